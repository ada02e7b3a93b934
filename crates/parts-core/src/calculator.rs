//! Material calculations behind the calculator form.
//!
//! Covers sheet nesting for rigid signs, roll usage for printed media and magnets,
//! banner finishing, decal sheets, VHB tape runs and bullet marker weights. Inputs
//! are raw form text, read with the same number parsing as part-number prefixes.

use crate::error::{PartsError, Result};
use crate::part_number::parse_number;
use serde::{Deserialize, Serialize};

/// Full 4x8 sheet used for aluminum and corrugated signs.
const STANDARD_SHEET: (f64, f64) = (96.0, 48.0);

/// Margin the printer keeps clear across the roll width.
const PRINT_MARGIN: f64 = 1.5;

/// Margin kept clear across a decal sheet.
const DECAL_SHEET_MARGIN: f64 = 1.5;

const BLEED: f64 = 0.5;

/// Laminate runs slightly longer than the printed material.
const LAMINATE_FACTOR: f64 = 1.05;

/// Tube weight in pounds per foot, by wall gauge.
const TUBE_WEIGHT_PER_FOOT: [(&str, f64); 5] = [
    ("0.100", 0.4599),
    ("0.110", 0.482195),
    ("0.125", 0.5211),
    ("0.218", 0.9073),
    ("0.318", 1.29512),
];

const SLEEVE_16_WEIGHT: f64 = 0.65;
const SLEEVE_LONG_WEIGHT: f64 = 0.95;
const DOME_CAP_PLUG_WEIGHT: f64 = 0.152;
const T3_HEAD_WEIGHT: f64 = 0.6;
const RAIN_CAP_WEIGHT: f64 = 0.05;
const U_CHANNEL_WEIGHT: f64 = 1.12;

/// Part types that are calculated without width and height.
const DIMENSIONLESS: [&str; 5] = ["bullet", "frame", "accessories", "delta", "drv"];

const INVALID_DIMENSIONS: &str = "Please enter valid numbers for width and height.";
const EXCEEDS_ROLL: &str = "Both dimensions exceed the roll width.";

/// Calculator form state. Omitted fields take the form's initial values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculatorInputs {
    #[serde(alias = "part_type")]
    pub part_type: String,
    #[serde(alias = "item_width")]
    pub item_width: String,
    #[serde(alias = "item_height")]
    pub item_height: String,
    /// `96` for 96x48 sheets, `120` for 120x60.
    #[serde(alias = "acm_sheet_size")]
    pub acm_sheet_size: String,
    /// `.023`, `.110_96`, `.110_40` or `.110_24`.
    #[serde(alias = "hdpe_sheet_size")]
    pub hdpe_sheet_size: String,
    #[serde(alias = "magnet_roll_width")]
    pub magnet_roll_width: String,
    #[serde(alias = "digital_print_roll_width")]
    pub digital_print_roll_width: String,
    #[serde(alias = "include_bleed")]
    pub include_bleed: bool,
    #[serde(alias = "opus_sheet_width")]
    pub opus_sheet_width: String,
    #[serde(alias = "opus_sheet_height")]
    pub opus_sheet_height: String,
    #[serde(alias = "sleeve_length")]
    pub sleeve_length: String,
    #[serde(alias = "tube_gauge")]
    pub tube_gauge: String,
    /// Tube length in inches, or `custom` to use `custom_tube_length`.
    #[serde(alias = "tube_length")]
    pub tube_length: String,
    #[serde(alias = "custom_tube_length")]
    pub custom_tube_length: String,
    #[serde(alias = "include_dome_cap_plug")]
    pub include_dome_cap_plug: bool,
    #[serde(alias = "include_sleeve")]
    pub include_sleeve: bool,
    #[serde(alias = "include_t3_head")]
    pub include_t3_head: bool,
    #[serde(alias = "include_rain_cap")]
    pub include_rain_cap: bool,
    #[serde(alias = "include_u_channel")]
    pub include_u_channel: bool,
}

impl Default for CalculatorInputs {
    fn default() -> Self {
        Self {
            part_type: "bullet".to_string(),
            item_width: "48".to_string(),
            item_height: "24".to_string(),
            acm_sheet_size: "96".to_string(),
            hdpe_sheet_size: ".023".to_string(),
            magnet_roll_width: "24".to_string(),
            digital_print_roll_width: "54".to_string(),
            include_bleed: true,
            opus_sheet_width: "12".to_string(),
            opus_sheet_height: "18".to_string(),
            sleeve_length: "16".to_string(),
            tube_gauge: "0.100".to_string(),
            tube_length: "72".to_string(),
            custom_tube_length: String::new(),
            include_dome_cap_plug: true,
            include_sleeve: true,
            include_t3_head: false,
            include_rain_cap: false,
            include_u_channel: false,
        }
    }
}

/// A single calculated figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CalcValue {
    Count(u64),
    Number(f64),
    Text(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalcLine {
    pub key: &'static str,
    pub label: &'static str,
    pub value: CalcValue,
}

impl CalcLine {
    fn count(key: &'static str, label: &'static str, value: u64) -> Self {
        Self {
            key,
            label,
            value: CalcValue::Count(value),
        }
    }

    fn number(key: &'static str, label: &'static str, value: f64) -> Self {
        Self {
            key,
            label,
            value: CalcValue::Number(value),
        }
    }

    fn text(key: &'static str, label: &'static str, value: &'static str) -> Self {
        Self {
            key,
            label,
            value: CalcValue::Text(value),
        }
    }
}

/// Calculated figures for one part type, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calculation {
    pub part_type: String,
    pub lines: Vec<CalcLine>,
}

fn dimension(raw: &str) -> Result<f64> {
    parse_number(raw)
        .filter(|n| n.is_finite() && *n > 0.0)
        .ok_or_else(|| PartsError::validation("dimensions", INVALID_DIMENSIONS))
}

fn positive(raw: &str, field: &str) -> Result<f64> {
    parse_number(raw)
        .filter(|n| n.is_finite() && *n > 0.0)
        .ok_or_else(|| PartsError::validation(field, format!("Please enter a valid {}.", field.replace('_', " "))))
}

/// Whole items of `item` that fit along `space`.
fn fit(space: f64, item: f64) -> u64 {
    (space / item).floor().max(0.0) as u64
}

/// Most items cut from one sheet, trying both orientations.
pub fn number_up(sheet: (f64, f64), width: f64, height: f64) -> u64 {
    let (sheet_w, sheet_h) = sheet;
    let straight = fit(sheet_w, width) * fit(sheet_h, height);
    let swapped = fit(sheet_w, height) * fit(sheet_h, width);
    straight.max(swapped)
}

/// Square feet of roll consumed per item when each row is `length` (+1in gap) long
/// and holds `per_row` items. Rounded up to thousandths.
fn roll_sq_ft(length: f64, roll_width: f64, per_row: u64) -> f64 {
    let sq_ft = (length + 1.0) * roll_width / 144.0 / per_row as f64;
    (sq_ft * 1000.0).ceil() / 1000.0
}

/// Rounds halves up, like the form's display rounding.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn sheet_lines(sheet: (f64, f64), width: f64, height: f64) -> Vec<CalcLine> {
    let qty = number_up(sheet, width, height);
    let share = if qty > 0 { 1.0 / qty as f64 } else { 0.0 };
    vec![
        CalcLine::count("qty", "# Up / Inverse Qty:", qty),
        CalcLine::number("percent_waste", "% Out of Material:", share),
    ]
}

fn hdpe_sheet(size: &str) -> (f64, f64) {
    match size {
        ".023" => (45.0, 24.0),
        ".110_96" => (48.0, 96.0),
        ".110_40" => (48.0, 40.0),
        _ => (48.0, 24.0),
    }
}

fn digital_print_lines(inputs: &CalculatorInputs, width: f64, height: f64) -> Result<Vec<CalcLine>> {
    let roll_width = positive(&inputs.digital_print_roll_width, "roll_width")?;
    let bleed = if inputs.include_bleed { BLEED } else { 0.0 };
    let print_area = roll_width - PRINT_MARGIN;
    let (bled_w, bled_h) = (width + bleed, height + bleed);

    if bled_w > print_area && bled_h > print_area {
        return Err(PartsError::validation("dimensions", EXCEEDS_ROLL));
    }

    // An orientation that doesn't fit still prints one per row
    let across_w = fit(print_area, bled_w).max(1);
    let across_h = fit(print_area, bled_h).max(1);

    let material = (roll_sq_ft(width, roll_width, across_h) + roll_sq_ft(height, roll_width, across_w)) / 2.0;
    Ok(vec![
        CalcLine::number("material_sq_ft", "Material Sq. ft.:", material),
        CalcLine::number("laminate_sq_ft", "Laminate Sq. ft.:", material * LAMINATE_FACTOR),
        CalcLine::count("max_up_per_row", "Max # Up per Row:", across_w.max(across_h)),
    ])
}

fn magnet_lines(inputs: &CalculatorInputs, width: f64, height: f64) -> Result<Vec<CalcLine>> {
    let roll_width = positive(&inputs.magnet_roll_width, "roll_width")?;
    let across_w = fit(roll_width, width);
    let across_h = fit(roll_width, height);

    // Only orientations that fit on the roll count toward the average
    let usable: Vec<f64> = [(width, across_h), (height, across_w)]
        .into_iter()
        .filter(|(_, per_row)| *per_row > 0)
        .map(|(length, per_row)| roll_sq_ft(length, roll_width, per_row))
        .collect();
    if usable.is_empty() {
        return Err(PartsError::validation("dimensions", EXCEEDS_ROLL));
    }
    let material = usable.iter().sum::<f64>() / usable.len() as f64;

    Ok(vec![
        CalcLine::number("material_sq_ft", "Material Sq. ft.:", material),
        CalcLine::count("max_up_per_row", "Max # Up per Row:", across_w.max(across_h)),
    ])
}

fn banner_lines(width: f64, height: f64) -> Vec<CalcLine> {
    // Hemmed height over 52.5in runs on the 54in roll
    let sq_ft = if (height + 3.0) * 2.0 < 52.5 {
        (width + 3.0) * (height + 3.0) / 144.0
    } else {
        (width + 3.0) * 54.0 / 144.0
    };
    let grommets = round_half_up((width - 2.0) / 30.0 * 2.0).max(4.0) as u64;

    vec![
        CalcLine::number("banner_sq_ft", "Banner Sq. ft.:", sq_ft),
        CalcLine::number("banner_tape", "Banner Tape:", (width + height) * 2.0 / 12.0),
        CalcLine::count("grommets", "Grommets:", grommets),
    ]
}

fn decal_sheet_lines(inputs: &CalculatorInputs, width: f64, height: f64) -> Result<Vec<CalcLine>> {
    let sheet_w = positive(&inputs.opus_sheet_width, "sheet_width")?;
    let sheet_h = positive(&inputs.opus_sheet_height, "sheet_height")?;

    let num_up = fit(sheet_w - DECAL_SHEET_MARGIN, width) * fit(sheet_h, height);
    let sheet_area = sheet_w * sheet_h / 144.0;
    let per_decal = if num_up > 0 { sheet_area / num_up as f64 } else { 0.0 };

    Ok(vec![
        CalcLine::count("num_up_standard", "# Up (Standard):", num_up),
        CalcLine::number("sheet_area_sq_ft", "Sheet Area (sq ft):", sheet_area),
        CalcLine::number("area_per_decal", "Area per Decal:", per_decal),
    ])
}

fn vhb_tape_lines(width: f64, height: f64) -> Vec<CalcLine> {
    let perimeter = (width - 2.0) * 2.0 + (height - 2.0) * 2.0;

    // Panels 48in or more get cross strips every 16in along the long side
    let (strips, strip_length) = if width >= 48.0 || height >= 48.0 {
        let (long, short) = if width > height { (width, height) } else { (height, width) };
        let strips = ((long - 48.0) / 16.0).floor().max(1.0);
        (strips as u64, strips * (short - 2.0))
    } else {
        (0, 0.0)
    };

    vec![
        CalcLine::number("vhb_perimeter_length", "Perimeter Length (ft):", perimeter / 12.0),
        CalcLine::count("vhb_additional_strips", "Additional Strips:", strips),
        CalcLine::number("vhb_tape_length", "Total Length (ft):", (perimeter + strip_length) / 12.0),
    ]
}

fn bullet_lines(inputs: &CalculatorInputs) -> Vec<CalcLine> {
    let length_raw = if inputs.tube_length == "custom" {
        &inputs.custom_tube_length
    } else {
        &inputs.tube_length
    };
    let tube_length = parse_number(length_raw).unwrap_or(0.0);
    let per_foot = TUBE_WEIGHT_PER_FOOT
        .iter()
        .find(|(gauge, _)| *gauge == inputs.tube_gauge.trim())
        .map(|(_, weight)| *weight)
        .unwrap_or(0.0);
    let tube_weight = tube_length / 12.0 * per_foot;

    let mut head_weight = 0.0;
    if inputs.include_sleeve {
        head_weight += if inputs.sleeve_length == "16" {
            SLEEVE_16_WEIGHT
        } else {
            SLEEVE_LONG_WEIGHT
        };
    }
    if inputs.include_dome_cap_plug {
        head_weight += DOME_CAP_PLUG_WEIGHT;
    }

    let mut total = tube_weight + head_weight;
    if inputs.include_t3_head {
        total += T3_HEAD_WEIGHT;
    }
    if inputs.include_rain_cap {
        total += RAIN_CAP_WEIGHT;
    }
    if inputs.include_u_channel {
        total += U_CHANNEL_WEIGHT;
    }

    vec![
        CalcLine::number("bullet_head_weight", "Bullet Head Weight:", head_weight),
        CalcLine::number("tube_weight", "Tube Weight:", tube_weight),
        CalcLine::number("weight", "Total Marker Weight:", total),
    ]
}

/// Run the calculation for the selected part type.
///
/// Sign weights are not produced; they need per-material densities.
pub fn calculate(inputs: &CalculatorInputs) -> Result<Calculation> {
    let part_type = inputs.part_type.trim();
    if part_type.is_empty() {
        return Err(PartsError::validation("part_type", "Please select a part type."));
    }

    let dims = if DIMENSIONLESS.contains(&part_type) {
        None
    } else {
        Some((dimension(&inputs.item_width)?, dimension(&inputs.item_height)?))
    };

    let lines = match (part_type, dims) {
        ("aluminum_sign" | "corrugated", Some((w, h))) => sheet_lines(STANDARD_SHEET, w, h),
        ("acm_sign", Some((w, h))) => {
            let sheet = if inputs.acm_sheet_size == "120" {
                (120.0, 60.0)
            } else {
                STANDARD_SHEET
            };
            sheet_lines(sheet, w, h)
        }
        ("hdpe_sign", Some((w, h))) => sheet_lines(hdpe_sheet(&inputs.hdpe_sheet_size), w, h),
        ("digital_print", Some((w, h))) => digital_print_lines(inputs, w, h)?,
        ("magnet", Some((w, h))) => magnet_lines(inputs, w, h)?,
        ("banner", Some((w, h))) => banner_lines(w, h),
        ("opus_cut_decal" | "screenDecal", Some((w, h))) => decal_sheet_lines(inputs, w, h)?,
        ("vhbTape", Some((w, h))) => vhb_tape_lines(w, h),
        ("bullet", _) => bullet_lines(inputs),
        ("delta" | "drv" | "accessories" | "frame", _) => vec![
            CalcLine::text("info", "No Calc Available", "N/A"),
            CalcLine::text("note", "Refer to Standard", "See Specs"),
        ],
        _ => {
            return Err(PartsError::UnknownPartType {
                key: part_type.to_string(),
            })
        }
    };

    Ok(Calculation {
        part_type: part_type.to_string(),
        lines,
    })
}
