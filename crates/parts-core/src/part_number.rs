//! Part-number prefixes derived from calculator inputs.
//!
//! Part numbers start with the material and dimensions, e.g. `080x24x18` for a
//! .080 gauge aluminum sign. The generated prefix is used as the free-text term of
//! a search.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Leading decimal number, the way form fields are read ("48in" reads as 48).
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").unwrap());

/// Calculator form state relevant to part numbers. All values are raw form text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrefixInputs {
    #[serde(alias = "part_group")]
    pub part_group: String,
    #[serde(alias = "part_type")]
    pub part_type: String,
    #[serde(alias = "item_width")]
    pub item_width: String,
    #[serde(alias = "item_height")]
    pub item_height: String,
    #[serde(alias = "al_gauge")]
    pub al_gauge: String,
    #[serde(alias = "hdpe_sheet_size")]
    pub hdpe_sheet_size: String,
    #[serde(alias = "tube_length")]
    pub tube_length: String,
    #[serde(alias = "custom_tube_length")]
    pub custom_tube_length: String,
}

/// Parse a form value the way the calculator form reads numbers.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Format a dimension without trailing zeros. Unparseable input formats as empty.
pub fn format_dim(raw: &str) -> String {
    match parse_number(raw) {
        Some(n) if n == 0.0 => "0".to_string(),
        Some(n) => n.to_string(),
        None => String::new(),
    }
}

/// Format a sheet gauge in thousandths, zero-padded to three digits (`.08` → `080`).
pub fn format_gauge(raw: &str) -> String {
    match parse_number(raw) {
        Some(n) => {
            let thousandths = (n * 1000.0 + 0.5).floor() as i64;
            format!("{:0>3}", thousandths)
        }
        None => String::new(),
    }
}

/// Generate the part-number prefix for the given inputs, or an empty string when the
/// inputs don't determine one.
pub fn generate_prefix(inputs: &PrefixInputs) -> String {
    let w = format_dim(&inputs.item_width);
    let h = format_dim(&inputs.item_height);

    if inputs.part_group == "lineMarkers" && inputs.part_type == "bullet" {
        return if inputs.tube_length == "custom" {
            format_dim(&inputs.custom_tube_length)
        } else {
            format_dim(&inputs.tube_length)
        };
    }

    if w.is_empty() || h.is_empty() {
        return String::new();
    }

    match (inputs.part_group.as_str(), inputs.part_type.as_str()) {
        ("signs", "aluminum_sign") => {
            let gauge = format_gauge(&inputs.al_gauge);
            if gauge.is_empty() {
                String::new()
            } else {
                format!("{}x{}x{}", gauge, w, h)
            }
        }
        ("signs", "acm_sign") => format!("3mmx{}x{}", w, h),
        ("signs", "hdpe_sign") => {
            let gauge = if inputs.hdpe_sheet_size == ".023" { "023" } else { "110" };
            format!("{}x{}x{}", gauge, w, h)
        }
        ("signs", "corrugated") | ("decals", _) => format!("{}x{}", w, h),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(part_type: &str, w: &str, h: &str) -> PrefixInputs {
        PrefixInputs {
            part_group: "signs".into(),
            part_type: part_type.into(),
            item_width: w.into(),
            item_height: h.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_dim() {
        assert_eq!(format_dim("48"), "48");
        assert_eq!(format_dim("48.50"), "48.5");
        assert_eq!(format_dim("12.0"), "12");
        assert_eq!(format_dim(" 18in"), "18");
        assert_eq!(format_dim(".5"), "0.5");
        assert_eq!(format_dim("abc"), "");
        assert_eq!(format_dim(""), "");
    }

    #[test]
    fn test_format_gauge() {
        assert_eq!(format_gauge(".080"), "080");
        assert_eq!(format_gauge("0.04"), "040");
        assert_eq!(format_gauge("0.125"), "125");
        assert_eq!(format_gauge(""), "");
    }

    #[test]
    fn test_sign_prefixes() {
        let mut aluminum = sign("aluminum_sign", "24", "18");
        aluminum.al_gauge = ".080".into();
        assert_eq!(generate_prefix(&aluminum), "080x24x18");

        aluminum.al_gauge = String::new();
        assert_eq!(generate_prefix(&aluminum), "");

        assert_eq!(generate_prefix(&sign("acm_sign", "12", "18.50")), "3mmx12x18.5");

        let mut hdpe = sign("hdpe_sign", "24", "36");
        assert_eq!(generate_prefix(&hdpe), "110x24x36");
        hdpe.hdpe_sheet_size = ".023".into();
        assert_eq!(generate_prefix(&hdpe), "023x24x36");

        assert_eq!(generate_prefix(&sign("corrugated", "18", "24")), "18x24");
    }

    #[test]
    fn test_missing_dimensions_give_empty_prefix() {
        assert_eq!(generate_prefix(&sign("acm_sign", "12", "")), "");
        assert_eq!(generate_prefix(&PrefixInputs::default()), "");
    }

    #[test]
    fn test_decal_and_bullet_prefixes() {
        let decal = PrefixInputs {
            part_group: "decals".into(),
            part_type: "magnet".into(),
            item_width: "12".into(),
            item_height: "24".into(),
            ..Default::default()
        };
        assert_eq!(generate_prefix(&decal), "12x24");

        let mut bullet = PrefixInputs {
            part_group: "lineMarkers".into(),
            part_type: "bullet".into(),
            tube_length: "36".into(),
            ..Default::default()
        };
        assert_eq!(generate_prefix(&bullet), "36");
        bullet.tube_length = "custom".into();
        bullet.custom_tube_length = "42.250".into();
        assert_eq!(generate_prefix(&bullet), "42.25");
    }

    #[test]
    fn test_inputs_accept_both_key_styles() {
        let camel: PrefixInputs =
            serde_json::from_str(r#"{"partGroup":"signs","partType":"acm_sign","itemWidth":"12","itemHeight":"18"}"#)
                .unwrap();
        let snake: PrefixInputs =
            serde_json::from_str(r#"{"part_group":"signs","part_type":"acm_sign","item_width":"12","item_height":"18"}"#)
                .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(generate_prefix(&camel), "3mmx12x18");
    }
}
