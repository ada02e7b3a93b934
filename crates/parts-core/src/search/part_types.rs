//! Search configuration per part type, keyed the way the calculator names part types.

use super::predicate::{FilterOp, SearchConfig, ServerFilter};
use crate::error::{PartsError, Result};
use std::sync::LazyLock;

/// Upper bound used to turn a `>=` prefix into a prefix range.
const PREFIX_RANGE_END: char = '\u{f8ff}';

static PART_TYPES: LazyLock<Vec<(&'static str, SearchConfig)>> = LazyLock::new(|| {
    let group = |value: &str| ServerFilter::new("Part Group", FilterOp::Eq, value);
    let part_type = |value: &str| ServerFilter::new("Part Type", FilterOp::Eq, value);
    let decal_media = || vec![group("Signs"), part_type("Decal/Media")];

    vec![
        // Signs
        (
            "hdpe_sign",
            SearchConfig::new(vec![group("Signs"), ServerFilter::new("Grade", FilterOp::Eq, "HDPE")])
                .with_keywords("Part Type", &["Small Signs", "Large Signs"]),
        ),
        (
            "acm_sign",
            SearchConfig::new(vec![
                group("Signs"),
                ServerFilter::new("Name", FilterOp::Gte, "3mm"),
                ServerFilter::new("Name", FilterOp::Lte, format!("3mm{}", PREFIX_RANGE_END)),
            ])
            .with_keywords("Part Type", &["Small Signs", "Large Signs"]),
        ),
        ("aluminum_sign", SearchConfig::new(vec![group("Signs")])),
        (
            "corrugated",
            SearchConfig::new(vec![group("Signs"), part_type("Temporary Markings")])
                .with_keywords("Name", &["Coroplast"]),
        ),
        // Decals
        ("magnet", SearchConfig::new(decal_media()).with_keywords("Name", &["magnet"])),
        (
            "opus_cut_decal",
            SearchConfig::new(decal_media()).with_keywords("Name", &["opus", "pmps"]),
        ),
        ("banner", SearchConfig::new(decal_media()).with_keywords("Name", &["banner"])),
        ("digital_print", SearchConfig::new(decal_media())),
        (
            "screenDecal",
            SearchConfig::new(vec![group("Decals"), part_type("Screen Decal")]),
        ),
        // Other groups
        ("delta", SearchConfig::new(vec![group("Deltas")])),
        ("bullet", SearchConfig::new(vec![group("Bullets")])),
        ("drv", SearchConfig::new(vec![group("DRVs")])),
    ]
});

/// Resolve the search configuration for a part-type key.
///
/// Fails before any fetch: an empty key is a validation error, an unknown key a
/// configuration error.
pub fn search_config_for(key: &str) -> Result<SearchConfig> {
    let key = key.trim();
    if key.is_empty() {
        return Err(PartsError::validation("part_type", "Please select a part type."));
    }

    PART_TYPES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, config)| config.clone())
        .ok_or_else(|| PartsError::UnknownPartType {
            key: key.to_string(),
        })
}

/// All configured part-type keys, in display order.
pub fn part_type_keys() -> Vec<&'static str> {
    PART_TYPES.iter().map(|(k, _)| *k).collect()
}
