//! Normalisation of raw facility wiring labels.

const UNKNOWN_SPLICE_RACK: &str = "UNKNOWN";

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Derives the display IDF code from the raw IDF label and the wiring scope.
///
/// Labels already naming an IDF pass through, bare closet numbers `1`-`4` gain
/// the `IDF` prefix, and empty labels fall back to the ring or edge scope.
/// Hyphens are stripped from every result.
pub fn normalize_idf(raw_idf: &str, wiring_scope: &str) -> String {
    let scope = wiring_scope.to_uppercase();
    let code = if contains_ignore_case(raw_idf, "IDF") {
        raw_idf.to_string()
    } else if matches!(raw_idf, "1" | "2" | "3" | "4") {
        format!("IDF{raw_idf}")
    } else if raw_idf.is_empty() && scope == "RNG-RNG" {
        "RNG".to_string()
    } else if raw_idf.is_empty() && scope.starts_with("EDGE-") {
        "EDGE".to_string()
    } else {
        raw_idf.to_string()
    };
    code.replace('-', "")
}

/// Formats a splice rack location as `<rack> U<unit>`, or `UNKNOWN` when
/// either half is missing.
pub fn normalize_splice_rack(rack: &str, rack_unit: &str) -> String {
    if rack.is_empty() || rack_unit.is_empty() {
        return UNKNOWN_SPLICE_RACK.to_string();
    }
    // Units are numeric upstream; tolerate a unit that already carries the prefix.
    let unit = rack_unit
        .strip_prefix('U')
        .or_else(|| rack_unit.strip_prefix('u'))
        .filter(|unit| !unit.is_empty())
        .unwrap_or(rack_unit);
    format!("{rack} U{unit}")
}
