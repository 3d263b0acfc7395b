//! Human-readable view-count parsing
//!
//! Platforms render counters as `"1.2M"`, `"822,000"`, or `"15K"`
//! depending on surface and locale. Unparseable input is worth exactly
//! zero views; it must never abort a refresh.

/// Parse a human-readable count string into a non-negative integer
///
/// Rules, applied in order:
/// 1. comma-grouped number with no letter suffix: strip commas, parse as
///    integer;
/// 2. trailing case-insensitive `k`/`m`/`b` suffix: strip everything but
///    digits and dots from the remainder, parse as float, scale by
///    1e3/1e6/1e9, round to nearest;
/// 3. otherwise strip all non-digit characters and parse as integer;
/// 4. any parse failure yields 0.
///
/// A `.` used as a thousands separator is not distinguished from a
/// decimal point; `"1.234"` parses as 1234 via rule 3 while `"1.2K"`
/// parses as 1200 via rule 2.
pub fn parse_view_count(raw: &str) -> u64 {
    let text = raw.trim();
    if text.is_empty() {
        return 0;
    }

    // Rule 1: comma-grouped integer, no suffix letters anywhere
    if text.contains(',') && !text.chars().any(|c| c.is_ascii_alphabetic()) {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        return digits.parse().unwrap_or(0);
    }

    // Rule 2: trailing k/m/b multiplier
    if let Some(multiplier) = suffix_multiplier(text) {
        // Safe byte slice: the suffix is a single ASCII character
        let body: String = text[..text.len() - 1]
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        return match body.parse::<f64>() {
            Ok(value) => (value * multiplier).round() as u64,
            Err(_) => 0,
        };
    }

    // Rule 3: plain digits, everything else stripped
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Multiplier for a trailing count suffix, if present
fn suffix_multiplier(text: &str) -> Option<f64> {
    match text.chars().last()? {
        'k' | 'K' => Some(1e3),
        'm' | 'M' => Some(1e6),
        'b' | 'B' => Some(1e9),
        _ => None,
    }
}
