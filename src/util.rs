// Utility helpers for parsing and safe arithmetic.
//
// This module centralizes the "dirty" CSV/number handling so the rest of the
// code can assume clean, typed values, plus the zero-guarded divisions that
// keep ratios and percentages free of NaN and infinity.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Accepts `Option<&str>` so callers can pass through optional cells.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Refuses non-finite results.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Division that yields 0 instead of NaN or infinity.
///
/// A non-positive denominator counts as "nothing to divide by": the sums fed
/// in here (investments, counts, group totals) are only meaningful above 0.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        return 0.0;
    }
    let v = numerator / denominator;
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Percentage of `part` relative to `total`; 0 when `total` is 0.
pub fn percent_of(part: f64, total: f64) -> f64 {
    safe_div(part * 100.0, total)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with a fixed number of decimal places and
    // locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    // First, format to a plain fixed-decimal string like `1234567.89`.
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Use `num-format` to insert commas into the integer portion.
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values, used for row
    // counts in console messages (e.g., `1,248 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

/// Table-cell rendering for monetary/energy amounts.
pub fn display_amount(v: &f64) -> String {
    format_number(*v, 2)
}

/// Table-cell rendering for optional percentage columns; an absent share
/// renders as an empty cell.
pub fn display_share(v: &Option<f64>) -> String {
    match v {
        Some(p) => format!("{:.2}", p),
        None => String::new(),
    }
}
