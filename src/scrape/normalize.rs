use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2}/\d{2}/\d{4})").expect("date regex"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2}:\d{2})").expect("time regex"));

/// Convert a DD/MM/YYYY date to YYYY-MM-DD. Anything that does not split
/// into exactly three `/`-separated parts is passed through unchanged, so
/// malformed dates travel as opaque strings instead of aborting the run.
pub fn normalize_date(raw: &str) -> String {
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() == 3 {
        format!("{}-{}-{}", parts[2], parts[1], parts[0])
    } else {
        raw.to_string()
    }
}

/// First DD/MM/YYYY-shaped substring, if any.
pub fn find_first_date(text: &str) -> Option<String> {
    DATE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First HH:MM-shaped substring, if any.
pub fn find_first_time(text: &str) -> Option<String> {
    TIME_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
