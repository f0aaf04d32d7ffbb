use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Row identifiers for exports that do not carry one.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

// Floats are exact integers up to 2^53.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

fn as_integer(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if !raw.contains('.') {
        // Out of range values are not identifiers.
        return raw.parse::<u64>().ok();
    }
    let x = raw.parse::<f64>().ok()?;
    if x.is_finite() && x.fract() == 0.0 && (0.0..MAX_EXACT_FLOAT).contains(&x) {
        Some(x as u64)
    } else {
        None
    }
}

/// Survey exports often store codes as floats: `3.0` and `3` are the same code.
pub fn normalize_code(raw: &str) -> String {
    let s = raw.trim();
    match as_integer(s) {
        Some(x) => x.to_string(),
        None => s.to_string(),
    }
}

fn normalize_id(raw: &str, prefix: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let is_numeric = s.chars().all(|c| c.is_ascii_digit() || c == '.');
    match as_integer(s) {
        Some(x) => Some(format!("{}-{:03}", prefix, x)),
        // A number that is not an integer (1.5) is not an identifier.
        None if is_numeric => None,
        None => Some(s.to_lowercase()),
    }
}

/// `7`, `7.0` -> `pid-007`. Other identifiers (e-mails, `PID-007`) are lowercased.
pub fn normalize_participant_id(raw: &str) -> Option<String> {
    normalize_id(raw, "pid")
}

/// `1` -> `ses-001`. Other identifiers are lowercased.
pub fn normalize_session_id(raw: &str) -> Option<String> {
    normalize_id(raw, "ses")
}

/// The presenter key is the last name: `"Lee, Dreams and memory"` -> `"Lee"`.
pub fn presenter_key(display_name: &str) -> Option<String> {
    let key = display_name.split(',').next()?.trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}
