//! Wire encoding for multi-select answers.
//!
//! The exam platform stores several selected options as one string joined by
//! the literal separator `" and "`. This encoding only exists at the API
//! boundary; inside the gateway selections are `Vec<String>`.
//!
//! An option whose own text contains `" and "` cannot round-trip: decoding
//! splits it in two. Use [`ambiguous_options`] to surface such options to
//! authors instead of repairing them.

pub const SEPARATOR: &str = " and ";

pub fn encode<S: AsRef<str>>(options: &[S]) -> String {
    options
        .iter()
        .map(|o| o.as_ref())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

pub fn decode(answer: &str) -> Vec<String> {
    answer
        .split(SEPARATOR)
        .filter(|token| !token.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Adds `option` when absent (appended at the end), removes it when present.
pub fn toggle(answer: &str, option: &str) -> String {
    let mut selected = decode(answer);
    if let Some(pos) = selected.iter().position(|s| s == option) {
        selected.remove(pos);
    } else {
        selected.push(option.to_string());
    }
    encode(&selected)
}

pub fn ambiguous_options<S: AsRef<str>>(options: &[S]) -> Vec<String> {
    options
        .iter()
        .map(|o| o.as_ref())
        .filter(|o| o.contains(SEPARATOR))
        .map(str::to_string)
        .collect()
}
