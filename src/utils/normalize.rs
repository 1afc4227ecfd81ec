/// Canonical comparison form of an answer: surrounding whitespace removed, lowercased.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}
