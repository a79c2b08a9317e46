/// Canonical form of an email address: surrounding whitespace removed,
/// lower-cased. Uniqueness and lookups always use this form.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
