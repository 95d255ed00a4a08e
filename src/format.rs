use crate::dynamo::ConfigEntry;

/// Render entries as `name=value` lines, keeping their order.
///
/// Neither side is escaped, so a name containing `=` cannot be split back
/// unambiguously.
pub fn format_entries(entries: &[ConfigEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| format!("{}={}", entry.name, entry.value))
        .collect()
}
