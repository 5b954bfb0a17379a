// ABOUTME: Shared utility functions for Tasklane
// ABOUTME: ID generation and display helpers

/// Generate a prefixed unique ID, e.g. `tsk-V1StGXR8_Z5j`
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!(12))
}

/// Truncate a string to at most `max` characters, appending an ellipsis when cut
pub fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let cut: String = value.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}
