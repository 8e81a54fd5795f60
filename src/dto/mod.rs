pub mod catalog;
pub mod flow;
pub mod game;
pub mod health;
pub mod sse;
pub mod team;
pub mod validation;

/// Map an empty or whitespace-only optional string to `None`.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
