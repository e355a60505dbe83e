//! Built-in job types.

mod echo;
mod sleep;
mod summarize_checklist;

pub use echo::EchoJob;
pub use sleep::SleepJob;
pub use summarize_checklist::{ChecklistItem, SummarizeChecklistJob};

/// Read an optional text field from a payload.
///
/// Missing or `null` yields an empty string; non-string values are rendered
/// as compact JSON.
fn text_field(payload: &serde_json::Value, field: &str) -> String {
    match payload.get(field) {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
