use serde::{Deserialize, Serialize};

/// A single failed validation rule, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    /// The rule parameter (e.g. the minimum length), not the submitted value.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    pub message: String,
}
