//! Structured error bodies returned by the records service

use serde::Deserialize;

/// The `detail` payload of an error response.
///
/// The service answers either with a plain message
/// (`{"detail": "Group with id 4 not found"}`) or, for request validation
/// failures, with a list of located messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerErrorDetail {
    /// A single human-readable message.
    Message(String),
    /// Per-location validation messages.
    Fields(Vec<FieldIssue>),
}

/// One entry of a validation `detail` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldIssue {
    /// Path to the offending input, e.g. `["body", 0, "name"]`.
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    /// Message text.
    pub msg: String,
    /// Machine-readable error type.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl FieldIssue {
    /// Returns the location joined with dots.
    pub fn location(&self) -> String {
        self.loc
            .iter()
            .map(|part| match part {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Deserialize)]
struct Envelope {
    detail: RawDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDetail {
    Message(String),
    Fields(Vec<FieldIssue>),
}

impl ServerErrorDetail {
    /// Parses an error body. Returns `None` if the body has no `detail`.
    pub fn parse(body: &str) -> Option<Self> {
        let envelope: Envelope = serde_json::from_str(body).ok()?;
        Some(match envelope.detail {
            RawDetail::Message(message) => Self::Message(message),
            RawDetail::Fields(issues) => Self::Fields(issues),
        })
    }
}

impl std::fmt::Display for ServerErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => f.write_str(message),
            Self::Fields(issues) => {
                let parts: Vec<String> = issues
                    .iter()
                    .map(|issue| format!("{}: {}", issue.location(), issue.msg))
                    .collect();
                f.write_str(&parts.join("; "))
            }
        }
    }
}
