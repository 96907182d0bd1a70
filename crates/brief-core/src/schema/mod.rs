//! Strict validation of untrusted JSON against the brief contract.
//!
//! Everything that crosses into the store goes through here first: LLM
//! output, mock output, and inbound generate requests. Validation never
//! assumes shape. It walks the value, collects every field-level problem it
//! can find, and returns either a fully typed [`Brief`](crate::Brief) or the
//! list of [`Violation`]s.

mod brief;
mod request;

pub use brief::{validate_brief, Validation};
pub use request::{check_source_urls, GenerateRequest};

use serde::{Deserialize, Serialize};
use std::fmt;

/// What went wrong with a single field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    WrongType,
    InvalidEnum,
    InvalidUrl,
    InvalidUuid,
    InvalidTimestamp,
    DuplicateId,
    Empty,
    TooMany,
}

/// One field-level validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    /// Location of the offending value, e.g. `key_points[1].credibility`.
    /// Empty for the document root.
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Join a parent path and a child key.
pub(crate) fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// JSON type name used in violation messages.
pub(crate) fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
