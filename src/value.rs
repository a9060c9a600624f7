//! Parameter payload types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote type tag of a stored parameter.
///
/// Variant names serialize exactly as the remote protocol spells them
/// (`"String"`, `"StringList"`, `"SecureString"`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    #[default]
    String,
    StringList,
    SecureString,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::String => "String",
            ParameterKind::StringList => "StringList",
            ParameterKind::SecureString => "SecureString",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached parameter payload.
///
/// `StringList` payloads arrive from the store as one comma-joined string
/// and are split into a list; every other kind passes through as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParameterValue {
    Text(String),
    List(Vec<String>),
}

impl ParameterValue {
    /// Parse a raw store payload according to its kind.
    pub fn from_raw(kind: ParameterKind, raw: &str) -> Self {
        match kind {
            ParameterKind::StringList => {
                ParameterValue::List(raw.split(',').map(str::to_string).collect())
            }
            _ => ParameterValue::Text(raw.to_string()),
        }
    }

    /// The scalar text, if this is not a list.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(text) => Some(text),
            ParameterValue::List(_) => None,
        }
    }

    /// The list items, if this is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParameterValue::Text(_) => None,
            ParameterValue::List(items) => Some(items),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ParameterValue::List(_))
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Text(text) => f.write_str(text),
            ParameterValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}
