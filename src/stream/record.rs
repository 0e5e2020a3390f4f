//! Patch records: the unit the merger reasons about.
//!
//! On the wire a record is a compact JSON object with the short keys `p` (path),
//! `o` (operation) and `v` (value). The long spellings are accepted on input.
//! Any other keys are carried along so re-serialization never loses them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::frame::DATA_PREFIX;

/// Value carried by a record.
///
/// Only the textual case takes part in merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchValue {
    Text(String),
    Other(Value),
}

impl PatchValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PatchValue::Text(s) => Some(s),
            PatchValue::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    #[serde(
        rename = "p",
        alias = "path",
        default,
        skip_serializing_if = "is_blank"
    )]
    pub path: Option<String>,

    #[serde(
        rename = "o",
        alias = "operation",
        default,
        skip_serializing_if = "is_blank"
    )]
    pub operation: Option<String>,

    /// `null` decodes as `None`.
    #[serde(
        rename = "v",
        alias = "value",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<PatchValue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().is_none_or(str::is_empty)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl PatchRecord {
    /// Decode a data-line payload.
    pub fn decode(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Build an opening record with a textual value.
    pub fn text(path: &str, operation: &str, value: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            operation: Some(operation.to_string()),
            value: Some(PatchValue::Text(value.to_string())),
            extra: Map::new(),
        }
    }

    pub fn path(&self) -> Option<&str> {
        non_empty(&self.path)
    }

    pub fn operation(&self) -> Option<&str> {
        non_empty(&self.operation)
    }

    pub fn text_value(&self) -> Option<&str> {
        self.value.as_ref().and_then(PatchValue::as_text)
    }

    /// Both path and operation present: this record starts a new logical entry.
    pub fn opens_entry(&self) -> bool {
        self.path().is_some() && self.operation().is_some()
    }

    /// No path, no operation, but a value: continues the previously opened entry.
    pub fn is_continuation(&self) -> bool {
        self.path().is_none() && self.operation().is_none() && self.value.is_some()
    }

    /// Fold a continuation into this record: its text is appended and its extra keys
    /// are carried over (a repeated key takes the continuation's value).
    ///
    /// Returns `false`, leaving this record untouched, unless both values are text.
    pub fn merge_continuation(&mut self, next: PatchRecord) -> bool {
        let Some(text) = next.text_value() else {
            return false;
        };
        if !self.append_text(text) {
            return false;
        }
        self.extra.extend(next.extra);
        true
    }

    /// Append `more` onto a textual value. Returns `false` (and leaves the record
    /// untouched) if this record's value is not text.
    pub fn append_text(&mut self, more: &str) -> bool {
        match &mut self.value {
            Some(PatchValue::Text(s)) => {
                s.push_str(more);
                true
            }
            _ => false,
        }
    }

    /// Re-serialize as a data line (no trailing newline).
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{DATA_PREFIX} {json}"))
    }
}
