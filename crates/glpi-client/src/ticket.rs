//! Ticket payloads as returned by GLPI.
//!
//! GLPI is loose about field types: with `expand_dropdowns` some columns come
//! back as display strings instead of numeric ids. Fields other than `id`
//! are therefore kept as raw JSON values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub priority: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Ticket {
    pub fn name_text(&self) -> String {
        display_value(&self.name)
    }

    pub fn content_text(&self) -> String {
        display_value(&self.content)
    }

    pub fn status_text(&self) -> String {
        display_value(&self.status)
    }

    pub fn priority_text(&self) -> String {
        display_value(&self.priority)
    }
}

/// Reply to `POST /Ticket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTicket {
    pub id: i64,
    #[serde(default)]
    pub message: String,
}

/// Render a JSON scalar the way a person would read it: strings unquoted,
/// `null` as an empty string.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
