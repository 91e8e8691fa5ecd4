use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Database;

/// JSON Schema property for a tool parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    /// Shorthand for a plain string parameter
    pub fn string(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "string".to_string(),
            description: description.into(),
            default: None,
            items: None,
            enum_values: None,
        }
    }

    /// Shorthand for a string parameter restricted to an enumeration
    pub fn string_enum(description: impl Into<String>, values: &[&str]) -> Self {
        PropertySchema {
            schema_type: "string".to_string(),
            description: description.into(),
            default: None,
            items: None,
            enum_values: Some(values.iter().map(|v| v.to_string()).collect()),
        }
    }

    /// Shorthand for an integer parameter
    pub fn integer(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "integer".to_string(),
            description: description.into(),
            default: None,
            items: None,
            enum_values: None,
        }
    }

    /// Shorthand for an array-of-strings parameter
    pub fn string_array(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "array".to_string(),
            description: description.into(),
            default: None,
            items: Some(Box::new(PropertySchema::string("array item"))),
            enum_values: None,
        }
    }
}

/// Input schema for a tool in JSON Schema object form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: HashMap<String, PropertySchema>,
    pub required: Vec<String>,
}

impl ToolInputSchema {
    pub fn object(properties: HashMap<String, PropertySchema>, required: &[&str]) -> Self {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties,
            required: required.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Tool definition handed to the AI API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// Error signalled when a tool executes with no acting user bound.
/// This indicates a context-management bug in the caller, not a user error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingUserError;

impl fmt::Display for MissingUserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no acting user set in tool context")
    }
}

impl std::error::Error for MissingUserError {}

/// Per-invocation execution context passed into every tool. Owned by a
/// single agent invocation and dropped with it; concurrent invocations
/// never observe each other's acting user.
#[derive(Clone)]
pub struct ToolContext {
    pub user_id: Option<Uuid>,
    pub db: Arc<Database>,
}

impl ToolContext {
    pub fn new(db: Arc<Database>) -> Self {
        ToolContext { user_id: None, db }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// The acting user, or a distinguishable missing-context error
    pub fn require_user(&self) -> Result<Uuid, MissingUserError> {
        self.user_id.ok_or(MissingUserError)
    }
}

/// Result of a tool execution. `content` is always a human-readable string;
/// tools report their own failures here rather than raising.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        ToolResult {
            success: true,
            content: content.into(),
            metadata: None,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        ToolResult {
            success: false,
            content: content.into(),
            metadata: None,
        }
    }

    /// The missing-context failure, tagged in metadata so callers can tell
    /// it apart from ordinary tool errors.
    pub fn missing_user() -> Self {
        ToolResult::error(format!("Error: {}", MissingUserError))
            .with_metadata(serde_json::json!({ "error_kind": "missing_user" }))
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// True when this result is the missing-context failure
    pub fn is_missing_user(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("error_kind"))
            .and_then(|k| k.as_str())
            == Some("missing_user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_user() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let context = ToolContext::new(db.clone());
        assert_eq!(context.require_user(), Err(MissingUserError));

        let uid = Uuid::new_v4();
        let context = context.with_user(uid);
        assert_eq!(context.require_user(), Ok(uid));
    }

    #[test]
    fn test_missing_user_result_is_distinguishable() {
        let result = ToolResult::missing_user();
        assert!(!result.success);
        assert!(result.is_missing_user());
        assert!(result.content.contains("no acting user"));

        let plain = ToolResult::error("something broke");
        assert!(!plain.is_missing_user());
    }

    #[test]
    fn test_schema_serializes_with_json_schema_keys() {
        let mut properties = HashMap::new();
        properties.insert(
            "priority".to_string(),
            PropertySchema::string_enum("Task priority", &["low", "medium", "high"]),
        );
        let schema = ToolInputSchema::object(properties, &["priority"]);
        let json = serde_json::to_value(&schema).unwrap();

        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["priority"]["type"], "string");
        assert_eq!(json["properties"]["priority"]["enum"][0], "low");
        assert_eq!(json["required"][0], "priority");
    }
}
