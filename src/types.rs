//! Core types for Motorpool

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// User identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
}

/// A car listing. `id` is not unique across listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Car {
    /// Listing identifier (may repeat)
    pub id: i64,
    /// Manufacturer
    pub brand: String,
    /// Model name
    pub model: String,
    /// Model year
    pub year: i64,
    /// Price in whole currency units
    pub price: i64,
}

/// Result of a car search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CarsResponse {
    /// Matching cars in dataset order
    pub content: Vec<Car>,
}

/// Error body returned by the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Per-field validation diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldIssue>>,
}

/// One failed query parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldIssue {
    /// Query parameter name
    pub field: String,
    /// Machine-readable issue code (`invalid_type`, `too_small`)
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            code: code.to_string(),
            message: message.into(),
        }
    }
}

// Tool result envelope

/// A text block inside a tool result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolText {
    pub text: String,
}

/// Decoded `{ content: [{ type: "text", text }], isError? }` tool result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEnvelope {
    pub content: Vec<ToolText>,
    pub is_error: bool,
}

/// Why a value is not a tool result envelope
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` should be {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("field `content` is empty")]
    EmptyContent,

    #[error("unsupported content type `{0}`")]
    UnsupportedContent(String),
}

impl ToolEnvelope {
    /// Decode a serialized tool result, naming the first field that does not fit
    pub fn decode(value: &Value) -> Result<Self, EnvelopeError> {
        let object = value.as_object().ok_or(EnvelopeError::NotAnObject)?;

        let items = object
            .get("content")
            .ok_or_else(|| EnvelopeError::MissingField("content".into()))?
            .as_array()
            .ok_or_else(|| EnvelopeError::WrongType {
                field: "content".into(),
                expected: "an array",
            })?;

        if items.is_empty() {
            return Err(EnvelopeError::EmptyContent);
        }

        let mut content = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let field = |name: &str| format!("content[{}].{}", i, name);

            let item = item.as_object().ok_or_else(|| EnvelopeError::WrongType {
                field: format!("content[{}]", i),
                expected: "an object",
            })?;

            match item.get("type").and_then(Value::as_str) {
                Some("text") => {}
                Some(other) => return Err(EnvelopeError::UnsupportedContent(other.to_string())),
                None => return Err(EnvelopeError::MissingField(field("type"))),
            }

            let text = item
                .get("text")
                .ok_or_else(|| EnvelopeError::MissingField(field("text")))?
                .as_str()
                .ok_or_else(|| EnvelopeError::WrongType {
                    field: field("text"),
                    expected: "a string",
                })?;

            content.push(ToolText {
                text: text.to_string(),
            });
        }

        let is_error = match object.get("isError") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                return Err(EnvelopeError::WrongType {
                    field: "isError".into(),
                    expected: "a boolean",
                })
            }
        };

        Ok(Self { content, is_error })
    }

    /// Text of the first content block
    pub fn first_text(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or_default()
    }
}
