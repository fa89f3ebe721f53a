//! One prompt, one model round trip, then every requested tool call in order

use std::fmt;

use async_trait::async_trait;
use rmcp::model::Tool;
use serde_json::{Map, Value};

use super::chat::{ChatMessage, ChatModel, ChatTool, FunctionSpec, ToolCall};
use crate::error::{Error, Result};
use crate::types::{EnvelopeError, ToolEnvelope};

/// Prompt used when `motorpool ask` gets none
pub const DEFAULT_PROMPT: &str =
    "Find Toyota cars with a maximum price of 150000 and also look up the user with id 2";

/// Executes a named tool and returns the serialized tool result
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<Value>;
}

/// Map MCP tool definitions onto the chat-completion tool schema
pub fn to_chat_tools(tools: &[Tool]) -> Vec<ChatTool> {
    tools
        .iter()
        .map(|tool| ChatTool {
            kind: "function".into(),
            function: FunctionSpec {
                name: tool.name.to_string(),
                description: tool.description.as_deref().unwrap_or_default().to_string(),
                parameters: Value::Object((*tool.input_schema).clone()),
            },
        })
        .collect()
}

/// What one tool call produced
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Inner text parsed as JSON
    Json(Value),
    /// Inner text that is not JSON
    Text(String),
    /// Result that is not a text envelope, kept as received
    Unrecognized { raw: Value, reason: EnvelopeError },
}

impl ToolOutput {
    /// Decode a serialized tool result into something printable
    pub fn from_result(raw: Value) -> Self {
        match ToolEnvelope::decode(&raw) {
            Ok(envelope) => Self::from_envelope(&envelope),
            Err(reason) => ToolOutput::Unrecognized { raw, reason },
        }
    }

    /// First text block, as JSON when it parses
    pub fn from_envelope(envelope: &ToolEnvelope) -> Self {
        let text = envelope.first_text();
        match serde_json::from_str::<Value>(text) {
            Ok(json) => ToolOutput::Json(json),
            Err(_) => ToolOutput::Text(text.to_string()),
        }
    }
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pretty = |value: &Value| {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        };
        match self {
            ToolOutput::Json(value) => write!(f, "{}", pretty(value)),
            ToolOutput::Text(text) => write!(f, "{}", text),
            ToolOutput::Unrecognized { raw, .. } => write!(f, "{}", pretty(raw)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub name: String,
    pub arguments: String,
    pub is_error: bool,
    pub output: ToolOutput,
}

#[derive(Debug, Clone)]
pub struct AgentReport {
    pub prompt: String,
    /// Tool calls exactly as the model requested them
    pub requested: Vec<ToolCall>,
    pub outcomes: Vec<ToolOutcome>,
    /// Model text when it asked for no tools
    pub reply: Option<String>,
}

/// Parse the model's argument string; blank means no arguments
fn parse_arguments(raw: &str) -> Result<Map<String, Value>> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Llm(format!(
            "tool arguments must be a JSON object, got {}",
            other
        ))),
    }
}

/// Send `prompt` with `tools`, then execute the requested calls sequentially
pub async fn run_prompt<M, T>(
    model: &M,
    executor: &T,
    tools: &[ChatTool],
    prompt: &str,
) -> Result<AgentReport>
where
    M: ChatModel + ?Sized,
    T: ToolExecutor + ?Sized,
{
    let message = model.complete(&[ChatMessage::user(prompt)], tools).await?;
    let requested = message.tool_calls().to_vec();

    if requested.is_empty() {
        return Ok(AgentReport {
            prompt: prompt.to_string(),
            requested,
            outcomes: Vec::new(),
            reply: message.content,
        });
    }

    let mut outcomes = Vec::with_capacity(requested.len());
    for call in &requested {
        if call.kind != "function" {
            tracing::debug!("Skipping tool call {} of type {}", call.id, call.kind);
            continue;
        }

        tracing::info!("Executing tool {} with {}", call.function.name, call.function.arguments);
        let arguments = parse_arguments(&call.function.arguments)?;
        let raw = executor.call_tool(&call.function.name, arguments).await?;

        let (is_error, output) = match ToolEnvelope::decode(&raw) {
            Ok(envelope) => (envelope.is_error, ToolOutput::from_envelope(&envelope)),
            Err(reason) => {
                tracing::warn!("Tool {} returned an unexpected result: {}", call.function.name, reason);
                (false, ToolOutput::Unrecognized { raw, reason })
            }
        };

        outcomes.push(ToolOutcome {
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
            is_error,
            output,
        });
    }

    Ok(AgentReport {
        prompt: prompt.to_string(),
        requested,
        outcomes,
        reply: None,
    })
}
