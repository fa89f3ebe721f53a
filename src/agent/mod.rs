//! Tool-calling client: hands the bridge's tools to a chat model and runs its calls

pub mod bridge;
pub mod chat;
pub mod runner;

pub use bridge::BridgeClient;
pub use chat::{ChatMessage, ChatModel, ChatTool, OpenAiCompatible, ToolCall};
pub use runner::{run_prompt, to_chat_tools, AgentReport, ToolExecutor, ToolOutcome, ToolOutput, DEFAULT_PROMPT};
