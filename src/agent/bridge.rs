//! MCP client side of the bridge

use std::path::Path;

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, Tool};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use rmcp::ServiceExt;
use serde_json::{json, Map, Value};
use tokio::process::Command;

use super::runner::ToolExecutor;
use crate::error::{Error, Result};

/// A connected MCP client session
pub struct BridgeClient {
    service: RunningService<RoleClient, ()>,
}

impl BridgeClient {
    /// Wrap an already initialized client session
    pub fn new(service: RunningService<RoleClient, ()>) -> Self {
        Self { service }
    }

    /// Start `program` with `args` and talk MCP over its stdio
    pub async fn spawn(program: &Path, args: &[String]) -> Result<Self> {
        tracing::debug!("Spawning MCP server: {} {}", program.display(), args.join(" "));

        let transport = TokioChildProcess::new(Command::new(program).configure(|cmd| {
            cmd.args(args);
        }))?;

        let service = ()
            .serve(transport)
            .await
            .map_err(|e| Error::Mcp(format!("failed to initialize client: {}", e)))?;

        if let Some(info) = service.peer_info() {
            tracing::info!("Connected to MCP server {}", info.server_info.name);
        }

        Ok(Self::new(service))
    }

    /// Every tool the server advertises
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        Ok(self.service.list_all_tools().await?)
    }

    /// Close the session and stop the transport
    pub async fn shutdown(self) -> Result<()> {
        self.service
            .cancel()
            .await
            .map_err(|e| Error::Mcp(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ToolExecutor for BridgeClient {
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        let request: CallToolRequestParam =
            serde_json::from_value(json!({ "name": name, "arguments": arguments }))?;
        let result = self.service.call_tool(request).await?;
        Ok(serde_json::to_value(result)?)
    }
}
