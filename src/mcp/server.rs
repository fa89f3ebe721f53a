//! MCP server implementation

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::sync::Arc;

use super::upstream::ApiClient;

/// MCP server exposing the Motorpool API as tools
#[derive(Clone)]
pub struct MotorpoolServer {
    pub api: Arc<ApiClient>,
    tool_router: ToolRouter<Self>,
}

// Tool parameter types

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetUserByIdParams {
    /// User ID
    pub id: Number,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchCarsParams {
    /// Brand, case-insensitive partial match
    pub brand: Option<String>,
    /// Model, case-insensitive partial match
    pub model: Option<String>,
    /// Exact model year
    pub year: Option<Number>,
    /// Maximum price (inclusive)
    pub max_price: Option<Number>,
}

/// Pretty-print a value as the single text block of a successful result
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn error_result(message: String) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message)])
}

// Server implementation

#[tool_router]
impl MotorpoolServer {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            tool_router: Self::tool_router(),
        }
    }

    /// Look up one user through `GET /users/{id}`
    #[tool(name = "getUserById", description = "Look up a user by ID")]
    pub async fn get_user_by_id(
        &self,
        Parameters(params): Parameters<GetUserByIdParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.get_user(&params.id).await {
            Ok(user) => json_result(&user),
            Err(e) => {
                tracing::warn!("getUserById({}) failed: {}", params.id, e);
                Ok(error_result(e.to_string()))
            }
        }
    }

    /// Search cars through `GET /cars`
    #[tool(
        name = "searchCars",
        description = "Search cars by brand, model, year or maximum price"
    )]
    pub async fn search_cars(
        &self,
        Parameters(params): Parameters<SearchCarsParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.search_cars(&params).await {
            Ok(cars) => json_result(&cars),
            Err(e) => {
                tracing::warn!("searchCars({:?}) failed: {}", params, e);
                Ok(error_result(e.to_string()))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for MotorpoolServer {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::default(),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: rmcp::model::Implementation {
                name: "motorpool".into(),
                title: Some("Motorpool users and cars".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some("Use getUserById to fetch a user record and searchCars to filter the car catalogue by brand, model, year or maximum price. Results are JSON text.".into()),
        }
    }
}

/// Run the MCP server on stdio
pub async fn serve_stdio(server: MotorpoolServer) -> anyhow::Result<()> {
    tracing::info!("Starting MCP server on stdio (API at {})...", server.api.base_url());
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// Run the MCP server on HTTP
pub async fn serve_http(server: MotorpoolServer, port: u16) -> anyhow::Result<()> {
    use axum::routing::get;
    use axum::Router;
    use rmcp::transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService, StreamableHttpServerConfig,
    };
    use tokio_util::sync::CancellationToken;

    let api = server.api.clone();

    let ct = CancellationToken::new();

    let config = StreamableHttpServerConfig {
        cancellation_token: ct.clone(),
        ..Default::default()
    };

    let mcp_service = StreamableHttpService::new(
        move || Ok(MotorpoolServer::new(api.clone())),
        Arc::new(LocalSessionManager::default()),
        config,
    );

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest_service("/mcp", mcp_service);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Motorpool MCP server running at http://{}/mcp", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down...");
            ct.cancel();
        })
        .await?;

    Ok(())
}
