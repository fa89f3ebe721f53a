//! Integration tests for the MCP bridge
//! Runs the real HTTP API on an ephemeral port and drives the tools against it

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ServiceExt;
use serde_json::{json, Value};

use motorpool::agent::{
    run_prompt, to_chat_tools, BridgeClient, ChatMessage, ChatModel, ChatTool, ToolCall, ToolExecutor,
    ToolOutput,
};
use motorpool::api::{create_router, AppState};
use motorpool::mcp::{ApiClient, GetUserByIdParams, MotorpoolServer, SearchCarsParams};
use motorpool::store::Dataset;
use motorpool::ToolEnvelope;

/// Serve the API on 127.0.0.1 and return its base URL
async fn spawn_api() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind ephemeral port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, create_router(AppState::new(Dataset::seed())))
            .await
            .expect("API server failed");
    });

    format!("http://{}", addr)
}

/// A base URL nothing is listening on
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn bridge_for(base_url: &str) -> MotorpoolServer {
    let api = ApiClient::new(base_url, Duration::from_secs(5)).expect("Should build client");
    MotorpoolServer::new(Arc::new(api))
}

fn envelope(result: CallToolResult) -> ToolEnvelope {
    let value = serde_json::to_value(result).expect("Should serialize result");
    ToolEnvelope::decode(&value).expect("Should be a text envelope")
}

// ============================================================================
// Tool handlers
// ============================================================================

mod tool_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_user_by_id() {
        let server = bridge_for(&spawn_api().await);

        let result = server
            .get_user_by_id(Parameters(GetUserByIdParams { id: 1i64.into() }))
            .await
            .expect("Tool should not fail at protocol level");
        let envelope = envelope(result);

        assert!(!envelope.is_error);
        assert_eq!(envelope.content.len(), 1);
        assert_eq!(
            envelope.first_text(),
            "{\n  \"id\": 1,\n  \"name\": \"Victor\",\n  \"email\": \"victor@domain.com\"\n}"
        );
    }

    #[tokio::test]
    async fn test_get_user_not_found_carries_status() {
        let server = bridge_for(&spawn_api().await);

        let result = server
            .get_user_by_id(Parameters(GetUserByIdParams { id: 42i64.into() }))
            .await
            .unwrap();
        let envelope = envelope(result);

        assert!(envelope.is_error);
        assert_eq!(envelope.first_text(), "Failed to fetch user: 404 Not Found");
    }

    #[tokio::test]
    async fn test_get_user_invalid_id_carries_status() {
        let server = bridge_for(&spawn_api().await);

        let result = server
            .get_user_by_id(Parameters(GetUserByIdParams { id: 0i64.into() }))
            .await
            .unwrap();
        let envelope = envelope(result);

        assert!(envelope.is_error);
        assert!(envelope.first_text().contains("400"));
    }

    #[tokio::test]
    async fn test_search_cars_filters() {
        let server = bridge_for(&spawn_api().await);

        let params = SearchCarsParams {
            brand: Some("toyota".into()),
            max_price: Some(150000i64.into()),
            ..Default::default()
        };
        let envelope = envelope(server.search_cars(Parameters(params)).await.unwrap());

        assert!(!envelope.is_error);
        let body: Value = serde_json::from_str(envelope.first_text()).unwrap();
        assert_eq!(
            body,
            json!({ "content": [
                { "id": 1, "brand": "Toyota", "model": "Corolla", "year": 2022, "price": 120000 }
            ]})
        );
    }

    #[tokio::test]
    async fn test_search_cars_without_params_returns_all() {
        let server = bridge_for(&spawn_api().await);

        let envelope = envelope(
            server
                .search_cars(Parameters(SearchCarsParams::default()))
                .await
                .unwrap(),
        );

        let body: Value = serde_json::from_str(envelope.first_text()).unwrap();
        assert_eq!(body["content"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_search_cars_rejection_includes_body() {
        let server = bridge_for(&spawn_api().await);

        let params = SearchCarsParams {
            year: Some((-1i64).into()),
            ..Default::default()
        };
        let envelope = envelope(server.search_cars(Parameters(params)).await.unwrap());

        assert!(envelope.is_error);
        let text = envelope.first_text();
        assert!(text.starts_with("Failed to fetch cars: 400 Bad Request. "), "{}", text);
        assert!(text.contains("Invalid query parameters"));
        assert!(text.contains("too_small"));
    }

    #[tokio::test]
    async fn test_unreachable_api_gives_actionable_message() {
        let server = bridge_for(&dead_url().await);

        let cars = envelope(
            server
                .search_cars(Parameters(SearchCarsParams::default()))
                .await
                .unwrap(),
        );
        assert!(cars.is_error);
        assert_eq!(
            cars.first_text(),
            "API server is not running. Start it with: motorpool serve"
        );

        let user = envelope(
            server
                .get_user_by_id(Parameters(GetUserByIdParams { id: 1i64.into() }))
                .await
                .unwrap(),
        );
        assert_eq!(user.first_text(), cars.first_text());
    }
}

// ============================================================================
// MCP protocol (in-memory transport)
// ============================================================================

mod protocol_tests {
    use super::*;

    /// Connect an MCP client to a bridge over an in-memory pipe
    async fn connect(base_url: &str) -> BridgeClient {
        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        let server = bridge_for(base_url);

        tokio::spawn(async move {
            if let Ok(running) = server.serve(server_io).await {
                let _ = running.waiting().await;
            }
        });

        let service = ().serve(client_io).await.expect("Client should initialize");
        BridgeClient::new(service)
    }

    struct ScriptedModel {
        calls: Vec<ToolCall>,
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            tools: &[ChatTool],
        ) -> motorpool::Result<ChatMessage> {
            assert_eq!(tools.len(), 2, "Both bridge tools should be offered");
            Ok(ChatMessage {
                role: "assistant".into(),
                content: None,
                tool_calls: Some(self.calls.clone()),
            })
        }
    }

    fn function_call(name: &str, arguments: Value) -> ToolCall {
        serde_json::from_value(json!({
            "id": format!("call_{}", name),
            "type": "function",
            "function": { "name": name, "arguments": arguments.to_string() }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_lists_exactly_two_tools() {
        let client = connect(&spawn_api().await).await;

        let tools = client.list_tools().await.expect("Should list tools");
        let mut names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["getUserById", "searchCars"]);

        let search = tools.iter().find(|t| t.name == "searchCars").unwrap();
        let properties = search.input_schema.get("properties").unwrap();
        assert!(properties.get("maxPrice").is_some());
        assert!(properties.get("brand").is_some());

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_call_tool_over_protocol() {
        let client = connect(&spawn_api().await).await;

        let mut arguments = serde_json::Map::new();
        arguments.insert("year".into(), json!(2020));
        let raw = client.call_tool("searchCars", arguments).await.unwrap();

        match ToolOutput::from_result(raw) {
            ToolOutput::Json(body) => assert_eq!(body["content"][0]["model"], "Mustang"),
            other => panic!("Expected JSON output, got {:?}", other),
        }

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_float_arguments_are_accepted() {
        let client = connect(&spawn_api().await).await;

        let mut arguments = serde_json::Map::new();
        arguments.insert("brand".into(), json!("Toyota"));
        arguments.insert("maxPrice".into(), json!(150000.0));
        let raw = client
            .call_tool("searchCars", arguments)
            .await
            .expect("Float maxPrice should be accepted");
        match ToolOutput::from_result(raw) {
            ToolOutput::Json(body) => {
                assert_eq!(body["content"].as_array().unwrap().len(), 1);
                assert_eq!(body["content"][0]["model"], "Corolla");
            }
            other => panic!("Expected JSON output, got {:?}", other),
        }

        let mut arguments = serde_json::Map::new();
        arguments.insert("id".into(), json!(2.0));
        let raw = client
            .call_tool("getUserById", arguments)
            .await
            .expect("Float id should be accepted");
        assert_eq!(
            ToolOutput::from_result(raw),
            ToolOutput::Json(json!({ "id": 2, "name": "Maria", "email": "maria@domain.com" }))
        );

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_fractional_arguments_reach_the_api() {
        let client = connect(&spawn_api().await).await;

        let mut arguments = serde_json::Map::new();
        arguments.insert("maxPrice".into(), json!(150000.5));
        let raw = client.call_tool("searchCars", arguments).await.unwrap();
        let envelope = ToolEnvelope::decode(&raw).unwrap();
        assert!(envelope.is_error);
        assert!(envelope.first_text().starts_with("Failed to fetch cars: 400 Bad Request. "));
        assert!(envelope.first_text().contains("Expected integer, received float"));

        let mut arguments = serde_json::Map::new();
        arguments.insert("id".into(), json!(1.5));
        let raw = client.call_tool("getUserById", arguments).await.unwrap();
        let envelope = ToolEnvelope::decode(&raw).unwrap();
        assert!(envelope.is_error);
        assert_eq!(envelope.first_text(), "Failed to fetch user: 404 Not Found");

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_agent_runs_model_tool_calls_against_bridge() {
        let client = connect(&spawn_api().await).await;
        let chat_tools = to_chat_tools(&client.list_tools().await.unwrap());

        let model = ScriptedModel {
            calls: vec![
                function_call("searchCars", json!({ "brand": "Toyota", "maxPrice": 150000 })),
                function_call("getUserById", json!({ "id": 2 })),
            ],
        };

        let report = run_prompt(&model, &client, &chat_tools, "cars and a user")
            .await
            .expect("Agent run should succeed");

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].name, "searchCars");
        assert_eq!(
            report.outcomes[1].output,
            ToolOutput::Json(json!({ "id": 2, "name": "Maria", "email": "maria@domain.com" }))
        );
        match &report.outcomes[0].output {
            ToolOutput::Json(body) => {
                assert_eq!(body["content"].as_array().unwrap().len(), 1);
                assert_eq!(body["content"][0]["model"], "Corolla");
            }
            other => panic!("Expected JSON output, got {:?}", other),
        }

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_agent_reports_tool_errors_as_text() {
        let client = connect(&dead_url().await).await;

        let model = ScriptedModel {
            calls: vec![function_call("getUserById", json!({ "id": 1 }))],
        };
        let chat_tools = to_chat_tools(&client.list_tools().await.unwrap());

        let report = run_prompt(&model, &client, &chat_tools, "who is user 1?")
            .await
            .unwrap();

        assert!(report.outcomes[0].is_error);
        assert_eq!(
            report.outcomes[0].output,
            ToolOutput::Text("API server is not running. Start it with: motorpool serve".into())
        );

        client.shutdown().await.unwrap();
    }
}
