//! Motorpool - in-memory users/cars HTTP API with an MCP bridge and a tool-calling client

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motorpool::agent::{self, BridgeClient, OpenAiCompatible};
use motorpool::api::{self, AppState};
use motorpool::config::Config;
use motorpool::mcp::{ApiClient, MotorpoolServer};
use motorpool::store::Dataset;

#[derive(Parser)]
#[command(name = "motorpool")]
#[command(about = "In-memory users/cars HTTP API with an MCP bridge and a tool-calling client")]
#[command(version)]
struct Cli {
    /// Path to a config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Where to write it (default: user config directory)
        path: Option<PathBuf>,
    },

    /// Start the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start the MCP bridge (stdio mode)
    Mcp,

    /// Start the MCP bridge (streamable HTTP mode)
    McpHttp {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a chat model a question it can answer with the bridge's tools
    Ask {
        /// Prompt to send
        prompt: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging. stdout belongs to the MCP stdio transport.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("motorpool={},tower_http=debug", log_level).into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment
    let _ = dotenvy::dotenv();

    // Load config
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Init { path } => {
            let path = path
                .or_else(Config::config_path)
                .ok_or_else(|| anyhow::anyhow!("Could not determine a config directory"))?;

            config.save(&path)?;
            println!("✓ Config written to {}", path.display());
        }

        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.api.port = port;
            }

            let state = AppState::new(Dataset::seed());
            tracing::info!(
                "Loaded {} users and {} cars",
                state.dataset.users().len(),
                state.dataset.cars().len()
            );

            println!("Motorpool API running at http://localhost:{}", config.api.port);
            println!("  Users:    http://localhost:{}/users/{{id}}", config.api.port);
            println!("  Cars:     http://localhost:{}/cars", config.api.port);
            println!("  API Docs: http://localhost:{}/api/docs", config.api.port);

            api::serve(state, &config.api_addr()).await?;
        }

        Commands::Mcp => {
            let server = build_server(&config)?;
            motorpool::mcp::server::serve_stdio(server).await?;
        }

        Commands::McpHttp { port } => {
            let port = port.unwrap_or(config.bridge.mcp_port);
            let server = build_server(&config)?;

            println!("MCP server running at http://localhost:{}/mcp", port);

            motorpool::mcp::server::serve_http(server, port).await?;
        }

        Commands::Ask { prompt } => {
            let prompt = prompt.unwrap_or_else(|| agent::DEFAULT_PROMPT.to_string());
            let model = OpenAiCompatible::new(&config.llm)?;

            let exe = std::env::current_exe()?;
            let mut args = Vec::new();
            if let Some(path) = &cli.config {
                args.push("--config".to_string());
                args.push(path.display().to_string());
            }
            args.push("mcp".to_string());

            let bridge = BridgeClient::spawn(&exe, &args).await?;
            let tools = bridge.list_tools().await?;
            tracing::info!("Bridge offers {} tools", tools.len());

            let chat_tools = agent::to_chat_tools(&tools);
            let outcome = agent::run_prompt(&model, &bridge, &chat_tools, &prompt).await;
            bridge.shutdown().await?;
            let report = outcome?;

            println!("Prompt: {}", report.prompt);
            if let Some(reply) = &report.reply {
                println!("\nModel reply: {}", reply);
            }
            for outcome in &report.outcomes {
                println!("\nTool {} ({})", outcome.name, outcome.arguments);
                if outcome.is_error {
                    println!("  failed:");
                }
                println!("{}", outcome.output);
            }
        }
    }

    Ok(())
}

fn build_server(config: &Config) -> anyhow::Result<MotorpoolServer> {
    let api = ApiClient::new(&config.bridge.api_url, config.bridge.request_timeout())?;
    Ok(MotorpoolServer::new(Arc::new(api)))
}
