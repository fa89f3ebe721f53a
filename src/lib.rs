//! Motorpool - in-memory users/cars HTTP API with an MCP bridge and a tool-calling client

pub mod config;
pub mod error;
pub mod types;

pub mod store;
pub mod api;
pub mod mcp;
pub mod agent;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
