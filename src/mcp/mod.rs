//! MCP bridge: exposes the HTTP API as tools

pub mod server;
pub mod upstream;

pub use server::{GetUserByIdParams, MotorpoolServer, SearchCarsParams};
pub use upstream::ApiClient;
