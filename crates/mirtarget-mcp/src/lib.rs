//! miRTargetLink MCP server: exposes the lookup engine to LLM agents over stdio.

pub mod config;
pub mod output;
pub mod protocol;
pub mod resources;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{load_config, resolve_config_path};
pub use protocol::ProtocolHandler;
pub use session::LookupSessionManager;
pub use transport::StdioTransport;
