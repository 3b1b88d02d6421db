//! MCP resource implementations.

pub mod registry;

pub use registry::ResourceRegistry;
