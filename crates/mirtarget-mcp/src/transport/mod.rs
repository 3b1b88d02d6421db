//! Newline-delimited JSON-RPC over stdio.

pub mod framing;
pub mod stdio;

pub use stdio::StdioTransport;
