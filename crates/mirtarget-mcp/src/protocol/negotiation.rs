//! Capability negotiation during `initialize`.

use crate::types::{ClientCapabilities, InitializeParams, InitializeResult, MCP_VERSION};

#[derive(Debug, Clone, Default)]
pub struct NegotiatedCapabilities {
    pub client: ClientCapabilities,
    pub client_name: Option<String>,
    pub initialized: bool,
}

impl NegotiatedCapabilities {
    pub fn negotiate(&mut self, params: InitializeParams) -> InitializeResult {
        if params.protocol_version != MCP_VERSION {
            tracing::warn!(
                "Client asked for protocol {}, answering with {MCP_VERSION}",
                params.protocol_version
            );
        }

        tracing::info!(
            "Client connected: {} v{}",
            params.client_info.name,
            params.client_info.version
        );
        self.client = params.capabilities;
        self.client_name = Some(params.client_info.name);
        self.initialized = false;

        InitializeResult::default_result()
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
        tracing::info!("MCP handshake complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Implementation;

    #[test]
    fn test_negotiate_answers_with_server_version() {
        let mut caps = NegotiatedCapabilities::default();
        let result = caps.negotiate(InitializeParams {
            protocol_version: "2025-03-26".to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "claude-desktop".to_string(),
                version: "0.9".to_string(),
            },
        });
        assert_eq!(result.protocol_version, MCP_VERSION);
        assert_eq!(caps.client_name.as_deref(), Some("claude-desktop"));
        assert!(!caps.initialized);

        caps.mark_initialized();
        assert!(caps.initialized);
    }
}
