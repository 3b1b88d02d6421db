//! Stdio transport: requests on stdin, responses on stdout, logs on stderr.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::protocol::ProtocolHandler;
use crate::types::{McpError, McpResult};

use super::framing;

pub struct StdioTransport {
    handler: ProtocolHandler,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self { handler }
    }

    /// Serve until stdin closes. Messages are handled one at a time.
    pub async fn run(&self) -> McpResult<()> {
        let mut reader = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut line = String::new();

        tracing::info!("Stdio transport started");

        loop {
            line.clear();
            if reader.read_line(&mut line).await.map_err(McpError::Io)? == 0 {
                tracing::info!("EOF on stdin, shutting down");
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let response = match framing::parse_message(&line) {
                Ok(msg) => self.handler.handle_message(msg).await,
                Err(e) => {
                    tracing::warn!("Parse error: {e}");
                    Some(framing::parse_error_response(&e)?)
                }
            };

            if let Some(response) = response {
                let framed = framing::frame_message(&response)?;
                stdout.write_all(framed.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        self.handler.session().lock().await.end_session();
        Ok(())
    }
}
