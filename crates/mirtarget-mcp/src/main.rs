//! miRTargetLink MCP server entry point.

use std::sync::Arc;
use tokio::sync::Mutex;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use mirtarget_engine::{Mode, Query, QueryOrchestrator};
use mirtarget_mcp::config::load_config;
use mirtarget_mcp::output::render_result;
use mirtarget_mcp::protocol::ProtocolHandler;
use mirtarget_mcp::resources::ResourceRegistry;
use mirtarget_mcp::session::LookupSessionManager;
use mirtarget_mcp::tools::ToolRegistry;
use mirtarget_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "mirtarget-mcp",
    about = "MCP server for miRTargetLink 2.0: miRNA–target interaction lookups",
    version
)]
struct Cli {
    /// Path to a JSON engine config file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Browser executable to launch instead of the detected default.
    #[arg(long, global = true)]
    chrome: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server over stdio (default).
    Serve,

    /// Run lookups from the command line and print the tables.
    Query {
        /// One or more miRNA, gene, or pathway names.
        #[arg(required = true)]
        terms: Vec<String>,

        /// Evidence mode.
        #[arg(short, long, default_value = "validated")]
        mode: Mode,

        /// Print JSON instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   mirtarget-mcp completions bash > ~/.local/share/bash-completion/completions/mirtarget-mcp
    ///   mirtarget-mcp completions zsh > ~/.zfunc/_mirtarget-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = load_config(cli.config.as_deref(), cli.chrome.as_deref())?;
            tracing::info!("miRTargetLink MCP server, target site {}", config.base_url);
            let session = LookupSessionManager::new(QueryOrchestrator::with_chromium(config));
            let handler = ProtocolHandler::new(Arc::new(Mutex::new(session)));
            StdioTransport::new(handler).run().await?;
        }

        Commands::Query { terms, mode, json } => {
            let config = load_config(cli.config.as_deref(), cli.chrome.as_deref())?;
            let queries = terms
                .iter()
                .map(|t| Query::new(t, Some(mode)))
                .collect::<Result<Vec<_>, _>>()?;

            let orchestrator = QueryOrchestrator::with_chromium(config);
            let mut failures = 0usize;
            for (query, outcome) in queries.iter().zip(orchestrator.run_batch(&queries).await) {
                match outcome {
                    Ok(result) if json => println!("{}", serde_json::to_string_pretty(&result)?),
                    Ok(result) => println!("{}", render_result(&result)),
                    Err(e) => {
                        failures += 1;
                        eprintln!("{} failed [{}]: {e}", query.term(), e.kind());
                    }
                }
            }
            if failures > 0 {
                anyhow::bail!("{failures} of {} lookups failed", queries.len());
            }
        }

        Commands::Info => {
            let capabilities = mirtarget_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let resources = ResourceRegistry::list_resources();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
                "resources": resources.iter().map(|r| &r.uri).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "mirtarget-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}
