//! tone-analyzer - sentiment + sarcasm analysis as a web form and MCP tool.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tone_analyzer::config::{ModelConfig, ServeArgs};
use tone_analyzer::{server, Analyzer};

#[derive(Parser)]
#[command(name = "tone-analyzer", version, about = "Sentiment + sarcasm analyzer")]
struct Cli {
    #[command(flatten)]
    models: ModelConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web form, JSON API and MCP endpoint over HTTP
    Serve(ServeArgs),
    /// Serve the MCP tool over stdio
    Mcp,
    /// Analyze one text and print the JSON result
    Analyze {
        /// Text to analyze
        text: String,
    },
}

/// When `mcp_mode` is true, all tracing output goes to stderr with ANSI disabled
/// so it cannot corrupt the JSON-RPC stream on stdout.
fn init_tracing(mcp_mode: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tone_analyzer=info,tower_http=info".into());

    if mcp_mode {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn load_analyzer(config: ModelConfig) -> Result<Arc<Analyzer>> {
    let analyzer = tokio::task::spawn_blocking(move || Analyzer::load(&config)).await??;
    Ok(Arc::new(analyzer))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Mcp));

    let analyzer = load_analyzer(cli.models).await?;

    match cli.command {
        Commands::Serve(args) => server::run_server(analyzer, &args.host, args.port).await?,
        Commands::Mcp => server::mcp::run_stdio(analyzer).await?,
        Commands::Analyze { text } => {
            let json = tokio::task::spawn_blocking(move || analyzer.analyze_json(&text)).await??;
            println!("{json}");
        }
    }

    Ok(())
}
