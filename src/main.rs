//! boardwiki - Azure Boards and Confluence MCP server.

use boardwiki::config::Config;
use boardwiki::mcp::{serve_http, McpServer};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "boardwiki")]
#[command(about = "Azure Boards and Confluence tools for AI assistants over MCP")]
#[command(version)]
struct Cli {
    /// Path to config file (defaults to environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run MCP server over stdio
    Mcp,

    /// Run MCP server over HTTP (POST /mcp)
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value = "3005")]
        port: u16,
    },

    /// Validate configuration
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries JSON-RPC frames; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boardwiki=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Mcp => cmd_mcp(config).await?,
        Commands::Serve { host, port } => cmd_serve(config, &host, port).await?,
        Commands::Validate => cmd_validate(config),
    }

    Ok(())
}

async fn cmd_mcp(config: Config) -> anyhow::Result<()> {
    let server = McpServer::from_config(&config)?;
    server.run().await?;
    Ok(())
}

async fn cmd_serve(config: Config, host: &str, port: u16) -> anyhow::Result<()> {
    let server = Arc::new(McpServer::from_config(&config)?);
    serve_http(server, &format!("{}:{}", host, port)).await?;
    Ok(())
}

fn cmd_validate(config: Config) {
    println!("Configuration OK\n");
    println!("  Azure Boards: {} (project {})", config.boards.org_url, config.boards.project);
    println!("  Confluence:   {} (user {})", config.wiki.base_url, config.wiki.user);
}
