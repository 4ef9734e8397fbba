mod arm;
mod config;
mod credential;
mod error;
mod fabric;
mod lab;
mod models;
mod params;
mod resources;
mod server;

use std::sync::Arc;

use rmcp::transport::stdio;
use rmcp::ServiceExt;

use credential::{AzureCliTokenProvider, StaticTokenProvider, TokenProvider};
use server::FabricMcpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Write structured logs to stderr so stdout stays clean for MCP JSON-RPC.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_env("RUST_LOG")
                .add_directive("fabric_mcp_server=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting fabric-mcp-server v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::from_env()?;
    tracing::info!(endpoint = %config.arm.endpoint, api_version = %config.arm.fabric_api_version, "ARM configuration loaded");

    let credential: Arc<dyn TokenProvider> = match &config.access_token {
        Some(token) => {
            tracing::info!("using access token from AZURE_ACCESS_TOKEN");
            Arc::new(StaticTokenProvider(token.clone()))
        }
        None => Arc::new(AzureCliTokenProvider::new()?),
    };

    let server = FabricMcpServer::new(config, credential)?;

    let transport = stdio();

    tracing::info!("MCP server listening on stdio");

    let running = server.serve(transport).await?;
    running.waiting().await?;

    Ok(())
}
