use anyhow::Result;
use mbti_flow::{
    config::{Config, Transport},
    http::start_http_server,
    init_tracing,
    server::MbtiServer,
};
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // `--http` on the command line wins over MBTI_TRANSPORT
    if std::env::args().skip(1).any(|a| a == "--http") {
        config.runtime.transport = Transport::Http;
    }

    init_tracing(&config.runtime);

    let transport = config.runtime.transport;
    let server = MbtiServer::new(config).map_err(|e| {
        eprintln!("Failed to create server: {}", e);
        e
    })?;

    info!(
        "Starting mbti-flow MCP server (narrative provider: {}, available: {})",
        server.augmenter.generator_name(),
        server.augmenter.is_available()
    );

    match transport {
        Transport::Http => start_http_server(server).await?,
        Transport::Stdio => {
            let service = server.serve(stdio()).await.map_err(|e| {
                eprintln!("Failed to start MCP service: {}", e);
                e
            })?;
            info!("MCP server ready on stdio");
            service.waiting().await?;
        }
    }

    Ok(())
}
