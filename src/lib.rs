pub mod config;
pub mod error;
pub mod export;
pub mod http;
pub mod narrative;
pub mod pipeline;
pub mod questions;
pub mod report;
pub mod responses;
pub mod schemas;
pub mod scoring;
pub mod server;
pub mod testdata;
pub mod tools;

use config::RuntimeConfig;

/// Install the stderr subscriber unless `MCP_NO_LOG` is set.
///
/// stdout carries the MCP stdio transport, so logs never go there.
pub fn init_tracing(runtime: &RuntimeConfig) {
    if runtime.mcp_no_log {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_new(&runtime.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mbti_flow=info,rmcp=info"));
    // try_init: a second call (tests, CLI reuse) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
