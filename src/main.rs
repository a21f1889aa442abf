use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use rmcp::{ServiceExt, transport::stdio};

use reflect_mcp::client::{DEFAULT_BASE_URL, GraphClient, ReflectClient};
use reflect_mcp::dates::{self, DailyNoteFormatter};
use reflect_mcp::redact::mask_identifier;
use reflect_mcp::server::ReflectServer;

#[derive(Debug, Parser)]
#[command(name = "reflect-mcp", version, about = "Reflect MCP server")]
struct Args {
    #[arg(long, env = "REFLECT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    #[arg(long, env = "REFLECT_TOKEN")]
    token: String,
    #[arg(long, env = "GRAPH_ID")]
    graph_id: String,
    /// IANA zone for daily-note dates. Falls back to the system zone.
    #[arg(long, env = "REFLECT_TIMEZONE")]
    timezone: Option<String>,
    #[arg(long, env = "REFLECT_LOCALE", default_value = dates::DEFAULT_LOCALE)]
    locale: String,
    #[arg(long, env = "REFLECT_TIMEOUT_MS", default_value_t = 15000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
    let args = Args::parse();
    info!(
        "starting reflect-mcp: base_url={}, graph_id={}, timeout_ms={}",
        args.base_url,
        mask_identifier(&args.graph_id),
        args.timeout_ms
    );

    let resolution = dates::resolve_time_zone(args.timezone.as_deref(), &args.locale);
    if let Some(err) = &resolution.error {
        warn!(
            "falling back to time zone {}: {}",
            resolution.effective_time_zone, err
        );
    }
    info!("daily notes use time zone {}", resolution.effective_time_zone);
    let dates = DailyNoteFormatter::for_resolution(&resolution);

    let api = ReflectClient::new(args.base_url, args.token, args.timeout_ms)?;
    let client = Arc::new(GraphClient::new(api, args.graph_id));

    let server = ReflectServer::new(client, dates);
    let running = server.serve(stdio()).await?;
    running.waiting().await?;

    Ok(())
}
