//! Account and graph discovery: prints the graphs reachable with a token
//! so the right id can be placed in `GRAPH_ID`.

use clap::Parser;
use serde::Deserialize;

use reflect_mcp::client::{ApiError, DEFAULT_BASE_URL, ReflectClient};

#[derive(Debug, Parser)]
#[command(name = "get-graph-id", version, about = "List Reflect graphs for a token")]
struct Args {
    #[arg(long, env = "REFLECT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    #[arg(long, env = "REFLECT_TOKEN")]
    token: String,
    /// Checked against the listed graphs when set.
    #[arg(long, env = "GRAPH_ID")]
    graph_id: Option<String>,
    #[arg(long, env = "REFLECT_TIMEOUT_MS", default_value_t = 15000)]
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    name: Option<String>,
    uid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphInfo {
    id: String,
    name: Option<String>,
}

async fn run(client: &ReflectClient, configured_graph: Option<&str>) -> Result<(), ApiError> {
    let user: UserInfo = serde_json::from_value(client.get_json("/users/me").await?)
        .unwrap_or(UserInfo {
            email: None,
            name: None,
            uid: None,
        });
    println!("User:");
    println!("  email: {}", user.email.as_deref().unwrap_or("(unknown)"));
    println!("  name:  {}", user.name.as_deref().unwrap_or("(not set)"));
    println!("  uid:   {}", user.uid.as_deref().unwrap_or("(unknown)"));
    println!();

    let graphs: Vec<GraphInfo> =
        serde_json::from_value(client.get_json("/graphs").await?).unwrap_or_default();
    if graphs.is_empty() {
        println!("No graphs found on this account.");
        return Ok(());
    }

    println!("Available graphs:");
    for (index, graph) in graphs.iter().enumerate() {
        println!(
            "  {}. {} (id: {})",
            index + 1,
            graph.name.as_deref().unwrap_or("Unnamed graph"),
            graph.id
        );
    }
    println!();
    if graphs.len() == 1 {
        println!("Set GRAPH_ID={} in the server environment.", graphs[0].id);
    } else {
        println!("Pick one graph and set its id as GRAPH_ID in the server environment.");
    }

    match configured_graph {
        Some(configured) if graphs.iter().any(|graph| graph.id == configured) => {
            println!("The currently configured GRAPH_ID is valid.");
        }
        Some(_) => {
            println!("Warning: the currently configured GRAPH_ID matches none of these graphs.");
        }
        None => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();
    let client = match ReflectClient::new(args.base_url, args.token, args.timeout_ms) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("error: {:#}", err);
            return std::process::ExitCode::FAILURE;
        }
    };

    println!("Fetching Reflect account info...");
    println!();
    match run(&client, args.graph_id.as_deref()).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            match err {
                ApiError::Status { status: 401, .. } => {
                    eprintln!("The token was rejected. Generate a new one at https://reflect.app/developer and update REFLECT_TOKEN.");
                }
                ApiError::Status { .. } => {
                    eprintln!("The service answered with an error; check the token's permissions.");
                }
                ApiError::Transport(_) => {
                    eprintln!("Could not reach the Reflect API; check the network connection.");
                }
            }
            std::process::ExitCode::FAILURE
        }
    }
}
