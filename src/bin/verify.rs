//! Offline configuration check: tool table sanity, required environment,
//! and time-zone resolution. Exits non-zero when anything fails.

use clap::Parser;
use serde_json::Value;

use reflect_mcp::dates;
use reflect_mcp::tools::{TOOL_SPECS, parse_schema};

#[derive(Debug, Parser)]
#[command(name = "verify-setup", version, about = "Check Reflect MCP configuration")]
struct Args {
    #[arg(long, env = "REFLECT_TOKEN")]
    token: Option<String>,
    #[arg(long, env = "GRAPH_ID")]
    graph_id: Option<String>,
    #[arg(long, env = "REFLECT_TIMEZONE")]
    timezone: Option<String>,
    #[arg(long, env = "REFLECT_LOCALE", default_value = dates::DEFAULT_LOCALE)]
    locale: String,
}

fn check_tool_table() -> bool {
    println!("Tools:");
    let mut ok = true;
    for spec in TOOL_SPECS {
        let schema = parse_schema(spec.schema);
        if schema.get("type") != Some(&Value::String("object".to_string())) {
            println!("  FAIL {} - schema is not an object schema", spec.name);
            ok = false;
            continue;
        }
        let properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let required: Vec<String> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let undeclared: Vec<&String> = required
            .iter()
            .filter(|field| !properties.contains_key(*field))
            .collect();
        if undeclared.is_empty() {
            let summary = if required.is_empty() {
                "no required fields".to_string()
            } else {
                format!("requires {}", required.join(", "))
            };
            println!("  ok   {} ({})", spec.name, summary);
        } else {
            println!(
                "  FAIL {} - required fields not declared: {:?}",
                spec.name, undeclared
            );
            ok = false;
        }
    }
    ok
}

fn check_config(args: &Args) -> bool {
    println!("Configuration:");
    let mut ok = true;
    if args.token.as_deref().is_some_and(|token| !token.is_empty()) {
        println!("  ok   REFLECT_TOKEN is set");
    } else {
        println!("  FAIL REFLECT_TOKEN is not set");
        ok = false;
    }
    if args.graph_id.as_deref().is_some_and(|id| !id.is_empty()) {
        println!("  ok   GRAPH_ID is set");
    } else {
        println!("  FAIL GRAPH_ID is not set (run get-graph-id to find it)");
        ok = false;
    }

    let resolution = dates::resolve_time_zone(args.timezone.as_deref(), &args.locale);
    match (&resolution.requested_time_zone, resolution.is_fallback) {
        (None, _) => println!(
            "  info REFLECT_TIMEZONE not set; the system zone {} will be used",
            resolution.effective_time_zone
        ),
        (Some(requested), true) => {
            println!(
                "  FAIL REFLECT_TIMEZONE `{}` is invalid; the server would fall back to {}",
                requested, resolution.effective_time_zone
            );
            ok = false;
        }
        (Some(requested), false) => println!("  ok   REFLECT_TIMEZONE is valid ({})", requested),
    }
    ok
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();
    println!("Checking Reflect MCP configuration...");
    println!();
    let tools_ok = check_tool_table();
    println!();
    let config_ok = check_config(&args);
    println!();
    if tools_ok && config_ok {
        println!("Everything is configured correctly.");
        std::process::ExitCode::SUCCESS
    } else {
        println!("Verification found problems; fix the items marked FAIL above.");
        std::process::ExitCode::FAILURE
    }
}
