//! actlog-cli — terminal frontend for the endpoint activity log
//!
//! Talks to the actlog HTTP API and prints one agent's interleaved actions and
//! responses, newest first.
//!
//! # Subcommands
//! - `log <agent-id> [-p <page>] [-n <page-size>] [--json]` — one page of the log
//! - `status`                                             — show server health

use actlog_core::models::{ActivityLogEntry, ActivityLogPage, EntryKind};
use clap::{Parser, Subcommand};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8767";
const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 10;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "actlog-cli",
    version,
    about = "Browse an endpoint agent's activity log"
)]
struct Cli {
    /// actlog HTTP server URL (overrides ACTLOG_HTTP_URL env var)
    #[arg(long, env = "ACTLOG_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show one page of an agent's activity log
    Log {
        /// Elastic agent id
        agent_id: String,

        /// Page number (1-based)
        #[arg(short = 'p', long, default_value_t = DEFAULT_PAGE)]
        page: u32,

        /// Page size; actions and responses each get half
        #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,

        /// Print the raw page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show actlog server status
    Status,
}

// ============================================================================
// Text Output
// ============================================================================

/// One line per entry: `timestamp  kind  id  summary`.
pub fn format_entry(entry: &ActivityLogEntry) -> String {
    let timestamp = entry
        .timestamp()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".repeat(19));

    format!(
        "{}  {:<8}  {}  {}",
        timestamp,
        entry.kind().as_str(),
        entry.item().id,
        summarize(entry)
    )
}

fn summarize(entry: &ActivityLogEntry) -> String {
    match entry.kind() {
        EntryKind::Action => match entry.as_action() {
            Some(action) => {
                let command = action.command().unwrap_or("unknown command");
                match action.comment() {
                    Some(comment) if !comment.is_empty() => {
                        format!("{} \"{}\"", command, comment)
                    }
                    _ => command.to_string(),
                }
            }
            None => "unreadable action".to_string(),
        },
        EntryKind::Response => match entry.as_response() {
            Some(result) if result.is_error() => {
                format!("failed: {}", result.error.unwrap_or_default())
            }
            Some(result) => match result.command() {
                Some(command) => format!("completed {}", command),
                None => "completed".to_string(),
            },
            None => "unreadable response".to_string(),
        },
    }
}

pub fn format_page(page: &ActivityLogPage) -> String {
    let mut out = format!("Page {} (page size {})\n", page.page, page.page_size);
    for entry in &page.data {
        out.push_str(&format_entry(entry));
        out.push('\n');
    }
    out
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

/// Activity log URL with `agent_id` encoded as a single path segment.
fn log_url(server: &str, agent_id: &str, page: u32, page_size: u32) -> anyhow::Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(server)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("server URL cannot be a base: {}", server))?
        .pop_if_empty()
        .extend(["api", "endpoint", "action_log", agent_id]);
    url.query_pairs_mut()
        .append_pair("page", &page.to_string())
        .append_pair("page_size", &page_size.to_string());
    Ok(url)
}

/// Fetch and print one page of the activity log.
fn do_log(
    server: &str,
    agent_id: &str,
    page: u32,
    page_size: u32,
    json_output: bool,
) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let url = log_url(server, agent_id, page, page_size)?;
    let resp = client.get(url.clone()).send();

    let resp = match resp {
        Ok(r) => r,
        Err(e) => {
            eprintln!("actlog-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("actlog-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    let log_page: ActivityLogPage = match resp.json() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("actlog-cli: failed to parse activity log: {}", e);
            std::process::exit(1);
        }
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&log_page)?);
    } else if log_page.data.is_empty() {
        eprintln!("No activity found for agent {}", agent_id);
    } else {
        print!("{}", format_page(&log_page));
    }

    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("actlog server:   {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:         {}", body["version"].as_str().unwrap_or("?"));
            println!("Search cluster:  {}", body["cluster_name"].as_str().unwrap_or("?"));
            println!("Cluster version: {}", body["cluster_version"].as_str().unwrap_or("?"));
            println!("Socket:          {}", body["socket"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("actlog-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("actlog-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Log {
            agent_id,
            page,
            page_size,
            json,
        } => do_log(&server, &agent_id, page, page_size, json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("actlog-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
