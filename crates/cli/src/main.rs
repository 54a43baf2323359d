//! ingestctl - Command-line client for the Event Ingestion Service
//!
//! Sends events and polls job status over JSON-RPC.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tabled::{Table, Tabled};

const DEFAULT_SERVER_ADDRESS: &str = "http://localhost:50051";
const METHOD_INGEST_EVENT: &str = "events.ingest.v1";
const METHOD_GET_STATUS: &str = "jobs.status.v1";
const STATUS_DONE: &str = "done";

#[derive(Parser)]
#[command(name = "ingestctl")]
#[command(about = "Event Ingestion Service CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server URL (a bare host:port gets http://)
    #[arg(long, env = "SERVER_ADDRESS", default_value = DEFAULT_SERVER_ADDRESS)]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one event
    Ingest {
        #[arg(short, long)]
        event_id: String,

        /// Opaque payload (usually JSON)
        #[arg(short, long, default_value = "")]
        payload: String,

        /// Unix seconds (default: now)
        #[arg(short, long)]
        timestamp: Option<i64>,
    },

    /// Show a job's status
    Status {
        /// Job ID
        job_id: String,
    },

    /// Send one event, then poll until its job is done
    Watch {
        #[arg(short, long)]
        event_id: String,

        #[arg(short, long, default_value = "")]
        payload: String,

        #[arg(short, long)]
        timestamp: Option<i64>,

        /// Seconds between polls
        #[arg(long, default_value = "1")]
        interval_secs: u64,

        /// Give up after this many seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct IngestResult {
    accepted: bool,
    message: String,
    job_id: String,
}

#[derive(Deserialize)]
struct StatusResult {
    status: String,
}

fn server_url(server: &str) -> String {
    if server.contains("://") {
        server.to_string()
    } else {
        format!("http://{}", server)
    }
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to server")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

async fn ingest(url: &str, event_id: &str, payload: &str, timestamp: Option<i64>) -> Result<IngestResult> {
    let params = json!({
        "event_id": event_id,
        "payload": payload,
        "timestamp": timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp()),
    });

    let result = call_rpc(url, METHOD_INGEST_EVENT, params).await?;
    Ok(serde_json::from_value(result)?)
}

async fn fetch_status(url: &str, job_id: &str) -> Result<String> {
    let result = call_rpc(url, METHOD_GET_STATUS, json!({ "job_id": job_id })).await?;
    let status: StatusResult = serde_json::from_value(result)?;
    Ok(status.status)
}

fn print_ingest(result: IngestResult) {
    if result.accepted {
        println!("{}", "✓ Event accepted".green().bold());
    } else {
        println!("{}", format!("✗ Event rejected: {}", result.message).red().bold());
    }
    println!();
    println!("{}", Table::new(vec![result]));
}

fn colored_status(status: &str) -> colored::ColoredString {
    match status {
        "done" => status.green(),
        "processing" => status.yellow(),
        _ => status.red(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let url = server_url(&cli.server);

    match cli.command {
        Commands::Ingest {
            event_id,
            payload,
            timestamp,
        } => {
            let result = ingest(&url, &event_id, &payload, timestamp).await?;
            print_ingest(result);
        }

        Commands::Status { job_id } => {
            let status = fetch_status(&url, &job_id).await?;
            println!("{} {}", format!("Job {}:", job_id).cyan().bold(), colored_status(&status));
        }

        Commands::Watch {
            event_id,
            payload,
            timestamp,
            interval_secs,
            timeout_secs,
        } => {
            let result = ingest(&url, &event_id, &payload, timestamp).await?;
            if !result.accepted {
                anyhow::bail!("Event rejected: {}", result.message);
            }
            let job_id = result.job_id.clone();
            print_ingest(result);

            let poll = async {
                let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
                loop {
                    ticker.tick().await;
                    let status = fetch_status(&url, &job_id).await?;
                    println!("  status: {}", colored_status(&status));
                    if status == STATUS_DONE {
                        return Ok::<_, anyhow::Error>(());
                    }
                }
            };

            tokio::time::timeout(Duration::from_secs(timeout_secs), poll)
                .await
                .map_err(|_| {
                    anyhow::anyhow!("Job {} not done after {}s", job_id, timeout_secs)
                })??;

            println!("{}", format!("✓ Job {} done", job_id).green().bold());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_url() {
        assert_eq!(server_url("localhost:50051"), "http://localhost:50051");
        assert_eq!(server_url("https://ingest.local"), "https://ingest.local");
    }

    #[test]
    fn test_cli_parses_watch_defaults() {
        let cli = Cli::try_parse_from(["ingestctl", "watch", "--event-id", "evt-1"]).unwrap();
        match cli.command {
            Commands::Watch {
                event_id,
                payload,
                timestamp,
                interval_secs,
                timeout_secs,
            } => {
                assert_eq!(event_id, "evt-1");
                assert_eq!(payload, "");
                assert_eq!(timestamp, None);
                assert_eq!(interval_secs, 1);
                assert_eq!(timeout_secs, 30);
            }
            _ => panic!("expected watch"),
        }
    }
}
