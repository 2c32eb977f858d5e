//! LSA CLI - Operator tool for the payment status daemon
//!
//! Talks to the daemon's admin JSON-RPC server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "lsa")]
#[command(about = "LSA Spa Management payment status CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "LSA_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Payment status sweep operations
    Sweep {
        #[command(subcommand)]
        action: SweepAction,
    },

    /// Show one spa's status and payment due date
    Spa {
        /// Spa ID
        spa_id: i64,
    },

    /// List notifications sent to a spa
    Notifications {
        /// Spa ID
        spa_id: i64,

        /// Maximum number of notifications
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum SweepAction {
    /// Run a sweep now
    Run,
    /// Show scheduler state and the last sweep report
    Status,
    /// List spas the next sweep would demote (no changes made)
    Preview,
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
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct SweepReport {
    run_id: String,
    today: String,
    cutoff: String,
    candidates: usize,
    demoted: Vec<i64>,
    skipped: Vec<i64>,
    notifications_created: usize,
    status_failures: usize,
    notification_failures: usize,
}

#[derive(Deserialize, Tabled)]
struct OverdueSpa {
    id: i64,
    name: String,
    next_payment_date: String,
    days_overdue: i64,
}

#[derive(Deserialize)]
struct SweepPreview {
    today: String,
    cutoff: String,
    candidates: Vec<OverdueSpa>,
}

#[derive(Deserialize)]
struct Notification {
    id: i64,
    title: String,
    message: String,
    #[serde(rename = "type")]
    kind: String,
    is_read: bool,
    created_at: i64,
}

#[derive(Tabled)]
struct NotificationRow {
    id: i64,
    #[tabled(rename = "type")]
    kind: String,
    title: String,
    read: bool,
    created_at: i64,
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
        .context("Failed to connect to daemon")?
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

fn print_report(report: &SweepReport) {
    println!("  {} {}", "Run:".bold(), report.run_id);
    println!("  {} {} (due before {})", "Today:".bold(), report.today, report.cutoff);
    println!("  {} {}", "Candidates:".bold(), report.candidates);
    println!("  {} {:?}", "Demoted:".bold(), report.demoted);
    if !report.skipped.is_empty() {
        println!("  {} {:?}", "Skipped:".bold(), report.skipped);
    }
    println!(
        "  {} {}",
        "Notifications:".bold(),
        report.notifications_created
    );
    if report.status_failures > 0 || report.notification_failures > 0 {
        println!(
            "  {} {} status, {} notification",
            "Failures:".bold().red(),
            report.status_failures,
            report.notification_failures
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep {
            action: SweepAction::Run,
        } => {
            println!("{}", "Running payment sweep...".cyan().bold());
            println!();

            let result = call_rpc(&cli.rpc_url, "sweep.run.v1", json!({})).await?;
            let report: SweepReport = serde_json::from_value(result)?;

            if report.candidates == 0 {
                println!("{}", "✓ No overdue spas".green().bold());
            } else {
                println!(
                    "{}",
                    format!("✓ {} spa(s) demoted", report.demoted.len())
                        .green()
                        .bold()
                );
            }
            println!();
            print_report(&report);
        }

        Commands::Sweep {
            action: SweepAction::Status,
        } => {
            println!("{}", "Payment Sweep Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "sweep.status.v1", json!({})).await {
                Ok(status) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    let state = if status["running"].as_bool().unwrap_or(false) {
                        "RUNNING".yellow()
                    } else {
                        "IDLE".green()
                    };
                    println!("  {} {}", "Sweep:".bold(), state);
                    let interval_hours = status["interval_secs"].as_u64().unwrap_or(0) / 3600;
                    println!("  {} every {}h", "Schedule:".bold(), interval_hours);
                    println!(
                        "  {} {} days",
                        "Grace period:".bold(),
                        status["grace_period_days"]
                    );
                    println!();

                    if status["last_report"].is_null() {
                        println!("  ○ No sweep completed yet");
                    } else {
                        let report: SweepReport =
                            serde_json::from_value(status["last_report"].clone())?;
                        println!("{}", "Last sweep".bold());
                        print_report(&report);
                    }
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Sweep {
            action: SweepAction::Preview,
        } => {
            let result = call_rpc(&cli.rpc_url, "sweep.preview.v1", json!({})).await?;
            let preview: SweepPreview = serde_json::from_value(result)?;

            println!(
                "{}",
                format!(
                    "Overdue as of {} (due before {})",
                    preview.today, preview.cutoff
                )
                .cyan()
                .bold()
            );
            println!();

            if preview.candidates.is_empty() {
                println!("{}", "No spas would be demoted".green());
            } else {
                println!("{}", Table::new(preview.candidates));
            }
        }

        Commands::Spa { spa_id } => {
            let spa = call_rpc(&cli.rpc_url, "spa.get.v1", json!({ "spa_id": spa_id })).await?;

            println!("{}", format!("Spa {}", spa_id).cyan().bold());
            println!();
            println!("  {} {}", "Name:".bold(), spa["name"].as_str().unwrap_or("-"));

            let status = spa["status"].as_str().unwrap_or("-");
            let colored_status = match status {
                "verified" => status.green(),
                "unverified" | "pending" => status.yellow(),
                _ => status.red(),
            };
            println!("  {} {}", "Status:".bold(), colored_status);

            match spa["next_payment_date"].as_str() {
                Some(due) => {
                    println!("  {} {}", "Next payment:".bold(), due);
                    if let Some(days) = spa["days_overdue"].as_i64().filter(|d| *d > 0) {
                        println!("  {} {} days", "Overdue:".bold(), days.to_string().red());
                    }
                }
                None => println!("  {} not set", "Next payment:".bold()),
            }
        }

        Commands::Notifications { spa_id, limit } => {
            let params = json!({ "spa_id": spa_id, "limit": limit });
            let result = call_rpc(&cli.rpc_url, "notifications.list.v1", params).await?;
            let notifications: Vec<Notification> =
                serde_json::from_value(result["notifications"].clone())?;

            if notifications.is_empty() {
                println!("{}", format!("No notifications for spa {}", spa_id).yellow());
                return Ok(());
            }

            println!(
                "{}",
                format!("Notifications for spa {}:", spa_id).cyan().bold()
            );
            println!();

            for n in &notifications {
                println!("  {} {}", format!("#{}", n.id).bold(), n.message);
            }
            println!();

            let rows: Vec<NotificationRow> = notifications
                .into_iter()
                .map(|n| NotificationRow {
                    id: n.id,
                    kind: n.kind,
                    title: n.title,
                    read: n.is_read,
                    created_at: n.created_at,
                })
                .collect();
            println!("{}", Table::new(rows));
        }
    }

    Ok(())
}
