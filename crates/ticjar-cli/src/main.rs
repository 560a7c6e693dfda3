use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ticjar_core::{MonthKey, RangeReport, TicJar, UserHistory};
use ticjar_gateway::GatewayServer;

mod config;

use config::TicJarConfig;

#[derive(Parser)]
#[command(name = "ticjar")]
#[command(version)]
#[command(about = "ticjar, a personal accountability tracker")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory and default config
    Init,

    /// Show current configuration
    Config,

    /// Start the web server
    Start,

    /// Record a tic for a user
    Tic {
        /// Who the tic is for
        user: String,
    },

    /// Show a user's all-time history
    History {
        /// Who to look up
        user: String,
    },

    /// Print a month-range report
    Report {
        /// First month of the range (YYYY-MM), defaults to the current month
        #[arg(long)]
        start: Option<String>,

        /// Last month of the range (YYYY-MM), defaults to the start month
        #[arg(long)]
        end: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Init => cmd_init().await,
        Commands::Config => cmd_config(&cli.config),
        Commands::Start => cmd_start(&cli.config).await,
        Commands::Tic { user } => cmd_tic(&cli.config, &user).await,
        Commands::History { user } => cmd_history(&cli.config, &user).await,
        Commands::Report { start, end } => cmd_report(&cli.config, start, end).await,
    }
}

async fn open_jar(cfg: &TicJarConfig) -> Result<TicJar> {
    TicJar::open(cfg.data_file(), cfg.ledger.cost_per_tic).await
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        let default_config = include_str!("../../../config/default.toml");
        tokio::fs::write(&config_path, default_config).await?;
        info!("Created default config at {}", config_path.display());
    }

    println!("ticjar initialized at {}", config_dir.display());
    println!(
        "Edit {} to change the bind address or cost per tic.",
        config_path.display()
    );
    Ok(())
}

fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = TicJarConfig::load(config_path)?;
    println!("{}", toml::to_string_pretty(&cfg)?);
    Ok(())
}

async fn cmd_start(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = TicJarConfig::load(config_path)?;

    let jar = open_jar(&cfg).await?;
    info!(
        "Ledger at {} (cost per tic: {:.2})",
        jar.path().display(),
        jar.cost_per_tic()
    );

    let bind = cfg
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", cfg.server.bind))?;

    GatewayServer::new(bind, Arc::new(jar)).run().await
}

async fn cmd_tic(config_path: &Option<PathBuf>, user: &str) -> Result<()> {
    let cfg = TicJarConfig::load(config_path)?;
    let jar = open_jar(&cfg).await?;

    let receipt = jar.add_tic(user).await?;
    println!("{}", receipt.message);
    Ok(())
}

async fn cmd_history(config_path: &Option<PathBuf>, user: &str) -> Result<()> {
    let cfg = TicJarConfig::load(config_path)?;
    let jar = open_jar(&cfg).await?;

    print!("{}", render_history(&jar.user_history(user).await));
    Ok(())
}

async fn cmd_report(
    config_path: &Option<PathBuf>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let cfg = TicJarConfig::load(config_path)?;
    let jar = open_jar(&cfg).await?;

    let start = start.unwrap_or_else(|| MonthKey::current().to_string());
    let end = end.unwrap_or_else(|| start.clone());
    let report = jar.range_report(&start, &end).await?;

    print!("{}", render_report(&report));
    Ok(())
}

fn render_report(report: &RangeReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Report: {}\n", report.month));

    if report.users.is_empty() {
        out.push_str("No tics recorded for this period.\n");
        return out;
    }

    let mut users: Vec<_> = report.users.iter().collect();
    users.sort_by(|a, b| b.count.cmp(&a.count));
    for entry in users {
        out.push_str(&format!(
            "  {:<16} {:>4} tics  ${:.2}\n",
            entry.user, entry.count, entry.amount_owed
        ));
    }
    out.push_str(&format!(
        "Total: {} tics, ${:.2} owed\n",
        report.total_tics, report.total_owed
    ));
    out
}

fn render_history(history: &UserHistory) -> String {
    let mut out = String::new();
    out.push_str(&format!("All-time history for {}\n", history.user));

    if history.monthly_breakdown.is_empty() {
        out.push_str("Clean record, no tics on file.\n");
        return out;
    }

    for entry in &history.monthly_breakdown {
        out.push_str(&format!(
            "  {}  {:>4} tics  ${:.2}\n",
            entry.month, entry.count, entry.amount_owed
        ));
    }
    out.push_str(&format!(
        "Total: {} tics, ${:.2} owed\n",
        history.total_tics, history.total_owed
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticjar_core::{MonthlyEntry, UserTotals};

    #[test]
    fn test_render_report_sorts_by_count() {
        let report = RangeReport {
            month: "2024-01".to_string(),
            cost_per_tic: 0.5,
            users: vec![
                UserTotals {
                    user: "alice".to_string(),
                    count: 1,
                    amount_owed: 0.5,
                },
                UserTotals {
                    user: "bob".to_string(),
                    count: 4,
                    amount_owed: 2.0,
                },
            ],
            total_tics: 5,
            total_owed: 2.5,
        };

        let rendered = render_report(&report);
        let bob = rendered.find("bob").unwrap();
        let alice = rendered.find("alice").unwrap();
        assert!(bob < alice);
        assert!(rendered.contains("Total: 5 tics, $2.50 owed"));
    }

    #[test]
    fn test_render_report_empty() {
        let report = RangeReport {
            month: "2024-01".to_string(),
            cost_per_tic: 0.5,
            users: Vec::new(),
            total_tics: 0,
            total_owed: 0.0,
        };
        let rendered = render_report(&report);
        assert!(rendered.contains("No tics recorded"));
    }

    #[test]
    fn test_render_history() {
        let history = UserHistory {
            user: "alice".to_string(),
            total_tics: 3,
            total_owed: 1.5,
            monthly_breakdown: vec![MonthlyEntry {
                month: "2024-01".to_string(),
                count: 3,
                amount_owed: 1.5,
            }],
            cost_per_tic: 0.5,
        };
        let rendered = render_history(&history);
        assert!(rendered.contains("2024-01"));
        assert!(rendered.contains("Total: 3 tics, $1.50 owed"));
    }

    #[test]
    fn test_render_history_clean_record() {
        let history = UserHistory {
            user: "saint".to_string(),
            total_tics: 0,
            total_owed: 0.0,
            monthly_breakdown: Vec::new(),
            cost_per_tic: 0.5,
        };
        assert!(render_history(&history).contains("Clean record"));
    }
}
