use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::config;
use crate::pipeline;

#[derive(Debug, Parser)]
#[command(
    name = "sprint-report",
    about = "Sprint ops report: Linear cycles and the initiatives sheet as one static HTML page",
    version
)]
pub struct Cli {
    /// Config file (default: ~/.sprint-report/config.toml)
    #[arg(long, global = true, env = "SPRINT_REPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for snapshots and the report (overrides [report] output_dir)
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Fetch current and next cycles for every team into the tracker snapshot
    FetchLinear,
    /// Read the initiatives sheet into the sheet snapshot
    FetchSheets,
    /// Render the HTML report from the snapshots on disk
    Render,
    /// Fetch both sources, then render (the default)
    Run,
}

/// Load configuration and run the selected command.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        config.report.output_dir = dir;
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::FetchLinear => {
            let path = pipeline::fetch_linear(&config).await?;
            println!("Linear data saved to {}", path.display());
        }
        Commands::FetchSheets => {
            let readable = pipeline::fetch_sheets(&config).await?;
            if !readable {
                println!("Sheet not accessible; snapshot saved with access_error set");
            }
        }
        Commands::Render => {
            let path = pipeline::render(&config, Utc::now())?;
            println!("Report written to {}", path.display());
        }
        Commands::Run => {
            let summary = pipeline::run_all(&config).await?;
            let status = |ok: bool| if ok { "OK" } else { "WARN" };
            println!("Linear: {}", status(summary.linear_ok));
            println!("Sheets: {}", status(summary.sheets_ok));
            println!("Report: {}", summary.report_path.display());
        }
    }
    Ok(())
}
