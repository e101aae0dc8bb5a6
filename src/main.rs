use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing::{debug, warn};

use gcn_cli::{LogOptions, TerminalProgress, display_plan, display_report, load_folders, logging};
use gcn_core::FileStateStore;
use gcn_oci::{OciAuthResolver, OciConfig};
use gcn_undeploy::{UndeployOptions, UndeployReport, Undeployer, plan};

#[derive(Parser)]
#[command(name = "gcn")]
#[command(about = "Tear down DevOps projects deployed by the GCN tooling", long_about = None)]
struct Cli {
    /// OCI profile used when the deployment does not name one
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Debug logging for the gcn crates
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write log records as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Delete every resource recorded in a deployment-state file
    Undeploy {
        /// Deployment-state document, rewritten after every deletion
        #[arg(long)]
        state: PathBuf,

        /// Local folders whose registration is removed afterwards
        #[arg(long = "folder")]
        folders: Vec<PathBuf>,
    },
    /// Delete everything found in the DevOps projects the folders are registered with
    UndeployFolder {
        #[arg(required = true)]
        folders: Vec<PathBuf>,
    },
    /// Print the deletions `undeploy` would perform
    Plan {
        #[arg(long)]
        state: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(LogOptions {
        verbose: cli.verbose,
        json: cli.log_json,
    });

    let mut config = OciConfig::from_env().context("Invalid OCI configuration")?;
    if let Some(profile) = &cli.profile {
        config = config.with_profile(profile.as_str());
    }
    let options = UndeployOptions::from_env();
    debug!("Undeploy options: {:?}", options);

    match cli.command {
        Command::Plan { state } => {
            let store = FileStateStore::new(state);
            let Some(state) = store.load()? else {
                println!("{}", format!("No deployment state at {}", store.path().display()).yellow());
                return Ok(());
            };
            display_plan(&plan(&state));
            Ok(())
        }
        Command::Undeploy { state, folders } => {
            let mut store = FileStateStore::new(state);
            let Some(mut state) = store.load()? else {
                println!("{}", format!("No deployment state at {}", store.path().display()).yellow());
                return Ok(());
            };
            let folders = load_folders(&folders, &options)?;
            let state_path = store.path().to_path_buf();

            let resolver = OciAuthResolver::new(config);
            let progress = TerminalProgress::new();
            let undeployer = Undeployer::new(&resolver, &progress).with_options(options);

            let report = tokio::select! {
                report = undeployer.undeploy(&folders, &mut state, &mut store) => report?,
                _ = tokio::signal::ctrl_c() => {
                    warn!("[undeploy] Interrupted");
                    bail!(
                        "Interrupted; run again to resume from {}",
                        state_path.display()
                    );
                }
            };
            finish(&[report])
        }
        Command::UndeployFolder { folders } => {
            let folders = load_folders(&folders, &options)?;

            let resolver = OciAuthResolver::new(config);
            let progress = TerminalProgress::new();
            let undeployer = Undeployer::new(&resolver, &progress).with_options(options);

            // runs to completion; discovered resources are not recorded anywhere
            let reports = undeployer.undeploy_folders(&folders).await;
            finish(&reports)
        }
    }
}

fn finish(reports: &[UndeployReport]) -> Result<()> {
    for report in reports {
        display_report(report);
    }
    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        bail!("{} of {} undeploy run(s) failed", failed, reports.len());
    }
    Ok(())
}
