//! Watch command: run the propagation sweep until interrupted.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use procflow_core::watch;
use procflow_store::Store;

use crate::commands::store_path;

#[derive(Args)]
pub struct WatchArgs {
    /// Sweep period in seconds
    #[arg(long, default_value_t = 5)]
    pub period: u64,
}

pub async fn execute(args: WatchArgs, project_dir: &Path) -> Result<()> {
    let path = store_path(project_dir);

    println!(
        "{} Sweeping every {}s, press Ctrl-C to stop",
        "▸".cyan(),
        args.period
    );
    // reopen the snapshot every tick so confirmations and stage updates
    // written by other procflow invocations are swept too
    let handle = watch::spawn_sweep(
        move || Ok(Arc::new(Store::open(path.clone())?)),
        Duration::from_secs(args.period),
    );
    tokio::signal::ctrl_c().await?;
    handle.stop();
    println!("{}", "stopped".dimmed());
    Ok(())
}
