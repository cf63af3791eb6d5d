//! Batch stage completion commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::Path;

use procflow_core::auth::AuthProvider;
use procflow_core::batch::{self, ProgressKey};
use procflow_core::progress::model::ProgressFlavor;

use crate::commands::{ensure_offered, open_store};
use crate::output;

#[derive(Subcommand)]
pub enum BatchCommands {
    /// Complete one stage across many requests/SKUs
    Complete(BatchCompleteArgs),
}

#[derive(Args)]
pub struct BatchCompleteArgs {
    /// Progress flavor (procurement, card, accessory)
    pub flavor: String,

    /// Stage key to complete
    pub stage: String,

    /// Selected keys: request_id or request_id/sku_id (repeatable)
    #[arg(long = "key", required = true)]
    pub keys: Vec<String>,
}

pub fn execute(cmd: BatchCommands, project_dir: &Path, auth: &impl AuthProvider) -> Result<()> {
    let store = open_store(project_dir)?;

    match cmd {
        BatchCommands::Complete(args) => {
            let flavor = ProgressFlavor::parse(&args.flavor)
                .ok_or_else(|| anyhow::anyhow!("Unknown progress flavor '{}'", args.flavor))?;
            ensure_offered(auth, crate::commands::progress::flavor_capability(flavor))?;

            let keys: Vec<ProgressKey> = args.keys.iter().map(|raw| parse_key(raw)).collect();
            let outcome = batch::batch_complete(&store, flavor, &keys, &args.stage)?;
            output::print_batch_outcome(&outcome);
        }
    }

    Ok(())
}

/// "REQ" selects the per-request record; "REQ/SKU" the per-SKU one.
fn parse_key(raw: &str) -> ProgressKey {
    match raw.split_once('/') {
        Some((request_id, sku_id)) => ProgressKey::sku(request_id, sku_id),
        None => ProgressKey::request(raw),
    }
}
