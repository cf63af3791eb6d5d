//! Progress tracking commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::Path;

use procflow_core::auth::{AuthProvider, Capability};
use procflow_core::progress::{
    self,
    model::{ProgressFlavor, StageStatus},
};

use crate::commands::{ensure_offered, open_store};
use crate::output;

#[derive(Subcommand)]
pub enum ProgressCommands {
    /// Show one progress record as a stage checklist
    Show(ShowArgs),

    /// List progress records
    List(ListArgs),

    /// Mark a manual stage completed
    Complete(StageArgs),

    /// Mark a manual stage skipped
    Skip(StageArgs),

    /// Mark a manual stage in progress
    Start(StageArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// Progress flavor (procurement, card, accessory)
    pub flavor: String,

    /// Request ID
    pub request_id: String,

    /// SKU ID (card and accessory records only)
    #[arg(long)]
    pub sku: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Narrow to one flavor (procurement, card, accessory)
    #[arg(long)]
    pub flavor: Option<String>,
}

#[derive(Args)]
pub struct StageArgs {
    /// Progress flavor (procurement, card, accessory)
    pub flavor: String,

    /// Request ID
    pub request_id: String,

    /// Stage key (e.g. arrange_production, design, sourcing)
    pub stage: String,

    /// SKU ID (card and accessory records only)
    #[arg(long)]
    pub sku: Option<String>,

    /// Free-form remarks stored on the stage
    #[arg(long)]
    pub remarks: Option<String>,
}

pub fn execute(cmd: ProgressCommands, project_dir: &Path, auth: &impl AuthProvider) -> Result<()> {
    let store = open_store(project_dir)?;

    match cmd {
        ProgressCommands::Show(args) => {
            let flavor = parse_flavor(&args.flavor)?;
            let progress =
                progress::get_progress(&store, flavor, &args.request_id, args.sku.as_deref())?;
            output::print_progress(&progress);
        }

        ProgressCommands::List(args) => {
            let flavor = args.flavor.as_deref().map(parse_flavor).transpose()?;
            let records = progress::list_progress(&store, flavor)?;
            output::print_progress_table(&records);
        }

        ProgressCommands::Complete(args) => update(&store, auth, args, StageStatus::Completed)?,
        ProgressCommands::Skip(args) => update(&store, auth, args, StageStatus::Skipped)?,
        ProgressCommands::Start(args) => update(&store, auth, args, StageStatus::InProgress)?,
    }

    Ok(())
}

fn update(
    store: &procflow_store::Store,
    auth: &impl AuthProvider,
    args: StageArgs,
    target: StageStatus,
) -> Result<()> {
    let flavor = parse_flavor(&args.flavor)?;
    ensure_offered(auth, flavor_capability(flavor))?;

    let progress = progress::update_stage(
        store,
        flavor,
        &args.request_id,
        args.sku.as_deref(),
        &args.stage,
        target,
        args.remarks.as_deref(),
    )?;

    println!(
        "{} Stage {} is now {}",
        "✓".green().bold(),
        args.stage.cyan(),
        target.as_str().yellow()
    );
    println!();
    output::print_progress(&progress);
    Ok(())
}

fn parse_flavor(s: &str) -> Result<ProgressFlavor> {
    ProgressFlavor::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown progress flavor '{s}'"))
}

pub(crate) fn flavor_capability(flavor: ProgressFlavor) -> Capability {
    match flavor {
        ProgressFlavor::Procurement => Capability::CompleteProcurementStage,
        ProgressFlavor::Card => Capability::CompleteCardStage,
        ProgressFlavor::Accessory => Capability::CompleteAccessoryStage,
    }
}
