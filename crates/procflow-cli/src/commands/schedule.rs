//! Production schedule commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::Path;

use procflow_core::auth::{AuthProvider, Capability};
use procflow_core::schedule::{self, ScheduleStatus};

use crate::commands::{ensure_offered, open_store};
use crate::output;

#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Create a schedule row manually
    New(NewArgs),

    /// List schedules, optionally for one request
    List(ListArgs),

    /// Move a schedule forward through its lifecycle
    Set(SetArgs),

    /// Return a scheduled row back to pending
    Return(KeyArgs),
}

#[derive(Args)]
pub struct NewArgs {
    /// Request ID
    pub request_id: String,

    /// SKU ID
    pub sku_id: String,

    /// Quantity to produce
    pub quantity: u32,
}

#[derive(Args)]
pub struct ListArgs {
    /// Narrow to one request
    #[arg(long)]
    pub request: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    /// Request ID
    pub request_id: String,

    /// SKU ID
    pub sku_id: String,

    /// Target status (scheduled, in_production, completed, cancelled)
    pub status: String,
}

#[derive(Args)]
pub struct KeyArgs {
    /// Request ID
    pub request_id: String,

    /// SKU ID
    pub sku_id: String,
}

pub fn execute(cmd: ScheduleCommands, project_dir: &Path, auth: &impl AuthProvider) -> Result<()> {
    let store = open_store(project_dir)?;

    match cmd {
        ScheduleCommands::New(args) => {
            ensure_offered(auth, Capability::ManageSchedule)?;
            let row = schedule::create_schedule(&store, &args.request_id, &args.sku_id, args.quantity)?;
            println!(
                "{} Schedule created for {} / {} ({} units)",
                "✓".green().bold(),
                row.request_id.cyan(),
                row.sku_id.cyan(),
                row.quantity
            );
        }

        ScheduleCommands::List(args) => {
            let rows = schedule::list_schedules(&store, args.request.as_deref())?;
            output::print_schedules_table(&rows);
        }

        ScheduleCommands::Set(args) => {
            ensure_offered(auth, Capability::ManageSchedule)?;
            let target = ScheduleStatus::parse(&args.status)
                .ok_or_else(|| anyhow::anyhow!("Unknown schedule status '{}'", args.status))?;
            let row = schedule::set_status(&store, &args.request_id, &args.sku_id, target)?;
            println!(
                "{} Schedule {} / {} is now {}",
                "✓".green().bold(),
                row.request_id.dimmed(),
                row.sku_id,
                row.status.as_str().yellow()
            );
        }

        ScheduleCommands::Return(args) => {
            ensure_offered(auth, Capability::ManageSchedule)?;
            let row = schedule::return_to_pending(&store, &args.request_id, &args.sku_id)?;
            println!(
                "{} Schedule {} / {} returned to {}",
                "✓".green().bold(),
                row.request_id.dimmed(),
                row.sku_id,
                row.status.as_str().yellow()
            );
        }
    }

    Ok(())
}
