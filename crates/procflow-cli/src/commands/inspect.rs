//! In-house inspection commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::Path;

use procflow_core::auth::{AuthProvider, Capability};
use procflow_core::inspection::{self, InspectionDecision};
use procflow_core::propagator;

use crate::commands::{ensure_offered, open_store};
use crate::output;

#[derive(Subcommand)]
pub enum InspectCommands {
    /// Record a pass/fail decision for one SKU
    Record(RecordArgs),

    /// List inspection records for a request
    List(ListArgs),

    /// Show whether a request is ready for in-house inspection
    Ready(ListArgs),
}

#[derive(Args)]
pub struct RecordArgs {
    /// Request ID
    pub request_id: String,

    /// SKU ID
    pub sku_id: String,

    /// Decision (pending, pass, fail)
    pub decision: String,

    /// Quantity that actually arrived
    #[arg(long)]
    pub arrived: Option<u32>,

    /// Free-form remarks
    #[arg(long)]
    pub remarks: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Request ID
    pub request_id: String,
}

pub fn execute(cmd: InspectCommands, project_dir: &Path, auth: &impl AuthProvider) -> Result<()> {
    let store = open_store(project_dir)?;

    match cmd {
        InspectCommands::Record(args) => {
            ensure_offered(auth, Capability::RecordInspection)?;
            let decision = InspectionDecision::parse(&args.decision)
                .ok_or_else(|| anyhow::anyhow!("Unknown decision '{}'", args.decision))?;
            let record = inspection::record_decision(
                &store,
                &args.request_id,
                &args.sku_id,
                decision,
                args.arrived,
                args.remarks.as_deref(),
            )?;
            println!(
                "{} Recorded {} for {}",
                "✓".green().bold(),
                record.decision.as_str().yellow(),
                record.sku_id.cyan()
            );
            if inspection::all_skus_passed(&store, &args.request_id)? {
                println!(
                    "  {}",
                    "all SKUs passed; production schedules spawned".green()
                );
            }
        }

        InspectCommands::List(args) => {
            let records = inspection::records_for_request(&store, &args.request_id)?;
            output::print_inspections(&records);
        }

        InspectCommands::Ready(args) => {
            if propagator::ready_for_inspection(&store, &args.request_id)? {
                println!("{}", "Ready for in-house inspection".green().bold());
            } else {
                println!("{}", "Not yet ready for inspection".dimmed());
            }
        }
    }

    Ok(())
}
