//! Purchase request commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::Path;

use procflow_core::auth::{AuthProvider, Capability};
use procflow_core::request::{self, model::LineItem, model::RequestStatus};

use crate::commands::{ensure_offered, open_store};
use crate::output;

#[derive(Subcommand)]
pub enum RequestCommands {
    /// Submit a new purchase request
    New(NewRequestArgs),

    /// First-tier (department) approval
    ApproveFirst(IdArg),

    /// Second-tier (general manager) approval
    ApproveFinal(IdArg),

    /// Reject at the current approval gate
    Reject(RejectArgs),

    /// Advance the downstream fulfillment status
    Advance(AdvanceArgs),

    /// List all requests
    List,

    /// Show one request with its allocation and progress
    Show(IdArg),
}

#[derive(Args)]
pub struct NewRequestArgs {
    /// Requester name
    #[arg(long)]
    pub requester: String,

    /// Line items as sku:name:quantity:unit_price (repeatable)
    #[arg(long = "item", required = true)]
    pub items: Vec<String>,
}

#[derive(Args)]
pub struct IdArg {
    /// Request ID
    pub request_id: String,
}

#[derive(Args)]
pub struct RejectArgs {
    /// Request ID
    pub request_id: String,

    /// Reason for rejection
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Args)]
pub struct AdvanceArgs {
    /// Request ID
    pub request_id: String,

    /// Target status (in_production, quality_check, ready_to_ship,
    /// shipped, completed)
    pub status: String,
}

pub fn execute(cmd: RequestCommands, project_dir: &Path, auth: &impl AuthProvider) -> Result<()> {
    let store = open_store(project_dir)?;

    match cmd {
        RequestCommands::New(args) => {
            ensure_offered(auth, Capability::SubmitRequest)?;
            let line_items = args
                .items
                .iter()
                .map(|raw| parse_line_item(raw))
                .collect::<Result<Vec<_>>>()?;
            let req = request::create_request(&store, &args.requester, line_items)?;
            println!(
                "{} Submitted request {} ({} line items)",
                "✓".green().bold(),
                req.id.cyan(),
                req.line_items.len()
            );
        }

        RequestCommands::ApproveFirst(args) => {
            ensure_offered(auth, Capability::ApproveFirst)?;
            let req = request::approve_first(&store, &args.request_id)?;
            println!(
                "{} Request {} is now {}",
                "✓".green().bold(),
                req.id.dimmed(),
                req.status.as_str().yellow()
            );
        }

        RequestCommands::ApproveFinal(args) => {
            ensure_offered(auth, Capability::ApproveFinal)?;
            let req = request::approve_final(&store, &args.request_id)?;
            println!(
                "{} Request {} is now {}",
                "✓".green().bold(),
                req.id.dimmed(),
                req.status.as_str().yellow()
            );
        }

        RequestCommands::Reject(args) => {
            let req = request::get_request(&store, &args.request_id)?;
            let capability = if req.status == RequestStatus::Submitted {
                Capability::ApproveFirst
            } else {
                Capability::ApproveFinal
            };
            ensure_offered(auth, capability)?;
            let req = request::reject(&store, &args.request_id, args.reason.as_deref())?;
            println!("{} Request {} rejected", "✗".red().bold(), req.id.dimmed());
        }

        RequestCommands::Advance(args) => {
            ensure_offered(auth, Capability::Allocate)?;
            let target = RequestStatus::parse(&args.status)
                .ok_or_else(|| anyhow::anyhow!("Unknown status '{}'", args.status))?;
            let req = request::advance_status(&store, &args.request_id, target)?;
            println!(
                "{} Request {} is now {}",
                "✓".green().bold(),
                req.id.dimmed(),
                req.status.as_str().yellow()
            );
        }

        RequestCommands::List => {
            let requests = request::list_requests(&store)?;
            output::print_requests_table(&requests);
        }

        RequestCommands::Show(args) => {
            let req = request::get_request(&store, &args.request_id)?;
            let allocation = procflow_core::allocation::try_get_allocation(&store, &req.id)?;
            let records = procflow_core::progress::progress_for_request(&store, &req.id)?;
            let ready = procflow_core::propagator::ready_for_inspection(&store, &req.id)?;
            output::print_request(&req, allocation.as_ref(), &records, ready);
        }
    }

    Ok(())
}

/// Parse "sku:name:quantity:unit_price".
fn parse_line_item(raw: &str) -> Result<LineItem> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 4 {
        anyhow::bail!("Expected sku:name:quantity:unit_price, got '{raw}'");
    }
    Ok(LineItem {
        sku_id: parts[0].to_string(),
        product_name: parts[1].to_string(),
        quantity: parts[2].parse()?,
        unit_price: parts[3].parse()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_item() {
        let item = parse_line_item("SKU-1:Plush Bear:500:2.35").unwrap();
        assert_eq!(item.sku_id, "SKU-1");
        assert_eq!(item.product_name, "Plush Bear");
        assert_eq!(item.quantity, 500);
        assert!((item.unit_price - 2.35).abs() < f64::EPSILON);

        assert!(parse_line_item("SKU-1:only-two").is_err());
        assert!(parse_line_item("SKU-1:Bear:many:2.0").is_err());
    }
}
