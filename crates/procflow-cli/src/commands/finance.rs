//! Finance side-channel commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::Path;

use procflow_core::auth::{AuthProvider, Capability};
use procflow_core::finance::{self, PaymentKind};

use crate::commands::{ensure_offered, open_store};

#[derive(Subcommand)]
pub enum FinanceCommands {
    /// Confirm a payment (completes the linked stage when reachable)
    Confirm(PaymentArgs),

    /// Show payment confirmation state for a request
    Status(StatusArgs),
}

#[derive(Args)]
pub struct PaymentArgs {
    /// Request ID
    pub request_id: String,

    /// Payment kind (deposit, final)
    pub kind: String,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Request ID
    pub request_id: String,
}

pub fn execute(cmd: FinanceCommands, project_dir: &Path, auth: &impl AuthProvider) -> Result<()> {
    let store = open_store(project_dir)?;

    match cmd {
        FinanceCommands::Confirm(args) => {
            ensure_offered(auth, Capability::ConfirmPayment)?;
            let kind = parse_kind(&args.kind)?;
            let applied = finance::confirm_payment(&store, &args.request_id, kind)?;
            println!(
                "{} {} payment confirmed for {}",
                "✓".green().bold(),
                kind.as_str(),
                args.request_id.cyan()
            );
            if !applied {
                println!(
                    "  {}",
                    "stage not yet reachable; will apply on a later sweep".dimmed()
                );
            }
        }

        FinanceCommands::Status(args) => {
            for kind in [PaymentKind::Deposit, PaymentKind::Final] {
                match finance::confirmation_time(&store, &args.request_id, kind)? {
                    Some(at) => println!(
                        "  {} {} ({}) confirmed {}",
                        "✓".green(),
                        kind.as_str(),
                        kind.label(),
                        at.format("%Y-%m-%d %H:%M").to_string().dimmed()
                    ),
                    None => println!(
                        "  {} {} ({}) {}",
                        "○".dimmed(),
                        kind.as_str(),
                        kind.label(),
                        "unconfirmed".dimmed()
                    ),
                }
            }
        }
    }

    Ok(())
}

fn parse_kind(s: &str) -> Result<PaymentKind> {
    PaymentKind::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown payment kind '{s}'"))
}
