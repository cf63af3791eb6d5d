//! Reminder commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::Path;

use procflow_core::auth::{AuthProvider, Capability};
use procflow_core::finance::PaymentKind;
use procflow_core::reminder::{self, ReminderKind};

use crate::commands::{ensure_offered, open_store};

#[derive(Subcommand)]
pub enum RemindCommands {
    /// Nudge finance about a payment
    Payment(PaymentArgs),

    /// Ask the card designer to deliver the cards
    CardDelivery(RequestArg),

    /// Show reminder timestamps for a request
    Status(RequestArg),
}

#[derive(Args)]
pub struct PaymentArgs {
    /// Request ID
    pub request_id: String,

    /// Payment kind (deposit, final)
    pub kind: String,
}

#[derive(Args)]
pub struct RequestArg {
    /// Request ID
    pub request_id: String,
}

pub fn execute(cmd: RemindCommands, project_dir: &Path, auth: &impl AuthProvider) -> Result<()> {
    let store = open_store(project_dir)?;

    match cmd {
        RemindCommands::Payment(args) => {
            ensure_offered(auth, Capability::SendReminder)?;
            let kind = PaymentKind::parse(&args.kind)
                .ok_or_else(|| anyhow::anyhow!("Unknown payment kind '{}'", args.kind))?;
            let reminder = reminder::add_payment_reminder(&store, &args.request_id, kind)?;
            println!(
                "{} Reminder sent: {} for {}",
                "✓".green().bold(),
                reminder.kind.as_str().yellow(),
                reminder.request_id.cyan()
            );
        }

        RemindCommands::CardDelivery(args) => {
            ensure_offered(auth, Capability::SendReminder)?;
            let reminder = reminder::request_card_delivery(&store, &args.request_id)?;
            println!(
                "{} Card delivery requested for {}",
                "✓".green().bold(),
                reminder.request_id.cyan()
            );
        }

        RemindCommands::Status(args) => {
            for kind in [
                ReminderKind::DepositPayment,
                ReminderKind::FinalPayment,
                ReminderKind::CardDelivery,
            ] {
                match reminder::reminder_time(&store, &args.request_id, kind)? {
                    Some(at) => println!(
                        "  {} {} {}",
                        "✓".green(),
                        kind.as_str(),
                        at.format("%Y-%m-%d %H:%M").to_string().dimmed()
                    ),
                    None => println!("  {} {} {}", "○".dimmed(), kind.as_str(), "never".dimmed()),
                }
            }
        }
    }

    Ok(())
}
