//! Allocation command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;

use procflow_core::allocation::{self, AllocationInput, CardType, PackagingType, PaymentMethod};
use procflow_core::auth::{AuthProvider, Capability};

use crate::commands::{ensure_offered, open_store};

#[derive(Args)]
pub struct AllocateArgs {
    /// Request ID (must be fully approved)
    pub request_id: String,

    /// Packaging type (external, in_house)
    #[arg(long, default_value = "external")]
    pub packaging: String,

    /// Payment method (wire_transfer, credit_terms)
    #[arg(long, default_value = "wire_transfer")]
    pub payment: String,

    /// Prepayment amount; zero waives the deposit stage
    #[arg(long, default_value_t = 0.0)]
    pub prepayment: f64,

    /// Card type (color_card, hang_tag, insert_card); omit for no cards
    #[arg(long)]
    pub card: Option<String>,

    /// Spawn accessory progress per SKU
    #[arg(long)]
    pub accessories: bool,

    /// Planned production date (YYYY-MM-DD)
    #[arg(long)]
    pub production_date: Option<chrono::NaiveDate>,

    /// Planned delivery date (YYYY-MM-DD)
    #[arg(long)]
    pub delivery_date: Option<chrono::NaiveDate>,
}

pub fn execute(args: AllocateArgs, project_dir: &Path, auth: &impl AuthProvider) -> Result<()> {
    ensure_offered(auth, Capability::Allocate)?;
    let store = open_store(project_dir)?;

    let packaging = PackagingType::parse(&args.packaging)
        .ok_or_else(|| anyhow::anyhow!("Unknown packaging type '{}'", args.packaging))?;
    let payment_method = PaymentMethod::parse(&args.payment)
        .ok_or_else(|| anyhow::anyhow!("Unknown payment method '{}'", args.payment))?;
    let card_type = args
        .card
        .as_deref()
        .map(|c| {
            CardType::parse(c).ok_or_else(|| anyhow::anyhow!("Unknown card type '{c}'"))
        })
        .transpose()?;

    let allocation = allocation::allocate(
        &store,
        &args.request_id,
        AllocationInput {
            packaging,
            payment_method,
            prepayment_amount: args.prepayment,
            card_type,
            needs_accessories: args.accessories,
            production_date: args.production_date,
            delivery_date: args.delivery_date,
        },
    )?;

    println!(
        "{} Allocated request {}",
        "✓".green().bold(),
        allocation.request_id.cyan()
    );
    if !allocation.deposit_required() {
        println!("  {}", "deposit stage waived".dimmed());
    }
    if allocation.card_type.is_none() {
        println!("  {}", "card provision stage waived".dimmed());
    }
    Ok(())
}
