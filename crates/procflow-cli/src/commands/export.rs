//! CSV export command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use procflow_core::auth::{AuthProvider, Capability};
use procflow_core::export;

use crate::commands::{ensure_offered, open_store};

#[derive(Args)]
pub struct ExportArgs {
    /// Output file; writes to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: ExportArgs, project_dir: &Path, auth: &impl AuthProvider) -> Result<()> {
    ensure_offered(auth, Capability::ExportData)?;
    let store = open_store(project_dir)?;

    let rows = export::progress_rows(&store)?;
    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            export::write_csv(&rows, file)?;
            println!(
                "{} Exported {} row(s) to {}",
                "✓".green().bold(),
                rows.len(),
                path.display()
            );
        }
        None => {
            export::write_csv(&rows, std::io::stdout().lock())?;
        }
    }
    Ok(())
}
