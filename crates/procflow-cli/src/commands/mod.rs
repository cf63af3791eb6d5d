//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use procflow_core::auth::{AuthProvider, Capability, Role, RoleAuth, User};
use procflow_store::Store;

pub mod allocate;
pub mod batch;
pub mod export;
pub mod finance;
pub mod inspect;
pub mod progress;
pub mod remind;
pub mod request;
pub mod schedule;
pub mod watch;

/// Procflow - procurement-to-shipment workflow tracking
#[derive(Parser)]
#[command(name = "procflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Operator role (department_manager, general_manager,
    /// purchasing_officer, card_designer, warehouse_staff, logistics_staff,
    /// accessory_staff)
    #[arg(short, long, global = true, default_value = "purchasing_officer")]
    pub role: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Purchase request lifecycle
    #[command(subcommand)]
    Request(request::RequestCommands),

    /// Allocate an approved request
    Allocate(allocate::AllocateArgs),

    /// Progress tracking (stage checklists)
    #[command(subcommand)]
    Progress(progress::ProgressCommands),

    /// Batch stage completion
    #[command(subcommand)]
    Batch(batch::BatchCommands),

    /// In-house inspection decisions
    #[command(subcommand)]
    Inspect(inspect::InspectCommands),

    /// Finance side-channel (payment confirmations)
    #[command(subcommand)]
    Finance(finance::FinanceCommands),

    /// Production schedules
    #[command(subcommand)]
    Schedule(schedule::ScheduleCommands),

    /// Reminders (payment nudges, card delivery)
    #[command(subcommand)]
    Remind(remind::RemindCommands),

    /// Export progress data as CSV
    Export(export::ExportArgs),

    /// Run the periodic propagation sweep until interrupted
    Watch(watch::WatchArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let project_dir = self
            .project
            .clone()
            .map(Ok)
            .unwrap_or_else(std::env::current_dir)?;

        let role = Role::parse(&self.role)
            .ok_or_else(|| anyhow::anyhow!("Unknown role '{}'", self.role))?;
        let auth = RoleAuth::new(User {
            id: whoami(),
            role,
        });

        match self.command {
            Commands::Request(cmd) => request::execute(cmd, &project_dir, &auth),
            Commands::Allocate(args) => allocate::execute(args, &project_dir, &auth),
            Commands::Progress(cmd) => progress::execute(cmd, &project_dir, &auth),
            Commands::Batch(cmd) => batch::execute(cmd, &project_dir, &auth),
            Commands::Inspect(cmd) => inspect::execute(cmd, &project_dir, &auth),
            Commands::Finance(cmd) => finance::execute(cmd, &project_dir, &auth),
            Commands::Schedule(cmd) => schedule::execute(cmd, &project_dir, &auth),
            Commands::Remind(cmd) => remind::execute(cmd, &project_dir, &auth),
            Commands::Export(args) => export::execute(args, &project_dir, &auth),
            Commands::Watch(args) => watch::execute(args, &project_dir).await,
        }
    }
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "operator".to_string())
}

/// Path of the project's store file.
pub(crate) fn store_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".procflow/state.json")
}

/// Open the project's store file.
pub(crate) fn open_store(project_dir: &Path) -> Result<Store> {
    let path = store_path(project_dir);
    tracing::debug!(path = %path.display(), "opening project store");
    Ok(Store::open(path)?)
}

/// Permission gates only decide whether the action is offered here; stage
/// gating is enforced by the engine regardless.
pub(crate) fn ensure_offered(auth: &impl AuthProvider, capability: Capability) -> Result<()> {
    if auth.has_permission(capability) {
        Ok(())
    } else {
        anyhow::bail!(
            "Role '{}' is not offered this action",
            auth.current_user().role.as_str()
        )
    }
}
