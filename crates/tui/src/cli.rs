use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;
use crate::model::TaskStatus;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tareas",
    version,
    about = "Assign tasks to registered users and keep them in sync with a REST task server.",
    after_help = "Examples:\n  tareas                       Launch the form (same as `tareas tui`)\n  tareas --offline             Run against a built-in sample registry\n  tareas users 103             Suggest users whose documento starts with 103\n  tareas add --documento 10314 --title \"Review PR\" --description \"Check diff\"\n  tareas edit 7 --status inactiva\n  tareas delete 7 8"
)]
pub struct Cli {
    /// Base URL of the task server (defaults to http://localhost:3000)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Read settings from this file instead of the platform config dir
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory used for the log file
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Tracing filter directive (e.g. "info", "tareas_core=debug")
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    /// Use an in-process sample backend instead of the server
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            config_path: self.config.clone(),
            data_dir: self.data_dir.clone(),
            log_filter: self.log_filter.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Launch the terminal form (default command)
    Tui,
    /// Print every task card, newest first
    List,
    /// List registered users, optionally filtered by documento prefix
    Users(UsersArgs),
    /// Resolve a documento to its registered user
    Lookup(LookupArgs),
    /// Create a task for the user registered under a documento
    Add(AddArgs),
    /// Change the title, description or status of a task
    Edit(EditArgs),
    /// Delete one or more tasks by id
    Delete(DeleteArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UsersArgs {
    /// Documento prefix to filter by
    #[arg(value_name = "PREFIX")]
    pub prefix: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    #[arg(value_name = "DOCUMENTO")]
    pub documento: String,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Documento of the user the task is assigned to
    #[arg(long)]
    pub documento: String,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: String,

    #[arg(long, value_enum, default_value_t = TaskStatus::Activa)]
    pub status: TaskStatus,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_enum)]
    pub status: Option<TaskStatus>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// One or more task ids to delete
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,
}
