use crate::infra::{parse_grade, parse_sort_key};
use crate::report::{run_import_check, run_report};
use crate::server;
use crate::settings::run_settings;
use clap::{Args, Parser, Subcommand};
use hr_review::error::AppError;
use hr_review::reviews::{Grade, SortKey};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Quarterly Review Insights",
    about = "Serve and report on quarterly performance review metrics",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the roster, KPIs, or one employee's history to the terminal
    Report(ReportArgs),
    /// Check how an evaluation export would be imported, without storing it
    Import(ImportArgs),
    /// Persist the AI provider, model, and API key to the settings file
    Settings(SettingsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Load an evaluation export (CSV) into the store at start-up
    #[arg(long, conflicts_with = "sample")]
    pub(crate) seed: Option<PathBuf>,
    /// Start with the bundled synthetic dataset
    #[arg(long)]
    pub(crate) sample: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Evaluation export to report on. Defaults to the bundled sample.
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Show the full history and insight for one employee
    #[arg(long)]
    pub(crate) subject: Option<String>,
    /// Only list employees in this department
    #[arg(long)]
    pub(crate) department: Option<String>,
    /// Only list employees with this latest grade (A-D)
    #[arg(long, value_parser = parse_grade)]
    pub(crate) grade: Option<Grade>,
    /// Roster sort column
    #[arg(long, value_parser = parse_sort_key)]
    pub(crate) sort: Option<SortKey>,
    /// Sort descending
    #[arg(long)]
    pub(crate) desc: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Evaluation export (CSV) to inspect
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct SettingsArgs {
    /// Settings file to write. Defaults to APP_AI_SETTINGS_PATH.
    #[arg(long)]
    pub(crate) path: Option<PathBuf>,
    /// API key for the text-generation provider
    #[arg(long)]
    pub(crate) api_key: Option<String>,
    /// Provider name (gemini)
    #[arg(long)]
    pub(crate) provider: Option<String>,
    /// Model identifier
    #[arg(long)]
    pub(crate) model: Option<String>,
    /// Remove the stored API key
    #[arg(long, conflicts_with = "api_key")]
    pub(crate) clear_key: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
        Command::Import(args) => run_import_check(args),
        Command::Settings(args) => run_settings(args),
    }
}
