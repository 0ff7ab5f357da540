mod commands;
mod menu;
mod prompt;
mod session;
mod ui;

use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};
use commands::{CicdAction, DeployAction, ManageAction, SetupAction};
use runkit_core::ExecutionMode;
use session::Session;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "runkit",
    about = "Guided deploy, management, and CI/CD setup for Google Cloud Run"
)]
#[command(version)]
struct Cli {
    /// Print external commands instead of running them
    #[arg(long, global = true, env = "DRY_RUN", value_parser = FalseyValueParser::new())]
    dry_run: bool,

    /// Never prompt; every answer falls back to its default
    #[arg(long, global = true, env = "NON_INTERACTIVE", value_parser = FalseyValueParser::new())]
    non_interactive: bool,

    /// Verbose tracing of every operation
    #[arg(long, global = true, env = "DEBUG", value_parser = FalseyValueParser::new())]
    debug: bool,

    /// Directory holding runkit.toml, generated files, and deploy records
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    project_dir: PathBuf,

    /// Replace generated files that have local changes
    #[arg(long, global = true)]
    force: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and deploy a service
    Deploy {
        /// Run one action instead of showing the menu
        action: Option<DeployAction>,
    },
    /// Inspect and operate deployed services
    Manage {
        /// Run one action instead of showing the menu
        action: Option<ManageAction>,
    },
    /// Generate pipelines and set up continuous deployment
    Cicd {
        /// Run one action instead of showing the menu
        action: Option<CicdAction>,
    },
    /// Prepare the project: tools, APIs, defaults, registry
    Setup {
        /// Run one action instead of showing the menu
        action: Option<SetupAction>,
    },
}

impl Commands {
    fn has_action(&self) -> bool {
        match self {
            Self::Deploy { action } => action.is_some(),
            Self::Manage { action } => action.is_some(),
            Self::Cicd { action } => action.is_some(),
            Self::Setup { action } => action.is_some(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mode = ExecutionMode::new(cli.dry_run, cli.non_interactive, cli.debug);
    if mode.non_interactive && !cli.command.has_action() {
        anyhow::bail!("an action is required in non-interactive mode, see --help");
    }
    if mode.dry_run {
        ui::info("dry run: external commands are printed, not executed");
    }
    tracing::debug!(?mode, project_dir = %cli.project_dir.display(), "starting");

    let mut session = Session::new(mode, cli.project_dir, cli.force)?;
    match cli.command {
        Commands::Deploy { action } => commands::deploy(&mut session, action).await,
        Commands::Manage { action } => commands::manage(&mut session, action).await,
        Commands::Cicd { action } => commands::cicd(&mut session, action).await,
        Commands::Setup { action } => commands::setup(&mut session, action).await,
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `.env` in the working directory, without overriding the environment.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => ui::warn(format!("ignoring .env: {e}")),
    }
}
