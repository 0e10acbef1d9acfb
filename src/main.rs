mod handlers;

use anyhow::Result;
use casework::engine::settings::Settings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "casework", version, about = "Case workflow status from task progress")]
struct Cli {
    /// Directory holding cases.json, workflows.json and seed.json
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,
    /// Log store activity to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Initialize the session database
    Init,
    /// List every case with its static and display status
    List,
    /// Show the display status of a case
    Status {
        case: String,
        #[arg(long)]
        json: bool,
    },
    /// Explain how a case's status was derived
    Why {
        case: String,
        #[arg(long)]
        json: bool,
    },
    /// Record the status of a task
    Set {
        case: String,
        stage: String,
        task: String,
        /// not-started, in-progress or completed
        status: String,
    },
    /// Save form answers for a task
    Answer {
        case: String,
        stage: String,
        task: String,
        /// Answer as question=value; repeat a question to answer with a list
        #[arg(long = "field", short = 'f')]
        fields: Vec<String>,
        /// Mark the task completed (otherwise in-progress)
        #[arg(long)]
        complete: bool,
    },
    /// Show saved answers for a task
    Show {
        case: String,
        stage: String,
        task: String,
    },
    /// Load the demo seed bundle into an empty session
    Seed {
        /// Clear the session first and load unconditionally
        #[arg(long)]
        refresh: bool,
    },
    /// Generate random demo progress for every case
    Generate,
    /// Print the session as a seed bundle
    Export,
    /// Remove all recorded progress
    Clear,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "casework=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = Settings::load()?;
    if let Some(dir) = &cli.fixtures {
        settings = settings.with_fixtures_dir(dir);
    }

    match cli.command {
        Commands::Init
        | Commands::Set { .. }
        | Commands::Answer { .. }
        | Commands::Seed { .. }
        | Commands::Generate
        | Commands::Clear => dispatch_write_ops(&settings, cli.command),
        Commands::List
        | Commands::Status { .. }
        | Commands::Why { .. }
        | Commands::Show { .. }
        | Commands::Export => dispatch_read_ops(&settings, cli.command),
    }
}

fn dispatch_write_ops(settings: &Settings, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init => handlers::init::handle(settings),
        Commands::Set {
            case,
            stage,
            task,
            status,
        } => handlers::set::handle(settings, &case, &stage, &task, &status),
        Commands::Answer {
            case,
            stage,
            task,
            fields,
            complete,
        } => handlers::answer::handle(settings, &case, &stage, &task, &fields, complete),
        Commands::Seed { refresh } => handlers::seed::handle(settings, refresh),
        Commands::Generate => handlers::generate::handle(settings),
        Commands::Clear => handlers::clear::handle(settings),
        _ => unreachable!("Invalid write command dispatch"),
    }
}

fn dispatch_read_ops(settings: &Settings, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::List => handlers::list::handle(settings),
        Commands::Status { case, json } => handlers::status::handle(settings, &case, json),
        Commands::Why { case, json } => handlers::why::handle(settings, &case, json),
        Commands::Show { case, stage, task } => handlers::show::handle(settings, &case, &stage, &task),
        Commands::Export => handlers::export::handle(settings),
        _ => unreachable!("Invalid read command dispatch"),
    }
}
