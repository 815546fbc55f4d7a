mod config;
mod context;
mod follow_up_cmd;
mod leads_cmd;
mod metrics_cmd;
mod output;
mod users_cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use context::AppContext;
use leadflow_core::Stage;

#[derive(Parser)]
#[command(
    name = "leadflow",
    version,
    about = "Lead funnel tracker: leads, follow-ups and funnel metrics"
)]
struct Cli {
    /// Username to log in as (defaults to $LEADFLOW_USER, else prompts)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and any missing tables
    Init,

    /// List, show, add, edit and export leads
    Leads(leads_cmd::LeadsArgs),

    /// Due list, history, templates and follow-up recording
    FollowUp(follow_up_cmd::FollowUpArgs),

    /// Funnel counts and conversion for a period
    Metrics(metrics_cmd::MetricsArgs),

    /// Manage logins
    Users(users_cmd::UsersArgs),

    /// Show the funnel stages
    Stages,

    /// Show or set configuration
    Config {
        /// Directory holding the CSV tables
        #[arg(long)]
        data_dir: Option<String>,

        /// Prefix mixed into password hashes
        #[arg(long)]
        salt: Option<String>,

        /// How long writers wait for a table lock
        #[arg(long)]
        lock_timeout_ms: Option<u64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let user = cli.user.as_deref();
    match cli.command {
        Commands::Config {
            data_dir,
            salt,
            lock_timeout_ms,
        } => {
            if data_dir.is_none() && salt.is_none() && lock_timeout_ms.is_none() {
                config::show_config()
            } else {
                config::set_config(data_dir, salt, lock_timeout_ms)
            }
        }
        Commands::Init => run_init(),
        Commands::Leads(args) => leads_cmd::run(args, &AppContext::open()?, user),
        Commands::FollowUp(args) => follow_up_cmd::run(args, &AppContext::open()?, user),
        Commands::Metrics(args) => metrics_cmd::run(args, &AppContext::open()?, user),
        Commands::Users(args) => users_cmd::run(args, &AppContext::open()?, user),
        Commands::Stages => {
            let ctx = AppContext::open()?;
            for stage in ctx.store.stages.load()? {
                print_stage(stage);
            }
            Ok(())
        }
    }
}

fn run_init() -> Result<()> {
    let ctx = AppContext::open()?;
    let config_path = config::config_path()?;
    if !config_path.exists() {
        config::save_config(&ctx.config)?;
        println!("Wrote {}", config_path.display());
    }
    println!("Data dir: {}", ctx.paths.root.display());
    for path in [
        &ctx.paths.leads,
        &ctx.paths.interactions,
        &ctx.paths.stages,
        &ctx.paths.users,
    ] {
        println!("  {}", path.display());
    }
    if ctx.store.credentials.is_empty()? {
        println!();
        println!("No users yet. Create the first one with:");
        println!("  leadflow users add <username> --name <display name> --role Admin");
    }
    Ok(())
}

fn print_stage(stage: Stage) {
    println!("{:<12} {:<32} {}", stage.as_str(), stage.label(), stage.description());
}
