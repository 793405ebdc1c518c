mod commands;
mod config;
mod lock;
mod store;
mod view;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use comment_engine::UserId;
use env_logger::Env;

use crate::commands::{Command, Context};

#[derive(Parser)]
#[command(
    name = "evc",
    about = "Comments, replies and ratings of an event page, as JSON"
)]
struct Cli {
    /// State file holding the event's comments and rating
    #[arg(long, global = true, default_value = store::DEFAULT_STATE_FILE)]
    state: PathBuf,
    /// Engine config [default: <config dir>/event-comments/config.json]
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Id of the signed-in user
    #[arg(long, global = true, default_value_t = UserId::new(1))]
    user: UserId,
    /// Display name for new posts; defaults to the name last posted under
    #[arg(long, global = true)]
    name: Option<String>,
    #[command(subcommand)]
    command: Command,
}

fn init_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis()
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    log::debug!("running {:?} on {}", cli.command, cli.state.display());

    let ctx = Context {
        state: &cli.state,
        config,
        user: cli.user,
        name: cli.name,
    };
    let outcome = commands::run(ctx, &cli.command)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
