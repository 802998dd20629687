mod commands;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use crate::adapters::store::DEFAULT_BATTLE_LIMIT;

#[derive(Parser, Debug)]
#[command(
    name = "turing-arena",
    version,
    about = "Pit an interrogator model against a participant model pretending to be human"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one game and stream its turns as server-sent events
    Play(PlayArgs),
    /// List recorded games, newest first
    Battles {
        #[arg(long, default_value_t = DEFAULT_BATTLE_LIMIT)]
        limit: usize,
    },
    /// Show one recorded game with both transcripts
    Battle { run_id: String },
    /// Participant and interrogator success rates
    Leaderboard,
    /// Text-capable models offered by the configured provider
    Models,
    /// Report whether an API key is configured
    CheckKey,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlayArgs {
    /// Model that pretends to be human (defaults to config)
    #[arg(long)]
    pub participant: Option<String>,
    /// Model that asks the questions and renders the verdict (defaults to config)
    #[arg(long)]
    pub interrogator: Option<String>,
    /// Number of questions to ask
    #[arg(long)]
    pub questions: Option<u32>,
    /// Tag stored on the run record
    #[arg(long)]
    pub run_by: Option<String>,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("fatal: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::dispatch(cli.cmd)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
