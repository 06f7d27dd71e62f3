//! Conquest CLI - Command-line interface for running and replaying games.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{ArgAction, Parser, Subcommand};
use conquest::AgentKind;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Conquest - A deterministic territory-conquest simulation
#[derive(Parser, Debug)]
#[command(name = "conquest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Board and rules options shared by `run` and `tournament`.
#[derive(clap::Args, Debug, Clone)]
struct BoardArgs {
    /// Rules file (.toml or .json)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Generated board width (default: 6)
    #[arg(long)]
    width: Option<u16>,

    /// Generated board height (default: 7)
    #[arg(long)]
    height: Option<u16>,

    /// Starting armies per player on a generated board (default: 30)
    #[arg(long)]
    armies: Option<u32>,

    /// Maximum player-turns per game (default: 500)
    #[arg(short = 't', long)]
    max_turns: Option<u32>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single game between agents
    Run {
        /// Agents to seat (2-8 required): random, aggressive, defensive
        #[arg(required = true, num_args = 2..=8)]
        agents: Vec<AgentKind>,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Scenario file to play instead of a generated board
        #[arg(long)]
        scenario: Option<PathBuf>,

        #[command(flatten)]
        board: BoardArgs,

        /// Output format: text, json, or state
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save recording to file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Replay a recorded game
    Replay {
        /// Recording file (.json)
        #[arg(required = true)]
        recording: PathBuf,

        /// Output format: final, steps, or json
        #[arg(short, long, default_value = "final")]
        format: cli::ReplayFormat,

        /// Stop after this many recorded events
        #[arg(short, long)]
        event: Option<usize>,
    },

    /// Run mass parallel games and aggregate statistics
    Tournament {
        /// Agents to seat (2-8 required): random, aggressive, defensive
        #[arg(required = true, num_args = 2..=8)]
        agents: Vec<AgentKind>,

        /// Number of games to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        #[command(flatten)]
        board: BoardArgs,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Validate a scenario file and its invariants
    Validate {
        /// Scenario file (.toml or .json)
        #[arg(required = true)]
        scenario: PathBuf,

        /// Rules file (.toml or .json)
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Commands::Run {
            agents,
            seed,
            scenario,
            board,
            format,
            save,
            quiet,
        } => board.config().and_then(|config| {
            cli::run::execute(&agents, seed, scenario, config, format, save, quiet)
        }),

        Commands::Replay {
            recording,
            format,
            event,
        } => cli::replay::execute(&recording, format, event),

        Commands::Tournament {
            agents,
            games,
            seed,
            threads,
            board,
            format,
            progress,
        } => board.config().and_then(|config| {
            cli::tournament::execute(&agents, games, seed, threads, config, format, progress)
        }),

        Commands::Validate { scenario, rules } => cli::validate::execute(&scenario, rules.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

impl BoardArgs {
    /// Build the tournament configuration these flags describe.
    fn config(&self) -> Result<conquest::TournamentConfig, cli::CliError> {
        let mut config = conquest::TournamentConfig::default();
        if let Some(path) = &self.rules {
            config.rules = conquest::Rules::load(path)?;
        }
        if let Some(width) = self.width {
            config.board_width = width;
        }
        if let Some(height) = self.height {
            config.board_height = height;
        }
        if let Some(armies) = self.armies {
            config.starting_armies = armies;
        }
        if let Some(turns) = self.max_turns {
            config.max_turns = turns;
        }
        Ok(config)
    }
}
