//! Polyform-MCTS command line.
//!
//! ## Usage
//!
//! - `polyform-mcts genmove duo "e10,f10,e9"` - Generate a move after a move list
//! - `polyform-mcts selfplay trigon_3` - Play a game against itself
//! - `polyform-mcts analyze classic_2 <moves>` - Print the value of each move

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use polyform_mcts::analyze::AnalyzeGame;
use polyform_mcts::board::{Board, ColorMove};
use polyform_mcts::mcts::{CancelToken, SearchParams};
use polyform_mcts::player::Player;
use polyform_mcts::variant::Variant;

/// Polyform-MCTS: an MCTS engine for Blokus-style games
#[derive(Parser)]
#[command(name = "polyform-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a move for the color to play after the given moves
    Genmove {
        variant: Variant,
        /// Moves separated by ';', played by the colors in turn order
        #[arg(default_value = "")]
        moves: String,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Let the engine play a whole game against itself
    Selfplay {
        variant: Variant,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the search value of the position before each move
    Analyze {
        variant: Variant,
        /// Moves separated by ';', played by the colors in turn order
        moves: String,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Args)]
struct EngineArgs {
    /// Playing level (1-9)
    #[arg(short, long, default_value_t = 4)]
    level: u32,
    /// Fixed number of simulations per move
    #[arg(short, long, conflicts_with = "time")]
    simulations: Option<u64>,
    /// Fixed time per move in seconds
    #[arg(short, long)]
    time: Option<f64>,
    /// Number of search threads
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// Seed for reproducible searches
    #[arg(long)]
    seed: Option<u64>,
    /// Memory for the search tree in MiB
    #[arg(long, default_value_t = 256)]
    memory: usize,
}

impl EngineArgs {
    fn player(&self) -> Result<Player> {
        let mut player = Player::new(SearchParams {
            threads: self.threads.max(1),
            seed: self.seed,
            memory: self.memory << 20,
            ..SearchParams::default()
        });
        player.set_level(self.level);
        player.set_fixed_simulations(self.simulations);
        if let Some(t) = self.time {
            let t = Duration::try_from_secs_f64(t).context("invalid time")?;
            player.set_fixed_time(Some(t));
        }
        Ok(player)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("polyform_mcts=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Genmove {
            variant,
            moves,
            engine,
        } => {
            let bd = Board::from_moves(variant, &parse_moves(variant, &moves)?);
            let mut player = engine.player()?;
            let mv = player.genmove(&bd, bd.to_play());
            println!("{}", bd.move_to_string(mv));
        }
        Commands::Selfplay { variant, engine } => run_selfplay(variant, &engine)?,
        Commands::Analyze {
            variant,
            moves,
            engine,
        } => {
            let moves = parse_moves(variant, &moves)?;
            let mut player = engine.player()?;
            let budget = player.budget(variant);
            let mut analyze = AnalyzeGame::new(variant);
            analyze.run(
                variant,
                &moves,
                player.search_mut(),
                budget,
                &CancelToken::new(),
                |i, n| info!("analyzed {i}/{n}"),
            );
            for (i, (color, mv, _)) in analyze.entries().into_iter().enumerate() {
                println!("{:3} {color} {mv} {:.3}", i + 1, analyze.value(i));
            }
        }
    }
    Ok(())
}

/// Parse a ';' separated move list. Colors follow the turn order.
fn parse_moves(variant: Variant, s: &str) -> Result<Vec<ColorMove>> {
    let mut bd = Board::new(variant);
    let mut moves = Vec::new();
    for token in s.split(';').map(str::trim).filter(|t| !t.is_empty()) {
        let mv = bd
            .move_from_string(token)
            .with_context(|| format!("move {}", moves.len() + 1))?;
        let c = bd.to_play();
        if !bd.is_legal(c, mv) {
            bail!("illegal move {token} for color {c}");
        }
        moves.push(ColorMove::new(c, mv));
        bd.play(c, mv);
    }
    Ok(moves)
}

fn run_selfplay(variant: Variant, engine: &EngineArgs) -> Result<()> {
    let mut player = engine.player()?;
    let mut bd = Board::new(variant);
    while !bd.is_game_over() {
        let c = bd.to_play();
        let mv = player.genmove(&bd, c);
        if !mv.is_pass() {
            println!("{c} {}", bd.move_to_string(mv));
        }
        bd.play(c, mv);
    }
    println!("{bd}");
    for c in variant.colors() {
        println!("color {c}: {} points, score {}", bd.points(c), bd.score(c));
    }
    Ok(())
}
