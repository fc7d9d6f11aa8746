//! Conquest-Bot command line.
//!
//! ## Usage
//!
//! - `conquest-bot` - Play a match over stdin/stdout
//! - `conquest-bot play --early-turns 8` - Same, with tuned engine knobs
//! - `conquest-bot demo --seed 7` - Plan one turn on a generated map

use std::io;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use conquest_bot::board::{Board, Pos, TileState};
use conquest_bot::constants::{EARLY_PHASE_TURNS, ENGAGEMENT_RANGE, N};
use conquest_bot::game::{Building, BuildingKind, Game, MineSpot, Owner};
use conquest_bot::protocol::{Bot, format_actions};
use conquest_bot::strategy::{Engine, EngineConfig};

/// Conquest-Bot: rule-based player for a 12x12 territory-conquest game
#[derive(Parser)]
#[command(name = "conquest-bot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every policy decision
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a match, reading snapshots from stdin and writing commands to stdout
    Play(PlayArgs),
    /// Plan a single turn on a randomly generated map and print the commands
    Demo {
        /// Seed for the map generator
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
}

#[derive(Args)]
struct PlayArgs {
    /// Number of expansion-only turns
    #[arg(long, default_value_t = EARLY_PHASE_TURNS)]
    early_turns: u32,

    /// Distance within which units chase enemy units
    #[arg(long, default_value_t = ENGAGEMENT_RANGE)]
    engagement_range: i32,
}

impl Default for PlayArgs {
    fn default() -> Self {
        Self {
            early_turns: EARLY_PHASE_TURNS,
            engagement_range: ENGAGEMENT_RANGE,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Demo { seed }) => run_demo(seed),
        Some(Commands::Play(args)) => play(args),
        None => play(PlayArgs::default()),
    }
}

/// Logs go to stderr: stdout carries the protocol.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

fn play(args: PlayArgs) -> Result<()> {
    let config = EngineConfig {
        early_turns: args.early_turns,
        engagement_range: args.engagement_range,
        ..EngineConfig::default()
    };
    let mut bot = Bot::new(Engine::new(config));
    bot.run(io::stdin().lock(), io::stdout().lock())
        .context("match aborted")
}

fn run_demo(seed: u64) -> Result<()> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut game = demo_game(&mut rng);

    println!("Conquest-Bot demo (seed {seed})\n");
    print!("{}", game.board);

    let mut engine = Engine::new(EngineConfig {
        early_turns: 0,
        ..EngineConfig::default()
    });
    let actions = engine.play_turn(&mut game);

    println!("\nCommands: {}", format_actions(&actions));
    println!("Gold left: {}, income: {}", game.me.gold, game.me.income);
    print!("\n{}", game.board);
    Ok(())
}

/// Random walls and mine spots, each headquarters in its corner with a
/// small patch of territory around it.
fn demo_game(rng: &mut fastrand::Rng) -> Game {
    let mut board = Board::new();
    for y in 0..N {
        for x in 0..N {
            if rng.u8(..100) < 12 {
                board.set_state(Pos::new(x, y), TileState::Void);
            }
        }
    }

    let my_hq = Pos::new(0, 0);
    let enemy_hq = Pos::new(N - 1, N - 1);
    for (hq, state) in [(my_hq, TileState::OwnedActive), (enemy_hq, TileState::EnemyActive)] {
        board.set_state(hq, state);
        for p in hq.orthogonal() {
            board.set_state(p, state);
        }
    }

    let mine_spots = (0..4)
        .map(|_| MineSpot::new(Pos::new(rng.i32(0..N), rng.i32(0..N))))
        .filter(|s| board.tile_at(s.pos).is_some_and(|t| t.state == TileState::Neutral))
        .collect();

    let mut game = Game::new(mine_spots);
    game.board = board;
    game.me.gold = rng.i32(30..80);
    game.me.income = rng.i32(5..15);
    game.enemy.gold = rng.i32(0..40);
    game.enemy.income = rng.i32(0..10);
    game.buildings = vec![
        Building {
            pos: my_hq,
            kind: BuildingKind::Headquarters,
            owner: Owner::Me,
        },
        Building {
            pos: enemy_hq,
            kind: BuildingKind::Headquarters,
            owner: Owner::Enemy,
        },
    ];
    game
}
