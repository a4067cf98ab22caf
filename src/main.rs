use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use guaxinim::board::Board;
use guaxinim::harness::InteractiveHarness;
use guaxinim::movegen::{perft_divide, MoveGenerator};
use guaxinim::puzzle::PuzzleHarness;
use guaxinim::search::Algorithm;
use guaxinim::Config;

#[derive(Parser)]
#[command(name = "guaxinim")]
#[command(about = "Depth-bounded chess search engine", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search depth in plies
    #[arg(short, long)]
    depth: Option<u32>,

    /// minimax, alpha-beta or alpha-beta-improved
    #[arg(short, long)]
    algorithm: Option<Algorithm>,

    /// Human versus human, the engine never moves
    #[arg(long)]
    pvp: bool,

    /// Opening book JSON file
    #[arg(long)]
    book: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play a game on stdin/stdout (default)
    Play,
    /// Print the engine's move for a position
    Bestmove {
        #[arg(short, long)]
        fen: Option<String>,
    },
    /// Count leaf nodes of the legal move tree
    Perft {
        #[arg(short, long)]
        fen: Option<String>,
        depth: u32,
    },
    /// Run the engine over a Lichess puzzle CSV
    Puzzles {
        file: PathBuf,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(short, long)]
        theme: Option<String>,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(depth) = args.depth {
        config.depth = depth;
    }
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    if args.pvp {
        config.pvp_on = true;
    }
    if args.book.is_some() {
        config.book_path = args.book.clone();
    }
    config.validate()?;
    Ok(config)
}

fn board_from(fen: Option<&str>) -> Result<Board> {
    Ok(match fen {
        Some(fen) => Board::from_fen(fen)?,
        None => Board::new(),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    match &args.command {
        None | Some(Command::Play) => {
            let mut harness = InteractiveHarness::new(config)?;
            harness.run(io::stdin().lock(), io::stdout().lock())?;
        }
        Some(Command::Bestmove { fen }) => {
            let board = board_from(fen.as_deref())?;
            let mut engine = config.build_engine()?;
            let result = engine.search(&board, config.depth)?;
            match result.mate_in() {
                Some(moves) => println!("bestmove {} (mate {}, {} nodes)", result.best_move, moves, result.nodes),
                None => println!("bestmove {} (score {}, {} nodes)", result.best_move, result.score, result.nodes),
            }
        }
        Some(Command::Perft { fen, depth }) => {
            let mut board = board_from(fen.as_deref())?;
            let start = Instant::now();
            let counts = perft_divide(&MoveGenerator::new(), &mut board, *depth);
            for (mv, nodes) in &counts {
                println!("{}: {}", mv, nodes);
            }
            let total: u64 = counts.iter().map(|(_, nodes)| nodes).sum();
            println!("\nnodes {} in {:?}", total, start.elapsed());
        }
        Some(Command::Puzzles { file, limit, theme }) => {
            let reader = BufReader::new(File::open(file).with_context(|| format!("failed to open {}", file.display()))?);
            let mut harness = PuzzleHarness::new(config.build_engine()?, config.depth);
            let report = harness.run(reader, *limit, theme.as_deref())?;
            println!(
                "solved {}/{} ({:.1}%), average {:?} per puzzle",
                report.solved,
                report.attempted,
                report.score() * 100.0,
                report.average_time()
            );
        }
    }
    Ok(())
}
