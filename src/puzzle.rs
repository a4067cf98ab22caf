//! Tactical puzzle runner over the Lichess puzzle database CSV format.

use std::io::BufRead;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::board::Board;
use crate::error::{ChessError, Result};
use crate::movegen::MoveGenerator;
use crate::search::SearchEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub id: String,
    pub fen: String,
    /// Alternating opponent moves and expected replies, in UCI notation.
    pub moves: Vec<String>,
    pub rating: u32,
    pub themes: Vec<String>,
}

impl Puzzle {
    /// Parses one row of
    /// `PuzzleId,FEN,Moves,Rating,RatingDeviation,Popularity,NbPlays,Themes,GameUrl,OpeningTags`.
    /// Only the first four columns are required.
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.trim().split(',').collect();
        if fields.len() < 4 {
            return Err(ChessError::InvalidPuzzle(format!(
                "expected at least 4 columns, got {}",
                fields.len()
            )));
        }

        let moves: Vec<String> = fields[2].split_whitespace().map(str::to_string).collect();
        if moves.is_empty() || moves.len() % 2 != 0 {
            return Err(ChessError::InvalidPuzzle(format!(
                "puzzle {} needs an even, non-empty move list",
                fields[0]
            )));
        }

        let rating = fields[3]
            .trim()
            .parse()
            .map_err(|_| ChessError::InvalidPuzzle(format!("bad rating '{}'", fields[3])))?;

        let themes = fields
            .get(7)
            .map(|themes| themes.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            id: fields[0].to_string(),
            fen: fields[1].to_string(),
            moves,
            rating,
            themes,
        })
    }

    pub fn has_theme(&self, theme: &str) -> bool {
        self.themes.iter().any(|t| t == theme)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PuzzleReport {
    pub attempted: usize,
    pub solved: usize,
    pub total_time: Duration,
}

impl PuzzleReport {
    /// Fraction of attempted puzzles solved, in `[0, 1]`.
    pub fn score(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.solved as f64 / self.attempted as f64
        }
    }

    pub fn average_time(&self) -> Duration {
        if self.attempted == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.attempted as u32
        }
    }
}

pub struct PuzzleHarness {
    engine: SearchEngine,
    depth: u32,
    move_generator: MoveGenerator,
}

impl PuzzleHarness {
    pub fn new(engine: SearchEngine, depth: u32) -> Self {
        Self {
            engine,
            depth,
            move_generator: MoveGenerator::new(),
        }
    }

    /// Whether the engine's move for `board` is exactly `expected` (UCI).
    pub fn evaluate(&mut self, board: &Board, expected: &str) -> Result<bool> {
        let expected = self.move_generator.parse_uci(board, expected)?;
        let found = self.engine.search(board, self.depth)?.best_move;
        Ok(found == expected)
    }

    /// Plays the puzzle line, stopping at the first reply that differs from
    /// the expected one.
    pub fn solve(&mut self, puzzle: &Puzzle) -> Result<bool> {
        let mut board = Board::from_fen(&puzzle.fen)?;
        for pair in puzzle.moves.chunks(2) {
            let opponent = self.move_generator.parse_uci(&board, &pair[0])?;
            board.make_move(&opponent);

            if !self.evaluate(&board, &pair[1])? {
                debug!(puzzle = %puzzle.id, expected = %pair[1], "puzzle failed");
                return Ok(false);
            }
            let reply = self.move_generator.parse_uci(&board, &pair[1])?;
            board.make_move(&reply);
        }
        Ok(true)
    }

    /// Solves up to `limit` puzzles from `reader`, optionally only those
    /// tagged with `theme`. A header row and malformed rows are skipped.
    pub fn run<R: BufRead>(&mut self, reader: R, limit: Option<usize>, theme: Option<&str>) -> Result<PuzzleReport> {
        let mut report = PuzzleReport::default();

        for line in reader.lines() {
            if limit.is_some_and(|limit| report.attempted >= limit) {
                break;
            }
            let line = line?;
            if line.trim().is_empty() || line.starts_with("PuzzleId") {
                continue;
            }

            let puzzle = match Puzzle::parse(&line) {
                Ok(puzzle) => puzzle,
                Err(err) => {
                    warn!(error = %err, "skipping puzzle row");
                    continue;
                }
            };
            if theme.is_some_and(|theme| !puzzle.has_theme(theme)) {
                continue;
            }

            let start = Instant::now();
            let solved = match self.solve(&puzzle) {
                Ok(solved) => solved,
                Err(err) => {
                    warn!(puzzle = %puzzle.id, error = %err, "puzzle could not be played");
                    false
                }
            };
            report.total_time += start.elapsed();
            report.attempted += 1;
            if solved {
                report.solved += 1;
            }
        }

        info!(
            attempted = report.attempted,
            solved = report.solved,
            score = report.score(),
            "puzzle run finished"
        );
        Ok(report)
    }
}
