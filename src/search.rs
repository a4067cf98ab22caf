use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, Piece};
use crate::error::{ChessError, Result};
use crate::evaluation::{EvalWeights, Evaluator};
use crate::game::terminal_status;
use crate::movegen::{Move, MoveGenerator};

/// Score of delivering mate at the root. Mates found `n` plies deep score
/// `MATE_SCORE - n`, so shorter mates always score higher.
pub const MATE_SCORE: i32 = 1_000_000;
const INFINITY: i32 = 2 * MATE_SCORE;
const MAX_MATE_PLY: i32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Minimax,
    AlphaBeta,
    AlphaBetaImproved,
    /// Reserved selector. No null-window/re-search policy is settled yet,
    /// so engines refuse to run with it.
    PrincipalVariation,
}

impl Algorithm {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Algorithm::PrincipalVariation)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Algorithm::Minimax => "minimax",
            Algorithm::AlphaBeta => "alpha-beta",
            Algorithm::AlphaBetaImproved => "alpha-beta-improved",
            Algorithm::PrincipalVariation => "principal-variation",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Algorithm {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "minimax" => Ok(Algorithm::Minimax),
            "alphabeta" | "alpha-beta" => Ok(Algorithm::AlphaBeta),
            "alphabeta-improved" | "alpha-beta-improved" => Ok(Algorithm::AlphaBetaImproved),
            "pvs" | "principal-variation" => Ok(Algorithm::PrincipalVariation),
            other => Err(ChessError::Configuration(format!("unknown algorithm '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Move,
    /// Score from the point of view of the side to move at the root.
    pub score: i32,
    /// Positions visited, root included.
    pub nodes: u64,
    pub depth: u32,
    pub algorithm: Algorithm,
}

impl SearchResult {
    /// Moves (not plies) until mate when the score is a mate score. Positive
    /// when the side to move mates, negative when it gets mated.
    pub fn mate_in(&self) -> Option<i32> {
        mate_in(self.score)
    }
}

pub fn mate_in(score: i32) -> Option<i32> {
    let plies = MATE_SCORE - score.abs();
    if (0..MAX_MATE_PLY).contains(&plies) {
        let moves = (plies + 1) / 2;
        Some(if score > 0 { moves } else { -moves })
    } else {
        None
    }
}

/// Depth-bounded game tree search over a private copy of the position.
pub struct SearchEngine {
    algorithm: Algorithm,
    evaluator: Evaluator,
    move_generator: MoveGenerator,
    nodes: u64,
}

impl SearchEngine {
    pub fn new(algorithm: Algorithm, weights: EvalWeights) -> Result<Self> {
        if algorithm.is_reserved() {
            return Err(ChessError::Configuration(format!(
                "{} search is reserved and not available",
                algorithm
            )));
        }
        Ok(Self {
            algorithm,
            evaluator: Evaluator::new(weights),
            move_generator: MoveGenerator::new(),
            nodes: 0,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Returns the best move for the side to move and its score. Children
    /// are tried in generation order at the root, and the first move
    /// reaching the best score wins, so every algorithm agrees with
    /// minimax on both move and score.
    pub fn search(&mut self, board: &Board, depth: u32) -> Result<SearchResult> {
        if depth == 0 {
            return Err(ChessError::Configuration("search depth must be positive".to_string()));
        }

        let mut board = board.clone();
        let moves = self.move_generator.generate_moves(&board);
        if moves.is_empty() {
            return Err(ChessError::GameOver(terminal_status(&self.move_generator, &board)));
        }

        self.nodes = 1;
        let mut best: Option<(Move, i32)> = None;
        let mut alpha = -INFINITY;

        for mv in moves {
            let undo = board.make_move(&mv);
            let score = match self.algorithm {
                Algorithm::Minimax => -self.minimax(&mut board, depth - 1, 1),
                Algorithm::AlphaBeta => -self.alpha_beta(&mut board, depth - 1, 1, -INFINITY, -alpha, false),
                Algorithm::AlphaBetaImproved => {
                    -self.alpha_beta(&mut board, depth - 1, 1, -INFINITY, -alpha, true)
                }
                Algorithm::PrincipalVariation => unreachable!("rejected in SearchEngine::new"),
            };
            board.unmake_move(&mv, &undo);

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
            alpha = alpha.max(score);
        }

        let (best_move, score) = best.ok_or_else(|| {
            ChessError::GameOver(terminal_status(&self.move_generator, &board))
        })?;

        debug!(
            algorithm = %self.algorithm,
            depth,
            nodes = self.nodes,
            score,
            best_move = %best_move,
            "search finished"
        );

        Ok(SearchResult {
            best_move,
            score,
            nodes: self.nodes,
            depth,
            algorithm: self.algorithm,
        })
    }

    /// Score of a node with no legal moves.
    fn terminal_score(&self, board: &Board, ply: u32) -> i32 {
        if self.move_generator.is_king_in_check(board, board.side_to_move) {
            -(MATE_SCORE - ply as i32)
        } else {
            0
        }
    }

    fn leaf_score(&self, board: &Board, ply: u32) -> i32 {
        if self.move_generator.has_legal_move(board) {
            self.evaluator.evaluate(board)
        } else {
            self.terminal_score(board, ply)
        }
    }

    fn minimax(&mut self, board: &mut Board, depth: u32, ply: u32) -> i32 {
        self.nodes += 1;

        if depth == 0 {
            return self.leaf_score(board, ply);
        }

        let moves = self.move_generator.generate_moves(board);
        if moves.is_empty() {
            return self.terminal_score(board, ply);
        }

        let mut best_score = -INFINITY;
        for mv in moves {
            let undo = board.make_move(&mv);
            let score = -self.minimax(board, depth - 1, ply + 1);
            board.unmake_move(&mv, &undo);
            best_score = best_score.max(score);
        }
        best_score
    }

    /// Fail-hard alpha-beta: the result is clamped to `[alpha, beta]`.
    fn alpha_beta(&mut self, board: &mut Board, depth: u32, ply: u32, mut alpha: i32, beta: i32, ordered: bool) -> i32 {
        self.nodes += 1;

        if depth == 0 {
            return self.leaf_score(board, ply).clamp(alpha, beta);
        }

        let mut moves = self.move_generator.generate_moves(board);
        if moves.is_empty() {
            return self.terminal_score(board, ply).clamp(alpha, beta);
        }

        if ordered {
            self.order_moves(board, &mut moves);
        }

        for mv in moves {
            let undo = board.make_move(&mv);
            let score = -self.alpha_beta(board, depth - 1, ply + 1, -beta, -alpha, ordered);
            board.unmake_move(&mv, &undo);

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }
        alpha
    }

    /// Queen promotions and winning or safe captures first (most valuable
    /// victim, least valuable attacker). Everything else keeps generation
    /// order, since the sort is stable.
    fn order_moves(&self, board: &Board, moves: &mut [Move]) {
        moves.sort_by_cached_key(|mv| Reverse(self.move_order_key(board, mv)));
    }

    fn move_order_key(&self, board: &Board, mv: &Move) -> i32 {
        let mut key = 0;
        if mv.promotion == Some(Piece::Queen) {
            key += 2_000_000;
        }
        if let Some(victim) = mv.captured_piece {
            let victim_value = self.evaluator.piece_value(victim);
            let attacker_value = self.evaluator.piece_value(mv.piece);
            let defended = self
                .move_generator
                .is_square_under_attack(board, mv.to, board.side_to_move.opposite());
            if victim_value >= attacker_value || !defended {
                key += 1_000_000 + 10 * victim_value - mv.piece.index() as i32;
            }
        }
        key
    }
}
