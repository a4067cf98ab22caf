use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::{Board, Color, Piece, UndoInfo};
use crate::error::{ChessError, Result};
use crate::movegen::{Move, MoveGenerator};
use crate::zobrist::ZobristKeys;

/// Draw conditions beyond stalemate. Each rule is toggled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawRules {
    pub threefold_repetition: bool,
    pub fifty_move: bool,
    pub insufficient_material: bool,
}

impl Default for DrawRules {
    fn default() -> Self {
        Self {
            threefold_repetition: true,
            fifty_move: true,
            insufficient_material: true,
        }
    }
}

impl DrawRules {
    pub fn none() -> Self {
        Self {
            threefold_repetition: false,
            fifty_move: false,
            insufficient_material: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        *self != GameStatus::Ongoing
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameStatus::Ongoing => write!(f, "ongoing"),
            GameStatus::Checkmate { winner } => write!(f, "checkmate, {} wins", winner),
            GameStatus::Stalemate => write!(f, "stalemate"),
            GameStatus::Draw(DrawReason::ThreefoldRepetition) => write!(f, "draw by threefold repetition"),
            GameStatus::Draw(DrawReason::FiftyMoveRule) => write!(f, "draw by the fifty-move rule"),
            GameStatus::Draw(DrawReason::InsufficientMaterial) => write!(f, "draw by insufficient material"),
        }
    }
}

/// Checkmate or stalemate for a position, ignoring optional draw rules.
pub fn terminal_status(generator: &MoveGenerator, board: &Board) -> GameStatus {
    if !generator.generate_moves(board).is_empty() {
        return GameStatus::Ongoing;
    }
    if generator.is_king_in_check(board, board.side_to_move) {
        GameStatus::Checkmate {
            winner: board.side_to_move.opposite(),
        }
    } else {
        GameStatus::Stalemate
    }
}

pub fn is_insufficient_material(board: &Board) -> bool {
    let heavy = |color: Color| {
        board.piece_bb(color, Piece::Pawn)
            | board.piece_bb(color, Piece::Rook)
            | board.piece_bb(color, Piece::Queen)
    };
    if heavy(Color::White) | heavy(Color::Black) != 0 {
        return false;
    }

    let knights = |color: Color| board.piece_bb(color, Piece::Knight).count_ones();
    let bishops = |color: Color| board.piece_bb(color, Piece::Bishop);
    let minors = |color: Color| knights(color) + bishops(color).count_ones();

    match (minors(Color::White), minors(Color::Black)) {
        (0, 0) | (1, 0) | (0, 1) => true,
        (1, 1) => {
            // King and bishop versus king and bishop on the same colour
            let white = bishops(Color::White);
            let black = bishops(Color::Black);
            if white == 0 || black == 0 {
                return false;
            }
            let dark = |bb: u64| {
                let square = bb.trailing_zeros() as u8;
                (square / 8 + square % 8) % 2 == 0
            };
            dark(white) == dark(black)
        }
        _ => false,
    }
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    mv: Move,
    undo: UndoInfo,
}

/// A position together with the stack of moves that produced it.
pub struct GameState {
    board: Board,
    history: Vec<HistoryEntry>,
    hashes: Vec<u64>,
    draw_rules: DrawRules,
    from_initial_position: bool,
    generator: MoveGenerator,
    keys: ZobristKeys,
}

impl GameState {
    pub fn new(draw_rules: DrawRules) -> Self {
        let mut game = Self::with_board(Board::new(), draw_rules);
        game.from_initial_position = true;
        game
    }

    pub fn from_board(board: Board, draw_rules: DrawRules) -> Result<Self> {
        board.validate()?;
        Ok(Self::with_board(board, draw_rules))
    }

    pub fn from_fen(fen: &str, draw_rules: DrawRules) -> Result<Self> {
        Self::from_board(Board::from_fen(fen)?, draw_rules)
    }

    fn with_board(board: Board, draw_rules: DrawRules) -> Self {
        let keys = ZobristKeys::new();
        let hashes = vec![keys.hash(&board)];
        Self {
            board,
            history: Vec::new(),
            hashes,
            draw_rules,
            from_initial_position: false,
            generator: MoveGenerator::new(),
            keys,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn draw_rules(&self) -> DrawRules {
        self.draw_rules
    }

    /// Whether the game began from the standard initial arrangement.
    pub fn from_initial_position(&self) -> bool {
        self.from_initial_position
    }

    pub fn move_history(&self) -> Vec<Move> {
        self.history.iter().map(|entry| entry.mv).collect()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.generator.generate_moves(&self.board)
    }

    pub fn is_in_check(&self) -> bool {
        self.generator.is_king_in_check(&self.board, self.board.side_to_move)
    }

    /// Applies a move after checking it against the legal moves.
    pub fn apply_move(&mut self, mv: Move) -> Result<()> {
        let status = self.status();
        if status.is_over() {
            return Err(ChessError::GameOver(status));
        }
        if !self.legal_moves().contains(&mv) {
            warn!(mv = %mv, "rejected illegal move");
            return Err(ChessError::IllegalMove { mv: mv.to_uci() });
        }
        self.push(mv);
        Ok(())
    }

    pub fn apply_uci(&mut self, text: &str) -> Result<Move> {
        let status = self.status();
        if status.is_over() {
            return Err(ChessError::GameOver(status));
        }
        let mv = self.generator.parse_uci(&self.board, text)?;
        self.push(mv);
        Ok(mv)
    }

    fn push(&mut self, mv: Move) {
        let undo = self.board.make_move(&mv);
        self.history.push(HistoryEntry { mv, undo });
        self.hashes.push(self.keys.hash(&self.board));
        debug!(mv = %mv, fen = %self.board.to_fen(), "move applied");
    }

    /// Takes back the last move, returning it, or `None` at the start of the game.
    pub fn undo_move(&mut self) -> Option<Move> {
        let entry = self.history.pop()?;
        self.board.unmake_move(&entry.mv, &entry.undo);
        self.hashes.pop();
        Some(entry.mv)
    }

    pub fn status(&self) -> GameStatus {
        let terminal = terminal_status(&self.generator, &self.board);
        if terminal.is_over() {
            return terminal;
        }
        if self.draw_rules.insufficient_material && is_insufficient_material(&self.board) {
            return GameStatus::Draw(DrawReason::InsufficientMaterial);
        }
        if self.draw_rules.fifty_move && self.board.halfmove_clock >= 100 {
            return GameStatus::Draw(DrawReason::FiftyMoveRule);
        }
        if self.draw_rules.threefold_repetition && self.repetition_count() >= 3 {
            return GameStatus::Draw(DrawReason::ThreefoldRepetition);
        }
        GameStatus::Ongoing
    }

    /// Occurrences of the current position since the last irreversible move.
    fn repetition_count(&self) -> usize {
        let Some((&current, earlier)) = self.hashes.split_last() else {
            return 0;
        };
        let window = (self.board.halfmove_clock as usize).min(earlier.len());
        1 + earlier[earlier.len() - window..]
            .iter()
            .filter(|&&hash| hash == current)
            .count()
    }
}
