use thiserror::Error;

use crate::game::GameStatus;

pub type Result<T> = std::result::Result<T, ChessError>;

#[derive(Debug, Error)]
pub enum ChessError {
    /// The requested move is not among the legal moves of the current position.
    #[error("illegal move: {mv}")]
    IllegalMove { mv: String },

    /// Search or move application was requested on a finished game.
    #[error("game is over: {0}")]
    GameOver(GameStatus),

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid move notation: {0}")]
    InvalidMoveNotation(String),

    #[error("invalid puzzle record: {0}")]
    InvalidPuzzle(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
