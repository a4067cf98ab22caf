pub mod board;
pub mod book;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod harness;
pub mod movegen;
pub mod puzzle;
pub mod search;
pub mod zobrist;

pub use board::{Board, Color, Piece};
pub use config::Config;
pub use error::{ChessError, Result};
pub use evaluation::{EvalWeights, Evaluator};
pub use game::{DrawRules, GameState, GameStatus};
pub use movegen::{Move, MoveGenerator, MoveKind};
pub use search::{Algorithm, SearchEngine, SearchResult};

#[cfg(test)]
mod tests {
    use super::*;

    fn moves_for(fen: &str) -> Vec<Move> {
        MoveGenerator::new().generate_moves(&Board::from_fen(fen).unwrap())
    }

    #[test]
    fn test_initial_position() {
        let board = Board::new();
        let generator = MoveGenerator::new();
        let moves = generator.generate_moves(&board);

        // White should have 20 legal moves in the initial position
        assert_eq!(moves.len(), 20);

        for mv in moves {
            assert!(generator.is_move_valid(&board, &mv));
        }
    }

    #[test]
    fn test_pawn_moves() {
        let moves = MoveGenerator::new().generate_moves(&Board::new());
        let double_push = moves
            .iter()
            .find(|mv| mv.piece == Piece::Pawn && mv.from / 8 == 1 && mv.to / 8 == 3);
        assert!(double_push.is_some());

        // White pawn on e4, black pawn on d5
        let moves = moves_for("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");
        let capture = moves
            .iter()
            .find(|mv| mv.piece == Piece::Pawn && mv.captured_piece == Some(Piece::Pawn));
        assert_eq!(capture.map(Move::to_uci), Some("e4d5".to_string()));
    }

    #[test]
    fn test_castling() {
        let moves = moves_for("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let castles: Vec<String> = moves
            .iter()
            .filter(|mv| mv.kind == MoveKind::Castle)
            .map(Move::to_uci)
            .collect();
        assert_eq!(castles.len(), 2);
        assert!(castles.contains(&"e1g1".to_string()));
        assert!(castles.contains(&"e1c1".to_string()));
    }

    #[test]
    fn test_en_passant() {
        let mut game = GameState::new(DrawRules::default());
        for text in ["e2e4", "d7d5", "e4e5", "f7f5"] {
            game.apply_uci(text).unwrap();
        }

        let en_passant = game
            .legal_moves()
            .into_iter()
            .find(|mv| mv.kind == MoveKind::EnPassant)
            .unwrap();
        assert_eq!(en_passant.to_uci(), "e5f6");

        game.apply_move(en_passant).unwrap();
        assert_eq!(game.board().get_piece_at(board::parse_square("f5").unwrap()), None);
    }

    #[test]
    fn test_promotion() {
        let moves = moves_for("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let promotions = moves
            .iter()
            .filter(|mv| mv.piece == Piece::Pawn && mv.promotion.is_some())
            .count();

        // Queen, rook, bishop and knight
        assert_eq!(promotions, 4);
    }

    #[test]
    fn test_check() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/3KQ3 b - - 0 1").unwrap();
        let generator = MoveGenerator::new();
        assert!(generator.is_king_in_check(&board, Color::Black));
        assert!(!generator.is_king_in_check(&board, Color::White));
    }

    #[test]
    fn test_checkmate() {
        // Black king cornered on a1 by queen b1 guarded by king c1
        let game = GameState::from_fen("8/8/8/8/8/8/8/kQK5 b - - 0 1", DrawRules::default()).unwrap();
        assert!(game.legal_moves().is_empty());
        assert_eq!(game.status(), GameStatus::Checkmate { winner: Color::White });
    }

    #[test]
    fn test_stalemate() {
        let game = GameState::from_fen("8/8/8/8/8/1q6/2k5/K7 w - - 0 1", DrawRules::default()).unwrap();
        assert!(!game.is_in_check());
        assert!(game.legal_moves().is_empty());
        assert_eq!(game.status(), GameStatus::Stalemate);
    }

    #[test]
    fn test_move_validation() {
        // The e2 rook is pinned against the king by the e8 rook
        let board = Board::from_fen("4r1k1/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        let generator = MoveGenerator::new();
        let sideways = Move::new(12, 8, Piece::Rook);
        let along_pin = Move::new(12, 20, Piece::Rook);
        assert!(!generator.is_move_valid(&board, &sideways));
        assert!(generator.is_move_valid(&board, &along_pin));
    }
}
