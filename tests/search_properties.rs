use guaxinim::board::Board;
use guaxinim::error::ChessError;
use guaxinim::evaluation::EvalWeights;
use guaxinim::game::GameStatus;
use guaxinim::movegen::MoveGenerator;
use guaxinim::search::{Algorithm, SearchEngine, SearchResult, MATE_SCORE};

const POSITIONS: [&str; 6] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
    "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
    "4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "6k1/8/8/8/8/8/R7/1R4K1 w - - 0 1",
];

fn search(algorithm: Algorithm, fen: &str, depth: u32) -> SearchResult {
    let mut engine = SearchEngine::new(algorithm, EvalWeights::default()).unwrap();
    engine.search(&Board::from_fen(fen).unwrap(), depth).unwrap()
}

#[test]
fn test_pruning_variants_agree_with_minimax() {
    for fen in POSITIONS {
        for depth in 1..=3 {
            let reference = search(Algorithm::Minimax, fen, depth);
            for algorithm in [Algorithm::AlphaBeta, Algorithm::AlphaBetaImproved] {
                let result = search(algorithm, fen, depth);
                assert_eq!(result.best_move, reference.best_move, "{} at depth {} on {}", algorithm, depth, fen);
                assert_eq!(result.score, reference.score, "{} at depth {} on {}", algorithm, depth, fen);
            }
        }
    }
}

#[test]
fn test_node_counts_shrink_with_pruning() {
    for fen in POSITIONS {
        for depth in 2..=3 {
            let minimax = search(Algorithm::Minimax, fen, depth).nodes;
            let alpha_beta = search(Algorithm::AlphaBeta, fen, depth).nodes;
            let improved = search(Algorithm::AlphaBetaImproved, fen, depth).nodes;

            assert!(alpha_beta <= minimax, "{} depth {}: {} > {}", fen, depth, alpha_beta, minimax);
            assert!(
                improved <= alpha_beta,
                "{} depth {}: ordered {} > plain {}",
                fen,
                depth,
                improved,
                alpha_beta
            );
        }
    }
}

#[test]
fn test_search_leaves_input_untouched_and_returns_legal_move() {
    let generator = MoveGenerator::new();
    for fen in POSITIONS {
        let board = Board::from_fen(fen).unwrap();
        let before = board.clone();
        let mut engine = SearchEngine::new(Algorithm::AlphaBetaImproved, EvalWeights::default()).unwrap();
        let result = engine.search(&board, 2).unwrap();

        assert_eq!(board, before);
        assert!(generator.generate_moves(&board).contains(&result.best_move), "{}", fen);
        assert!(result.nodes > 1);
    }
}

#[test]
fn test_mate_in_two_found_at_depth_three() {
    // Rook ladder: one rook cuts off the seventh rank, the other mates on the eighth
    let fen = "7k/8/8/8/8/8/R7/1R4K1 w - - 0 1";
    let generator = MoveGenerator::new();

    for algorithm in [Algorithm::Minimax, Algorithm::AlphaBeta, Algorithm::AlphaBetaImproved] {
        let shallow = search(algorithm, fen, 2);
        assert_eq!(shallow.mate_in(), None);

        let result = search(algorithm, fen, 3);
        assert_eq!(result.score, MATE_SCORE - 3, "{}", algorithm);
        assert_eq!(result.mate_in(), Some(2));

        // Every defence still loses to a mate in one
        let mut board = Board::from_fen(fen).unwrap();
        board.make_move(&result.best_move);
        let defences = generator.generate_moves(&board);
        assert!(!defences.is_empty());
        for defence in defences {
            let mut after = board.clone();
            after.make_move(&defence);
            let mut engine = SearchEngine::new(algorithm, EvalWeights::default()).unwrap();
            assert_eq!(engine.search(&after, 1).unwrap().mate_in(), Some(1));
        }
    }
}

#[test]
fn test_mate_preferred_over_stalemate() {
    // Several queen moves mate, several stalemate
    let result = search(Algorithm::AlphaBeta, "k7/2Q5/1K6/8/8/8/8/8 w - - 0 1", 1);
    assert_eq!(result.mate_in(), Some(1));
    assert_eq!(result.score, MATE_SCORE - 1);
}

#[test]
fn test_terminal_positions_are_reported() {
    let mut engine = SearchEngine::new(Algorithm::AlphaBeta, EvalWeights::default()).unwrap();

    let stalemate = Board::from_fen("k7/2Q5/1K6/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(matches!(engine.search(&stalemate, 3), Err(ChessError::GameOver(GameStatus::Stalemate))));

    let mated = Board::from_fen("k1Q5/8/1K6/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(matches!(
        engine.search(&mated, 3),
        Err(ChessError::GameOver(GameStatus::Checkmate { .. }))
    ));
}

#[test]
fn test_avoids_losing_material_at_depth_two() {
    // Taking the defended pawn with the queen loses her to the rook
    let fen = "3rk3/8/8/3p4/8/8/8/3QK3 w - - 0 1";
    let result = search(Algorithm::AlphaBetaImproved, fen, 2);
    assert_ne!(result.best_move.to_uci(), "d1d5");
}
