use guaxinim::board::Board;
use guaxinim::movegen::{perft, MoveGenerator};
use guaxinim::zobrist::ZobristKeys;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const PROMOTIONS: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";

fn perft_fen(fen: &str, depth: u32) -> u64 {
    let mut board = Board::from_fen(fen).unwrap();
    perft(&MoveGenerator::new(), &mut board, depth)
}

#[test]
fn test_perft_initial_position() {
    let generator = MoveGenerator::new();
    let mut board = Board::new();
    assert_eq!(perft(&generator, &mut board, 1), 20);
    assert_eq!(perft(&generator, &mut board, 2), 400);
    assert_eq!(perft(&generator, &mut board, 3), 8_902);
    assert_eq!(board, Board::new());
}

#[test]
fn test_perft_kiwipete() {
    assert_eq!(perft_fen(KIWIPETE, 1), 48);
    assert_eq!(perft_fen(KIWIPETE, 2), 2_039);
    assert_eq!(perft_fen(KIWIPETE, 3), 97_862);
}

#[test]
fn test_perft_endgame() {
    assert_eq!(perft_fen(ENDGAME, 1), 14);
    assert_eq!(perft_fen(ENDGAME, 2), 191);
    assert_eq!(perft_fen(ENDGAME, 3), 2_812);
    assert_eq!(perft_fen(ENDGAME, 4), 43_238);
}

#[test]
fn test_perft_promotions_and_checks() {
    assert_eq!(perft_fen(PROMOTIONS, 1), 6);
    assert_eq!(perft_fen(PROMOTIONS, 2), 264);
    assert_eq!(perft_fen(PROMOTIONS, 3), 9_467);
}

#[test]
fn test_make_unmake_round_trip_for_every_move() {
    let generator = MoveGenerator::new();
    let keys = ZobristKeys::new();

    for fen in [KIWIPETE, ENDGAME, PROMOTIONS] {
        let mut board = Board::from_fen(fen).unwrap();
        let original = board.clone();
        let original_hash = keys.hash(&board);

        for mv in generator.generate_moves(&board) {
            let undo = board.make_move(&mv);
            assert_ne!(board, original, "{} did not change the board", mv);

            for reply in generator.generate_moves(&board) {
                let before_reply = board.clone();
                let reply_undo = board.make_move(&reply);
                board.unmake_move(&reply, &reply_undo);
                assert_eq!(board, before_reply, "{} {} on {}", mv, reply, fen);
            }

            board.unmake_move(&mv, &undo);
            assert_eq!(board, original, "{} on {}", mv, fen);
            assert_eq!(board.to_fen(), fen);
            assert_eq!(keys.hash(&board), original_hash);
        }
    }
}

#[test]
fn test_generated_moves_never_leave_king_in_check() {
    let generator = MoveGenerator::new();
    for fen in [KIWIPETE, ENDGAME, PROMOTIONS] {
        let board = Board::from_fen(fen).unwrap();
        let us = board.side_to_move;
        for mv in generator.generate_moves(&board) {
            let mut after = board.clone();
            after.make_move(&mv);
            assert!(!generator.is_king_in_check(&after, us), "{} on {}", mv, fen);
            assert_eq!(after.side_to_move, us.opposite());
        }
    }
}
