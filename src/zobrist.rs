use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{Board, Color, Piece};

const ZOBRIST_SEED: u64 = 0x6775_6178_696E_696D;

/// Random keys for hashing whole positions. Keys are seeded so
/// hashes are stable across runs.
pub struct ZobristKeys {
    piece_keys: [[[u64; 64]; 6]; 2],
    side_key: u64,
    castling_keys: [u64; 16],
    en_passant_keys: [u64; 8],
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl ZobristKeys {
    pub fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
        let mut piece_keys = [[[0u64; 64]; 6]; 2];
        for color in piece_keys.iter_mut() {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }
        let side_key = rng.gen();
        let mut castling_keys = [0u64; 16];
        for key in castling_keys.iter_mut() {
            *key = rng.gen();
        }
        let mut en_passant_keys = [0u64; 8];
        for key in en_passant_keys.iter_mut() {
            *key = rng.gen();
        }

        Self {
            piece_keys,
            side_key,
            castling_keys,
            en_passant_keys,
        }
    }

    /// Hash of everything that matters for repetition: placement, side,
    /// castling rights and en passant file. Move counters are excluded.
    pub fn hash(&self, board: &Board) -> u64 {
        let mut hash = 0u64;
        for color in [Color::White, Color::Black] {
            for piece in Piece::ALL {
                let mut bb = board.piece_bb(color, piece);
                while bb != 0 {
                    let square = bb.trailing_zeros() as usize;
                    hash ^= self.piece_keys[color.index()][piece.index()][square];
                    bb &= bb - 1;
                }
            }
        }
        if board.side_to_move == Color::Black {
            hash ^= self.side_key;
        }
        hash ^= self.castling_keys[(board.castling_rights & 0b1111) as usize];
        if let Some(square) = board.en_passant_square {
            hash ^= self.en_passant_keys[(square % 8) as usize];
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::Move;

    #[test]
    fn test_hash_is_deterministic() {
        let board = Board::new();
        assert_eq!(ZobristKeys::new().hash(&board), ZobristKeys::new().hash(&board));
    }

    #[test]
    fn test_transposition_hashes_equal() {
        let keys = ZobristKeys::new();
        let mut a = Board::new();
        a.make_move(&Move::new(6, 21, Piece::Knight));
        a.make_move(&Move::new(62, 45, Piece::Knight));
        a.make_move(&Move::new(1, 18, Piece::Knight));

        let mut b = Board::new();
        b.make_move(&Move::new(1, 18, Piece::Knight));
        b.make_move(&Move::new(62, 45, Piece::Knight));
        b.make_move(&Move::new(6, 21, Piece::Knight));

        assert_eq!(keys.hash(&a), keys.hash(&b));
    }

    #[test]
    fn test_side_to_move_changes_hash() {
        let keys = ZobristKeys::new();
        let white = Board::new();
        let mut black = Board::new();
        black.side_to_move = Color::Black;
        assert_ne!(keys.hash(&white), keys.hash(&black));
    }
}
