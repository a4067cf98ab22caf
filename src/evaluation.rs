use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Piece};
use crate::movegen::MoveGenerator;

// Piece-square tables, written from white's point of view with rank 8 in
// the first row. Black squares are mirrored vertically.
const PAWN_TABLE: [[i32; 8]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [50, 50, 50, 50, 50, 50, 50, 50],
    [10, 10, 20, 30, 30, 20, 10, 10],
    [5, 5, 10, 25, 25, 10, 5, 5],
    [0, 0, 0, 20, 20, 0, 0, 0],
    [5, -5, -10, 0, 0, -10, -5, 5],
    [5, 10, 10, -20, -20, 10, 10, 5],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

const KNIGHT_TABLE: [[i32; 8]; 8] = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20, 0, 0, 0, 0, -20, -40],
    [-30, 0, 10, 15, 15, 10, 0, -30],
    [-30, 5, 15, 20, 20, 15, 5, -30],
    [-30, 0, 15, 20, 20, 15, 0, -30],
    [-30, 5, 10, 15, 15, 10, 5, -30],
    [-40, -20, 0, 5, 5, 0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

const BISHOP_TABLE: [[i32; 8]; 8] = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-10, 0, 5, 10, 10, 5, 0, -10],
    [-10, 5, 5, 10, 10, 5, 5, -10],
    [-10, 0, 10, 10, 10, 10, 0, -10],
    [-10, 10, 10, 10, 10, 10, 10, -10],
    [-10, 5, 0, 0, 0, 0, 5, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

const ROOK_TABLE: [[i32; 8]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [5, 10, 10, 10, 10, 10, 10, 5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [0, 0, 0, 5, 5, 0, 0, 0],
];

const QUEEN_TABLE: [[i32; 8]; 8] = [
    [-20, -10, -10, -5, -5, -10, -10, -20],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-10, 0, 5, 5, 5, 5, 0, -10],
    [-5, 0, 5, 5, 5, 5, 0, -5],
    [0, 0, 5, 5, 5, 5, 0, -5],
    [-10, 5, 5, 5, 5, 5, 0, -10],
    [-10, 0, 5, 0, 0, 0, 0, -10],
    [-20, -10, -10, -5, -5, -10, -10, -20],
];

const KING_TABLE: [[i32; 8]; 8] = [
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-20, -30, -30, -40, -40, -30, -30, -20],
    [-10, -20, -20, -20, -20, -20, -20, -10],
    [20, 20, 0, 0, 0, 0, 20, 20],
    [20, 30, 10, 0, 0, 10, 30, 20],
];

const KING_ENDGAME_TABLE: [[i32; 8]; 8] = [
    [-50, -40, -30, -20, -20, -30, -40, -50],
    [-30, -20, -10, 0, 0, -10, -20, -30],
    [-30, -10, 20, 30, 30, 20, -10, -30],
    [-30, -10, 30, 40, 40, 30, -10, -30],
    [-30, -10, 30, 40, 40, 30, -10, -30],
    [-30, -10, 20, 30, 30, 20, -10, -30],
    [-30, -30, 0, 0, 0, 0, -30, -30],
    [-50, -30, -30, -30, -30, -30, -30, -50],
];

const FILE_MASK: u64 = 0x0101010101010101;

/// Tunable evaluation weights in centipawns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,

    pub knight_mobility_weight: i32,
    pub bishop_mobility_weight: i32,
    pub rook_mobility_weight: i32,
    pub queen_mobility_weight: i32,

    pub doubled_pawn_penalty: i32,
    pub isolated_pawn_penalty: i32,
    pub passed_pawn_bonus: i32,

    pub pawn_shield_bonus: i32,
    pub open_file_penalty: i32,
    pub semi_open_file_penalty: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 320,
            bishop_value: 330,
            rook_value: 500,
            queen_value: 900,

            knight_mobility_weight: 4,
            bishop_mobility_weight: 3,
            rook_mobility_weight: 2,
            queen_mobility_weight: 1,

            doubled_pawn_penalty: -10,
            isolated_pawn_penalty: -20,
            passed_pawn_bonus: 20,

            pawn_shield_bonus: 5,
            open_file_penalty: -15,
            semi_open_file_penalty: -10,
        }
    }
}

/// Static evaluation. A pure function of the board: positive scores favour
/// the side to move.
pub struct Evaluator {
    weights: EvalWeights,
    move_generator: MoveGenerator,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvalWeights::default())
    }
}

impl Evaluator {
    pub fn new(weights: EvalWeights) -> Self {
        Self {
            weights,
            move_generator: MoveGenerator::new(),
        }
    }

    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    /// Material value of a piece. The king gets a large sentinel so that
    /// capture ordering never prefers trading it.
    pub fn piece_value(&self, piece: Piece) -> i32 {
        match piece {
            Piece::Pawn => self.weights.pawn_value,
            Piece::Knight => self.weights.knight_value,
            Piece::Bishop => self.weights.bishop_value,
            Piece::Rook => self.weights.rook_value,
            Piece::Queen => self.weights.queen_value,
            Piece::King => 20_000,
        }
    }

    pub fn evaluate(&self, board: &Board) -> i32 {
        let white = self.evaluate_side(board, Color::White);
        let black = self.evaluate_side(board, Color::Black);
        match board.side_to_move {
            Color::White => white - black,
            Color::Black => black - white,
        }
    }

    fn evaluate_side(&self, board: &Board, color: Color) -> i32 {
        let endgame = self.is_endgame(board);
        let mut score = 0;
        for piece in Piece::ALL {
            let mut bb = board.piece_bb(color, piece);
            while bb != 0 {
                let square = bb.trailing_zeros() as u8;
                bb &= bb - 1;
                if piece != Piece::King {
                    score += self.piece_value(piece);
                }
                score += piece_square_bonus(piece, color, square, endgame);
            }
        }
        score + self.mobility(board, color) + self.pawn_structure(board, color) + self.king_safety(board, color)
    }

    fn is_endgame(&self, board: &Board) -> bool {
        let majors: u32 = [Color::White, Color::Black]
            .iter()
            .map(|&c| (board.piece_bb(c, Piece::Rook) | board.piece_bb(c, Piece::Queen)).count_ones())
            .sum();
        majors <= 2
    }

    fn mobility(&self, board: &Board, color: Color) -> i32 {
        let own = board.occupancy(color);
        let occupied = board.occupied();
        let weighted = [
            (Piece::Knight, self.weights.knight_mobility_weight),
            (Piece::Bishop, self.weights.bishop_mobility_weight),
            (Piece::Rook, self.weights.rook_mobility_weight),
            (Piece::Queen, self.weights.queen_mobility_weight),
        ];

        let mut score = 0;
        for (piece, weight) in weighted {
            let mut bb = board.piece_bb(color, piece);
            while bb != 0 {
                let square = bb.trailing_zeros() as u8;
                bb &= bb - 1;
                let reachable = self.move_generator.attacks_from(piece, color, square, occupied) & !own;
                score += reachable.count_ones() as i32 * weight;
            }
        }
        score
    }

    fn pawn_structure(&self, board: &Board, color: Color) -> i32 {
        let pawns = board.piece_bb(color, Piece::Pawn);
        let enemy_pawns = board.piece_bb(color.opposite(), Piece::Pawn);
        let mut score = 0;

        for file in 0..8 {
            let count = (pawns & (FILE_MASK << file)).count_ones() as i32;
            if count > 1 {
                score += self.weights.doubled_pawn_penalty * (count - 1);
            }
            if count > 0 && pawns & adjacent_files(file) == 0 {
                score += self.weights.isolated_pawn_penalty * count;
            }
        }

        let mut bb = pawns;
        while bb != 0 {
            let square = bb.trailing_zeros() as u8;
            bb &= bb - 1;
            let file = square % 8;
            let span = (FILE_MASK << file) | adjacent_files(file);
            if enemy_pawns & span & ranks_ahead(square / 8, color) == 0 {
                score += self.weights.passed_pawn_bonus;
            }
        }
        score
    }

    fn king_safety(&self, board: &Board, color: Color) -> i32 {
        let Some(king) = board.king_square(color) else {
            return 0;
        };
        let rank = king / 8;
        let file = king % 8;
        let own_pawns = board.piece_bb(color, Piece::Pawn);
        let enemy_pawns = board.piece_bb(color.opposite(), Piece::Pawn);
        let mut score = 0;

        let shield_rank = match color {
            Color::White if rank < 7 => Some(rank + 1),
            Color::Black if rank > 0 => Some(rank - 1),
            _ => None,
        };
        if let Some(shield_rank) = shield_rank {
            let shield_files = (FILE_MASK << file) | adjacent_files(file);
            let shield = shield_files & (0xFFu64 << (shield_rank * 8));
            score += (own_pawns & shield).count_ones() as i32 * self.weights.pawn_shield_bonus;
        }

        let king_file = FILE_MASK << file;
        if own_pawns & king_file == 0 {
            score += if enemy_pawns & king_file == 0 {
                self.weights.open_file_penalty
            } else {
                self.weights.semi_open_file_penalty
            };
        }
        score
    }
}

fn piece_square_bonus(piece: Piece, color: Color, square: u8, endgame: bool) -> i32 {
    let rank = (square / 8) as usize;
    let file = (square % 8) as usize;
    let row = match color {
        Color::White => 7 - rank,
        Color::Black => rank,
    };
    let table = match piece {
        Piece::Pawn => &PAWN_TABLE,
        Piece::Knight => &KNIGHT_TABLE,
        Piece::Bishop => &BISHOP_TABLE,
        Piece::Rook => &ROOK_TABLE,
        Piece::Queen => &QUEEN_TABLE,
        Piece::King if endgame => &KING_ENDGAME_TABLE,
        Piece::King => &KING_TABLE,
    };
    table[row][file]
}

fn adjacent_files(file: u8) -> u64 {
    let mut mask = 0;
    if file > 0 {
        mask |= FILE_MASK << (file - 1);
    }
    if file < 7 {
        mask |= FILE_MASK << (file + 1);
    }
    mask
}

/// Ranks strictly in front of `rank` from `color`'s point of view.
fn ranks_ahead(rank: u8, color: Color) -> u64 {
    match color {
        Color::White if rank < 7 => !0u64 << ((rank + 1) * 8),
        Color::Black if rank > 0 => !0u64 >> ((8 - rank) * 8),
        _ => 0,
    }
}
