use std::fmt;

use crate::board::{
    square_name, Board, Color, Piece, BLACK_KINGSIDE, BLACK_QUEENSIDE, WHITE_KINGSIDE,
    WHITE_QUEENSIDE,
};
use crate::error::{ChessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Normal,
    Castle,
    EnPassant,
    Promotion,
}

/// A move relative to the position it was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub piece: Piece,
    pub captured_piece: Option<Piece>,
    pub promotion: Option<Piece>,
    pub kind: MoveKind,
}

impl Move {
    pub fn new(from: u8, to: u8, piece: Piece) -> Self {
        Self {
            from,
            to,
            piece,
            captured_piece: None,
            promotion: None,
            kind: MoveKind::Normal,
        }
    }

    pub fn new_capture(from: u8, to: u8, piece: Piece, captured_piece: Piece) -> Self {
        Self {
            captured_piece: Some(captured_piece),
            ..Self::new(from, to, piece)
        }
    }

    pub fn new_en_passant(from: u8, to: u8) -> Self {
        Self {
            captured_piece: Some(Piece::Pawn),
            kind: MoveKind::EnPassant,
            ..Self::new(from, to, Piece::Pawn)
        }
    }

    pub fn new_castling(from: u8, to: u8) -> Self {
        Self {
            kind: MoveKind::Castle,
            ..Self::new(from, to, Piece::King)
        }
    }

    pub fn new_promotion(from: u8, to: u8, promotion: Piece, captured_piece: Option<Piece>) -> Self {
        Self {
            captured_piece,
            promotion: Some(promotion),
            kind: MoveKind::Promotion,
            ..Self::new(from, to, Piece::Pawn)
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }

    /// Rook source and destination squares for a castling move.
    pub fn castling_rook(&self) -> Option<(u8, u8)> {
        if self.kind != MoveKind::Castle {
            return None;
        }
        match self.to {
            6 => Some((7, 5)),
            2 => Some((0, 3)),
            62 => Some((63, 61)),
            58 => Some((56, 59)),
            _ => None,
        }
    }

    pub fn to_uci(&self) -> String {
        let mut text = format!("{}{}", square_name(self.from), square_name(self.to));
        if let Some(promotion) = self.promotion {
            text.push(promotion.to_char(Color::Black));
        }
        text
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn leaper_table(offsets: &[(i8, i8)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    for (square, attacks) in table.iter_mut().enumerate() {
        let rank = (square / 8) as i8;
        let file = (square % 8) as i8;
        for &(dr, df) in offsets {
            let r = rank + dr;
            let f = file + df;
            if (0..8).contains(&r) && (0..8).contains(&f) {
                *attacks |= 1u64 << (r * 8 + f);
            }
        }
    }
    table
}

fn slider_attacks(square: u8, occupied: u64, directions: &[(i8, i8)]) -> u64 {
    let mut attacks = 0u64;
    let rank = (square / 8) as i8;
    let file = (square % 8) as i8;
    for &(dr, df) in directions {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let target_mask = 1u64 << (r * 8 + f);
            attacks |= target_mask;
            if occupied & target_mask != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

fn squares(mut bb: u64) -> impl Iterator<Item = u8> {
    std::iter::from_fn(move || {
        if bb == 0 {
            None
        } else {
            let square = bb.trailing_zeros() as u8;
            bb &= bb - 1;
            Some(square)
        }
    })
}

pub struct MoveGenerator {
    knight_attacks: [u64; 64],
    king_attacks: [u64; 64],
}

impl Default for MoveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveGenerator {
    pub fn new() -> Self {
        Self {
            knight_attacks: leaper_table(&KNIGHT_OFFSETS),
            king_attacks: leaper_table(&KING_OFFSETS),
        }
    }

    pub fn bishop_attacks(&self, square: u8, occupied: u64) -> u64 {
        slider_attacks(square, occupied, &DIAGONALS)
    }

    pub fn rook_attacks(&self, square: u8, occupied: u64) -> u64 {
        slider_attacks(square, occupied, &ORTHOGONALS)
    }

    fn pawn_attacks(&self, square: u8, color: Color) -> u64 {
        let bb = 1u64 << square;
        let not_a_file = 0xFEFEFEFEFEFEFEFEu64;
        let not_h_file = 0x7F7F7F7F7F7F7F7Fu64;
        match color {
            Color::White => ((bb << 7) & not_h_file) | ((bb << 9) & not_a_file),
            Color::Black => ((bb >> 9) & not_h_file) | ((bb >> 7) & not_a_file),
        }
    }

    /// Squares attacked by the piece on `square` given the occupancy.
    pub fn attacks_from(&self, piece: Piece, color: Color, square: u8, occupied: u64) -> u64 {
        match piece {
            Piece::Pawn => self.pawn_attacks(square, color),
            Piece::Knight => self.knight_attacks[square as usize],
            Piece::Bishop => self.bishop_attacks(square, occupied),
            Piece::Rook => self.rook_attacks(square, occupied),
            Piece::Queen => self.bishop_attacks(square, occupied) | self.rook_attacks(square, occupied),
            Piece::King => self.king_attacks[square as usize],
        }
    }

    pub fn is_square_under_attack(&self, board: &Board, square: u8, attacker_color: Color) -> bool {
        let attackers = board.pieces(attacker_color);
        let occupied = board.occupied();

        // A pawn of the attacker attacks `square` iff a defender pawn on
        // `square` would attack that pawn.
        if self.pawn_attacks(square, attacker_color.opposite()) & attackers[Piece::Pawn.index()] != 0 {
            return true;
        }
        if self.knight_attacks[square as usize] & attackers[Piece::Knight.index()] != 0 {
            return true;
        }
        if self.king_attacks[square as usize] & attackers[Piece::King.index()] != 0 {
            return true;
        }
        let queens = attackers[Piece::Queen.index()];
        if self.bishop_attacks(square, occupied) & (attackers[Piece::Bishop.index()] | queens) != 0 {
            return true;
        }
        self.rook_attacks(square, occupied) & (attackers[Piece::Rook.index()] | queens) != 0
    }

    pub fn is_king_in_check(&self, board: &Board, color: Color) -> bool {
        match board.king_square(color) {
            Some(square) => self.is_square_under_attack(board, square, color.opposite()),
            None => false,
        }
    }

    /// Moves that obey piece movement rules but may leave the mover's king attacked.
    pub fn generate_pseudo_legal(&self, board: &Board) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        let us = board.side_to_move;
        let own = board.occupancy(us);
        let occupied = board.occupied();

        self.generate_pawn_moves(board, &mut moves);

        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King] {
            for from in squares(board.piece_bb(us, piece)) {
                let targets = self.attacks_from(piece, us, from, occupied) & !own;
                for to in squares(targets) {
                    moves.push(match board.get_piece_at(to) {
                        Some((captured, _)) => Move::new_capture(from, to, piece, captured),
                        None => Move::new(from, to, piece),
                    });
                }
            }
        }

        self.generate_castling_moves(board, &mut moves);
        moves
    }

    fn generate_pawn_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let us = board.side_to_move;
        let them = us.opposite();
        let occupied = board.occupied();
        let enemies = board.occupancy(them);
        let (forward, start_rank, promotion_rank): (i8, u8, u8) = match us {
            Color::White => (8, 1, 7),
            Color::Black => (-8, 6, 0),
        };

        for from in squares(board.piece_bb(us, Piece::Pawn)) {
            let push = (from as i8 + forward) as u8;
            if occupied & (1u64 << push) == 0 {
                if push / 8 == promotion_rank {
                    for promotion in Piece::PROMOTIONS {
                        moves.push(Move::new_promotion(from, push, promotion, None));
                    }
                } else {
                    moves.push(Move::new(from, push, Piece::Pawn));
                    let double = (push as i8 + forward) as u8;
                    if from / 8 == start_rank && occupied & (1u64 << double) == 0 {
                        moves.push(Move::new(from, double, Piece::Pawn));
                    }
                }
            }

            let attacks = self.pawn_attacks(from, us);
            for to in squares(attacks & enemies) {
                let captured = board.get_piece_at(to).map(|(piece, _)| piece);
                if to / 8 == promotion_rank {
                    for promotion in Piece::PROMOTIONS {
                        moves.push(Move::new_promotion(from, to, promotion, captured));
                    }
                } else if let Some(captured) = captured {
                    moves.push(Move::new_capture(from, to, Piece::Pawn, captured));
                }
            }

            if let Some(ep) = board.en_passant_square {
                if attacks & (1u64 << ep) != 0 {
                    moves.push(Move::new_en_passant(from, ep));
                }
            }
        }
    }

    fn generate_castling_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let us = board.side_to_move;
        let them = us.opposite();
        let occupied = board.occupied();
        let rooks = board.piece_bb(us, Piece::Rook);

        // (right, king from, king to, rook square, must be empty, must be safe)
        let candidates: [(u8, u8, u8, u8, u64, [u8; 3]); 2] = match us {
            Color::White => [
                (WHITE_KINGSIDE, 4, 6, 7, (1 << 5) | (1 << 6), [4, 5, 6]),
                (WHITE_QUEENSIDE, 4, 2, 0, (1 << 1) | (1 << 2) | (1 << 3), [4, 3, 2]),
            ],
            Color::Black => [
                (BLACK_KINGSIDE, 60, 62, 63, (1 << 61) | (1 << 62), [60, 61, 62]),
                (BLACK_QUEENSIDE, 60, 58, 56, (1 << 57) | (1 << 58) | (1 << 59), [60, 59, 58]),
            ],
        };

        for (right, from, to, rook_square, empty, safe) in candidates {
            if board.castling_rights & right != 0
                && board.piece_bb(us, Piece::King) & (1u64 << from) != 0
                && rooks & (1u64 << rook_square) != 0
                && occupied & empty == 0
                && safe.iter().all(|&sq| !self.is_square_under_attack(board, sq, them))
            {
                moves.push(Move::new_castling(from, to));
            }
        }
    }

    /// All legal moves of the side to move, in generation order.
    pub fn generate_moves(&self, board: &Board) -> Vec<Move> {
        let us = board.side_to_move;
        let mut scratch = board.clone();
        self.generate_pseudo_legal(board)
            .into_iter()
            .filter(|mv| {
                let undo = scratch.make_move(mv);
                let legal = !self.is_king_in_check(&scratch, us);
                scratch.unmake_move(mv, &undo);
                legal
            })
            .collect()
    }

    /// Stops at the first legal move instead of building the full list.
    pub fn has_legal_move(&self, board: &Board) -> bool {
        let us = board.side_to_move;
        let mut scratch = board.clone();
        self.generate_pseudo_legal(board).iter().any(|mv| {
            let undo = scratch.make_move(mv);
            let legal = !self.is_king_in_check(&scratch, us);
            scratch.unmake_move(mv, &undo);
            legal
        })
    }

    pub fn is_move_valid(&self, board: &Board, mv: &Move) -> bool {
        self.generate_moves(board).contains(mv)
    }

    /// Resolves UCI text such as `e2e4` or `e7e8q` against the legal moves.
    pub fn parse_uci(&self, board: &Board, text: &str) -> Result<Move> {
        let text = text.trim();
        if text.len() != 4 && text.len() != 5 {
            return Err(ChessError::InvalidMoveNotation(text.to_string()));
        }
        let from = text
            .get(0..2)
            .and_then(crate::board::parse_square)
            .ok_or_else(|| ChessError::InvalidMoveNotation(text.to_string()))?;
        let to = text
            .get(2..4)
            .and_then(crate::board::parse_square)
            .ok_or_else(|| ChessError::InvalidMoveNotation(text.to_string()))?;
        let promotion = match text.get(4..) {
            None | Some("") => None,
            Some(p) => match p.chars().next().and_then(Piece::from_char) {
                Some((piece, _)) if Piece::PROMOTIONS.contains(&piece) => Some(piece),
                _ => return Err(ChessError::InvalidMoveNotation(text.to_string())),
            },
        };

        self.generate_moves(board)
            .into_iter()
            .find(|mv| mv.from == from && mv.to == to && mv.promotion == promotion)
            .ok_or_else(|| ChessError::IllegalMove { mv: text.to_string() })
    }
}

/// Counts leaf nodes of the legal move tree to `depth`.
pub fn perft(generator: &MoveGenerator, board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generator.generate_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves {
        let undo = board.make_move(&mv);
        nodes += perft(generator, board, depth - 1);
        board.unmake_move(&mv, &undo);
    }
    nodes
}

/// Per-root-move perft counts, useful for locating generator bugs.
pub fn perft_divide(generator: &MoveGenerator, board: &mut Board, depth: u32) -> Vec<(Move, u64)> {
    let mut counts = Vec::new();
    for mv in generator.generate_moves(board) {
        let undo = board.make_move(&mv);
        let nodes = perft(generator, board, depth.saturating_sub(1));
        board.unmake_move(&mv, &undo);
        counts.push((mv, nodes));
    }
    counts
}
