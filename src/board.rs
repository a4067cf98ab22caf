use std::fmt;

use crate::error::{ChessError, Result};
use crate::movegen::{Move, MoveGenerator, MoveKind};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// Castling right bits, KQkq.
pub const WHITE_KINGSIDE: u8 = 0b0001;
pub const WHITE_QUEENSIDE: u8 = 0b0010;
pub const BLACK_KINGSIDE: u8 = 0b0100;
pub const BLACK_QUEENSIDE: u8 = 0b1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    pub const ALL: [Piece; 6] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    pub const PROMOTIONS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn to_char(self, color: Color) -> char {
        let c = match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_char(c: char) -> Option<(Piece, Color)> {
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        let piece = match c.to_ascii_lowercase() {
            'p' => Piece::Pawn,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'r' => Piece::Rook,
            'q' => Piece::Queen,
            'k' => Piece::King,
            _ => return None,
        };
        Some((piece, color))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

pub fn square_name(square: u8) -> String {
    let file = (b'a' + square % 8) as char;
    let rank = (b'1' + square / 8) as char;
    format!("{}{}", file, rank)
}

pub fn parse_square(text: &str) -> Option<u8> {
    let bytes = text.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let file = bytes[0].checked_sub(b'a').filter(|f| *f < 8)?;
    let rank = bytes[1].checked_sub(b'1').filter(|r| *r < 8)?;
    Some(rank * 8 + file)
}

/// State that a move destroys and that cannot be recomputed from the move itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoInfo {
    pub captured_piece: Option<Piece>,
    pub castling_rights: u8,
    pub en_passant_square: Option<u8>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

/// Castling rights surviving a move that touches the given square.
fn castling_mask(square: u8) -> u8 {
    match square {
        0 => !WHITE_QUEENSIDE,
        4 => !(WHITE_KINGSIDE | WHITE_QUEENSIDE),
        7 => !WHITE_KINGSIDE,
        56 => !BLACK_QUEENSIDE,
        60 => !(BLACK_KINGSIDE | BLACK_QUEENSIDE),
        63 => !BLACK_KINGSIDE,
        _ => 0b1111,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    pub white_pieces: [u64; 6], // Pawn, Knight, Bishop, Rook, Queen, King
    pub black_pieces: [u64; 6], // Pawn, Knight, Bishop, Rook, Queen, King
    pub side_to_move: Color,
    pub castling_rights: u8, // 4 bits: KQkq
    pub en_passant_square: Option<u8>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            white_pieces: [
                0x000000000000FF00, // Pawns
                0x0000000000000042, // Knights
                0x0000000000000024, // Bishops
                0x0000000000000081, // Rooks
                0x0000000000000008, // Queen
                0x0000000000000010, // King
            ],
            black_pieces: [
                0x00FF000000000000, // Pawns
                0x4200000000000000, // Knights
                0x2400000000000000, // Bishops
                0x8100000000000000, // Rooks
                0x0800000000000000, // Queen
                0x1000000000000000, // King
            ],
            side_to_move: Color::White,
            castling_rights: 0b1111,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// A board with no pieces, white to move and no castling rights.
    pub fn empty() -> Self {
        Self {
            white_pieces: [0; 6],
            black_pieces: [0; 6],
            side_to_move: Color::White,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn pieces(&self, color: Color) -> &[u64; 6] {
        match color {
            Color::White => &self.white_pieces,
            Color::Black => &self.black_pieces,
        }
    }

    fn pieces_mut(&mut self, color: Color) -> &mut [u64; 6] {
        match color {
            Color::White => &mut self.white_pieces,
            Color::Black => &mut self.black_pieces,
        }
    }

    pub fn piece_bb(&self, color: Color, piece: Piece) -> u64 {
        self.pieces(color)[piece.index()]
    }

    pub fn occupancy(&self, color: Color) -> u64 {
        self.pieces(color).iter().fold(0, |acc, bb| acc | bb)
    }

    pub fn occupied(&self) -> u64 {
        self.occupancy(Color::White) | self.occupancy(Color::Black)
    }

    pub fn king_square(&self, color: Color) -> Option<u8> {
        let king = self.piece_bb(color, Piece::King);
        if king == 0 {
            None
        } else {
            Some(king.trailing_zeros() as u8)
        }
    }

    pub fn put_piece(&mut self, square: u8, piece: Piece, color: Color) {
        let mask = 1u64 << square;
        for bb in self.white_pieces.iter_mut().chain(self.black_pieces.iter_mut()) {
            *bb &= !mask;
        }
        self.pieces_mut(color)[piece.index()] |= mask;
    }

    pub fn get_piece_at(&self, square: u8) -> Option<(Piece, Color)> {
        let mask = 1u64 << square;
        for color in [Color::White, Color::Black] {
            for piece in Piece::ALL {
                if self.piece_bb(color, piece) & mask != 0 {
                    return Some((piece, color));
                }
            }
        }
        None
    }

    /// Applies a move generated for this position. Returns the metadata
    /// `unmake_move` needs to restore the position exactly.
    pub fn make_move(&mut self, mv: &Move) -> UndoInfo {
        let undo = UndoInfo {
            captured_piece: mv.captured_piece,
            castling_rights: self.castling_rights,
            en_passant_square: self.en_passant_square,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        };

        let us = self.side_to_move;
        let them = us.opposite();
        let from_mask = 1u64 << mv.from;
        let to_mask = 1u64 << mv.to;

        if let Some(captured) = mv.captured_piece {
            let captured_square = if mv.kind == MoveKind::EnPassant {
                match us {
                    Color::White => mv.to - 8,
                    Color::Black => mv.to + 8,
                }
            } else {
                mv.to
            };
            self.pieces_mut(them)[captured.index()] &= !(1u64 << captured_square);
        }

        let placed = mv.promotion.unwrap_or(mv.piece);
        let pieces = self.pieces_mut(us);
        pieces[mv.piece.index()] &= !from_mask;
        pieces[placed.index()] |= to_mask;

        if let Some((rook_from, rook_to)) = mv.castling_rook() {
            pieces[Piece::Rook.index()] &= !(1u64 << rook_from);
            pieces[Piece::Rook.index()] |= 1u64 << rook_to;
        }

        self.castling_rights &= castling_mask(mv.from) & castling_mask(mv.to);

        self.en_passant_square = if mv.piece == Piece::Pawn && mv.from.abs_diff(mv.to) == 16 {
            Some((mv.from + mv.to) / 2)
        } else {
            None
        };

        if mv.piece == Piece::Pawn || mv.captured_piece.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = them;
        undo
    }

    /// Reverts `mv`, which must be the last move applied to this board.
    pub fn unmake_move(&mut self, mv: &Move, undo: &UndoInfo) {
        let us = self.side_to_move.opposite();
        let them = self.side_to_move;
        let from_mask = 1u64 << mv.from;
        let to_mask = 1u64 << mv.to;

        let placed = mv.promotion.unwrap_or(mv.piece);
        let pieces = self.pieces_mut(us);
        pieces[placed.index()] &= !to_mask;
        pieces[mv.piece.index()] |= from_mask;

        if let Some((rook_from, rook_to)) = mv.castling_rook() {
            pieces[Piece::Rook.index()] &= !(1u64 << rook_to);
            pieces[Piece::Rook.index()] |= 1u64 << rook_from;
        }

        if let Some(captured) = undo.captured_piece {
            let captured_square = if mv.kind == MoveKind::EnPassant {
                match us {
                    Color::White => mv.to - 8,
                    Color::Black => mv.to + 8,
                }
            } else {
                mv.to
            };
            self.pieces_mut(them)[captured.index()] |= 1u64 << captured_square;
        }

        self.fullmove_number = undo.fullmove_number;
        self.castling_rights = undo.castling_rights;
        self.en_passant_square = undo.en_passant_square;
        self.halfmove_clock = undo.halfmove_clock;
        self.side_to_move = us;
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 4 && fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 4 or 6 fields, found {}",
                fields.len()
            )));
        }

        let mut board = Board::empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidFen(format!("expected 8 ranks in '{}'", fields[0])));
        }
        for (i, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if skip == 0 || file as u32 + skip > 8 {
                        return Err(ChessError::InvalidFen(format!("rank '{}' is too long", rank_text)));
                    }
                    file += skip as u8;
                } else {
                    let (piece, color) = Piece::from_char(c)
                        .ok_or_else(|| ChessError::InvalidFen(format!("unknown piece '{}'", c)))?;
                    if file >= 8 {
                        return Err(ChessError::InvalidFen(format!("rank '{}' is too long", rank_text)));
                    }
                    board.put_piece(rank * 8 + file, piece, color);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(ChessError::InvalidFen(format!("rank '{}' does not cover 8 files", rank_text)));
            }
        }

        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(ChessError::InvalidFen(format!("bad side to move '{}'", other))),
        };

        if fields[2] != "-" {
            for c in fields[2].chars() {
                board.castling_rights |= match c {
                    'K' => WHITE_KINGSIDE,
                    'Q' => WHITE_QUEENSIDE,
                    'k' => BLACK_KINGSIDE,
                    'q' => BLACK_QUEENSIDE,
                    _ => return Err(ChessError::InvalidFen(format!("bad castling field '{}'", fields[2]))),
                };
            }
        }

        board.en_passant_square = match fields[3] {
            "-" => None,
            text => Some(
                parse_square(text)
                    .ok_or_else(|| ChessError::InvalidFen(format!("bad en passant square '{}'", text)))?,
            ),
        };

        if fields.len() == 6 {
            board.halfmove_clock = fields[4]
                .parse()
                .map_err(|_| ChessError::InvalidFen(format!("bad halfmove clock '{}'", fields[4])))?;
            board.fullmove_number = fields[5]
                .parse()
                .map_err(|_| ChessError::InvalidFen(format!("bad fullmove number '{}'", fields[5])))?;
        }

        board.validate()?;
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.get_piece_at(rank * 8 + file) {
                    Some((piece, color)) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.to_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            for (bit, c) in [
                (WHITE_KINGSIDE, 'K'),
                (WHITE_QUEENSIDE, 'Q'),
                (BLACK_KINGSIDE, 'k'),
                (BLACK_QUEENSIDE, 'q'),
            ] {
                if self.castling_rights & bit != 0 {
                    fen.push(c);
                }
            }
        }

        fen.push(' ');
        match self.en_passant_square {
            Some(square) => fen.push_str(&square_name(square)),
            None => fen.push('-'),
        }

        format!("{} {} {}", fen, self.halfmove_clock, self.fullmove_number)
    }

    /// Checks the invariants every reachable position satisfies.
    pub fn validate(&self) -> Result<()> {
        for color in [Color::White, Color::Black] {
            let kings = self.piece_bb(color, Piece::King).count_ones();
            if kings != 1 {
                return Err(ChessError::InvalidPosition(format!("{} has {} kings", color, kings)));
            }
        }

        let total: u32 = self
            .white_pieces
            .iter()
            .chain(self.black_pieces.iter())
            .map(|bb| bb.count_ones())
            .sum();
        if total != self.occupied().count_ones() {
            return Err(ChessError::InvalidPosition("two pieces share a square".to_string()));
        }

        let back_ranks = 0xFF000000000000FFu64;
        if (self.white_pieces[0] | self.black_pieces[0]) & back_ranks != 0 {
            return Err(ChessError::InvalidPosition("pawn on the first or last rank".to_string()));
        }

        for (bit, king_square, rook_square, color) in [
            (WHITE_KINGSIDE, 4, 7, Color::White),
            (WHITE_QUEENSIDE, 4, 0, Color::White),
            (BLACK_KINGSIDE, 60, 63, Color::Black),
            (BLACK_QUEENSIDE, 60, 56, Color::Black),
        ] {
            if self.castling_rights & bit != 0
                && (self.piece_bb(color, Piece::King) & (1u64 << king_square) == 0
                    || self.piece_bb(color, Piece::Rook) & (1u64 << rook_square) == 0)
            {
                return Err(ChessError::InvalidPosition(format!(
                    "castling right without king and rook on their home squares for {}",
                    color
                )));
            }
        }

        if let Some(square) = self.en_passant_square {
            // (target rank, square of the pawn that just moved, its start square)
            let (expected_rank, pawn_square, start_square) = match self.side_to_move {
                Color::White => (5, square.wrapping_sub(8), square.wrapping_add(8)),
                Color::Black => (2, square.wrapping_add(8), square.wrapping_sub(8)),
            };
            if square / 8 != expected_rank {
                return Err(ChessError::InvalidPosition(format!(
                    "en passant square {} on the wrong rank",
                    square_name(square)
                )));
            }
            let mover = self.side_to_move.opposite();
            let occupied = self.occupied();
            if self.piece_bb(mover, Piece::Pawn) & (1u64 << pawn_square) == 0
                || occupied & ((1u64 << square) | (1u64 << start_square)) != 0
            {
                return Err(ChessError::InvalidPosition(format!(
                    "en passant square {} without a pawn that just double pushed",
                    square_name(square)
                )));
            }
        }

        let generator = MoveGenerator::new();
        if generator.is_king_in_check(self, self.side_to_move.opposite()) {
            return Err(ChessError::InvalidPosition(
                "the side not to move is in check".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let c = match self.get_piece_at(rank * 8 + file) {
                    Some((piece, color)) => piece.to_char(color),
                    None => '.',
                };
                write!(f, "{}", c)?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}
