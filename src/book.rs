//! Opening book keyed by the sequence of moves played from the initial
//! position.
//!
//! The on-disk format is a JSON object whose keys are space separated UCI
//! move sequences (the empty string is the initial position) and whose
//! values are either a single UCI move or a list of candidates:
//!
//! ```json
//! { "": ["e2e4", "d2d4"], "e2e4": "c7c5", "e2e4 c7c5": ["g1f3"] }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::board::Board;
use crate::error::Result;
use crate::movegen::{Move, MoveGenerator};

#[derive(Deserialize)]
#[serde(untagged)]
enum Candidates {
    One(String),
    Many(Vec<String>),
}

/// Immutable after construction.
pub struct OpeningBook {
    entries: HashMap<String, Vec<String>>,
    move_generator: MoveGenerator,
}

fn normalize_key(key: &str) -> String {
    key.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn history_key(history: &[Move]) -> String {
    history.iter().map(Move::to_uci).collect::<Vec<_>>().join(" ")
}

impl OpeningBook {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            move_generator: MoveGenerator::new(),
        }
    }

    pub fn from_json(json_str: &str) -> Result<Self> {
        let raw: HashMap<String, Candidates> = serde_json::from_str(json_str)?;
        let entries: HashMap<String, Vec<String>> = raw
            .into_iter()
            .map(|(key, candidates)| {
                let moves = match candidates {
                    Candidates::One(mv) => vec![mv],
                    Candidates::Many(moves) => moves,
                };
                (normalize_key(&key), moves)
            })
            .collect();
        debug!(positions = entries.len(), "opening book loaded");
        Ok(Self {
            entries,
            move_generator: MoveGenerator::new(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw candidate text for a history, without legality checks.
    pub fn candidates(&self, history: &[Move]) -> &[String] {
        self.entries
            .get(&history_key(history))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First legal book move for the position reached by `history` from
    /// the initial position.
    pub fn lookup(&self, history: &[Move]) -> Option<Move> {
        self.legal_candidates(history).into_iter().next()
    }

    /// Like `lookup`, but picks uniformly among the legal candidates.
    pub fn lookup_with<R: Rng + ?Sized>(&self, history: &[Move], rng: &mut R) -> Option<Move> {
        self.legal_candidates(history).choose(rng).copied()
    }

    fn legal_candidates(&self, history: &[Move]) -> Vec<Move> {
        let candidates = self.candidates(history);
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut board = Board::new();
        for mv in history {
            if !self.move_generator.is_move_valid(&board, mv) {
                return Vec::new();
            }
            board.make_move(mv);
        }

        candidates
            .iter()
            .filter_map(|text| match self.move_generator.parse_uci(&board, text) {
                Ok(mv) => Some(mv),
                Err(err) => {
                    warn!(candidate = %text, history = %history_key(history), error = %err, "skipping bad book entry");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const BOOK: &str = r#"{
        "": ["e2e4", "d2d4"],
        "e2e4": "c7c5",
        "e2e4  c7c5": ["g1f3", "e2e5"]
    }"#;

    fn play(texts: &[&str]) -> Vec<Move> {
        let generator = MoveGenerator::new();
        let mut board = Board::new();
        texts
            .iter()
            .map(|text| {
                let mv = generator.parse_uci(&board, text).unwrap();
                board.make_move(&mv);
                mv
            })
            .collect()
    }

    #[test]
    fn test_lookup_initial_position() {
        let book = OpeningBook::from_json(BOOK).unwrap();
        assert_eq!(book.len(), 3);
        assert_eq!(book.lookup(&[]).unwrap().to_uci(), "e2e4");
    }

    #[test]
    fn test_single_string_entry() {
        let book = OpeningBook::from_json(BOOK).unwrap();
        assert_eq!(book.lookup(&play(&["e2e4"])).unwrap().to_uci(), "c7c5");
    }

    #[test]
    fn test_illegal_candidates_skipped() {
        let book = OpeningBook::from_json(BOOK).unwrap();
        let history = play(&["e2e4", "c7c5"]);
        assert_eq!(book.candidates(&history).len(), 2);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(book.lookup_with(&history, &mut rng).unwrap().to_uci(), "g1f3");
        }
    }

    #[test]
    fn test_out_of_book_returns_none() {
        let book = OpeningBook::from_json(BOOK).unwrap();
        assert!(book.lookup(&play(&["d2d4"])).is_none());
        assert!(OpeningBook::empty().lookup(&[]).is_none());
    }

    #[test]
    fn test_random_choice_stays_within_candidates() {
        let book = OpeningBook::from_json(BOOK).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let mv = book.lookup_with(&[], &mut rng).unwrap().to_uci();
            assert!(mv == "e2e4" || mv == "d2d4");
        }
    }
}
