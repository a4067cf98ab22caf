//! Line-oriented game loop: a human plays White by typing UCI moves and the
//! engine answers as Black unless both sides are human.

use std::io::{BufRead, Write};

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::book::OpeningBook;
use crate::board::Color;
use crate::config::Config;
use crate::error::{ChessError, Result};
use crate::game::GameState;
use crate::movegen::Move;
use crate::search::SearchEngine;

const HELP: &str = "commands: <uci move> | undo | board | fen | load <fen> | moves | new | go | help | quit";

pub struct InteractiveHarness {
    config: Config,
    game: GameState,
    engine: SearchEngine,
    book: Option<OpeningBook>,
    rng: Option<StdRng>,
}

impl InteractiveHarness {
    /// Builds the engine from `config` and loads the opening book it names.
    pub fn new(config: Config) -> Result<Self> {
        let engine = config.build_engine()?;
        let book = match &config.book_path {
            Some(path) => Some(OpeningBook::load(path)?),
            None => None,
        };
        Ok(Self {
            game: GameState::new(config.draw_rules),
            rng: config.book_seed.map(StdRng::seed_from_u64),
            config,
            engine,
            book,
        })
    }

    pub fn with_book(mut self, book: OpeningBook) -> Self {
        self.book = Some(book);
        self
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> anyhow::Result<()> {
        info!(
            pvp = self.config.pvp_on,
            algorithm = %self.config.algorithm,
            depth = self.config.depth,
            "game started"
        );
        writeln!(writer, "{}", self.game.board())?;

        for line in reader.lines() {
            let line = line.context("failed to read command")?;
            let command = line.trim();
            if command.is_empty() {
                continue;
            }
            if command == "quit" {
                break;
            }

            match self.handle_command(command) {
                Ok(response) => writeln!(writer, "{}", response)?,
                Err(err) => writeln!(writer, "error: {}", err)?,
            }
            writer.flush()?;
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }

        match parts[0] {
            "help" => Ok(HELP.to_string()),
            "board" => Ok(self.game.board().to_string()),
            "fen" => Ok(self.game.board().to_fen()),
            "moves" => Ok(self
                .game
                .legal_moves()
                .iter()
                .map(Move::to_uci)
                .collect::<Vec<_>>()
                .join(" ")),
            "new" => {
                self.game = GameState::new(self.config.draw_rules);
                Ok(self.game.board().to_string())
            }
            "load" => {
                self.game = GameState::from_fen(&parts[1..].join(" "), self.config.draw_rules)?;
                Ok(self.game.board().to_string())
            }
            "undo" => Ok(self.handle_undo()),
            "go" => {
                if self.config.pvp_on {
                    return Err(ChessError::Configuration(
                        "engine moves are disabled in player versus player mode".to_string(),
                    ));
                }
                let mv = self.engine_move()?;
                Ok(self.describe("engine plays", mv))
            }
            text => self.handle_player_move(text),
        }
    }

    fn handle_player_move(&mut self, text: &str) -> Result<String> {
        let mv = self.game.apply_uci(text)?;
        let mut response = self.describe("played", mv);

        let engine_to_move = !self.config.pvp_on && self.game.board().side_to_move == Color::Black;
        if engine_to_move && !self.game.status().is_over() {
            let reply = self.engine_move()?;
            response.push('\n');
            response.push_str(&self.describe("engine plays", reply));
        }
        Ok(response)
    }

    /// Takes back moves until a human is to move again.
    fn handle_undo(&mut self) -> String {
        let mut undone = Vec::new();
        while let Some(mv) = self.game.undo_move() {
            undone.push(mv.to_uci());
            if self.config.pvp_on || self.game.board().side_to_move == Color::White {
                break;
            }
        }
        if undone.is_empty() {
            "nothing to undo".to_string()
        } else {
            format!("undone {}", undone.join(" "))
        }
    }

    /// Plays the engine's move for the side to move: a book move while the
    /// game is still in book, otherwise the search result.
    pub fn engine_move(&mut self) -> Result<Move> {
        let status = self.game.status();
        if status.is_over() {
            return Err(ChessError::GameOver(status));
        }

        let mv = match self.book_move() {
            Some(mv) => {
                info!(mv = %mv, "book move");
                mv
            }
            None => {
                let result = self.engine.search(self.game.board(), self.config.depth)?;
                info!(
                    mv = %result.best_move,
                    score = result.score,
                    nodes = result.nodes,
                    "engine move"
                );
                result.best_move
            }
        };
        self.game.apply_move(mv)?;
        Ok(mv)
    }

    fn book_move(&mut self) -> Option<Move> {
        if !self.game.from_initial_position() {
            return None;
        }
        let book = self.book.as_ref()?;
        let history = self.game.move_history();
        match self.rng.as_mut() {
            Some(rng) => book.lookup_with(&history, rng),
            None => book.lookup(&history),
        }
    }

    fn describe(&self, prefix: &str, mv: Move) -> String {
        let status = self.game.status();
        if status.is_over() {
            format!("{} {}\ngame over: {}", prefix, mv, status)
        } else {
            format!("{} {}", prefix, mv)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Algorithm;
    use std::io::Cursor;

    fn config(pvp_on: bool) -> Config {
        Config {
            pvp_on,
            depth: 1,
            algorithm: Algorithm::AlphaBeta,
            ..Config::default()
        }
    }

    fn play(harness: &mut InteractiveHarness, input: &str) -> String {
        let mut output = Vec::new();
        harness.run(Cursor::new(input.to_string()), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_engine_replies_as_black() {
        let mut harness = InteractiveHarness::new(config(false)).unwrap();
        let output = play(&mut harness, "e2e4\nquit\n");
        assert!(output.contains("played e2e4"));
        assert!(output.contains("engine plays"));
        assert_eq!(harness.game().move_history().len(), 2);
        assert_eq!(harness.game().board().side_to_move, Color::White);
    }

    #[test]
    fn test_book_move_preferred() {
        let book = OpeningBook::from_json(r#"{ "e2e4": "c7c5" }"#).unwrap();
        let mut harness = InteractiveHarness::new(config(false)).unwrap().with_book(book);
        let response = harness.handle_command("e2e4").unwrap();
        assert!(response.ends_with("engine plays c7c5"), "{}", response);
    }

    #[test]
    fn test_pvp_refuses_engine() {
        let mut harness = InteractiveHarness::new(config(true)).unwrap();
        assert_eq!(harness.handle_command("e2e4").unwrap(), "played e2e4");
        assert_eq!(harness.game().board().side_to_move, Color::Black);
        assert!(matches!(harness.handle_command("go"), Err(ChessError::Configuration(_))));
    }

    #[test]
    fn test_illegal_move_reported_and_loop_continues() {
        let mut harness = InteractiveHarness::new(config(true)).unwrap();
        let output = play(&mut harness, "e2e5\nbogus\nfen\n");
        assert!(output.contains("error: illegal move: e2e5"));
        assert!(output.contains("error: invalid move notation: bogus"));
        assert!(output.contains(crate::board::STARTING_FEN));
    }

    #[test]
    fn test_fools_mate_ends_game() {
        let mut harness = InteractiveHarness::new(config(true)).unwrap();
        for mv in ["f2f3", "e7e5", "g2g4"] {
            harness.handle_command(mv).unwrap();
        }
        let response = harness.handle_command("d8h4").unwrap();
        assert!(response.contains("game over: checkmate, black wins"));
        assert!(matches!(harness.handle_command("a2a3"), Err(ChessError::GameOver(_))));
    }

    #[test]
    fn test_undo_returns_to_human_turn() {
        let mut harness = InteractiveHarness::new(config(false)).unwrap();
        harness.handle_command("d2d4").unwrap();
        let response = harness.handle_command("undo").unwrap();
        assert!(response.starts_with("undone "));
        assert!(harness.game().move_history().is_empty());
        assert_eq!(harness.handle_command("undo").unwrap(), "nothing to undo");
    }

    #[test]
    fn test_load_and_moves() {
        let mut harness = InteractiveHarness::new(config(true)).unwrap();
        harness.handle_command("load 4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let moves = harness.handle_command("moves").unwrap();
        assert!(moves.split(' ').any(|mv| mv == "e1g1"));
        assert!(harness.handle_command("load not a fen").is_err());
    }
}
