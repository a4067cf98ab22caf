use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChessError, Result};
use crate::evaluation::EvalWeights;
use crate::game::DrawRules;
use crate::search::{Algorithm, SearchEngine};

/// Depth beyond which a single search becomes impractically slow.
pub const RECOMMENDED_MAX_DEPTH: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Human versus human: the engine is never asked for a move.
    pub pvp_on: bool,
    pub depth: u32,
    pub algorithm: Algorithm,
    pub draw_rules: DrawRules,
    pub weights: EvalWeights,
    pub book_path: Option<PathBuf>,
    /// Seed for choosing among several book candidates. Without it the
    /// first candidate is always played.
    pub book_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pvp_on: false,
            depth: RECOMMENDED_MAX_DEPTH,
            algorithm: Algorithm::AlphaBetaImproved,
            draw_rules: DrawRules::default(),
            weights: EvalWeights::default(),
            book_path: None,
            book_seed: None,
        }
    }
}

impl Config {
    pub fn load_from_json(json_str: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::load_from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(ChessError::Configuration("depth must be a positive integer".to_string()));
        }
        if self.algorithm.is_reserved() {
            return Err(ChessError::Configuration(format!(
                "algorithm '{}' is reserved and cannot be selected",
                self.algorithm
            )));
        }
        Ok(())
    }

    pub fn build_engine(&self) -> Result<SearchEngine> {
        self.validate()?;
        SearchEngine::new(self.algorithm, self.weights.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_default() {
        let config = Config::load_from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.pvp_on);
        assert_eq!(config.depth, 4);
    }

    #[test]
    fn test_load_config_partial() {
        let json = r#"{
            "pvp_on": true,
            "algorithm": "minimax",
            "draw_rules": { "fifty_move": false },
            "weights": { "queen_value": 950 }
        }"#;
        let config = Config::load_from_json(json).unwrap();
        assert!(config.pvp_on);
        assert_eq!(config.algorithm, Algorithm::Minimax);
        assert!(!config.draw_rules.fifty_move);
        assert!(config.draw_rules.threefold_repetition);
        assert_eq!(config.weights.queen_value, 950);
        assert_eq!(config.weights.rook_value, 500);
    }

    #[test]
    fn test_non_positive_depth_rejected() {
        assert!(matches!(
            Config::load_from_json(r#"{ "depth": 0 }"#),
            Err(ChessError::Configuration(_))
        ));
        // Negative numbers do not fit the field at all
        assert!(matches!(Config::load_from_json(r#"{ "depth": -2 }"#), Err(ChessError::Json(_))));
    }

    #[test]
    fn test_unknown_and_reserved_algorithms_rejected() {
        assert!(matches!(
            Config::load_from_json(r#"{ "algorithm": "negascout" }"#),
            Err(ChessError::Json(_))
        ));
        assert!(matches!(
            Config::load_from_json(r#"{ "algorithm": "principal-variation" }"#),
            Err(ChessError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(Config::load_from_json("{ invalid json }").is_err());
    }

    #[test]
    fn test_build_engine_uses_selected_algorithm() {
        let config = Config {
            algorithm: Algorithm::AlphaBeta,
            ..Config::default()
        };
        assert_eq!(config.build_engine().unwrap().algorithm(), Algorithm::AlphaBeta);
    }
}
