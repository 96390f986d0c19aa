//! Loading game configuration (rules, remote generator, storage, optional
//! question bank) from TOML.
//!
//! See `AppConfig` for the expected schema. Every table is optional; missing
//! keys take the defaults below.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Difficulty, Question};
use crate::error::GameError;

pub const DEFAULT_REMOTE_BASE_URL: &str = "https://treino-hero-ia-backend.onrender.com";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub rules: GameRules,
  #[serde(default)]
  pub remote: RemoteCfg,
  #[serde(default)]
  pub storage: StorageCfg,
  /// Replaces the built-in bank when non-empty.
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
}

/// Scoring and challenge constants.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameRules {
  pub xp_per_correct: u32,
  pub xp_per_level: u32,
  pub challenge_duration: u32,
  pub challenge_lives_start: u32,
}

impl Default for GameRules {
  fn default() -> Self {
    Self { xp_per_correct: 10, xp_per_level: 100, challenge_duration: 60, challenge_lives_start: 3 }
  }
}

impl GameRules {
  /// Zero values would make level-up or a challenge run degenerate; bump them to 1.
  pub fn sanitized(self) -> Self {
    Self {
      xp_per_level: self.xp_per_level.max(1),
      challenge_duration: self.challenge_duration.max(1),
      challenge_lives_start: self.challenge_lives_start.max(1),
      ..self
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RemoteCfg {
  /// Empty string disables the remote generator.
  pub base_url: String,
  pub timeout_secs: u64,
  /// Some deployments expect an empty JSON body instead of `{topic, difficulty}`.
  pub send_filters: bool,
}

impl Default for RemoteCfg {
  fn default() -> Self {
    Self { base_url: DEFAULT_REMOTE_BASE_URL.into(), timeout_secs: 20, send_filters: true }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
  pub dir: String,
}

impl Default for StorageCfg {
  fn default() -> Self {
    Self { dir: "./save".into() }
  }
}

/// Question entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  pub text: String,
  pub options: Vec<String>,
  pub correct: usize,
  #[serde(default)] pub explanation: String,
  #[serde(default)] pub difficulty: Option<Difficulty>,
}

impl QuestionCfg {
  pub fn into_question(self) -> Result<Question, GameError> {
    Question::new(self.text, self.options, self.correct, self.explanation, self.difficulty.unwrap_or_default())
  }
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Attempt to load `AppConfig` from TREINO_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("TREINO_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "treino_hero", %path, questions = cfg.questions.len(), "Loaded game config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "treino_hero", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "treino_hero", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse_config("").unwrap();
    assert_eq!(cfg.rules, GameRules::default());
    assert_eq!(cfg.remote.base_url, DEFAULT_REMOTE_BASE_URL);
    assert!(cfg.remote.send_filters);
    assert!(cfg.questions.is_empty());
  }

  #[test]
  fn partial_rules_and_question_bank() {
    let cfg = parse_config(
      r#"
      [rules]
      xp_per_level = 50
      challenge_duration = 30

      [remote]
      base_url = ""
      send_filters = false

      [[questions]]
      text = "Quantos dias de descanso por semana?"
      options = ["0", "1-2", "7"]
      correct = 1
      difficulty = "easy"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.rules.xp_per_level, 50);
    assert_eq!(cfg.rules.xp_per_correct, 10);
    assert_eq!(cfg.rules.challenge_duration, 30);
    assert_eq!(cfg.rules.challenge_lives_start, 3);
    assert!(cfg.remote.base_url.is_empty());
    assert!(!cfg.remote.send_filters);

    let q = cfg.questions[0].clone().into_question().unwrap();
    assert_eq!(q.difficulty(), Difficulty::Easy);
    assert_eq!(q.correct_option_index(), 1);
    assert_eq!(q.explanation(), "");
  }

  #[test]
  fn sanitized_rules_never_zero() {
    let r = GameRules { xp_per_correct: 0, xp_per_level: 0, challenge_duration: 0, challenge_lives_start: 0 }.sanitized();
    assert_eq!(r.xp_per_correct, 0);
    assert_eq!(r.xp_per_level, 1);
    assert_eq!(r.challenge_duration, 1);
    assert_eq!(r.challenge_lives_start, 1);
  }
}
