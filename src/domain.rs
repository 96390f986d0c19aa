//! Domain models used by the engine: questions, difficulty/mode enums, progress,
//! challenge countdown and session preferences.

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Question difficulty. Missing or unknown values resolve to `Medium`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }

  /// Lenient parse used at the remote/legacy boundaries (accepts Portuguese labels too).
  pub fn parse_lenient(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "easy" | "facil" | "fácil" => Some(Difficulty::Easy),
      "medium" | "medio" | "médio" => Some(Difficulty::Medium),
      "hard" | "dificil" | "difícil" => Some(Difficulty::Hard),
      _ => None,
    }
  }
}

/// Which strategy supplies questions and whether the countdown runs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  #[default]
  Classic,
  #[serde(alias = "ia")]
  Ai,
  Challenge,
}

impl Mode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Mode::Classic => "classic",
      Mode::Ai => "ai",
      Mode::Challenge => "challenge",
    }
  }

  pub fn parse_lenient(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "classic" | "classico" | "clássico" => Some(Mode::Classic),
      "ai" | "ia" => Some(Mode::Ai),
      "challenge" | "desafio" => Some(Mode::Challenge),
      _ => None,
    }
  }
}

/// A multiple-choice question. Fields are private so a constructed question
/// always satisfies its invariants (≥ 2 options, correct index in range).
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Question {
  text: String,
  options: Vec<String>,
  correct_option_index: usize,
  explanation: String,
  difficulty: Difficulty,
}

impl Question {
  pub fn new(
    text: impl Into<String>,
    options: Vec<String>,
    correct_option_index: usize,
    explanation: impl Into<String>,
    difficulty: Difficulty,
  ) -> Result<Self, GameError> {
    let text = text.into();
    if text.trim().is_empty() {
      return Err(GameError::InvalidQuestion("empty question text".into()));
    }
    if options.len() < 2 {
      return Err(GameError::InvalidQuestion(format!("needs at least 2 options, got {}", options.len())));
    }
    if correct_option_index >= options.len() {
      return Err(GameError::InvalidQuestion(format!(
        "correct index {} out of range for {} options",
        correct_option_index,
        options.len()
      )));
    }
    Ok(Self { text, options, correct_option_index, explanation: explanation.into(), difficulty })
  }

  pub fn text(&self) -> &str { &self.text }
  pub fn options(&self) -> &[String] { &self.options }
  pub fn correct_option_index(&self) -> usize { self.correct_option_index }
  pub fn explanation(&self) -> &str { &self.explanation }
  pub fn difficulty(&self) -> Difficulty { self.difficulty }
}

/// Player progress. Level uses a local counter: `xp` resets to zero on level-up.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProgressState {
  pub xp: u32,
  pub level: u32,
  pub correct_count: u32,
  pub best_xp: u32,
  pub streak: u32,
  pub best_streak: u32,
}

impl Default for ProgressState {
  fn default() -> Self {
    Self { xp: 0, level: 1, correct_count: 0, best_xp: 0, streak: 0, best_streak: 0 }
  }
}

impl ProgressState {
  /// Restore the invariants on progress read from outside the engine:
  /// level at least 1, best marks never below the current values.
  pub fn normalized(self) -> Self {
    Self {
      level: self.level.max(1),
      best_xp: self.best_xp.max(self.xp),
      best_streak: self.best_streak.max(self.streak),
      ..self
    }
  }
}

/// Countdown and lives for challenge mode. Never persisted.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct ChallengeState {
  pub time_remaining: u32,
  pub lives_remaining: u32,
  pub active: bool,
}

impl ChallengeState {
  pub fn start(duration: u32, lives: u32) -> Self {
    Self { time_remaining: duration, lives_remaining: lives, active: true }
  }
}

/// Player-selected preferences plus the local bank cursor.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Default)]
pub struct SessionConfig {
  pub mode: Mode,
  pub difficulty: Difficulty,
  pub topic: String,
  pub question_cursor: usize,
}

/// Why a challenge run stopped.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeEndReason {
  TimeUp,
  OutOfLives,
}

/// Emitted once when a challenge run reaches a terminal condition.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ChallengeEnded {
  pub reason: ChallengeEndReason,
  pub final_state: ChallengeState,
  pub progress: ProgressState,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn opts(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn question_rejects_single_option() {
    let err = Question::new("q", opts(&["a"]), 0, "", Difficulty::Easy).unwrap_err();
    assert!(matches!(err, GameError::InvalidQuestion(_)));
  }

  #[test]
  fn question_rejects_out_of_range_index() {
    assert!(Question::new("q", opts(&["a", "b"]), 2, "", Difficulty::Easy).is_err());
  }

  #[test]
  fn question_rejects_blank_text() {
    assert!(Question::new("   ", opts(&["a", "b"]), 0, "", Difficulty::Easy).is_err());
  }

  #[test]
  fn mode_accepts_legacy_ia_label() {
    let m: Mode = serde_json::from_str("\"ia\"").unwrap();
    assert_eq!(m, Mode::Ai);
    assert_eq!(Mode::parse_lenient("desafio"), Some(Mode::Challenge));
  }

  #[test]
  fn progress_defaults_fill_missing_fields() {
    let p: ProgressState = serde_json::from_str(r#"{"xp": 30}"#).unwrap();
    assert_eq!(p.xp, 30);
    assert_eq!(p.level, 1);
    assert_eq!(p.best_streak, 0);
  }

  #[test]
  fn normalized_repairs_level_and_best_marks() {
    let p = ProgressState { xp: 50, level: 0, correct_count: 3, best_xp: 10, streak: 4, best_streak: 1 }.normalized();
    assert_eq!(p, ProgressState { xp: 50, level: 1, correct_count: 3, best_xp: 50, streak: 4, best_streak: 4 });
  }

  #[test]
  fn difficulty_lenient_parse() {
    assert_eq!(Difficulty::parse_lenient("Fácil"), Some(Difficulty::Easy));
    assert_eq!(Difficulty::parse_lenient("HARD"), Some(Difficulty::Hard));
    assert_eq!(Difficulty::parse_lenient("extreme"), None);
  }
}
