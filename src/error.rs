//! Error kinds for the game engine and its collaborators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
  /// Network/HTTP failure talking to the question generator.
  #[error("remote question service unavailable: {0}")]
  RemoteUnavailable(String),

  /// The generator answered, but the payload lacks required fields.
  #[error("malformed remote question: {0}")]
  MalformedResponse(String),

  /// Local bank is empty. Fatal configuration error.
  #[error("question bank is empty")]
  EmptyQuestionBank,

  #[error("storage unavailable: {0}")]
  StorageUnavailable(String),

  #[error("invalid question: {0}")]
  InvalidQuestion(String),

  /// An answer arrived while the next question is still being fetched.
  #[error("question not ready yet")]
  QuestionPending,

  #[error("option {index} out of range ({len} options)")]
  InvalidOption { index: usize, len: usize },
}

impl GameError {
  /// Short, fixed text safe to show to the player.
  pub fn player_message(&self) -> &'static str {
    match self {
      GameError::RemoteUnavailable(_) | GameError::MalformedResponse(_) => "AI temporarily unavailable.",
      GameError::EmptyQuestionBank | GameError::InvalidQuestion(_) => "Questions temporarily unavailable.",
      GameError::StorageUnavailable(_) => "Progress could not be saved.",
      GameError::QuestionPending => "Next question is still loading.",
      GameError::InvalidOption { .. } => "That option does not exist.",
    }
  }
}
