//! Local question selection: difficulty filter with full-bank fallback, then
//! cursor modulo pool length.

use tracing::warn;

use crate::domain::{Difficulty, Question};
use crate::error::GameError;

/// Result of a local pick. `difficulty_matched` is false when no question had
/// the requested difficulty and the whole bank was used instead.
#[derive(Clone, Copy, Debug)]
pub struct LocalPick<'a> {
  pub question: &'a Question,
  pub difficulty_matched: bool,
}

#[derive(Clone, Debug)]
pub struct QuestionBank {
  questions: Vec<Question>,
}

impl QuestionBank {
  /// An empty bank is a deployment defect, so it is refused here rather than at selection time.
  pub fn new(questions: Vec<Question>) -> Result<Self, GameError> {
    if questions.is_empty() {
      return Err(GameError::EmptyQuestionBank);
    }
    Ok(Self { questions })
  }

  pub fn len(&self) -> usize {
    self.questions.len()
  }

  /// Deterministic and total: `cursor` wraps over the filtered pool.
  pub fn next_local(&self, cursor: usize, difficulty: Difficulty) -> LocalPick<'_> {
    let pool: Vec<&Question> = self.questions.iter().filter(|q| q.difficulty() == difficulty).collect();
    if pool.is_empty() {
      warn!(target: "quiz", difficulty = difficulty.as_str(), "No question matches difficulty; using full bank");
      return LocalPick { question: &self.questions[cursor % self.questions.len()], difficulty_matched: false };
    }
    LocalPick { question: pool[cursor % pool.len()], difficulty_matched: true }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn q(text: &str, d: Difficulty) -> Question {
    Question::new(text, vec!["a".into(), "b".into()], 0, "", d).unwrap()
  }

  fn bank() -> QuestionBank {
    QuestionBank::new(vec![
      q("e1", Difficulty::Easy),
      q("m1", Difficulty::Medium),
      q("e2", Difficulty::Easy),
      q("m2", Difficulty::Medium),
      q("e3", Difficulty::Easy),
    ])
    .unwrap()
  }

  #[test]
  fn empty_bank_is_rejected() {
    assert!(matches!(QuestionBank::new(vec![]), Err(GameError::EmptyQuestionBank)));
  }

  #[test]
  fn filters_by_difficulty() {
    let b = bank();
    let texts: Vec<&str> = (0..3).map(|c| b.next_local(c, Difficulty::Easy).question.text()).collect();
    assert_eq!(texts, vec!["e1", "e2", "e3"]);
    assert!(b.next_local(0, Difficulty::Easy).difficulty_matched);
  }

  #[test]
  fn cursor_wraps_cyclically() {
    let b = bank();
    let pool_len = 2;
    for k in 0..6 {
      assert_eq!(
        b.next_local(pool_len + k, Difficulty::Medium).question.text(),
        b.next_local(k, Difficulty::Medium).question.text()
      );
    }
  }

  #[test]
  fn falls_back_to_full_bank_when_no_match() {
    let b = bank();
    let pick = b.next_local(6, Difficulty::Hard);
    assert!(!pick.difficulty_matched);
    assert_eq!(pick.question.text(), "m1");
  }
}
