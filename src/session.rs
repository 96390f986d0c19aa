//! Session / mode controller.
//!
//! Owns the mode (`classic | ai | challenge`), the bank cursor, the challenge
//! countdown and lives, and drives the per-answer protocol:
//! compare → apply progress → lose a life (challenge) → advance → persist.
//!
//! The controller never sleeps or does I/O besides the store. Remote questions
//! are fetched by the caller: `pending_fetch()` hands out a ticket, the caller
//! awaits the network, then `resolve_fetch()` applies the result only if the
//! ticket is still current. Countdown ticks come from an external scheduler.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::GameRules;
use crate::domain::{
  ChallengeEndReason, ChallengeEnded, ChallengeState, Difficulty, Mode, ProgressState, Question, SessionConfig,
};
use crate::error::GameError;
use crate::progress::apply_outcome;
use crate::question_source::QuestionBank;
use crate::storage::{load_snapshot, save_snapshot, KeyValueStore, SaveSnapshot, SAVE_VERSION};

pub const AI_FALLBACK_NOTICE: &str = "AI unavailable, showing a local question";

/// Identifies one outstanding remote fetch. Any mode switch or advance makes it stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
  generation: u64,
}

#[derive(Clone, Debug)]
pub struct FetchRequest {
  pub ticket: FetchTicket,
  pub topic: String,
  pub difficulty: Difficulty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchResolution {
  Applied,
  FellBack { notice: &'static str },
  Stale,
}

#[derive(Clone, Debug)]
pub struct AnswerOutcome {
  pub is_correct: bool,
  pub correct_index: usize,
  pub explanation: String,
  pub progress: ProgressState,
  /// Challenge state after the answer; the final state if the run just ended.
  pub challenge: Option<ChallengeState>,
  pub challenge_ended: Option<ChallengeEnded>,
}

/// Read-only picture of the session for renderers.
#[derive(Clone, Debug)]
pub struct SessionView {
  pub config: SessionConfig,
  pub progress: ProgressState,
  pub challenge: Option<ChallengeState>,
  pub question: Option<Question>,
  pub awaiting_remote: bool,
  pub notice: Option<String>,
  pub difficulty_matched: bool,
}

pub struct SessionController {
  rules: GameRules,
  bank: QuestionBank,
  store: Arc<dyn KeyValueStore>,
  progress: ProgressState,
  config: SessionConfig,
  challenge: Option<ChallengeState>,
  current: Option<Question>,
  awaiting: Option<FetchTicket>,
  generation: u64,
  notice: Option<String>,
  difficulty_matched: bool,
}

impl SessionController {
  /// Restore progress and preferences from the store and prepare the first question.
  /// A saved challenge run is not resumed; it comes back as classic.
  #[instrument(level = "info", skip_all)]
  pub fn new(rules: GameRules, bank: QuestionBank, store: Arc<dyn KeyValueStore>) -> Self {
    let snap = load_snapshot(store.as_ref());
    let mode = match snap.mode {
      Mode::Challenge => Mode::Classic,
      m => m,
    };
    let mut ctl = Self {
      rules: rules.sanitized(),
      bank,
      store,
      progress: snap.progress,
      config: SessionConfig { mode, difficulty: snap.difficulty, topic: snap.topic, question_cursor: 0 },
      challenge: None,
      current: None,
      awaiting: None,
      generation: 0,
      notice: None,
      difficulty_matched: true,
    };
    ctl.prepare_question();
    info!(target: "session", mode = mode.as_str(), level = ctl.progress.level, xp = ctl.progress.xp, bank = ctl.bank.len(), "Session ready");
    ctl
  }

  pub fn mode(&self) -> Mode { self.config.mode }
  pub fn progress(&self) -> &ProgressState { &self.progress }
  pub fn challenge(&self) -> Option<&ChallengeState> { self.challenge.as_ref() }

  /// The question on screen, or None while a remote fetch is outstanding.
  pub fn current_question(&self) -> Option<&Question> {
    self.current.as_ref()
  }

  pub fn pending_fetch(&self) -> Option<FetchRequest> {
    self.awaiting.map(|ticket| FetchRequest {
      ticket,
      topic: self.config.topic.clone(),
      difficulty: self.config.difficulty,
    })
  }

  /// Apply a remote result. Failures fall back to the next local question.
  #[instrument(level = "info", skip(self, result), fields(ok = result.is_ok()))]
  pub fn resolve_fetch(&mut self, ticket: FetchTicket, result: Result<Question, GameError>) -> FetchResolution {
    if self.awaiting != Some(ticket) {
      debug!(target: "session", ?ticket, current = self.generation, "Discarding stale remote question");
      return FetchResolution::Stale;
    }
    self.awaiting = None;
    match result {
      Ok(q) => {
        self.current = Some(q);
        self.difficulty_matched = true;
        FetchResolution::Applied
      }
      Err(e) => {
        warn!(target: "session", error = %e, "Remote question failed; serving local question");
        self.load_local();
        self.notice = Some(AI_FALLBACK_NOTICE.to_string());
        FetchResolution::FellBack { notice: AI_FALLBACK_NOTICE }
      }
    }
  }

  #[instrument(level = "info", skip(self), fields(mode = self.config.mode.as_str()))]
  pub fn submit_answer(&mut self, index: usize) -> Result<AnswerOutcome, GameError> {
    let question = match (&self.current, self.awaiting) {
      (Some(q), None) => q,
      _ => return Err(GameError::QuestionPending),
    };
    let len = question.options().len();
    if index >= len {
      return Err(GameError::InvalidOption { index, len });
    }

    let is_correct = index == question.correct_option_index();
    let correct_index = question.correct_option_index();
    let explanation = question.explanation().to_string();
    self.progress = apply_outcome(&self.progress, is_correct, self.rules.xp_per_correct, self.rules.xp_per_level);

    let mut challenge_ended = None;
    if self.config.mode == Mode::Challenge && !is_correct {
      if let Some(ch) = self.challenge.as_mut() {
        ch.lives_remaining = ch.lives_remaining.saturating_sub(1);
        if ch.lives_remaining == 0 {
          challenge_ended = Some(self.end_challenge(ChallengeEndReason::OutOfLives));
        }
      }
    }

    if challenge_ended.is_none() {
      self.config.question_cursor += 1;
      self.prepare_question();
    }
    self.persist();

    info!(target: "session", is_correct, level = self.progress.level, xp = self.progress.xp, streak = self.progress.streak, "Answer applied");
    let challenge = challenge_ended.as_ref().map(|e| e.final_state).or(self.challenge);
    Ok(AnswerOutcome { is_correct, correct_index, explanation, progress: self.progress, challenge, challenge_ended })
  }

  #[instrument(level = "info", skip(self), fields(from = self.config.mode.as_str(), to = mode.as_str()))]
  pub fn set_mode(&mut self, mode: Mode) {
    self.enter_mode(mode);
    self.persist();
  }

  /// Takes effect from the next question on.
  pub fn set_difficulty(&mut self, difficulty: Difficulty) {
    debug!(target: "session", difficulty = difficulty.as_str(), "Difficulty changed");
    self.config.difficulty = difficulty;
    self.persist();
  }

  /// Only consulted for remote questions; takes effect from the next fetch.
  pub fn set_topic(&mut self, topic: &str) {
    self.config.topic = topic.trim().to_string();
    debug!(target: "session", topic_len = self.config.topic.len(), "Topic changed");
    self.persist();
  }

  /// One second of challenge countdown. Returns the end event when time runs out.
  pub fn tick(&mut self) -> Option<ChallengeEnded> {
    let ch = self.challenge.as_mut().filter(|c| c.active)?;
    ch.time_remaining = ch.time_remaining.saturating_sub(1);
    if ch.time_remaining > 0 {
      return None;
    }
    let ended = self.end_challenge(ChallengeEndReason::TimeUp);
    self.persist();
    Some(ended)
  }

  pub fn view(&self) -> SessionView {
    SessionView {
      config: self.config.clone(),
      progress: self.progress,
      challenge: self.challenge,
      question: self.current.clone(),
      awaiting_remote: self.awaiting.is_some(),
      notice: self.notice.clone(),
      difficulty_matched: self.difficulty_matched,
    }
  }

  fn enter_mode(&mut self, mode: Mode) {
    self.config.mode = mode;
    self.config.question_cursor = 0;
    self.challenge = match mode {
      Mode::Challenge => Some(ChallengeState::start(self.rules.challenge_duration, self.rules.challenge_lives_start)),
      _ => None,
    };
    self.prepare_question();
  }

  fn end_challenge(&mut self, reason: ChallengeEndReason) -> ChallengeEnded {
    let mut final_state = self
      .challenge
      .take()
      .unwrap_or_else(|| ChallengeState::start(self.rules.challenge_duration, self.rules.challenge_lives_start));
    final_state.active = false;
    info!(target: "session", ?reason, time_remaining = final_state.time_remaining, lives = final_state.lives_remaining, "Challenge ended");
    self.enter_mode(Mode::Classic);
    ChallengeEnded { reason, final_state, progress: self.progress }
  }

  /// Any previously issued fetch ticket becomes stale here.
  fn prepare_question(&mut self) {
    self.generation += 1;
    self.notice = None;
    match self.config.mode {
      Mode::Ai => {
        self.current = None;
        self.awaiting = Some(FetchTicket { generation: self.generation });
      }
      Mode::Classic | Mode::Challenge => {
        self.awaiting = None;
        self.load_local();
      }
    }
  }

  fn load_local(&mut self) {
    let pick = self.bank.next_local(self.config.question_cursor, self.config.difficulty);
    self.difficulty_matched = pick.difficulty_matched;
    self.current = Some(pick.question.clone());
  }

  /// Storage failures never block play.
  fn persist(&self) {
    let snap = SaveSnapshot {
      version: SAVE_VERSION,
      progress: self.progress,
      mode: self.config.mode,
      difficulty: self.config.difficulty,
      topic: self.config.topic.clone(),
    };
    if let Err(e) = save_snapshot(self.store.as_ref(), &snap) {
      warn!(target: "storage", error = %e, "Failed to persist progress; continuing");
    }
  }
}
