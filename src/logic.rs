//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Resolving outstanding remote fetches (with local fallback) before a question is shown
//!   - Submitting answers and publishing challenge-ended events
//!   - Mode / difficulty / topic changes
//!   - The once-per-second countdown ticker

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

use crate::domain::{Difficulty, Mode};
use crate::error::GameError;
use crate::protocol::ServerWsMessage;
use crate::session::{AnswerOutcome, FetchResolution, SessionView};
use crate::state::AppState;

/// Make sure a question is on screen. While a remote fetch is outstanding it
/// is performed here with the session lock released; the result goes through
/// the session's ticket check, so a response that lost a race is dropped.
#[instrument(level = "info", skip(state))]
pub async fn ensure_question(state: &AppState) -> SessionView {
  loop {
    let req = {
      let s = state.session.lock().await;
      match s.pending_fetch() {
        Some(r) => r,
        None => return s.view(),
      }
    };

    let result = match &state.remote {
      Some(r) => r.fetch_question(&req.topic, req.difficulty).await,
      None => Err(GameError::RemoteUnavailable("remote generator disabled".into())),
    };

    let mut s = state.session.lock().await;
    match s.resolve_fetch(req.ticket, result) {
      FetchResolution::Applied => return s.view(),
      FetchResolution::FellBack { notice } => {
        info!(target: "challenge", %notice, "Served local fallback question");
        return s.view();
      }
      FetchResolution::Stale => debug!(target: "challenge", "Remote question arrived after a switch; retrying"),
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn submit_answer(state: &AppState, index: usize) -> Result<(AnswerOutcome, SessionView), GameError> {
  let outcome = state.session.lock().await.submit_answer(index)?;
  if let Some(ended) = &outcome.challenge_ended {
    state.publish(ServerWsMessage::ChallengeEnded { ended: ended.clone() });
  }
  let view = ensure_question(state).await;
  Ok((outcome, view))
}

#[instrument(level = "info", skip(state, mode), fields(mode = mode.as_str()))]
pub async fn set_mode(state: &AppState, mode: Mode) -> SessionView {
  state.session.lock().await.set_mode(mode);
  ensure_question(state).await
}

#[instrument(level = "info", skip(state, difficulty), fields(difficulty = difficulty.as_str()))]
pub async fn set_difficulty(state: &AppState, difficulty: Difficulty) -> SessionView {
  state.session.lock().await.set_difficulty(difficulty);
  ensure_question(state).await
}

#[instrument(level = "info", skip(state, topic), fields(topic_len = topic.len()))]
pub async fn set_topic(state: &AppState, topic: &str) -> SessionView {
  state.session.lock().await.set_topic(topic);
  ensure_question(state).await
}

/// One tick: advance the countdown and publish the remaining time / end event.
pub async fn tick_once(state: &AppState) {
  let (ended, challenge) = {
    let mut s = state.session.lock().await;
    let ended = s.tick();
    (ended, s.challenge().copied())
  };
  if let Some(challenge) = challenge {
    state.publish(ServerWsMessage::ChallengeTick { challenge });
  }
  if let Some(ended) = ended {
    info!(target: "challenge", reason = ?ended.reason, "Challenge ended by countdown");
    state.publish(ServerWsMessage::ChallengeEnded { ended });
  }
}

/// External scheduler for the challenge countdown: one `tick()` per second.
pub fn spawn_ticker(state: AppState) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
      interval.tick().await;
      tick_once(&state).await;
    }
  })
}
