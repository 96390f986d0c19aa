//! Application state: the single game session, the optional remote question
//! client, and the event channel WebSocket clients subscribe to.
//!
//! The session sits behind one async mutex. Answers, mode changes and
//! countdown ticks all take it, so a tick can never interleave with an answer.
//! Remote fetches run with the lock released (see `logic::ensure_question`).

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, instrument};

use crate::config::{load_app_config_from_env, AppConfig, GameRules};
use crate::error::GameError;
use crate::protocol::ServerWsMessage;
use crate::question_source::QuestionBank;
use crate::remote::RemoteQuestions;
use crate::seeds::seed_questions;
use crate::session::SessionController;
use crate::storage::{FileStore, KeyValueStore};

const EVENT_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<SessionController>>,
    pub remote: Option<RemoteQuestions>,
    pub events: broadcast::Sender<ServerWsMessage>,
}

impl AppState {
    /// Build state from env: load config, build the bank, open storage, init the remote client.
    /// Fails only on an empty question bank, which is a deployment defect.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, GameError> {
        let mut cfg = load_app_config_from_env().unwrap_or_default();
        if let Ok(url) = std::env::var("QUESTION_API_URL") {
            cfg.remote.base_url = url;
        }
        if let Ok(dir) = std::env::var("TREINO_SAVE_DIR") {
            cfg.storage.dir = dir;
        }

        let bank = build_bank(&cfg)?;
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&cfg.storage.dir));
        info!(target: "treino_hero", dir = %cfg.storage.dir, "Using file storage");

        let remote = RemoteQuestions::from_config(&cfg.remote);
        if let Some(r) = &remote {
            info!(target: "treino_hero", base_url = %r.base_url, send_filters = r.send_filters, "Remote question generator enabled.");
        } else {
            info!(target: "treino_hero", "Remote question generator disabled. AI mode serves local questions.");
        }

        Ok(Self::with_parts(cfg.rules, bank, store, remote))
    }

    pub fn with_parts(
        rules: GameRules,
        bank: QuestionBank,
        store: Arc<dyn KeyValueStore>,
        remote: Option<RemoteQuestions>,
    ) -> Self {
        let session = SessionController::new(rules, bank, store);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { session: Arc::new(Mutex::new(session)), remote, events }
    }

    /// Push an event to every connected WebSocket. Having no listeners is fine.
    pub fn publish(&self, msg: ServerWsMessage) {
        let _ = self.events.send(msg);
    }
}

/// Config questions replace the built-in bank when present; invalid entries are skipped.
pub fn build_bank(cfg: &AppConfig) -> Result<QuestionBank, GameError> {
    if cfg.questions.is_empty() {
        return QuestionBank::new(seed_questions()?);
    }
    let mut questions = Vec::with_capacity(cfg.questions.len());
    for (i, qc) in cfg.questions.iter().enumerate() {
        match qc.clone().into_question() {
            Ok(q) => questions.push(q),
            Err(e) => error!(target: "quiz", index = i, error = %e, "Skipping bank item"),
        }
    }
    info!(target: "quiz", configured = cfg.questions.len(), usable = questions.len(), "Startup question inventory");
    QuestionBank::new(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn builtin_bank_without_config() {
        let bank = build_bank(&AppConfig::default()).unwrap();
        assert!(bank.len() >= 3);
    }

    #[test]
    fn config_bank_skips_invalid_entries() {
        let cfg = parse_config(
            r#"
            [[questions]]
            text = "ok"
            options = ["a", "b"]
            correct = 0

            [[questions]]
            text = "broken"
            options = ["a"]
            correct = 0
            "#,
        )
        .unwrap();
        assert_eq!(build_bank(&cfg).unwrap().len(), 1);
    }

    #[test]
    fn config_bank_with_no_usable_entries_is_fatal() {
        let cfg = parse_config(
            r#"
            [[questions]]
            text = "broken"
            options = ["a", "b"]
            correct = 9
            "#,
        )
        .unwrap();
        assert!(matches!(build_bank(&cfg), Err(GameError::EmptyQuestionBank)));
    }
}
