//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//! Questions are sent without their correct index; it is revealed in the answer result.

use serde::{Deserialize, Serialize};

use crate::domain::{ChallengeEnded, ChallengeState, Difficulty, Mode, ProgressState, Question};
use crate::session::{AnswerOutcome, SessionView};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    GetState,
    GetQuestion,
    SubmitAnswer { index: usize },
    SetMode { mode: String },
    SetDifficulty { difficulty: String },
    SetTopic { topic: String },
}

/// Messages the server sends back over WebSocket, as replies or pushed events.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    State { state: StateOut },
    AnswerResult { result: AnswerOut },
    ChallengeTick { challenge: ChallengeState },
    ChallengeEnded { ended: ChallengeEnded },
    Error { message: String },
}

/// DTO used by both WS and HTTP for question delivery.
#[derive(Clone, Debug, Serialize)]
pub struct QuestionOut {
    pub text: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
}

pub fn question_out(q: &Question) -> QuestionOut {
    QuestionOut {
        text: q.text().to_string(),
        options: q.options().to_vec(),
        difficulty: q.difficulty(),
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StateOut {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub topic: String,
    pub question_cursor: usize,
    pub progress: ProgressState,
    pub challenge: Option<ChallengeState>,
    pub question: Option<QuestionOut>,
    pub awaiting_remote: bool,
    pub notice: Option<String>,
    pub difficulty_matched: bool,
}

pub fn state_out(v: &SessionView) -> StateOut {
    StateOut {
        mode: v.config.mode,
        difficulty: v.config.difficulty,
        topic: v.config.topic.clone(),
        question_cursor: v.config.question_cursor,
        progress: v.progress,
        challenge: v.challenge,
        question: v.question.as_ref().map(question_out),
        awaiting_remote: v.awaiting_remote,
        notice: v.notice.clone(),
        difficulty_matched: v.difficulty_matched,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub index: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerOut {
    pub correct: bool,
    pub correct_index: usize,
    pub explanation: String,
    pub progress: ProgressState,
    pub challenge: Option<ChallengeState>,
    pub challenge_ended: Option<ChallengeEnded>,
    /// Session after advancing, including the next question.
    pub state: StateOut,
}

pub fn answer_out(o: AnswerOutcome, v: &SessionView) -> AnswerOut {
    AnswerOut {
        correct: o.is_correct,
        correct_index: o.correct_index,
        explanation: o.explanation,
        progress: o.progress,
        challenge: o.challenge,
        challenge_ended: o.challenge_ended,
        state: state_out(v),
    }
}

#[derive(Debug, Deserialize)]
pub struct ModeIn {
    pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct DifficultyIn {
    pub difficulty: String,
}

#[derive(Debug, Deserialize)]
pub struct TopicIn {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub goal: Option<String>,
    pub days: Option<usize>,
}

#[derive(Serialize)]
pub struct PlanOut {
    pub goal: crate::plan::Goal,
    pub workouts: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub remote_enabled: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: &'static str,
}
