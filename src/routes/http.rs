//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.
//! Errors map to fixed player-safe messages; raw error text stays in the logs.

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::domain::{Difficulty, Mode};
use crate::error::GameError;
use crate::logic;
use crate::plan::{plan_for, Goal};
use crate::protocol::*;
use crate::state::AppState;

pub struct ApiError(StatusCode, &'static str);

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.0, Json(ErrorOut { error: self.1 })).into_response()
  }
}

impl From<GameError> for ApiError {
  fn from(e: GameError) -> Self {
    let status = match &e {
      GameError::QuestionPending => StatusCode::CONFLICT,
      GameError::InvalidOption { .. } => StatusCode::UNPROCESSABLE_ENTITY,
      _ => StatusCode::SERVICE_UNAVAILABLE,
    };
    warn!(target: "treino_hero", error = %e, %status, "Request failed");
    ApiError(status, e.player_message())
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<AppState>) -> impl IntoResponse {
  Json(HealthOut { ok: true, remote_enabled: state.remote.is_some() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_state(State(state): State<AppState>) -> impl IntoResponse {
  let view = logic::ensure_question(&state).await;
  Json(state_out(&view))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_question(State(state): State<AppState>) -> Result<Json<QuestionOut>, ApiError> {
  let view = logic::ensure_question(&state).await;
  match &view.question {
    Some(q) => {
      info!(target: "challenge", mode = view.config.mode.as_str(), cursor = view.config.question_cursor, "HTTP question served");
      Ok(Json(question_out(q)))
    }
    None => Err(GameError::QuestionPending.into()),
  }
}

#[instrument(level = "info", skip(state, body), fields(index = body.index))]
pub async fn http_post_answer(
  State(state): State<AppState>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  let (outcome, view) = logic::submit_answer(&state, body.index).await?;
  info!(target: "challenge", correct = outcome.is_correct, ended = outcome.challenge_ended.is_some(), "HTTP answer evaluated");
  Ok(Json(answer_out(outcome, &view)))
}

#[instrument(level = "info", skip(state, body), fields(mode = %body.mode))]
pub async fn http_post_mode(
  State(state): State<AppState>,
  Json(body): Json<ModeIn>,
) -> Result<Json<StateOut>, ApiError> {
  let mode = Mode::parse_lenient(&body.mode).ok_or(ApiError(StatusCode::BAD_REQUEST, "Unknown mode."))?;
  let view = logic::set_mode(&state, mode).await;
  Ok(Json(state_out(&view)))
}

#[instrument(level = "info", skip(state, body), fields(difficulty = %body.difficulty))]
pub async fn http_post_difficulty(
  State(state): State<AppState>,
  Json(body): Json<DifficultyIn>,
) -> Result<Json<StateOut>, ApiError> {
  let difficulty =
    Difficulty::parse_lenient(&body.difficulty).ok_or(ApiError(StatusCode::BAD_REQUEST, "Unknown difficulty."))?;
  let view = logic::set_difficulty(&state, difficulty).await;
  Ok(Json(state_out(&view)))
}

#[instrument(level = "info", skip(state, body), fields(topic_len = body.topic.len()))]
pub async fn http_post_topic(
  State(state): State<AppState>,
  Json(body): Json<TopicIn>,
) -> impl IntoResponse {
  let view = logic::set_topic(&state, &body.topic).await;
  Json(state_out(&view))
}

#[instrument(level = "info")]
pub async fn http_get_plan(Query(q): Query<PlanQuery>) -> Result<Json<PlanOut>, ApiError> {
  let goal = match q.goal.as_deref() {
    Some(g) => Goal::parse(g).ok_or(ApiError(StatusCode::BAD_REQUEST, "Unknown goal."))?,
    None => Goal::default(),
  };
  let workouts = plan_for(goal, q.days.unwrap_or(3));
  Ok(Json(PlanOut { goal, workouts }))
}
