//! Minimal client for the remote question generator.
//!
//! One call: `POST {base_url}/generate-question` with `{topic, difficulty}`.
//! The generator has shipped several response shapes over time, so every field
//! is looked up through an ordered alias list and resolved here into the
//! canonical `Question`. Nothing past this module sees the aliases.
//!
//! Calls are instrumented and log latency and status (not contents).

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::RemoteCfg;
use crate::domain::{Difficulty, Question};
use crate::error::GameError;
use crate::util::trunc_for_log;

const TEXT_ALIASES: &[&str] = &["question", "pergunta", "q", "text"];
const OPTION_ALIASES: &[&str] = &["options", "opcoes", "alternativas", "choices"];
const CORRECT_ALIASES: &[&str] = &["correctIndex", "correct_index", "answerIndex", "correct", "correta", "answer"];
const EXPLANATION_ALIASES: &[&str] = &["explanation", "explain", "explicacao"];
const DIFFICULTY_ALIASES: &[&str] = &["difficulty", "dificuldade"];

#[derive(Clone)]
pub struct RemoteQuestions {
  pub client: reqwest::Client,
  pub base_url: String,
  pub send_filters: bool,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  topic: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  difficulty: Option<&'a str>,
}

impl RemoteQuestions {
  /// Build the client if a base URL is configured; otherwise return None.
  pub fn from_config(cfg: &RemoteCfg) -> Option<Self> {
    let base_url = cfg.base_url.trim().trim_end_matches('/').to_string();
    if base_url.is_empty() {
      return None;
    }
    let client = match reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
      .build()
    {
      Ok(c) => c,
      Err(e) => {
        error!(target: "remote", error = %e, "Failed to build HTTP client for question generator");
        return None;
      }
    };
    Some(Self { client, base_url, send_filters: cfg.send_filters })
  }

  /// Fetch and normalize one question.
  #[instrument(level = "info", skip(self, topic), fields(topic_len = topic.len(), difficulty = difficulty.as_str()))]
  pub async fn fetch_question(&self, topic: &str, difficulty: Difficulty) -> Result<Question, GameError> {
    let url = format!("{}/generate-question", self.base_url);
    let body = if self.send_filters {
      GenerateRequest {
        topic: Some(topic).filter(|t| !t.trim().is_empty()),
        difficulty: Some(difficulty.as_str()),
      }
    } else {
      GenerateRequest { topic: None, difficulty: None }
    };

    let start = std::time::Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "treino-hero/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&body)
      .send()
      .await
      .map_err(|e| {
        error!(target: "remote", elapsed = ?start.elapsed(), error = %e, "Question request failed");
        GameError::RemoteUnavailable(e.to_string())
      })?;

    let status = res.status();
    if !status.is_success() {
      let text = res.text().await.unwrap_or_default();
      let msg = extract_remote_error(&text).unwrap_or_else(|| trunc_for_log(&text, 200));
      error!(target: "remote", %status, elapsed = ?start.elapsed(), "Question service returned an error status");
      return Err(GameError::RemoteUnavailable(format!("HTTP {}: {}", status, msg)));
    }

    let payload: Value = res
      .json()
      .await
      .map_err(|e| GameError::RemoteUnavailable(format!("invalid JSON: {}", e)))?;
    info!(target: "remote", elapsed = ?start.elapsed(), "Question response received");

    normalize_question(&payload, difficulty)
  }
}

/// Resolve a generator payload into a canonical question.
/// `requested` is used when the payload carries no (recognizable) difficulty.
pub fn normalize_question(payload: &Value, requested: Difficulty) -> Result<Question, GameError> {
  let text = first_present(payload, TEXT_ALIASES)
    .and_then(Value::as_str)
    .map(|s| s.trim().to_string())
    .unwrap_or_default();
  if text.is_empty() {
    return Err(GameError::MalformedResponse("missing question text".into()));
  }

  let options: Vec<String> = first_present(payload, OPTION_ALIASES)
    .and_then(Value::as_array)
    .map(|arr| arr.iter().filter_map(option_text).collect())
    .unwrap_or_default();
  if options.len() < 2 {
    return Err(GameError::MalformedResponse(format!("expected at least 2 options, got {}", options.len())));
  }

  let correct = first_present(payload, CORRECT_ALIASES).map(coerce_index).unwrap_or(0);
  let correct = usize::try_from(correct)
    .ok()
    .filter(|i| *i < options.len())
    .ok_or_else(|| GameError::MalformedResponse(format!("correct index {} out of range", correct)))?;

  let explanation = first_present(payload, EXPLANATION_ALIASES)
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_string();

  let difficulty = first_present(payload, DIFFICULTY_ALIASES)
    .and_then(Value::as_str)
    .and_then(Difficulty::parse_lenient)
    .unwrap_or(requested);

  Question::new(text, options, correct, explanation, difficulty)
    .map_err(|e| GameError::MalformedResponse(e.to_string()))
}

/// First alias present (and not null) in the payload object.
fn first_present<'a>(payload: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
  aliases.iter().find_map(|k| payload.get(*k).filter(|v| !v.is_null()))
}

/// Integers pass through, floats truncate, numeric strings parse; anything else is 0.
fn coerce_index(v: &Value) -> i64 {
  match v {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)).unwrap_or(0),
    Value::String(s) => {
      let s = s.trim();
      s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        .unwrap_or(0)
    }
    _ => 0,
  }
}

fn option_text(v: &Value) -> Option<String> {
  match v {
    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Try to extract a clean error message from the generator's error body.
fn extract_remote_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    #[serde(alias = "error")]
    detail: Value,
  }
  let w = serde_json::from_str::<EWrap>(body).ok()?;
  match w.detail {
    Value::String(s) => Some(s),
    Value::Object(o) => o.get("message").and_then(Value::as_str).map(str::to_string),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{http::StatusCode, routing::post, Json, Router};
  use serde_json::json;

  #[test]
  fn canonical_shape_normalizes() {
    let q = normalize_question(
      &json!({"question": "Q?", "options": ["a", "b", "c"], "correct_index": 2, "explanation": "why"}),
      Difficulty::Hard,
    )
    .unwrap();
    assert_eq!(q.text(), "Q?");
    assert_eq!(q.options().len(), 3);
    assert_eq!(q.correct_option_index(), 2);
    assert_eq!(q.explanation(), "why");
    assert_eq!(q.difficulty(), Difficulty::Hard);
  }

  #[test]
  fn correct_alias_precedence() {
    let q = normalize_question(
      &json!({"pergunta": "Q", "alternativas": ["a", "b", "c"], "correta": 0, "correct": 1, "answerIndex": 2}),
      Difficulty::Medium,
    )
    .unwrap();
    assert_eq!(q.correct_option_index(), 2);

    let q = normalize_question(
      &json!({"q": "Q", "choices": ["a", "b"], "correct_index": 0, "correctIndex": 1}),
      Difficulty::Medium,
    )
    .unwrap();
    assert_eq!(q.correct_option_index(), 1);
  }

  #[test]
  fn correct_index_coercion() {
    let base = |v: Value| json!({"question": "Q", "options": ["a", "b", "c"], "correct": v});
    let idx = |v: Value| normalize_question(&base(v), Difficulty::Easy).unwrap().correct_option_index();
    assert_eq!(idx(json!("2")), 2);
    assert_eq!(idx(json!(1.9)), 1);
    assert_eq!(idx(json!("B")), 0);
    assert_eq!(idx(json!(true)), 0);
    let missing = normalize_question(&json!({"question": "Q", "options": ["a", "b"]}), Difficulty::Easy).unwrap();
    assert_eq!(missing.correct_option_index(), 0);
  }

  #[test]
  fn malformed_payloads() {
    let cases = [
      json!({"options": ["a", "b"], "correct": 0}),
      json!({"question": "  ", "options": ["a", "b"]}),
      json!({"question": "Q", "options": ["a"]}),
      json!({"question": "Q", "options": "a,b"}),
      json!({"question": "Q", "options": ["a", "b"], "correct": 5}),
      json!({"question": "Q", "options": ["a", "b"], "correct": -1}),
    ];
    for c in cases {
      assert!(matches!(normalize_question(&c, Difficulty::Easy), Err(GameError::MalformedResponse(_))), "{}", c);
    }
  }

  #[test]
  fn payload_difficulty_overrides_requested() {
    let q = normalize_question(&json!({"question": "Q", "options": ["a", "b"], "dificuldade": "fácil"}), Difficulty::Hard).unwrap();
    assert_eq!(q.difficulty(), Difficulty::Easy);
  }

  #[test]
  fn error_body_extraction() {
    assert_eq!(extract_remote_error(r#"{"detail": "quota"}"#).as_deref(), Some("quota"));
    assert_eq!(extract_remote_error(r#"{"error": {"message": "boom"}}"#).as_deref(), Some("boom"));
    assert_eq!(extract_remote_error("<html>"), None);
  }

  async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
  }

  fn client(base_url: String, send_filters: bool) -> RemoteQuestions {
    RemoteQuestions::from_config(&RemoteCfg { base_url, timeout_secs: 5, send_filters }).unwrap()
  }

  #[test]
  fn blank_base_url_disables_client() {
    assert!(RemoteQuestions::from_config(&RemoteCfg { base_url: " ".into(), ..Default::default() }).is_none());
  }

  #[test]
  fn configured_base_url_builds_client() {
    let r = RemoteQuestions::from_config(&RemoteCfg { base_url: "http://127.0.0.1:9/".into(), timeout_secs: 0, send_filters: true })
      .expect("client");
    assert_eq!(r.base_url, "http://127.0.0.1:9");
  }

  #[tokio::test]
  async fn fetch_sends_filters_and_normalizes() {
    let app = Router::new().route(
      "/generate-question",
      post(|Json(body): Json<Value>| async move {
        Json(json!({
          "question": format!("Sobre {}", body["topic"].as_str().unwrap_or("-")),
          "options": ["x", "y"],
          "correct_index": 1,
          "difficulty": body["difficulty"],
        }))
      }),
    );
    let base = serve(app).await;
    let q = client(format!("{}/", base), true).fetch_question("cardio", Difficulty::Hard).await.unwrap();
    assert_eq!(q.text(), "Sobre cardio");
    assert_eq!(q.correct_option_index(), 1);
    assert_eq!(q.difficulty(), Difficulty::Hard);
  }

  #[tokio::test]
  async fn fetch_sends_empty_body_when_filters_disabled() {
    let app = Router::new().route(
      "/generate-question",
      post(|Json(body): Json<Value>| async move {
        let empty = body.as_object().map(|o| o.is_empty()).unwrap_or(false);
        Json(json!({"question": if empty { "empty" } else { "filled" }, "options": ["x", "y"]}))
      }),
    );
    let base = serve(app).await;
    let q = client(base, false).fetch_question("cardio", Difficulty::Easy).await.unwrap();
    assert_eq!(q.text(), "empty");
  }

  #[tokio::test]
  async fn http_500_is_remote_unavailable() {
    let app = Router::new().route(
      "/generate-question",
      post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "model down"}))) }),
    );
    let base = serve(app).await;
    let err = client(base, true).fetch_question("", Difficulty::Medium).await.unwrap_err();
    match err {
      GameError::RemoteUnavailable(msg) => assert!(msg.contains("model down")),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[tokio::test]
  async fn non_json_body_is_remote_unavailable() {
    let app = Router::new().route("/generate-question", post(|| async { "not json" }));
    let base = serve(app).await;
    let err = client(base, true).fetch_question("", Difficulty::Medium).await.unwrap_err();
    assert!(matches!(err, GameError::RemoteUnavailable(_)));
  }

  #[tokio::test]
  async fn connection_refused_is_remote_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client(format!("http://{}", addr), true).fetch_question("", Difficulty::Medium).await.unwrap_err();
    assert!(matches!(err, GameError::RemoteUnavailable(_)));
  }
}
