//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic; we reply with a single JSON message per request.
//! Countdown ticks and challenge-ended events are pushed as they happen.

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{Difficulty, Mode};
use crate::logic;
use crate::protocol::{answer_out, state_out, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
  info!(target: "treino_hero", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: AppState) {
  info!(target: "treino_hero", "WebSocket connected");
  let mut events = state.events.subscribe();
  loop {
    let out = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => {
          // Parse, dispatch, serialize response.
          let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
            Ok(msg) => {
              debug!(target: "treino_hero", "WS received: {:?}", &msg);
              handle_client_ws(msg, &state).await
            }
            Err(e) => {
              debug!(target: "treino_hero", error = %e, "WS invalid message");
              ServerWsMessage::Error { message: "Invalid message.".into() }
            }
          };
          reply
        }
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          continue;
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => continue,
        Some(Err(e)) => {
          warn!(target: "treino_hero", error = %e, "WS receive error");
          break;
        }
      },
      pushed = events.recv() => match pushed {
        Ok(msg) => msg,
        Err(RecvError::Lagged(n)) => {
          warn!(target: "treino_hero", skipped = n, "WS client lagging; dropped events");
          continue;
        }
        Err(RecvError::Closed) => break,
      },
    };

    let text = serde_json::to_string(&out).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    if let Err(e) = socket.send(Message::Text(text)).await {
      error!(target: "treino_hero", error = %e, "WS send error");
      break;
    }
  }
  info!(target: "treino_hero", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::GetState | ClientWsMessage::GetQuestion => {
      let view = logic::ensure_question(state).await;
      ServerWsMessage::State { state: state_out(&view) }
    }

    ClientWsMessage::SubmitAnswer { index } => match logic::submit_answer(state, index).await {
      Ok((outcome, view)) => {
        info!(target: "challenge", correct = outcome.is_correct, "WS submit_answer evaluated");
        ServerWsMessage::AnswerResult { result: answer_out(outcome, &view) }
      }
      Err(e) => {
        warn!(target: "challenge", error = %e, "WS submit_answer rejected");
        ServerWsMessage::Error { message: e.player_message().into() }
      }
    },

    ClientWsMessage::SetMode { mode } => match Mode::parse_lenient(&mode) {
      Some(m) => ServerWsMessage::State { state: state_out(&logic::set_mode(state, m).await) },
      None => ServerWsMessage::Error { message: "Unknown mode.".into() },
    },

    ClientWsMessage::SetDifficulty { difficulty } => match Difficulty::parse_lenient(&difficulty) {
      Some(d) => ServerWsMessage::State { state: state_out(&logic::set_difficulty(state, d).await) },
      None => ServerWsMessage::Error { message: "Unknown difficulty.".into() },
    },

    ClientWsMessage::SetTopic { topic } => {
      ServerWsMessage::State { state: state_out(&logic::set_topic(state, &topic).await) }
    }
  }
}
