//! Persistence gateway: a tiny key/value string store plus the versioned save
//! snapshot that lives in it.
//!
//! Only one key is written (`SAVE_KEY`). When it is absent, older keys used by
//! previous front ends are probed once and merged onto defaults.

#[cfg(test)]
use std::collections::HashMap;
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{Difficulty, Mode, ProgressState};
use crate::error::GameError;

pub const SAVE_KEY: &str = "treino_hero.v1";
pub const SAVE_VERSION: u32 = 1;

/// Legacy keys, newest first.
const LEGACY_KEYS: &[&str] = &["treinoHero_v2", "treinoHero_stats", "treinoHero", "treino-hero-save"];

pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, GameError>;
  fn set(&self, key: &str, value: &str) -> Result<(), GameError>;
}

/// One file per key under `dir`.
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn path_for(&self, key: &str) -> PathBuf {
    let name: String = key
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
      .collect();
    self.dir.join(format!("{}.json", name))
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, GameError> {
    match std::fs::read_to_string(self.path_for(key)) {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(GameError::StorageUnavailable(e.to_string())),
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<(), GameError> {
    std::fs::create_dir_all(&self.dir).map_err(|e| GameError::StorageUnavailable(e.to_string()))?;
    let path = self.path_for(key);
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, value).map_err(|e| GameError::StorageUnavailable(e.to_string()))?;
    std::fs::rename(&tmp, &path).map_err(|e| GameError::StorageUnavailable(e.to_string()))
  }
}

/// In-process store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<HashMap<String, String>>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, GameError> {
    let map = self.inner.lock().map_err(|_| GameError::StorageUnavailable("poisoned".into()))?;
    Ok(map.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), GameError> {
    let mut map = self.inner.lock().map_err(|_| GameError::StorageUnavailable("poisoned".into()))?;
    map.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

/// What gets saved: progress plus player preferences. Challenge state and the
/// question cursor are per-run and never saved.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SaveSnapshot {
  pub version: u32,
  pub progress: ProgressState,
  pub mode: Mode,
  pub difficulty: Difficulty,
  pub topic: String,
}

impl Default for SaveSnapshot {
  fn default() -> Self {
    Self {
      version: SAVE_VERSION,
      progress: ProgressState::default(),
      mode: Mode::Classic,
      difficulty: Difficulty::Medium,
      topic: String::new(),
    }
  }
}

/// Load the current snapshot, migrating a legacy save if that is all there is.
/// Never fails: unreadable storage or corrupt data yields defaults.
pub fn load_snapshot(store: &dyn KeyValueStore) -> SaveSnapshot {
  match store.get(SAVE_KEY) {
    Ok(Some(raw)) => match serde_json::from_str::<SaveSnapshot>(&raw) {
      Ok(mut snap) => {
        snap.version = SAVE_VERSION;
        snap.progress = snap.progress.normalized();
        debug!(target: "storage", key = SAVE_KEY, "Loaded save snapshot");
        return snap;
      }
      Err(e) => {
        warn!(target: "storage", key = SAVE_KEY, error = %e, "Corrupt save snapshot; using defaults");
        return SaveSnapshot::default();
      }
    },
    Ok(None) => {}
    Err(e) => {
      warn!(target: "storage", error = %e, "Storage unavailable on load; using defaults");
      return SaveSnapshot::default();
    }
  }

  for key in LEGACY_KEYS {
    let raw = match store.get(key) {
      Ok(Some(raw)) => raw,
      _ => continue,
    };
    match serde_json::from_str::<Value>(&raw) {
      Ok(v) if v.is_object() => {
        info!(target: "storage", legacy_key = %key, "Migrating legacy save");
        return migrate_legacy(&v);
      }
      _ => warn!(target: "storage", legacy_key = %key, "Ignoring unreadable legacy save"),
    }
  }
  SaveSnapshot::default()
}

pub fn save_snapshot(store: &dyn KeyValueStore, snap: &SaveSnapshot) -> Result<(), GameError> {
  let raw = serde_json::to_string(snap).map_err(|e| GameError::StorageUnavailable(e.to_string()))?;
  store.set(SAVE_KEY, &raw)
}

/// Lenient merge of the flat objects older front ends stored.
fn migrate_legacy(v: &Value) -> SaveSnapshot {
  let defaults = ProgressState::default();
  let progress = ProgressState {
    xp: legacy_num(v, &["xp"]).unwrap_or(defaults.xp),
    level: legacy_num(v, &["level", "nivel"]).unwrap_or(defaults.level),
    correct_count: legacy_num(v, &["correctCount", "correct_count", "correct"]).unwrap_or(defaults.correct_count),
    best_xp: legacy_num(v, &["bestXp", "best_xp"]).unwrap_or(defaults.best_xp),
    streak: legacy_num(v, &["streak"]).unwrap_or(defaults.streak),
    best_streak: legacy_num(v, &["bestStreak", "best_streak"]).unwrap_or(defaults.best_streak),
  }
  .normalized();

  SaveSnapshot {
    version: SAVE_VERSION,
    progress,
    mode: legacy_text(v, &["mode"]).and_then(Mode::parse_lenient).unwrap_or_default(),
    difficulty: legacy_text(v, &["difficulty", "dificuldade"]).and_then(Difficulty::parse_lenient).unwrap_or_default(),
    topic: legacy_text(v, &["topic", "theme", "tema"]).unwrap_or_default().to_string(),
  }
}

fn legacy_num(v: &Value, keys: &[&str]) -> Option<u32> {
  keys
    .iter()
    .find_map(|k| v.get(*k))
    .and_then(|x| x.as_u64().or_else(|| x.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)))
    .map(|n| n.min(u32::MAX as u64) as u32)
}

fn legacy_text<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a str> {
  keys.iter().find_map(|k| v.get(*k)).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_save_yields_defaults() {
    let store = MemoryStore::default();
    assert_eq!(load_snapshot(&store), SaveSnapshot::default());
  }

  #[test]
  fn save_then_load() {
    let store = MemoryStore::default();
    let snap = SaveSnapshot {
      progress: ProgressState { xp: 20, level: 4, correct_count: 32, best_xp: 90, streak: 2, best_streak: 9 },
      mode: Mode::Ai,
      difficulty: Difficulty::Hard,
      topic: "cardio".into(),
      ..Default::default()
    };
    save_snapshot(&store, &snap).unwrap();
    assert_eq!(load_snapshot(&store), snap);
  }

  #[test]
  fn partial_snapshot_merges_defaults() {
    let store = MemoryStore::default();
    store.set(SAVE_KEY, r#"{"progress": {"xp": 40}, "difficulty": "easy"}"#).unwrap();
    let snap = load_snapshot(&store);
    assert_eq!(snap.progress.xp, 40);
    assert_eq!(snap.progress.level, 1);
    assert_eq!(snap.difficulty, Difficulty::Easy);
    assert_eq!(snap.mode, Mode::Classic);
  }

  #[test]
  fn level_zero_snapshot_is_repaired_on_load() {
    let store = MemoryStore::default();
    store
      .set(SAVE_KEY, r#"{"progress":{"level":0,"xp":50,"best_xp":10,"streak":4,"best_streak":1}}"#)
      .unwrap();
    let p = load_snapshot(&store).progress;
    assert_eq!(p.level, 1);
    assert_eq!(p.xp, 50);
    assert!(p.best_xp >= p.xp);
    assert!(p.best_streak >= p.streak);
  }

  #[test]
  fn corrupt_snapshot_yields_defaults() {
    let store = MemoryStore::default();
    store.set(SAVE_KEY, "{not json").unwrap();
    assert_eq!(load_snapshot(&store), SaveSnapshot::default());
  }

  #[test]
  fn legacy_main_state_is_migrated() {
    let store = MemoryStore::default();
    store
      .set("treinoHero", r#"{"mode":"ia","level":3,"xp":40,"energy":10,"lives":2,"questionIndex":7,"currentQuestion":null}"#)
      .unwrap();
    let snap = load_snapshot(&store);
    assert_eq!(snap.mode, Mode::Ai);
    assert_eq!(snap.progress.level, 3);
    assert_eq!(snap.progress.xp, 40);
    assert_eq!(snap.progress.best_xp, 40);
  }

  #[test]
  fn newest_legacy_key_wins() {
    let store = MemoryStore::default();
    store.set("treino-hero-save", r#"{"level": 2}"#).unwrap();
    store.set("treinoHero_v2", r#"{"level": 5, "correct": 44, "bestStreak": 6}"#).unwrap();
    let snap = load_snapshot(&store);
    assert_eq!(snap.progress.level, 5);
    assert_eq!(snap.progress.correct_count, 44);
    assert_eq!(snap.progress.best_streak, 6);
  }

  #[test]
  fn file_store_roundtrip_and_missing_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("nested"));
    assert_eq!(store.get(SAVE_KEY).unwrap(), None);
    store.set(SAVE_KEY, "{}").unwrap();
    assert_eq!(store.get(SAVE_KEY).unwrap().as_deref(), Some("{}"));
    assert!(dir.path().join("nested").join("treino_hero.v1.json").exists());
  }
}
