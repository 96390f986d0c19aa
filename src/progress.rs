//! XP / level / streak bookkeeping.
//!
//! Level model is a local counter: when `xp` reaches `xp_per_level` the level
//! goes up by one and `xp` drops back to exactly zero (no carry-over).
//! `best_xp` is compared against the post-reset value, so it records the best
//! within-level xp rather than lifetime xp.

use crate::domain::ProgressState;

/// Apply one answer outcome. Pure; the input is left untouched.
pub fn apply_outcome(current: &ProgressState, is_correct: bool, xp_per_correct: u32, xp_per_level: u32) -> ProgressState {
  let mut next = *current;
  if !is_correct {
    next.streak = 0;
    return next;
  }

  next.correct_count = next.correct_count.saturating_add(1);
  next.streak = next.streak.saturating_add(1);
  next.xp = next.xp.saturating_add(xp_per_correct);
  if next.xp >= xp_per_level {
    next.level = next.level.saturating_add(1);
    next.xp = 0;
  }
  next.best_xp = next.best_xp.max(next.xp);
  next.best_streak = next.best_streak.max(next.streak);
  next
}
