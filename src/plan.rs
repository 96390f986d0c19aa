//! Weekly training plans shown next to the quiz.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
  #[default]
  Hipertrofia,
  Condicionamento,
  Mobilidade,
}

impl Goal {
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "hipertrofia" => Some(Goal::Hipertrofia),
      "condicionamento" => Some(Goal::Condicionamento),
      "mobilidade" => Some(Goal::Mobilidade),
      _ => None,
    }
  }

  fn workouts(&self) -> &'static [&'static str] {
    match self {
      Goal::Hipertrofia => &[
        "A: Supino, Remada, Agachamento, Desenvolvimento, Core",
        "B: Terra romeno, Puxada, Avanço, Rosca, Tríceps",
        "C: Paralelas, Remo unilateral, Levantar terra leve, Elevação lateral, Core",
      ],
      Goal::Condicionamento => &[
        "A: Circuito 20' (Kettlebell swing, Flexão, Remo TRX, Agachamento)",
        "B: EMOM 16' (Burpee, Remada, Agachamento, Prancha)",
        "C: Intervalado 10x(30\" on/30\" off) + Core",
      ],
      Goal::Mobilidade => &[
        "A: Cadeia posterior 20' + estabilização quadril",
        "B: Torácica/ombro 20' + escápulas",
        "C: Tornozelo/quadril 20' + respiração",
      ],
    }
  }
}

/// First `days` workouts of the goal, capped at what the goal defines.
pub fn plan_for(goal: Goal, days: usize) -> Vec<&'static str> {
  let all = goal.workouts();
  all[..days.min(all.len())].to_vec()
}
