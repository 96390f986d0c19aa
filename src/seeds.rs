//! Built-in question bank so the game is playable without config or network.

use crate::domain::{Difficulty, Question};
use crate::error::GameError;

struct SeedQuestion {
  text: &'static str,
  options: &'static [&'static str],
  correct: usize,
  explanation: &'static str,
  difficulty: Difficulty,
}

const SEEDS: &[SeedQuestion] = &[
  SeedQuestion {
    text: "Para hipertrofia, uma faixa comum de repetições por série é:",
    options: &["1-3 reps", "6-12 reps", "20-30 reps"],
    correct: 1,
    explanation: "6-12 reps é uma faixa clássica para volume e tensão mecânica.",
    difficulty: Difficulty::Medium,
  },
  SeedQuestion {
    text: "Descanso entre séries de exercícios compostos pesados:",
    options: &["15-30s", "60-90s", "2-3min"],
    correct: 2,
    explanation: "Compostos pesados precisam de 2-3min para manter performance.",
    difficulty: Difficulty::Easy,
  },
  SeedQuestion {
    text: "Mobilidade antes do treino:",
    options: &["Estático longo", "Dinâmico leve", "Nenhum"],
    correct: 1,
    explanation: "Mobilidade dinâmica aquece sem reduzir potência.",
    difficulty: Difficulty::Hard,
  },
  SeedQuestion {
    text: "Qual macronutriente é mais associado à recuperação muscular?",
    options: &["Proteína", "Gordura", "Fibra"],
    correct: 0,
    explanation: "Proteína fornece aminoácidos para reparar e construir fibras musculares.",
    difficulty: Difficulty::Easy,
  },
  SeedQuestion {
    text: "Sobrecarga progressiva significa:",
    options: &["Treinar sempre até a falha", "Aumentar gradualmente o estímulo", "Trocar de treino toda semana"],
    correct: 1,
    explanation: "Aumentar carga, volume ou densidade aos poucos mantém o corpo se adaptando.",
    difficulty: Difficulty::Medium,
  },
  SeedQuestion {
    text: "Em um EMOM de 16 minutos, você executa:",
    options: &["Um bloco a cada minuto", "O máximo de reps em 16 minutos", "16 séries sem descanso"],
    correct: 0,
    explanation: "EMOM = every minute on the minute: um bloco no início de cada minuto.",
    difficulty: Difficulty::Hard,
  },
];

/// The bank shipped with the game.
pub fn seed_questions() -> Result<Vec<Question>, GameError> {
  SEEDS
    .iter()
    .map(|s| {
      Question::new(
        s.text,
        s.options.iter().map(|o| o.to_string()).collect(),
        s.correct,
        s.explanation,
        s.difficulty,
      )
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seeds_are_valid_and_cover_every_difficulty() {
    let bank = seed_questions().unwrap();
    assert_eq!(bank.len(), SEEDS.len());
    for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
      assert!(bank.iter().any(|q| q.difficulty() == d), "missing {:?}", d);
    }
  }
}
