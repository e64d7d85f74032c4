use rand::{Rng, RngExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a granted peek keeps the board revealed.
pub const PEEK_DURATION: Duration = Duration::from_millis(4000);

/// Minimum virtual time between peek grants.
pub const PEEK_COOLDOWN: Duration = Duration::from_secs(10);

/// Single-digit addition with a sum of at most 10.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathProblem {
    pub a: u8,
    pub b: u8,
}

impl MathProblem {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let a = rng.random_range(1..=8);
        let b = rng.random_range(1..=(10 - a));
        Self { a, b }
    }

    pub const fn answer(&self) -> u8 {
        self.a + self.b
    }

    pub fn check(&self, value: u8) -> bool {
        value == self.answer()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Peek granted.
    Correct,
    /// Wrong answer; the correct one is shown briefly by the presentation.
    Incorrect { correct: u8 },
    /// No problem was pending.
    NoChallenge,
}

/// Gates peek grants behind a math problem and a cooldown on the engine's
/// virtual clock.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PeekGate {
    pending: Option<MathProblem>,
    last_granted: Option<Duration>,
}

impl PeekGate {
    /// Hands out a fresh problem unless the cooldown is still running.
    pub fn request<R: Rng + ?Sized>(&mut self, now: Duration, rng: &mut R) -> Option<MathProblem> {
        if let Some(last) = self.last_granted {
            if now < last + PEEK_COOLDOWN {
                return None;
            }
        }
        let problem = MathProblem::generate(rng);
        self.pending = Some(problem);
        Some(problem)
    }

    pub fn pending(&self) -> Option<MathProblem> {
        self.pending
    }

    /// Consumes the pending problem and checks the answer.
    pub fn submit(&mut self, value: u8, now: Duration) -> AnswerOutcome {
        let Some(problem) = self.pending.take() else {
            return AnswerOutcome::NoChallenge;
        };
        if problem.check(value) {
            self.last_granted = Some(now);
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect {
                correct: problem.answer(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn problems_stay_within_single_digit_sums() {
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..200 {
            let problem = MathProblem::generate(&mut rng);
            assert!((1..=8).contains(&problem.a));
            assert!(problem.b >= 1);
            assert!(problem.answer() <= 10);
        }
    }

    #[test]
    fn correct_answer_starts_the_cooldown() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut gate = PeekGate::default();

        let problem = gate.request(Duration::ZERO, &mut rng).unwrap();
        assert_eq!(
            gate.submit(problem.answer(), Duration::ZERO),
            AnswerOutcome::Correct
        );

        assert!(gate.request(Duration::from_secs(5), &mut rng).is_none());
        assert!(gate.request(PEEK_COOLDOWN, &mut rng).is_some());
    }

    #[test]
    fn wrong_answer_reports_the_expected_value() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut gate = PeekGate::default();

        let problem = gate.request(Duration::ZERO, &mut rng).unwrap();
        let wrong = problem.answer().wrapping_add(1);
        assert_eq!(
            gate.submit(wrong, Duration::ZERO),
            AnswerOutcome::Incorrect {
                correct: problem.answer(),
            }
        );

        // a miss neither grants a peek nor starts the cooldown
        assert_eq!(gate.submit(problem.answer(), Duration::ZERO), AnswerOutcome::NoChallenge);
        assert!(gate.request(Duration::ZERO, &mut rng).is_some());
    }
}
