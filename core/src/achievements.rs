use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::*;

/// Every achievement the game can award, keyed by its display name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Achievement {
    PurrfectMemory,
    CatBurglar,
    NineLives,
    LightningCat,
    MathWizard,
    SpeedHunter,
    GoldenHunter,
    MouseMaster,
    PerfectPouncer,
    StreakMaster,
}

impl Achievement {
    pub const ALL: [Achievement; 10] = [
        Self::PurrfectMemory,
        Self::CatBurglar,
        Self::NineLives,
        Self::LightningCat,
        Self::MathWizard,
        Self::SpeedHunter,
        Self::GoldenHunter,
        Self::MouseMaster,
        Self::PerfectPouncer,
        Self::StreakMaster,
    ];

    /// Stable unique key, also the display name.
    pub const fn key(self) -> &'static str {
        match self {
            Self::PurrfectMemory => "Purr-fect Memory",
            Self::CatBurglar => "Cat Burglar",
            Self::NineLives => "Nine Lives",
            Self::LightningCat => "Lightning Cat",
            Self::MathWizard => "Math Wizard",
            Self::SpeedHunter => "Speed Hunter",
            Self::GoldenHunter => "Golden Hunter",
            Self::MouseMaster => "Mouse Master",
            Self::PerfectPouncer => "Perfect Pouncer",
            Self::StreakMaster => "Streak Master",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::PurrfectMemory => "Complete a game without any mistakes",
            Self::CatBurglar => "Win a game by 3 or more points",
            Self::NineLives => "Make a dramatic comeback victory",
            Self::LightningCat => "Complete the 6x6 grid in under 2 minutes",
            Self::MathWizard => "Solve 3 math problems correctly in one game",
            Self::SpeedHunter => "Achieve a legendary score in the mouse hunt",
            Self::GoldenHunter => "Catch the rare golden mouse",
            Self::MouseMaster => "Catch every mouse in the hunt",
            Self::PerfectPouncer => "Catch 3 mice with one pounce",
            Self::StreakMaster => "Achieve a 5+ mouse catching streak",
        }
    }
}

/// Rules over a finished board game; all independent, all may fire together.
pub fn evaluate_match_game(
    scores: Scores,
    stats: &GameStats,
    grid_size: Coord,
    elapsed_ms: u64,
    winner: Option<Player>,
) -> Vec<Achievement> {
    let mut earned = Vec::new();
    if stats.mistakes == 0 {
        earned.push(Achievement::PurrfectMemory);
    }
    if scores.diff() >= 3 {
        earned.push(Achievement::CatBurglar);
    }
    if grid_size == 6 && elapsed_ms < 120_000 {
        earned.push(Achievement::LightningCat);
    }
    if stats.math_correct >= 3 {
        earned.push(Achievement::MathWizard);
    }
    // Coarse comeback proxy; no score trajectory exists to do better.
    if winner.is_some() && scores.diff() >= 2 && stats.mistakes >= 3 {
        earned.push(Achievement::NineLives);
    }
    earned
}

/// Rules over a finished hunt session.
pub fn evaluate_hunt(report: &HuntReport) -> Vec<Achievement> {
    let mut earned = Vec::new();
    if report.caught_of(MouseKind::Golden) > 0 {
        earned.push(Achievement::GoldenHunter);
    }
    if report.total_spawned >= 8 && report.total_caught == report.total_spawned {
        earned.push(Achievement::MouseMaster);
    }
    if report.score >= 20 {
        earned.push(Achievement::SpeedHunter);
    }
    if report.perfect_pounces > 0 {
        earned.push(Achievement::PerfectPouncer);
    }
    if report.longest_streak >= 5 {
        earned.push(Achievement::StreakMaster);
    }
    earned
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub name: String,
    pub description: String,
    pub unlocked_at_ms: u64,
}

/// Name-keyed unlock log. Unlocking an already-unlocked name is a no-op and
/// keeps the first timestamp; records are only ever removed by
/// [`AchievementLog::reset_all`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementLog {
    unlocked: HashMap<String, AchievementRecord>,
}

impl AchievementLog {
    /// Returns true when this call created the record.
    pub fn unlock(&mut self, achievement: Achievement) -> bool {
        self.unlock_at(achievement, epoch_ms())
    }

    pub(crate) fn unlock_at(&mut self, achievement: Achievement, timestamp_ms: u64) -> bool {
        let key = achievement.key();
        if self.unlocked.contains_key(key) {
            return false;
        }
        self.unlocked.insert(
            key.to_owned(),
            AchievementRecord {
                name: key.to_owned(),
                description: achievement.description().to_owned(),
                unlocked_at_ms: timestamp_ms,
            },
        );
        true
    }

    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.unlocked.contains_key(achievement.key())
    }

    pub fn get(&self, achievement: Achievement) -> Option<&AchievementRecord> {
        self.unlocked.get(achievement.key())
    }

    pub fn len(&self) -> usize {
        self.unlocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AchievementRecord> {
        self.unlocked.values()
    }

    pub fn reset_all(&mut self) {
        self.unlocked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> GameStats {
        GameStats::default()
    }

    fn scores(player1: Points, player2: Points) -> Scores {
        Scores { player1, player2 }
    }

    #[test]
    fn flawless_game_awards_purrfect_memory() {
        let earned = evaluate_match_game(scores(5, 3), &stats(), 4, 60_000, Some(Player::One));
        assert!(earned.contains(&Achievement::PurrfectMemory));
        assert!(!earned.contains(&Achievement::CatBurglar));
    }

    #[test]
    fn blowout_awards_cat_burglar() {
        let mut stats = stats();
        stats.mistakes = 1;
        let earned = evaluate_match_game(scores(6, 2), &stats, 4, 60_000, Some(Player::One));
        assert!(earned.contains(&Achievement::CatBurglar));
        assert!(!earned.contains(&Achievement::PurrfectMemory));
    }

    #[test]
    fn speed_clear_requires_the_big_grid() {
        let mut stats = stats();
        stats.mistakes = 1;
        let fast_big = evaluate_match_game(scores(9, 7), &stats, 6, 100_000, Some(Player::One));
        assert!(fast_big.contains(&Achievement::LightningCat));

        let fast_small = evaluate_match_game(scores(5, 3), &stats, 4, 100_000, Some(Player::One));
        assert!(!fast_small.contains(&Achievement::LightningCat));

        let slow_big = evaluate_match_game(scores(9, 7), &stats, 6, 120_000, Some(Player::One));
        assert!(!slow_big.contains(&Achievement::LightningCat));
    }

    #[test]
    fn three_correct_answers_award_math_wizard() {
        let mut stats = stats();
        stats.mistakes = 1;
        stats.math_correct = 3;
        let earned = evaluate_match_game(scores(4, 4), &stats, 4, 60_000, None);
        assert!(earned.contains(&Achievement::MathWizard));
    }

    #[test]
    fn nine_lives_needs_a_winner_a_margin_and_mistakes() {
        let mut stats = stats();
        stats.mistakes = 3;
        let earned = evaluate_match_game(scores(5, 3), &stats, 4, 60_000, Some(Player::One));
        assert!(earned.contains(&Achievement::NineLives));

        let tied = evaluate_match_game(scores(4, 4), &stats, 4, 60_000, None);
        assert!(!tied.contains(&Achievement::NineLives));

        stats.mistakes = 2;
        let calm = evaluate_match_game(scores(5, 3), &stats, 4, 60_000, Some(Player::One));
        assert!(!calm.contains(&Achievement::NineLives));
    }

    #[test]
    fn independent_rules_may_fire_together() {
        let mut stats = stats();
        stats.math_correct = 3;
        let earned = evaluate_match_game(scores(12, 4), &stats, 6, 90_000, Some(Player::One));
        for expected in [
            Achievement::PurrfectMemory,
            Achievement::CatBurglar,
            Achievement::LightningCat,
            Achievement::MathWizard,
        ] {
            assert!(earned.contains(&expected), "{expected:?}");
        }
    }

    #[test]
    fn unlock_is_idempotent_and_keeps_the_first_timestamp() {
        let mut log = AchievementLog::default();
        assert!(log.unlock_at(Achievement::CatBurglar, 1_000));
        assert!(!log.unlock_at(Achievement::CatBurglar, 2_000));

        assert_eq!(log.len(), 1);
        assert_eq!(log.get(Achievement::CatBurglar).unwrap().unlocked_at_ms, 1_000);
    }

    #[test]
    fn reset_all_clears_every_record() {
        let mut log = AchievementLog::default();
        log.unlock(Achievement::GoldenHunter);
        log.unlock(Achievement::StreakMaster);
        log.reset_all();
        assert!(log.is_empty());
        assert!(!log.is_unlocked(Achievement::GoldenHunter));
    }

    #[test]
    fn keys_are_unique() {
        let mut seen = hashbrown::HashSet::new();
        for achievement in Achievement::ALL {
            assert!(seen.insert(achievement.key()));
        }
    }
}
