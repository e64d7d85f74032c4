use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use web_time::SystemTime;

use crate::*;

/// How many finished games the archive keeps before evicting the oldest.
pub const HISTORY_LIMIT: usize = 50;

/// Per-game counters, created at game start and read once at game end.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub moves: u32,
    pub perfect_moves: u32,
    pub mistakes: u32,
    pub peek_uses: u32,
    pub math_correct: u32,
    pub math_attempts: u32,
}

/// Per-player pair counts; monotonically non-decreasing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub player1: Points,
    pub player2: Points,
}

impl Scores {
    pub fn award(&mut self, player: Player) {
        match player {
            Player::One => self.player1 += 1,
            Player::Two => self.player2 += 1,
        }
    }

    pub const fn of(&self, player: Player) -> Points {
        match player {
            Player::One => self.player1,
            Player::Two => self.player2,
        }
    }

    pub fn diff(&self) -> Points {
        self.player1.abs_diff(self.player2)
    }

    /// Higher score wins; `None` on a tie.
    pub fn winner(&self) -> Option<Player> {
        use core::cmp::Ordering::*;
        match self.player1.cmp(&self.player2) {
            Greater => Some(Player::One),
            Less => Some(Player::Two),
            Equal => None,
        }
    }
}

/// Archive entry for one finished game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub grid_size: Coord,
    pub scores: Scores,
    pub winner: Option<Player>,
    pub stats: GameStats,
    pub elapsed_ms: u64,
    pub finished_at_ms: u64,
}

/// Bounded archive of finished games, newest last.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameHistory {
    entries: VecDeque<GameRecord>,
}

impl GameHistory {
    pub fn push(&mut self, record: GameRecord) {
        if self.entries.len() >= HISTORY_LIMIT {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&GameRecord> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameRecord> {
        self.entries.iter()
    }
}

/// Milliseconds since the Unix epoch, 0 if the clock is unavailable.
pub(crate) fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(grid_size: Coord) -> GameRecord {
        GameRecord {
            grid_size,
            scores: Scores::default(),
            winner: None,
            stats: GameStats::default(),
            elapsed_ms: 0,
            finished_at_ms: 0,
        }
    }

    #[test]
    fn winner_follows_the_higher_score() {
        let mut scores = Scores::default();
        assert_eq!(scores.winner(), None);
        scores.award(Player::Two);
        assert_eq!(scores.winner(), Some(Player::Two));
        scores.award(Player::One);
        scores.award(Player::One);
        assert_eq!(scores.winner(), Some(Player::One));
        assert_eq!(scores.diff(), 1);
    }

    #[test]
    fn history_evicts_the_oldest_past_the_cap() {
        let mut history = GameHistory::default();
        for i in 0..55u64 {
            let mut entry = record(4);
            entry.finished_at_ms = i;
            history.push(entry);
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.iter().next().unwrap().finished_at_ms, 5);
        assert_eq!(history.latest().unwrap().finished_at_ms, 54);
    }
}
