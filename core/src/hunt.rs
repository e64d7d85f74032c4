use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::*;

/// Fixed session length.
pub const HUNT_DURATION: Duration = Duration::from_secs(30);

/// Arena bounds in percentage units, both axes.
pub const ARENA_MIN: f32 = 8.0;
pub const ARENA_MAX: f32 = 85.0;

/// Fixed 60 Hz integration step; `advance` consumes wall time in these.
const FRAME: Duration = Duration::from_micros(16_667);

const SPAWN_BAND_MIN: i32 = 10;
const SPAWN_BAND_MAX: i32 = 85;
/// Mice never spawn this close to the cat.
const SPAWN_CLEARANCE: f32 = 25.0;
const FLEE_RANGE: f32 = 30.0;
const FLEE_BOOST: f32 = 1.5;
/// Walking onto a mouse this close catches it without a pounce.
const AUTO_CATCH_RANGE: f32 = 12.0;
/// Catching this many mice in one pounce is a perfect pounce.
const PERFECT_POUNCE_COUNT: u16 = 3;
/// Streak bonus stops growing past this many consecutive catches.
const STREAK_CAP: u16 = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseKind {
    Brown,
    Gray,
    White,
    Golden,
}

impl MouseKind {
    pub const ALL: [MouseKind; 4] = [Self::Brown, Self::Gray, Self::White, Self::Golden];

    pub const fn points(self) -> Points {
        match self {
            Self::Brown => 1,
            Self::Gray => 2,
            Self::White => 3,
            Self::Golden => 5,
        }
    }

    /// Top speed in arena units per frame.
    pub const fn speed(self) -> f32 {
        match self {
            Self::Brown => 1.5,
            Self::Gray => 2.0,
            Self::White => 2.5,
            Self::Golden => 3.0,
        }
    }

    /// Spawn weight while this kind's session target is unmet.
    const fn weight(self) -> u32 {
        match self {
            Self::Brown => 50,
            Self::Gray => 30,
            Self::White => 15,
            Self::Golden => 5,
        }
    }

    /// Per-session spawn target for balanced variety.
    const fn target(self) -> u16 {
        match self {
            Self::Brown => 5,
            Self::Gray => 3,
            Self::White => 1,
            Self::Golden => 1,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Brown => 0,
            Self::Gray => 1,
            Self::White => 2,
            Self::Golden => 3,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mouse {
    pub kind: MouseKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub caught: bool,
    spawned_at: Duration,
    lifetime: Duration,
    last_turn: Duration,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HuntConfig {
    pub duration: Duration,
    pub max_mice: usize,
    pub spawn_base: Duration,
    pub spawn_jitter: Duration,
    pub move_step: f32,
    pub pounce_range: f32,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            duration: HUNT_DURATION,
            max_mice: 8,
            spawn_base: Duration::from_millis(1200),
            spawn_jitter: Duration::from_millis(1000),
            move_step: 12.0,
            pounce_range: 25.0,
        }
    }
}

impl HuntConfig {
    /// Tuning for small screens: fewer concurrent mice, slower spawns.
    pub fn compact() -> Self {
        Self {
            max_mice: 6,
            spawn_base: Duration::from_millis(1500),
            ..Self::default()
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntStats {
    pub total_spawned: u16,
    pub total_caught: u16,
    pub pounces: u16,
    pub perfect_pounces: u16,
    pub longest_streak: u16,
    pub current_streak: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HuntRating {
    Legendary,
    Master,
    Great,
    Good,
    Practice,
}

impl HuntRating {
    pub fn for_score(score: Points) -> Self {
        if score >= 20 {
            Self::Legendary
        } else if score >= 15 {
            Self::Master
        } else if score >= 10 {
            Self::Great
        } else if score >= 5 {
            Self::Good
        } else {
            Self::Practice
        }
    }
}

/// End-of-session summary handed to the achievement evaluator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HuntReport {
    pub score: Points,
    pub total_spawned: u16,
    pub total_caught: u16,
    pub spawned: [u16; 4],
    pub caught: [u16; 4],
    pub accuracy_pct: u8,
    pub longest_streak: u16,
    pub pounces: u16,
    pub perfect_pounces: u16,
    pub rating: HuntRating,
}

impl HuntReport {
    pub fn spawned_of(&self, kind: MouseKind) -> u16 {
        self.spawned[kind.index()]
    }

    pub fn caught_of(&self, kind: MouseKind) -> u16 {
        self.caught[kind.index()]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PounceOutcome {
    pub caught: u16,
    pub points: Points,
    pub perfect: bool,
}

/// Presentation-facing notifications, drained by the owning session.
#[derive(Clone, Debug, PartialEq)]
pub enum HuntEvent {
    Spawned { kind: MouseKind, x: f32, y: f32 },
    Caught { kind: MouseKind, points: Points, streak: u16 },
    PerfectPounce { count: u16 },
    Expired { kind: MouseKind },
    Finished,
}

/// Catch-the-mouse arcade session, independent of the board game, driven by
/// its own virtual clock.
#[derive(Clone, Debug)]
pub struct HuntSession {
    config: HuntConfig,
    rng: SmallRng,
    now: Duration,
    acc: Duration,
    next_spawn_at: Duration,
    cat: (f32, f32),
    mice: Vec<Mouse>,
    score: Points,
    spawned: [u16; 4],
    caught: [u16; 4],
    stats: HuntStats,
    active: bool,
    events: Vec<HuntEvent>,
}

impl HuntSession {
    pub fn new(config: HuntConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let first_spawn =
            config.spawn_base + config.spawn_jitter.mul_f32(rng.random::<f32>());
        Self {
            config,
            rng,
            now: Duration::ZERO,
            acc: Duration::ZERO,
            next_spawn_at: first_spawn,
            cat: (50.0, 50.0),
            mice: Vec::new(),
            score: 0,
            spawned: [0; 4],
            caught: [0; 4],
            stats: HuntStats::default(),
            active: true,
            events: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn time_left(&self) -> Duration {
        self.config.duration.saturating_sub(self.now)
    }

    pub fn score(&self) -> Points {
        self.score
    }

    pub fn cat_position(&self) -> (f32, f32) {
        self.cat
    }

    pub fn mice(&self) -> &[Mouse] {
        &self.mice
    }

    pub fn stats(&self) -> &HuntStats {
        &self.stats
    }

    /// Drains presentation events accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<HuntEvent> {
        core::mem::take(&mut self.events)
    }

    /// Consumes wall time in fixed 60 Hz steps: countdown, spawning,
    /// velocity integration, flee and lifetime handling.
    pub fn advance(&mut self, dt: Duration) {
        if !self.active {
            return;
        }
        self.acc += dt;
        while self.acc >= FRAME && self.active {
            self.acc -= FRAME;
            self.step();
        }
    }

    fn step(&mut self) {
        self.now += FRAME;
        if self.now >= self.config.duration {
            self.finish();
            return;
        }

        if self.now >= self.next_spawn_at {
            if self.mice.len() < self.config.max_mice {
                self.spawn_mouse();
            }
            self.next_spawn_at = self.now
                + self.config.spawn_base
                + self.config.spawn_jitter.mul_f32(self.rng.random::<f32>());
        }

        self.update_mice();
    }

    /// Kinds with unmet targets weight the draw; uniform once all are met.
    fn pick_kind(&mut self) -> MouseKind {
        let mut weights = [0u32; 4];
        let mut total = 0u32;
        for kind in MouseKind::ALL {
            if self.spawned[kind.index()] < kind.target() {
                weights[kind.index()] = kind.weight();
                total += kind.weight();
            }
        }
        if total == 0 {
            return MouseKind::ALL[self.rng.random_range(0..MouseKind::ALL.len())];
        }
        let mut roll = self.rng.random_range(0..total);
        for kind in MouseKind::ALL {
            let weight = weights[kind.index()];
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        // roll < total guarantees a hit above
        MouseKind::Brown
    }

    fn pick_spawn_position(&mut self) -> (f32, f32) {
        let mut x = 0.0;
        let mut y = 0.0;
        for _ in 0..10 {
            x = self.rng.random_range(SPAWN_BAND_MIN..=SPAWN_BAND_MAX) as f32;
            y = self.rng.random_range(SPAWN_BAND_MIN..=SPAWN_BAND_MAX) as f32;
            if distance((x, y), self.cat) >= SPAWN_CLEARANCE {
                break;
            }
        }
        (x, y)
    }

    fn spawn_mouse(&mut self) {
        let kind = self.pick_kind();
        let (x, y) = self.pick_spawn_position();
        let speed = kind.speed();
        let mouse = Mouse {
            kind,
            x,
            y,
            vx: (self.rng.random::<f32>() - 0.5) * speed,
            vy: (self.rng.random::<f32>() - 0.5) * speed,
            caught: false,
            spawned_at: self.now,
            lifetime: Duration::from_millis(8000)
                + Duration::from_millis(4000).mul_f32(self.rng.random::<f32>()),
            last_turn: self.now,
        };
        self.spawned[kind.index()] += 1;
        self.stats.total_spawned += 1;
        self.events.push(HuntEvent::Spawned { kind, x, y });
        self.mice.push(mouse);
        log::debug!("spawned {kind:?} mouse at ({x:.0}, {y:.0})");
    }

    fn update_mice(&mut self) {
        let cat = self.cat;
        let now = self.now;
        let mut index = 0;
        while index < self.mice.len() {
            let mouse = &mut self.mice[index];
            mouse.x += mouse.vx;
            mouse.y += mouse.vy;

            // bounce off the arena bounds
            if mouse.x <= ARENA_MIN || mouse.x >= ARENA_MAX {
                mouse.vx = -mouse.vx;
                mouse.x = mouse.x.clamp(ARENA_MIN, ARENA_MAX);
            }
            if mouse.y <= ARENA_MIN || mouse.y >= ARENA_MAX {
                mouse.vy = -mouse.vy;
                mouse.y = mouse.y.clamp(ARENA_MIN, ARENA_MAX);
            }

            // occasional wander so movement stays organic
            let wander_after = Duration::from_millis(2000)
                + Duration::from_millis(3000).mul_f32(self.rng.random::<f32>());
            if now.saturating_sub(mouse.last_turn) > wander_after {
                let max_speed = mouse.kind.speed();
                mouse.vx =
                    (mouse.vx + (self.rng.random::<f32>() - 0.5) * 0.5).clamp(-max_speed, max_speed);
                mouse.vy =
                    (mouse.vy + (self.rng.random::<f32>() - 0.5) * 0.5).clamp(-max_speed, max_speed);
                mouse.last_turn = now;
            }

            // bolt straight away from the cat when it gets close
            if distance((mouse.x, mouse.y), cat) < FLEE_RANGE {
                let flee_speed = mouse.kind.speed() * FLEE_BOOST;
                let angle = (mouse.y - cat.1).atan2(mouse.x - cat.0);
                mouse.vx = angle.cos() * flee_speed;
                mouse.vy = angle.sin() * flee_speed;
            }

            let kind = mouse.kind;
            let expired = now.saturating_sub(mouse.spawned_at) > mouse.lifetime;
            if expired {
                self.mice.remove(index);
                self.events.push(HuntEvent::Expired { kind });
            } else {
                index += 1;
            }
        }
    }

    /// Fixed-step cursor movement; stepping next to a mouse catches it
    /// without a pounce.
    pub fn move_cat(&mut self, dir: Direction) -> bool {
        if !self.active {
            return false;
        }
        let step = self.config.move_step;
        let (x, y) = self.cat;
        let next = match dir {
            Direction::Up => (x, (y - step).max(ARENA_MIN)),
            Direction::Down => (x, (y + step).min(ARENA_MAX)),
            Direction::Left => ((x - step).max(ARENA_MIN), y),
            Direction::Right => ((x + step).min(ARENA_MAX), y),
        };
        if next == self.cat {
            return false;
        }
        self.cat = next;
        self.catch_within(AUTO_CATCH_RANGE);
        true
    }

    /// Catches all mice within the pounce radius simultaneously, each
    /// awarding streaked points; an empty pounce resets the streak.
    pub fn pounce(&mut self) -> Result<PounceOutcome> {
        if !self.active {
            return Err(GameError::HuntInactive);
        }
        self.stats.pounces += 1;
        let before = self.score;
        let caught = self.catch_within(self.config.pounce_range);
        let perfect = caught >= PERFECT_POUNCE_COUNT;
        if perfect {
            self.stats.perfect_pounces += 1;
            self.events.push(HuntEvent::PerfectPounce { count: caught });
        }
        if caught == 0 {
            self.stats.current_streak = 0;
        }
        Ok(PounceOutcome {
            caught,
            points: self.score - before,
            perfect,
        })
    }

    fn catch_within(&mut self, range: f32) -> u16 {
        let cat = self.cat;
        let mut caught = 0;
        let mut index = 0;
        while index < self.mice.len() {
            let within = {
                let mouse = &self.mice[index];
                !mouse.caught && distance((mouse.x, mouse.y), cat) <= range
            };
            if within {
                let mouse = self.mice.remove(index);
                self.catch(mouse);
                caught += 1;
            } else {
                index += 1;
            }
        }
        caught
    }

    fn catch(&mut self, mut mouse: Mouse) {
        mouse.caught = true;
        self.stats.total_caught += 1;
        self.stats.current_streak += 1;
        self.stats.longest_streak = self.stats.longest_streak.max(self.stats.current_streak);
        self.caught[mouse.kind.index()] += 1;

        let combo = self.stats.current_streak.min(STREAK_CAP);
        let points = mouse.kind.points() + if combo > 1 { combo - 1 } else { 0 };
        self.score += points;

        self.events.push(HuntEvent::Caught {
            kind: mouse.kind,
            points,
            streak: self.stats.current_streak,
        });
    }

    fn finish(&mut self) {
        self.active = false;
        self.mice.clear();
        self.events.push(HuntEvent::Finished);
        log::debug!("hunt finished with score {}", self.score);
    }

    pub fn report(&self) -> HuntReport {
        let accuracy_pct = if self.stats.total_spawned > 0 {
            ((self.stats.total_caught as f32 / self.stats.total_spawned as f32) * 100.0).round()
                as u8
        } else {
            0
        };
        HuntReport {
            score: self.score,
            total_spawned: self.stats.total_spawned,
            total_caught: self.stats.total_caught,
            spawned: self.spawned,
            caught: self.caught,
            accuracy_pct,
            longest_streak: self.stats.longest_streak,
            pounces: self.stats.pounces,
            perfect_pounces: self.stats.perfect_pounces,
            rating: HuntRating::for_score(self.score),
        }
    }

    #[cfg(test)]
    fn place_mouse(&mut self, kind: MouseKind, x: f32, y: f32) {
        self.spawned[kind.index()] += 1;
        self.stats.total_spawned += 1;
        self.mice.push(Mouse {
            kind,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            caught: false,
            spawned_at: self.now,
            lifetime: Duration::from_secs(8),
            last_turn: self.now,
        });
    }
}
