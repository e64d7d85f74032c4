use rand::prelude::*;
use std::time::Duration;
use web_time::Instant;

use crate::*;

pub const ACHIEVEMENTS_KEY: &str = "achievements";
pub const HISTORY_KEY: &str = "history";

/// Chance of the bonus hunt offering itself after a finished game.
pub const BONUS_HUNT_CHANCE: f64 = 0.05;

/// Shell-facing session owning the engine, collaborators, persistence and
/// the bonus-hunt lifecycle. Constructed and passed around explicitly by the
/// application shell; there is no process-wide instance.
pub struct GameSession {
    store: Box<dyn BlobStore>,
    audio: Box<dyn AudioOutput>,
    observer: Box<dyn GameObserver>,
    hunt_observer: Box<dyn HuntObserver>,
    rng: SmallRng,
    achievements: AchievementLog,
    history: GameHistory,
    engine: Option<MatchEngine>,
    hunt: Option<HuntSession>,
    peek_gate: PeekGate,
    started_at: Option<Instant>,
    timings: Timings,
}

impl GameSession {
    /// Loads achievements and history from the store; failures fall back to
    /// in-memory defaults.
    pub fn new(mut store: Box<dyn BlobStore>, seed: u64) -> Self {
        let achievements = load_or_default(store.as_mut(), ACHIEVEMENTS_KEY);
        let history = load_or_default(store.as_mut(), HISTORY_KEY);
        Self {
            store,
            audio: Box::new(SilentAudio),
            observer: Box::new(NullObserver),
            hunt_observer: Box::new(NullHuntObserver),
            rng: SmallRng::seed_from_u64(seed),
            achievements,
            history,
            engine: None,
            hunt: None,
            peek_gate: PeekGate::default(),
            started_at: None,
            timings: Timings::default(),
        }
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioOutput>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn GameObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_hunt_observer(mut self, observer: Box<dyn HuntObserver>) -> Self {
        self.hunt_observer = observer;
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn engine(&self) -> Option<&MatchEngine> {
        self.engine.as_ref()
    }

    pub fn hunt(&self) -> Option<&HuntSession> {
        self.hunt.as_ref()
    }

    pub fn achievements(&self) -> &AchievementLog {
        &self.achievements
    }

    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    /// Validates the grid size, deals a fresh shuffled deck and replaces any
    /// running game. Replacing the engine drops its pending settle with it,
    /// so no stale resolution can touch the new board.
    pub fn start_game(&mut self, grid_size: Coord) -> Result<()> {
        let config = GridConfig::for_size(grid_size)?;
        let deck = ShuffledDeckGenerator::new(self.rng.random()).generate(config);
        let mut engine = MatchEngine::new(config, deck)?;
        engine.set_timings(self.timings);
        self.engine = Some(engine);
        self.peek_gate = PeekGate::default();
        self.started_at = Some(Instant::now());
        self.audio.play_sound(SoundCue::ButtonClick);
        self.audio.start_music(MusicTrack::Game);
        log::debug!("started a {grid_size}x{grid_size} game");
        Ok(())
    }

    pub fn move_cursor(&mut self, dir: Direction) -> Result<bool> {
        let engine = self.engine.as_mut().ok_or(GameError::NoActiveGame)?;
        let moved = engine.move_cursor(dir);
        if moved {
            self.audio.play_sound(SoundCue::ButtonClick);
        }
        self.dispatch_engine_events();
        Ok(moved)
    }

    pub fn flip(&mut self, index: CardIndex) -> Result<FlipOutcome> {
        let engine = self.engine.as_mut().ok_or(GameError::NoActiveGame)?;
        let outcome = engine.flip(index)?;
        self.after_flip(outcome);
        Ok(outcome)
    }

    pub fn select(&mut self, index: CardIndex) -> Result<FlipOutcome> {
        let engine = self.engine.as_mut().ok_or(GameError::NoActiveGame)?;
        let outcome = engine.select(index)?;
        self.after_flip(outcome);
        Ok(outcome)
    }

    pub fn flip_at_cursor(&mut self) -> Result<FlipOutcome> {
        let engine = self.engine.as_mut().ok_or(GameError::NoActiveGame)?;
        let outcome = engine.flip_at_cursor()?;
        self.after_flip(outcome);
        Ok(outcome)
    }

    /// Offers a math problem unless the peek cooldown is still running.
    pub fn request_peek(&mut self) -> Result<Option<MathProblem>> {
        let now = self.engine.as_ref().ok_or(GameError::NoActiveGame)?.now();
        let problem = self.peek_gate.request(now, &mut self.rng);
        if problem.is_some() {
            self.audio.play_sound(SoundCue::Peek);
        }
        Ok(problem)
    }

    /// Checks a math answer; a correct one activates the peek window and is
    /// counted toward the math achievement.
    pub fn submit_answer(&mut self, value: u8) -> Result<AnswerOutcome> {
        let engine = self.engine.as_mut().ok_or(GameError::NoActiveGame)?;
        let outcome = self.peek_gate.submit(value, engine.now());
        match outcome {
            AnswerOutcome::Correct => {
                engine.stats_mut().math_attempts += 1;
                engine.stats_mut().math_correct += 1;
                engine.activate_peek(PEEK_DURATION);
                self.audio.play_sound(SoundCue::MathCorrect);
            }
            AnswerOutcome::Incorrect { .. } => {
                engine.stats_mut().math_attempts += 1;
                self.audio.play_sound(SoundCue::CardMiss);
            }
            AnswerOutcome::NoChallenge => {}
        }
        self.dispatch_engine_events();
        Ok(outcome)
    }

    /// Rolls the post-game bonus trigger.
    pub fn roll_bonus_hunt(&mut self) -> bool {
        self.rng.random::<f64>() < BONUS_HUNT_CHANCE
    }

    /// Starts a hunt session, replacing any previous one (and its timers).
    pub fn start_hunt(&mut self, config: HuntConfig) -> &HuntSession {
        self.audio.play_sound(SoundCue::MinigameStart);
        self.audio.start_music(MusicTrack::Minigame);
        self.hunt = Some(HuntSession::new(config, self.rng.random()));
        log::debug!("started a bonus hunt");
        self.hunt.as_ref().expect("just placed")
    }

    pub fn move_hunt_cat(&mut self, dir: Direction) -> Result<bool> {
        let hunt = self.hunt.as_mut().ok_or(GameError::HuntInactive)?;
        let moved = hunt.move_cat(dir);
        self.dispatch_hunt_events();
        Ok(moved)
    }

    pub fn pounce(&mut self) -> Result<PounceOutcome> {
        let hunt = self.hunt.as_mut().ok_or(GameError::HuntInactive)?;
        self.audio.play_sound(SoundCue::CatMeow);
        let outcome = hunt.pounce()?;
        self.dispatch_hunt_events();
        Ok(outcome)
    }

    /// Drives both virtual clocks: engine settles and the hunt countdown.
    pub fn advance(&mut self, dt: Duration) {
        if let Some(engine) = self.engine.as_mut() {
            engine.advance(dt);
        }
        self.dispatch_engine_events();

        let hunt_finished = match self.hunt.as_mut() {
            Some(hunt) => {
                let was_active = hunt.is_active();
                hunt.advance(dt);
                was_active && !hunt.is_active()
            }
            None => false,
        };
        self.dispatch_hunt_events();
        if hunt_finished {
            self.finalize_hunt();
        }
    }

    /// Explicit reset-all, the only way achievement records are deleted.
    pub fn reset_achievements(&mut self) {
        self.achievements.reset_all();
        if let Err(err) = self.store.remove_blob(ACHIEVEMENTS_KEY) {
            log::warn!("Failed to clear achievements blob: {err}");
        }
    }

    fn after_flip(&mut self, outcome: FlipOutcome) {
        self.dispatch_engine_events();
        if outcome == FlipOutcome::Won {
            self.finalize_game();
        }
    }

    /// Runs once when the final pair lands: achievements, history, blobs.
    fn finalize_game(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let elapsed_ms = self
            .started_at
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or(0);
        let scores = engine.scores();
        let stats = *engine.stats();
        let grid_size = engine.config().size;
        let winner = engine.winner();

        for achievement in evaluate_match_game(scores, &stats, grid_size, elapsed_ms, winner) {
            self.unlock(achievement);
        }

        self.history.push(GameRecord {
            grid_size,
            scores,
            winner,
            stats,
            elapsed_ms,
            finished_at_ms: epoch_ms(),
        });
        save_or_warn(self.store.as_mut(), HISTORY_KEY, &self.history);
        save_or_warn(self.store.as_mut(), ACHIEVEMENTS_KEY, &self.achievements);
    }

    fn finalize_hunt(&mut self) {
        let report = match self.hunt.as_ref() {
            Some(hunt) => hunt.report(),
            None => return,
        };
        self.audio.stop_music();
        self.audio.play_sound(if report.score >= 15 {
            SoundCue::GameWin
        } else {
            SoundCue::CatDisappoint
        });
        self.hunt_observer.on_finished(&report);
        for achievement in evaluate_hunt(&report) {
            self.unlock(achievement);
        }
        save_or_warn(self.store.as_mut(), ACHIEVEMENTS_KEY, &self.achievements);
    }

    fn unlock(&mut self, achievement: Achievement) {
        if self.achievements.unlock(achievement) {
            self.audio.play_sound(SoundCue::AchievementUnlock);
            self.observer.on_achievement_unlocked(achievement);
        }
    }

    fn dispatch_engine_events(&mut self) {
        let events = match self.engine.as_mut() {
            Some(engine) => engine.take_events(),
            None => return,
        };
        for event in events {
            match event {
                EngineEvent::CursorMoved { .. } => {}
                EngineEvent::Flipped { index } => {
                    self.audio.play_sound(SoundCue::CardFlip);
                    self.observer.on_flip(index);
                }
                EngineEvent::JokerRevealed { joker, pair } => {
                    self.observer.on_joker_reveal(joker, pair);
                }
                EngineEvent::Matched { indices, joker } => {
                    self.audio.play_sound(SoundCue::CardMatch);
                    self.audio.play_sound(SoundCue::CatPurr);
                    self.observer.on_match(&indices, joker);
                }
                EngineEvent::Mismatched { indices } => {
                    self.audio.play_sound(SoundCue::CardMiss);
                    self.audio.play_sound(SoundCue::CatDisappoint);
                    self.observer.on_mismatch(&indices);
                }
                EngineEvent::TurnChanged { .. } => {}
                EngineEvent::PeekStarted | EngineEvent::PeekEnded => {}
                EngineEvent::Completed { winner } => {
                    self.audio.stop_music();
                    self.audio.play_sound(if winner.is_some() {
                        SoundCue::GameWin
                    } else {
                        SoundCue::CatPurr
                    });
                    self.observer.on_complete(winner);
                }
            }
        }
    }

    fn dispatch_hunt_events(&mut self) {
        let events = match self.hunt.as_mut() {
            Some(hunt) => hunt.take_events(),
            None => return,
        };
        for event in events {
            match event {
                HuntEvent::Spawned { kind, x, y } => self.hunt_observer.on_spawn(kind, x, y),
                HuntEvent::Caught {
                    kind,
                    points,
                    streak,
                } => {
                    self.audio.play_sound(SoundCue::MouseCatch);
                    if kind == MouseKind::Golden {
                        self.audio.play_sound(SoundCue::AchievementUnlock);
                    }
                    self.hunt_observer.on_catch(kind, points, streak);
                }
                HuntEvent::PerfectPounce { count } => {
                    self.audio.play_sound(SoundCue::AchievementUnlock);
                    self.hunt_observer.on_perfect_pounce(count);
                }
                HuntEvent::Expired { kind } => self.hunt_observer.on_expire(kind),
                HuntEvent::Finished => {}
            }
        }
    }
}
