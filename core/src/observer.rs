use serde::{Deserialize, Serialize};

use crate::*;

/// Sound cue vocabulary the audio collaborator understands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    ButtonClick,
    CardFlip,
    CardMatch,
    CardMiss,
    CatPurr,
    CatDisappoint,
    CatMeow,
    MouseCatch,
    AchievementUnlock,
    GameWin,
    MinigameStart,
    Peek,
    MathCorrect,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicTrack {
    Title,
    Game,
    Minigame,
}

/// Fire-and-forget audio collaborator; the engine never reads anything back.
pub trait AudioOutput {
    fn play_sound(&mut self, _cue: SoundCue) {}
    fn start_music(&mut self, _track: MusicTrack) {}
    fn stop_music(&mut self) {}
}

/// Default audio collaborator that plays nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct SilentAudio;

impl AudioOutput for SilentAudio {}

/// Presentation-side notifications for the board game. Purely informative;
/// game logic never waits on them.
pub trait GameObserver {
    fn on_flip(&mut self, _index: CardIndex) {}
    fn on_match(&mut self, _indices: &[CardIndex], _is_joker_match: bool) {}
    fn on_mismatch(&mut self, _indices: &[CardIndex]) {}
    fn on_joker_reveal(&mut self, _joker: CardIndex, _pair: (CardIndex, CardIndex)) {}
    fn on_complete(&mut self, _winner: Option<Player>) {}
    fn on_achievement_unlocked(&mut self, _achievement: Achievement) {}
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NullObserver;

impl GameObserver for NullObserver {}

/// Presentation-side notifications for the hunt.
pub trait HuntObserver {
    fn on_spawn(&mut self, _kind: MouseKind, _x: f32, _y: f32) {}
    fn on_catch(&mut self, _kind: MouseKind, _points: Points, _streak: u16) {}
    fn on_perfect_pounce(&mut self, _count: u16) {}
    fn on_expire(&mut self, _kind: MouseKind) {}
    fn on_finished(&mut self, _report: &HuntReport) {}
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NullHuntObserver;

impl HuntObserver for NullHuntObserver {}
