use serde::{Deserialize, Serialize};

pub use achievements::*;
pub use card::*;
pub use challenge::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use hunt::*;
pub use observer::*;
pub use session::*;
pub use stats::*;
pub use store::*;
pub use types::*;

mod achievements;
mod card;
mod challenge;
mod engine;
mod error;
mod generator;
mod hunt;
mod observer;
mod session;
mod stats;
mod store;
mod types;

/// Deck shape for a supported grid size.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub size: Coord,
    pub pairs: CardCount,
    pub jokers: CardCount,
}

impl GridConfig {
    pub(crate) const fn new_unchecked(size: Coord, pairs: CardCount, jokers: CardCount) -> Self {
        Self {
            size,
            pairs,
            jokers,
        }
    }

    /// Fixed deck table. Any other size is a configuration error, rejected
    /// before any board is constructed.
    pub const fn for_size(size: Coord) -> Result<Self> {
        match size {
            3 => Ok(Self::new_unchecked(3, 4, 1)),
            4 => Ok(Self::new_unchecked(4, 8, 0)),
            5 => Ok(Self::new_unchecked(5, 12, 1)),
            6 => Ok(Self::new_unchecked(6, 16, 4)),
            other => Err(GameError::UnsupportedGridSize(other)),
        }
    }

    pub const fn total_cards(&self) -> CardCount {
        (self.size as CardCount) * (self.size as CardCount)
    }
}

/// Outcome of a flip attempt.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FlipOutcome {
    /// Rejected without mutating state (face-up already, resolution pending).
    NoChange,
    /// First card of a turn turned face-up.
    Flipped,
    /// Second card matched; the current player keeps the turn.
    Matched,
    /// A joker auto-revealed an existing complete pair.
    JokerMatched,
    /// Second card did not match; both flip back once the settle fires.
    Mismatched,
    /// A joker found no complete pair and is held as an ordinary first card.
    JokerHeld,
    /// This flip matched the final pair.
    Won,
}

impl FlipOutcome {
    /// Whether this outcome could have caused an update to the board.
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    pub const fn is_match(self) -> bool {
        matches!(self, Self::Matched | Self::JokerMatched | Self::Won)
    }
}

/// Valid transitions:
/// - Idle -> Idle (first flip, cursor moves)
/// - Idle -> ResolvingPair (second flip)
/// - Idle -> ResolvingJoker (joker flip)
/// - ResolvingJoker -> Idle (settle fired, or no pair available)
/// - ResolvingPair -> Idle (settle fired)
/// - ResolvingJoker | ResolvingPair -> Complete (final pair matched)
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EnginePhase {
    Idle,
    ResolvingJoker,
    ResolvingPair,
    Complete,
}

impl EnginePhase {
    /// Flips are accepted only at rest.
    pub const fn accepts_input(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl Default for EnginePhase {
    fn default() -> Self {
        Self::Idle
    }
}
