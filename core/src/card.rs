use serde::{Deserialize, Serialize};

use crate::CardIndex;

/// Number of distinct non-joker symbols available to the deck builder. The
/// presentation layer maps tokens to glyphs; the engine never interprets them.
pub const SYMBOL_ALPHABET: u8 = 24;

/// Opaque symbol token.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolToken(pub u8);

/// What a card shows once face-up. Face equality drives matching, so two
/// jokers compared directly against each other count as a pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CardFace {
    Symbol(SymbolToken),
    Joker,
}

impl CardFace {
    pub const fn is_joker(self) -> bool {
        matches!(self, Self::Joker)
    }
}

/// A single board cell. `id` is the board index assigned at deal time and
/// never changes; `matched` only ever goes true; `flipped` resets to false
/// when a mismatch settles.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardIndex,
    pub face: CardFace,
    pub flipped: bool,
    pub matched: bool,
}

impl Card {
    pub const fn new(id: CardIndex, face: CardFace) -> Self {
        Self {
            id,
            face,
            flipped: false,
            matched: false,
        }
    }

    pub const fn is_joker(&self) -> bool {
        self.face.is_joker()
    }
}
