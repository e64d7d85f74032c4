use crate::*;
pub use random::*;

mod random;

/// Builds the full card set for a grid configuration.
pub trait DeckGenerator {
    fn generate(self, config: GridConfig) -> Vec<Card>;
}
