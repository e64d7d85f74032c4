use super::*;

/// Deals a uniformly-random permutation of the paired-symbol multiset plus
/// the configured joker count, seeded for reproducibility.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShuffledDeckGenerator {
    seed: u64,
}

impl ShuffledDeckGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DeckGenerator for ShuffledDeckGenerator {
    fn generate(self, config: GridConfig) -> Vec<Card> {
        use rand::prelude::*;

        let mut faces: Vec<CardFace> = Vec::with_capacity(config.total_cards() as usize);
        for i in 0..config.pairs {
            let token = SymbolToken((i % SYMBOL_ALPHABET as CardCount) as u8);
            faces.push(CardFace::Symbol(token));
            faces.push(CardFace::Symbol(token));
        }
        for _ in 0..config.jokers {
            faces.push(CardFace::Joker);
        }

        // double check the table filled the board
        if faces.len() != config.total_cards() as usize {
            log::warn!(
                "Deck size mismatch, built {} cards for a {}x{} board",
                faces.len(),
                config.size,
                config.size
            );
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        faces.shuffle(&mut rng);

        faces
            .into_iter()
            .enumerate()
            .map(|(id, face)| Card::new(id as CardIndex, face))
            .collect()
    }
}
