use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Card index out of range")]
    InvalidIndex,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("No game is running")]
    NoActiveGame,
    #[error("Unsupported grid size {0}")]
    UnsupportedGridSize(u8),
    #[error("Deck size does not match the configured board")]
    InvalidDeckSize,
    #[error("No hunt session is running")]
    HuntInactive,
}

pub type Result<T> = core::result::Result<T, GameError>;
