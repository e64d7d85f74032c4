use serde::{Deserialize, Serialize};

/// Single coordinate axis used for board width, height, and cursor positions.
pub type Coord = u8;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

/// Linear index into the board, equal to the card id assigned at deal time.
pub type CardIndex = u16;

/// Count type used for pair counts and total-card counts.
pub type CardCount = u16;

/// Score points, shared between the board game and the hunt.
pub type Points = u16;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    // row-major `[y, x]` so linear iteration order equals card-id order
    fn to_nd_index(self) -> Self::Output {
        [self.1.into(), self.0.into()]
    }
}

/// Linear card index owned by the cell at `(x, y)`.
pub const fn cell_index((x, y): Coord2, size: Coord) -> CardIndex {
    (y as CardIndex) * (size as CardIndex) + (x as CardIndex)
}

/// Inverse of [`cell_index`].
pub const fn cell_coords(index: CardIndex, size: Coord) -> Coord2 {
    let size = size as CardIndex;
    ((index % size) as Coord, (index / size) as Coord)
}

/// Movement direction for both the board cursor and the hunt cat.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::One
    }
}

/// Euclidean distance in arena percentage units.
pub(crate) fn distance((x1, y1): (f32, f32), (x2, y2): (f32, f32)) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_index_round_trips_through_coords() {
        for size in [3u8, 4, 5, 6] {
            for index in 0..(size as CardIndex * size as CardIndex) {
                assert_eq!(cell_index(cell_coords(index, size), size), index);
            }
        }
    }

    #[test]
    fn nd_index_matches_linear_order() {
        let size: Coord = 4;
        let coords: Coord2 = (1, 2);
        assert_eq!(coords.to_nd_index(), [2, 1]);
        assert_eq!(cell_index(coords, size), 2 * 4 + 1);
    }

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(distance((0.0, 0.0), (3.0, 4.0)), 5.0);
    }
}
