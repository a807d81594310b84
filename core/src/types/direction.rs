use serde::{Deserialize, Serialize};

/// One of the eight movement directions on the server grid.
///
/// Wire ids run clockwise starting at north, matching the ids the server
/// uses in move and turn commands.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// X component of the unit step this direction takes on the server grid.
    pub fn vector_x(self) -> i32 {
        match self {
            Direction::North | Direction::South => 0,
            Direction::NorthEast | Direction::East | Direction::SouthEast => 1,
            Direction::SouthWest | Direction::West | Direction::NorthWest => -1,
        }
    }

    /// Y component of the unit step this direction takes on the server grid.
    pub fn vector_y(self) -> i32 {
        match self {
            Direction::East | Direction::West => 0,
            Direction::North | Direction::NorthEast | Direction::NorthWest => -1,
            Direction::South | Direction::SouthEast | Direction::SouthWest => 1,
        }
    }

    /// True for the four diagonal directions.
    pub fn is_diagonal(self) -> bool {
        self.vector_x() != 0 && self.vector_y() != 0
    }

    /// Maps a relative offset to a direction using the signs of both
    /// components. Returns `None` for the zero offset.
    pub fn from_components(dx: i32, dy: i32) -> Option<Self> {
        let sx = dx.signum();
        let sy = dy.signum();
        Direction::ALL
            .into_iter()
            .find(|dir| dir.vector_x() == sx && dir.vector_y() == sy)
    }

    /// Decodes a wire id into a direction.
    pub fn from_id(id: u8) -> Option<Self> {
        Direction::ALL.get(id as usize).copied()
    }

    /// The wire id of this direction.
    pub fn id(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::Direction;

    #[test]
    fn ids_roundtrip_for_all_directions() {
        for dir in Direction::ALL {
            assert_eq!(Direction::from_id(dir.id()), Some(dir));
        }
        assert_eq!(Direction::from_id(8), None);
        assert_eq!(Direction::from_id(u8::MAX), None);
    }

    #[test]
    fn vectors_are_unit_steps_and_unique() {
        for dir in Direction::ALL {
            let (dx, dy) = (dir.vector_x(), dir.vector_y());
            assert!(dx.abs() <= 1 && dy.abs() <= 1);
            assert!((dx, dy) != (0, 0));
            assert_eq!(Direction::from_components(dx, dy), Some(dir));
        }
    }

    #[test]
    fn from_components_uses_signs_only() {
        assert_eq!(Direction::from_components(5, 0), Some(Direction::East));
        assert_eq!(Direction::from_components(-3, 7), Some(Direction::SouthWest));
        assert_eq!(Direction::from_components(0, -12), Some(Direction::North));
        assert_eq!(Direction::from_components(0, 0), None);
    }

    #[test]
    fn diagonals_are_detected() {
        assert!(Direction::NorthEast.is_diagonal());
        assert!(Direction::SouthWest.is_diagonal());
        assert!(!Direction::North.is_diagonal());
        assert!(!Direction::West.is_diagonal());
    }
}
