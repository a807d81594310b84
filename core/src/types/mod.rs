pub mod direction;
pub mod location;

pub use direction::Direction;
pub use location::Location;

use std::fmt;

/// Server-assigned identifier of a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CharacterId(pub u32);

impl CharacterId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "char({})", self.0)
    }
}
