/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use strum::{Display, EnumIter};

use super::form::Form;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, EnumIter)]
pub enum TileType {
    Floor,
    Wall,
    Dirt,  // Mole only
    Water, // Frog jumps over, nobody stands in it
}

impl TileType {
    /// Can a player in `form` step onto this tile?
    ///
    /// Water is never walkable. Crossing it is the frog's jump,
    /// which lands beyond the water and is handled by the rules.
    pub fn walkable_by(self, form: Form) -> bool {
        match self {
            TileType::Floor => true,
            TileType::Wall => false,
            TileType::Dirt => form.digs(),
            TileType::Water => false,
        }
    }

    /// Can a boulder be pushed onto this tile?
    pub fn accepts_boulder(self) -> bool {
        matches!(self, TileType::Floor)
    }

    pub fn is_water(self) -> bool {
        matches!(self, TileType::Water)
    }
}
