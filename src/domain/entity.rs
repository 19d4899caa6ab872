/// Entities and grid primitives: coordinates, directions, the player,
/// the door and form tokens.
///
/// The grid has no fixed bounds. Coordinates are plain integer pairs with
/// y growing upward, so `Direction::Up` is `(0, 1)`.

use std::fmt;
use std::ops::Add;

use strum::{Display, EnumIter};

use super::form::Form;

// ── Coordinates ──

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// The cell `steps` cells away in `dir`.
    pub fn offset(self, dir: Direction, steps: i32) -> Coord {
        let (dx, dy) = dir.delta();
        Coord { x: self.x + dx * steps, y: self.y + dy * steps }
    }
}

impl Add<Direction> for Coord {
    type Output = Coord;

    fn add(self, dir: Direction) -> Coord {
        self.offset(dir, 1)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Movement direction. Unit vectors only; diagonals do not exist.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, EnumIter)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

// ── Entities ──

/// Per-level identity of a placed object. Assigned in parse order and kept
/// when the object moves, so a presentation layer can track it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EntityId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Player {
    pub pos: Coord,
    pub form: Form,
}

impl Player {
    /// Every level starts the player as a chameleon.
    pub fn new(pos: Coord) -> Self {
        Player { pos, form: Form::Chameleon }
    }
}

/// The level exit. Closed until a key is picked up; never closes again.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Door {
    pub pos: Coord,
    pub open: bool,
}

impl Door {
    pub fn new(pos: Coord) -> Self {
        Door { pos, open: false }
    }

    /// Does the door stop movement into `pos`?
    pub fn blocks(&self, pos: Coord) -> bool {
        !self.open && self.pos == pos
    }

    /// Open the door. Returns true only on the closed → open transition.
    pub fn unlock(&mut self) -> bool {
        let was_closed = !self.open;
        self.open = true;
        was_closed
    }
}

/// Collectible that unlocks a form for the rest of the level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token {
    pub id: EntityId,
    pub form: Form,
}
