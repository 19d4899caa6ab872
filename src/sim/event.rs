/// Outcomes emitted by resolving one intent.
/// The presentation layer consumes these for animation/sound; they never
/// feed back into the rules.

use crate::domain::entity::{Coord, EntityId};
use crate::domain::form::Form;
use crate::domain::rules::{BlockReason, CycleRefusal};

/// Pickups collected during landing resolution.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Pickups {
    pub key: bool,
    /// The door went from closed to open on this move.
    pub door_opened: bool,
    /// A token unlocked a form that was not yet available.
    pub unlocked: Option<Form>,
}

/// A completed relocation of the player.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Movement {
    pub from: Coord,
    pub to: Coord,
    /// Frog jump over water (the water cell was skipped).
    pub jumped: bool,
    pub pickups: Pickups,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Blocked(BlockReason),
    Moved(Movement),
    Pushed {
        movement: Movement,
        boulder: EntityId,
        boulder_from: Coord,
        boulder_to: Coord,
    },
    /// The player reached the open door. Terminal for this world.
    LevelComplete(Movement),
}

impl MoveOutcome {
    pub fn movement(&self) -> Option<&Movement> {
        match self {
            MoveOutcome::Blocked(_) => None,
            MoveOutcome::Moved(m)
            | MoveOutcome::Pushed { movement: m, .. }
            | MoveOutcome::LevelComplete(m) => Some(m),
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, MoveOutcome::Blocked(_))
    }

    pub fn is_level_complete(&self) -> bool {
        matches!(self, MoveOutcome::LevelComplete(_))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CycleOutcome {
    NoChange(CycleRefusal),
    Changed { from: Form, to: Form },
}

/// Either kind of outcome, as delivered to an `OutcomeSink`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Move(MoveOutcome),
    Cycle(CycleOutcome),
}
