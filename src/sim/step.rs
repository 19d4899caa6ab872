/// The step functions: resolve one intent against the world.
///
/// Processing order for a move:
///   1. Completed-world check
///   2. Plan (pure, `domain::rules::plan_move`); refusals stop here
///   3. Relocation (boulder first, then player)
///   4. Landing resolution: key → door unlock, token → form unlock
///   5. Level completion check (open door under the player)
///
/// Nothing is written before step 3, so a `Blocked` outcome leaves the
/// world untouched.

use tracing::debug;

use crate::domain::entity::Direction;
use crate::domain::rules::{self, BlockReason, CycleRefusal, MovePlan};
use super::event::{CycleOutcome, MoveOutcome, Movement, Pickups};
use super::world::World;

// ══════════════════════════════════════════════════════════════
// Move
// ══════════════════════════════════════════════════════════════

pub fn attempt_move(world: &mut World, dir: Direction) -> MoveOutcome {
    if world.completed {
        return MoveOutcome::Blocked(BlockReason::LevelOver);
    }

    let plan = match rules::plan_move(&world.board, &world.player, dir) {
        Ok(plan) => plan,
        Err(reason) => {
            debug!(?dir, ?reason, pos = %world.player.pos, "move blocked");
            return MoveOutcome::Blocked(reason);
        }
    };

    let from = world.player.pos;
    let mut pushed = None;
    if let MovePlan::Push { to, boulder_to } = plan {
        if let Some(id) = world.board.move_boulder(to, boulder_to) {
            pushed = Some((id, to, boulder_to));
        }
    }
    let to = plan.destination();
    world.player.pos = to;

    let (pickups, complete) = resolve_landing(world);
    let movement = Movement {
        from,
        to,
        jumped: matches!(plan, MovePlan::Jump { .. }),
        pickups,
    };
    debug!(?dir, %from, %to, ?pickups, complete, "player moved");

    if complete {
        return MoveOutcome::LevelComplete(movement);
    }
    match pushed {
        Some((boulder, boulder_from, boulder_to)) => MoveOutcome::Pushed {
            movement,
            boulder,
            boulder_from,
            boulder_to,
        },
        None => MoveOutcome::Moved(movement),
    }
}

/// Pickups at the player's new cell, then the completion check.
/// Returns the pickups and whether the level is now complete.
fn resolve_landing(world: &mut World) -> (Pickups, bool) {
    let pos = world.player.pos;
    let mut pickups = Pickups::default();

    if world.board.take_key(pos).is_some() {
        world.has_key = true;
        pickups.key = true;
        pickups.door_opened = world.board.unlock_door();
    }

    if let Some(token) = world.board.take_token(pos) {
        if world.available_forms.insert(token.form) {
            pickups.unlocked = Some(token.form);
        }
    }

    let complete = world.board.is_open_door(pos);
    if complete {
        world.completed = true;
    }
    (pickups, complete)
}

// ══════════════════════════════════════════════════════════════
// Shapeshift
// ══════════════════════════════════════════════════════════════

pub fn attempt_form_cycle(world: &mut World) -> CycleOutcome {
    if world.completed {
        return CycleOutcome::NoChange(CycleRefusal::LevelOver);
    }
    let from = world.player.form;
    match rules::plan_cycle(from, &world.available_forms, world.shapeshifts_remaining) {
        Ok(to) => {
            world.player.form = to;
            world.shapeshifts_remaining -= 1;
            debug!(%from, %to, remaining = world.shapeshifts_remaining, "shapeshift");
            CycleOutcome::Changed { from, to }
        }
        Err(reason) => {
            debug!(?reason, "shapeshift refused");
            CycleOutcome::NoChange(reason)
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
