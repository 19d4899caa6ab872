/// Movement and shapeshift rules, truth-table driven.
///
/// Pure functions operating on the board with no side effects.
/// These encode "what is legal" and return a plan; `sim::step` applies
/// the plan and runs landing resolution. Because every check happens
/// before anything is touched, a refused intent mutates nothing.
///
/// ## Move Truth Table
///
/// Evaluated top to bottom; the first matching row decides.
/// `target = player + dir`.
/// ┌───────────────────────────────────────┬──────────────────────────┐
/// │ Condition                              │ Result                   │
/// ├───────────────────────────────────────┼──────────────────────────┤
/// │ target has no tile                     │ DENY (OutOfLevel)        │
/// │ Frog, target is Water                  │ JUMP to player + 2·dir   │
/// │   landing: no tile / closed door /     │   DENY (Water)           │
/// │   not walkable / boulder               │                          │
/// │ target is the closed door              │ DENY (ClosedDoor)        │
/// │ target holds a boulder, not Gorilla    │ DENY (Boulder)           │
/// │ target holds a boulder, Gorilla:       │ PUSH boulder one cell    │
/// │   push cell: no tile / occupied /      │   DENY (Boulder)         │
/// │   not Floor                            │                          │
/// │ target not walkable for form           │ DENY (Terrain)           │
/// │ Otherwise                              │ STEP                     │
/// └───────────────────────────────────────┴──────────────────────────┘
///
/// ## Walkability (see `TileType::walkable_by`)
/// ┌───────┬───────────┬──────┬─────────┬──────┐
/// │ Tile  │ Chameleon │ Frog │ Gorilla │ Mole │
/// ├───────┼───────────┼──────┼─────────┼──────┤
/// │ Floor │ yes       │ yes  │ yes     │ yes  │
/// │ Wall  │ no        │ no   │ no      │ no   │
/// │ Dirt  │ no        │ no   │ no      │ yes  │
/// │ Water │ no        │ no   │ no      │ no   │
/// └───────┴───────────┴──────┴─────────┴──────┘
///
/// ## Shapeshift
/// ┌───────────────────────────────┬────────────────────────────┐
/// │ Condition (priority order)     │ Result                     │
/// ├───────────────────────────────┼────────────────────────────┤
/// │ budget == 0                    │ DENY (BudgetExhausted)     │
/// │ fewer than 2 forms available   │ DENY (NothingToCycle)      │
/// │ Otherwise                      │ next available in CYCLE    │
/// └───────────────────────────────┴────────────────────────────┘

use super::board::Board;
use super::entity::{Coord, Direction, Player};
use super::form::{Form, FormSet};
use super::tile::TileType;

/// Why a move was refused. Refusals are normal play, not errors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockReason {
    /// The level already completed; its world takes no more moves.
    LevelOver,
    OutOfLevel,
    /// Water ahead and no legal jump across it.
    Water,
    ClosedDoor,
    /// A boulder that cannot be pushed by this form or in this direction.
    Boulder,
    Terrain(TileType),
}

/// Why a shapeshift was refused.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CycleRefusal {
    LevelOver,
    BudgetExhausted,
    NothingToCycle,
}

/// A legal move, not yet applied.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MovePlan {
    Step { to: Coord },
    /// Frog jump: `over` is the water cell, never occupied.
    Jump { over: Coord, to: Coord },
    /// Gorilla push: the player enters `to`, the boulder moves on to `boulder_to`.
    Push { to: Coord, boulder_to: Coord },
}

impl MovePlan {
    /// Where the player ends up.
    pub fn destination(&self) -> Coord {
        match *self {
            MovePlan::Step { to } | MovePlan::Jump { to, .. } | MovePlan::Push { to, .. } => to,
        }
    }
}

// ── Move Rules ──

/// Decide what moving `player` one cell in `dir` does. See truth table above.
pub fn plan_move(board: &Board, player: &Player, dir: Direction) -> Result<MovePlan, BlockReason> {
    let target = player.pos + dir;
    let target_tile = board.tile_at(target).ok_or(BlockReason::OutOfLevel)?;

    if player.form.jumps_water() && target_tile.is_water() {
        return plan_jump(board, player, dir)
            .map(|to| MovePlan::Jump { over: target, to })
            .ok_or(BlockReason::Water);
    }

    if board.door_blocks(target) {
        return Err(BlockReason::ClosedDoor);
    }

    if board.has_boulder(target) {
        if !player.form.pushes_boulders() {
            return Err(BlockReason::Boulder);
        }
        let boulder_to = target + dir;
        return if can_receive_boulder(board, boulder_to) {
            Ok(MovePlan::Push { to: target, boulder_to })
        } else {
            Err(BlockReason::Boulder)
        };
    }

    if !target_tile.walkable_by(player.form) {
        return Err(BlockReason::Terrain(target_tile));
    }

    Ok(MovePlan::Step { to: target })
}

/// Landing cell of a frog jump over the water at `player + dir`, if legal.
fn plan_jump(board: &Board, player: &Player, dir: Direction) -> Option<Coord> {
    let landing = player.pos.offset(dir, 2);
    let tile = board.tile_at(landing)?;
    if board.door_blocks(landing) { return None; }
    if !tile.walkable_by(player.form) { return None; }
    if board.has_boulder(landing) { return None; }
    Some(landing)
}

/// A boulder may only be pushed onto empty Floor.
fn can_receive_boulder(board: &Board, pos: Coord) -> bool {
    match board.tile_at(pos) {
        Some(tile) => tile.accepts_boulder() && !board.is_occupied(pos),
        None => false,
    }
}

// ── Shapeshift Rules ──

/// Decide which form a shapeshift selects. See truth table above.
pub fn plan_cycle(current: Form, available: &FormSet, remaining: u32) -> Result<Form, CycleRefusal> {
    if remaining == 0 {
        return Err(CycleRefusal::BudgetExhausted);
    }
    if available.len() < 2 {
        return Err(CycleRefusal::NothingToCycle);
    }
    current.next_available(available).ok_or(CycleRefusal::NothingToCycle)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Door, EntityId, Token};

    /// Helper: build a board from a string diagram. Row 0 is the top (highest y).
    /// Legend:  '.'=Floor  '#'=Wall  'd'=Dirt  'w'=Water  'b'=Boulder
    ///         'k'=Key  'D'=Door(closed)  'O'=Door(open)  'F'=Frog token
    ///         ' '=no tile
    fn board_from(rows: &[&str]) -> Board {
        let mut b = Board::default();
        let h = rows.len() as i32;
        let mut next_id = 0;
        for (r, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let pos = Coord::new(x as i32, h - 1 - r as i32);
                let tile = match ch {
                    ' ' => continue,
                    '#' => TileType::Wall,
                    'd' => TileType::Dirt,
                    'w' => TileType::Water,
                    _ => TileType::Floor,
                };
                b.tiles.insert(pos, tile);
                next_id += 1;
                match ch {
                    'b' => { b.boulders.insert(pos, EntityId(next_id)); }
                    'k' => { b.keys.insert(pos, EntityId(next_id)); }
                    'F' => { b.tokens.insert(pos, Token { id: EntityId(next_id), form: Form::Frog }); }
                    'D' => b.door = Some(Door::new(pos)),
                    'O' => b.door = Some(Door { pos, open: true }),
                    _ => {}
                }
            }
        }
        b
    }

    fn at(x: i32, form: Form) -> Player {
        Player { pos: Coord::new(x, 0), form }
    }

    // ── Plain steps ──

    #[test]
    fn step_onto_floor() {
        let b = board_from(&["..."]);
        assert_eq!(
            plan_move(&b, &at(1, Form::Chameleon), Direction::Right),
            Ok(MovePlan::Step { to: Coord::new(2, 0) })
        );
    }

    #[test]
    fn step_off_level_is_blocked() {
        let b = board_from(&[".. ."]);
        assert_eq!(plan_move(&b, &at(0, Form::Chameleon), Direction::Left), Err(BlockReason::OutOfLevel));
        assert_eq!(plan_move(&b, &at(1, Form::Chameleon), Direction::Right), Err(BlockReason::OutOfLevel));
        assert_eq!(plan_move(&b, &at(1, Form::Chameleon), Direction::Up), Err(BlockReason::OutOfLevel));
    }

    #[test]
    fn dirt_only_for_mole() {
        let b = board_from(&[".d"]);
        for form in [Form::Chameleon, Form::Frog, Form::Gorilla] {
            assert_eq!(
                plan_move(&b, &at(0, form), Direction::Right),
                Err(BlockReason::Terrain(TileType::Dirt))
            );
        }
        assert!(plan_move(&b, &at(0, Form::Mole), Direction::Right).is_ok());
    }

    #[test]
    fn walls_block_everyone() {
        let b = board_from(&[".#"]);
        for form in crate::domain::form::CYCLE {
            assert_eq!(
                plan_move(&b, &at(0, form), Direction::Right),
                Err(BlockReason::Terrain(TileType::Wall))
            );
        }
    }

    // ── Water and the frog jump ──

    #[test]
    fn water_blocks_non_frogs() {
        let b = board_from(&[".w."]);
        for form in [Form::Chameleon, Form::Gorilla, Form::Mole] {
            assert_eq!(
                plan_move(&b, &at(0, form), Direction::Right),
                Err(BlockReason::Terrain(TileType::Water))
            );
        }
    }

    #[test]
    fn frog_jumps_single_water_cell() {
        let b = board_from(&[".w."]);
        assert_eq!(
            plan_move(&b, &at(0, Form::Frog), Direction::Right),
            Ok(MovePlan::Jump { over: Coord::new(1, 0), to: Coord::new(2, 0) })
        );
    }

    #[test]
    fn frog_cannot_jump_two_water_cells() {
        let b = board_from(&[".ww."]);
        assert_eq!(plan_move(&b, &at(0, Form::Frog), Direction::Right), Err(BlockReason::Water));
    }

    #[test]
    fn frog_jump_refusals() {
        // landing off level, on wall, on dirt, on boulder, on closed door
        for row in [".w", ".w#", ".wd", ".wb", ".wD"] {
            let b = board_from(&[row]);
            assert_eq!(
                plan_move(&b, &at(0, Form::Frog), Direction::Right),
                Err(BlockReason::Water),
                "row {row:?}"
            );
        }
    }

    #[test]
    fn frog_may_land_on_open_door_and_pickups() {
        for row in [".wO", ".wk", ".wF"] {
            let b = board_from(&[row]);
            assert!(plan_move(&b, &at(0, Form::Frog), Direction::Right).is_ok(), "row {row:?}");
        }
    }

    #[test]
    fn frog_jumps_vertically() {
        let b = board_from(&[
            ".",
            "w",
            ".",
        ]);
        let frog = Player { pos: Coord::new(0, 0), form: Form::Frog };
        assert_eq!(
            plan_move(&b, &frog, Direction::Up),
            Ok(MovePlan::Jump { over: Coord::new(0, 1), to: Coord::new(0, 2) })
        );
    }

    // ── Door ──

    #[test]
    fn closed_door_blocks_open_door_admits() {
        let closed = board_from(&[".D"]);
        assert_eq!(plan_move(&closed, &at(0, Form::Chameleon), Direction::Right), Err(BlockReason::ClosedDoor));
        let open = board_from(&[".O"]);
        assert_eq!(
            plan_move(&open, &at(0, Form::Chameleon), Direction::Right),
            Ok(MovePlan::Step { to: Coord::new(1, 0) })
        );
    }

    // ── Boulders ──

    #[test]
    fn only_gorilla_pushes() {
        let b = board_from(&[".b."]);
        for form in [Form::Chameleon, Form::Frog, Form::Mole] {
            assert_eq!(plan_move(&b, &at(0, form), Direction::Right), Err(BlockReason::Boulder));
        }
        assert_eq!(
            plan_move(&b, &at(0, Form::Gorilla), Direction::Right),
            Ok(MovePlan::Push { to: Coord::new(1, 0), boulder_to: Coord::new(2, 0) })
        );
    }

    #[test]
    fn push_refused_into_anything_but_empty_floor() {
        for row in [".b", ".bb.", ".bk", ".bF", ".bD", ".bO", ".b#", ".bd", ".bw"] {
            let b = board_from(&[row]);
            assert_eq!(
                plan_move(&b, &at(0, Form::Gorilla), Direction::Right),
                Err(BlockReason::Boulder),
                "row {row:?}"
            );
        }
    }

    // ── Shapeshift ──

    #[test]
    fn cycle_refusals() {
        let mut two = FormSet::baseline();
        two.insert(Form::Gorilla);
        assert_eq!(plan_cycle(Form::Chameleon, &two, 0), Err(CycleRefusal::BudgetExhausted));
        assert_eq!(plan_cycle(Form::Chameleon, &FormSet::baseline(), 5), Err(CycleRefusal::NothingToCycle));
        assert_eq!(plan_cycle(Form::Chameleon, &two, 1), Ok(Form::Gorilla));
        assert_eq!(plan_cycle(Form::Gorilla, &two, 1), Ok(Form::Chameleon));
    }

    #[test]
    fn plan_destination() {
        let p = MovePlan::Push { to: Coord::new(1, 0), boulder_to: Coord::new(2, 0) };
        assert_eq!(p.destination(), Coord::new(1, 0));
    }
}
