/// World: the complete state of one level attempt.
///
/// ## Lifecycle
///
/// Built fresh by `level::parse` on every load and dropped wholesale on
/// reload or advance; nothing survives a level boundary. Within a level
/// only `step::attempt_move` / `step::attempt_form_cycle` mutate it.
///
/// ## Invariants (hold after every resolved intent)
///   - the player stands on an existing tile
///   - a boulder sits on Floor, alone (no key, token, door or boulder)
///   - `available_forms` only grows
///   - the door only goes closed → open
///   - `shapeshifts_remaining` only decreases
///
/// Fields are crate-visible for the parser and the rules; everything the
/// presentation layer needs is exposed through the query methods below.

use std::collections::HashMap;

use crate::domain::board::Board;
use crate::domain::entity::{Coord, Door, EntityId, Player, Token};
use crate::domain::form::{Form, FormSet};
use crate::domain::rules;
use crate::domain::tile::TileType;

#[derive(Clone, Debug)]
pub struct World {
    pub(crate) board: Board,
    pub(crate) player: Player,
    pub(crate) spawn: Coord,
    pub(crate) available_forms: FormSet,
    pub(crate) shapeshifts_remaining: u32,
    pub(crate) has_key: bool,
    pub(crate) tutorial_line: String,
    /// Set by the `LevelComplete` transition; a completed world takes no more intents.
    pub(crate) completed: bool,
}

impl World {
    /// A fresh level-start world: chameleon form, only the chameleon
    /// available, full shapeshift budget, no key, door closed.
    pub(crate) fn new(board: Board, spawn: Coord, shapeshifts: u32, tutorial_line: String) -> Self {
        World {
            board,
            player: Player::new(spawn),
            spawn,
            available_forms: FormSet::baseline(),
            shapeshifts_remaining: shapeshifts,
            has_key: false,
            tutorial_line,
            completed: false,
        }
    }
}

// ── Query surface ──

impl World {
    pub fn tiles(&self) -> &HashMap<Coord, TileType> {
        &self.board.tiles
    }

    pub fn tile_at(&self, pos: Coord) -> Option<TileType> {
        self.board.tile_at(pos)
    }

    pub fn boulders(&self) -> &HashMap<Coord, EntityId> {
        &self.board.boulders
    }

    pub fn keys(&self) -> &HashMap<Coord, EntityId> {
        &self.board.keys
    }

    pub fn tokens(&self) -> &HashMap<Coord, Token> {
        &self.board.tokens
    }

    pub fn door(&self) -> Option<&Door> {
        self.board.door.as_ref()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// The parsed player start.
    pub fn spawn(&self) -> Coord {
        self.spawn
    }

    pub fn current_form(&self) -> Form {
        self.player.form
    }

    pub fn available_forms(&self) -> &FormSet {
        &self.available_forms
    }

    /// HUD preview: the form the next shapeshift would select,
    /// or None when a shapeshift would change nothing.
    pub fn next_form(&self) -> Option<Form> {
        if self.completed {
            return None;
        }
        rules::plan_cycle(self.player.form, &self.available_forms, self.shapeshifts_remaining).ok()
    }

    pub fn shapeshifts_remaining(&self) -> u32 {
        self.shapeshifts_remaining
    }

    pub fn has_key(&self) -> bool {
        self.has_key
    }

    pub fn tutorial_line(&self) -> &str {
        &self.tutorial_line
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Smallest and largest tile coordinate, for framing the grid.
    pub fn bounds(&self) -> Option<(Coord, Coord)> {
        self.board.bounds()
    }
}
