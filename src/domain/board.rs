/// Board: everything placed on the grid except the player.
///
/// ## Architecture
///
/// Two distinct concepts, queried separately:
///   1. TERRAIN   : what the cell IS (`tiles`)
///   2. OCCUPANCY : what sits ON the cell (boulders, keys, tokens, door)
///
/// A coordinate with no tile is outside the level. Every entity sits on a
/// Floor tile when parsed; boulders stay on Floor because pushes only
/// target empty Floor.

use std::collections::HashMap;

use super::entity::{Coord, Door, EntityId, Token};
use super::tile::TileType;

#[derive(Clone, Debug, Default)]
pub struct Board {
    pub tiles: HashMap<Coord, TileType>,
    pub boulders: HashMap<Coord, EntityId>,
    pub keys: HashMap<Coord, EntityId>,
    pub tokens: HashMap<Coord, Token>,
    pub door: Option<Door>,
}

// ── Layer 1: Terrain ──

impl Board {
    #[inline]
    pub fn tile_at(&self, pos: Coord) -> Option<TileType> {
        self.tiles.get(&pos).copied()
    }

    /// Smallest and largest coordinate holding a tile, or None for an
    /// empty board. Renderers use this to frame the grid.
    pub fn bounds(&self) -> Option<(Coord, Coord)> {
        let mut it = self.tiles.keys();
        let first = *it.next()?;
        Some(it.fold((first, first), |(lo, hi), c| {
            (
                Coord::new(lo.x.min(c.x), lo.y.min(c.y)),
                Coord::new(hi.x.max(c.x), hi.y.max(c.y)),
            )
        }))
    }
}

// ── Layer 2: Occupancy ──

impl Board {
    #[inline]
    pub fn has_boulder(&self, pos: Coord) -> bool {
        self.boulders.contains_key(&pos)
    }

    /// Is `pos` the door while it is still closed?
    #[inline]
    pub fn door_blocks(&self, pos: Coord) -> bool {
        self.door.as_ref().is_some_and(|d| d.blocks(pos))
    }

    #[inline]
    pub fn is_open_door(&self, pos: Coord) -> bool {
        self.door.as_ref().is_some_and(|d| d.open && d.pos == pos)
    }

    /// Does any entity (boulder, key, token or door, open or not) sit on `pos`?
    pub fn is_occupied(&self, pos: Coord) -> bool {
        self.boulders.contains_key(&pos)
            || self.keys.contains_key(&pos)
            || self.tokens.contains_key(&pos)
            || self.door.as_ref().is_some_and(|d| d.pos == pos)
    }
}

// ── Mutation (called by the rules engine only) ──

impl Board {
    /// Relocate the boulder at `from` to `to`, keeping its identity.
    pub fn move_boulder(&mut self, from: Coord, to: Coord) -> Option<EntityId> {
        let id = self.boulders.remove(&from)?;
        self.boulders.insert(to, id);
        Some(id)
    }

    pub fn take_key(&mut self, pos: Coord) -> Option<EntityId> {
        self.keys.remove(&pos)
    }

    pub fn take_token(&mut self, pos: Coord) -> Option<Token> {
        self.tokens.remove(&pos)
    }

    /// Open the door if there is one. Returns true on the closed → open transition.
    pub fn unlock_door(&mut self) -> bool {
        self.door.as_mut().is_some_and(Door::unlock)
    }
}
