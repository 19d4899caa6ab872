//! Shapeshift: a tile-based transformation puzzle.
//!
//! `domain` holds the closed vocabulary and the pure movement rules,
//! `sim` the level parser, world state, sequencer and session surface,
//! `ui` the terminal host pieces.

pub mod config;
pub mod domain;
pub mod sim;
pub mod ui;
