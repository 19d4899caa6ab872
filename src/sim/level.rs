/// Level parser: level source text → `World`.
///
/// ## Formats (chosen by configuration, never auto-detected)
///   - `plain`    : every non-blank line is a grid row.
///   - `tutorial` : the first raw line (even when blank) is the advisory
///                  tutorial text; the grid is every non-blank line after it.
///
/// Lines lose trailing `\r`, blank lines are dropped and grid rows are
/// right-trimmed. Rows may be ragged: a missing trailing column is simply
/// not part of the level.
///
/// ## Coordinates
///   Grid row 0 is the top of the level and has the highest y.
///   `(x, y) = (column, row_count - 1 - row)`, so the bottom row is `y = 0`.
///   Both formats use this convention.
///
/// ## Tile legend:
///   '#' = Wall             'd' = Dirt            'w' = Water
///   '.' = Floor            'b' = Boulder         'k' = Key
///   'D' = Door             'P' = Player start
///   'F' / 'G' / 'M' = Frog / Gorilla / Mole token
///   anything else = Floor

use serde::Deserialize;
use tracing::debug;

use crate::domain::board::Board;
use crate::domain::entity::{Coord, Door, EntityId, Token};
use crate::domain::form::Form;
use crate::domain::tile::TileType;
use crate::sim::world::World;

/// Default shapeshift budget per level attempt.
pub const DEFAULT_SHAPESHIFTS: u32 = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelFormat {
    Plain,
    #[default]
    Tutorial,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ParseOptions {
    pub format: LevelFormat,
    pub shapeshifts_per_level: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            format: LevelFormat::default(),
            shapeshifts_per_level: DEFAULT_SHAPESHIFTS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    #[error("level has no grid rows")]
    EmptyGrid,
    #[error("level has no player start ('P')")]
    NoPlayerStart,
    #[error("second player start at {second} (first at {first})")]
    DuplicatePlayerStart { first: Coord, second: Coord },
    #[error("second door at {second} (first at {first})")]
    DuplicateDoor { first: Coord, second: Coord },
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Parse one level body into a fresh level-start `World`.
pub fn parse(text: &str, opts: &ParseOptions) -> Result<World, LevelError> {
    let mut lines = text.split('\n').map(|l| l.trim_end_matches('\r'));

    let tutorial_line = match opts.format {
        LevelFormat::Plain => String::new(),
        LevelFormat::Tutorial => lines.next().unwrap_or_default().trim().to_string(),
    };

    let rows: Vec<&str> = lines
        .filter(|l| !l.trim().is_empty())
        .map(str::trim_end)
        .collect();
    if rows.is_empty() {
        return Err(LevelError::EmptyGrid);
    }

    let mut builder = Builder::default();
    let top = rows.len() as i32 - 1;
    for (r, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            builder.place(ch, Coord::new(x as i32, top - r as i32))?;
        }
    }

    let spawn = builder.spawn.ok_or(LevelError::NoPlayerStart)?;
    debug!(
        rows = rows.len(),
        tiles = builder.board.tiles.len(),
        boulders = builder.board.boulders.len(),
        keys = builder.board.keys.len(),
        tokens = builder.board.tokens.len(),
        door = builder.board.door.is_some(),
        "parsed level"
    );
    Ok(World::new(builder.board, spawn, opts.shapeshifts_per_level, tutorial_line))
}

// ══════════════════════════════════════════════════════════════
// Cell placement
// ══════════════════════════════════════════════════════════════

#[derive(Default)]
struct Builder {
    board: Board,
    spawn: Option<Coord>,
    next_id: u32,
}

impl Builder {
    fn place(&mut self, ch: char, pos: Coord) -> Result<(), LevelError> {
        let tile = match ch {
            '#' => TileType::Wall,
            'd' => TileType::Dirt,
            'w' => TileType::Water,
            _ => TileType::Floor,
        };
        self.board.tiles.insert(pos, tile);

        match ch {
            'b' => {
                let id = self.fresh_id();
                self.board.boulders.insert(pos, id);
            }
            'k' => {
                let id = self.fresh_id();
                self.board.keys.insert(pos, id);
            }
            'D' => {
                if let Some(door) = &self.board.door {
                    return Err(LevelError::DuplicateDoor { first: door.pos, second: pos });
                }
                self.board.door = Some(Door::new(pos));
            }
            'P' => {
                if let Some(first) = self.spawn {
                    return Err(LevelError::DuplicatePlayerStart { first, second: pos });
                }
                self.spawn = Some(pos);
            }
            _ => {
                if let Some(form) = Form::from_token_glyph(ch) {
                    let id = self.fresh_id();
                    self.board.tokens.insert(pos, Token { id, form });
                }
            }
        }
        Ok(())
    }

    fn fresh_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> ParseOptions {
        ParseOptions { format: LevelFormat::Plain, shapeshifts_per_level: 5 }
    }

    fn tutorial() -> ParseOptions {
        ParseOptions { format: LevelFormat::Tutorial, shapeshifts_per_level: 3 }
    }

    #[test]
    fn plain_rows_map_top_row_to_highest_y() {
        let w = parse("#P\n.d\nwb\n", &plain()).unwrap();
        assert_eq!(w.tile_at(Coord::new(0, 2)), Some(TileType::Wall));
        assert_eq!(w.player().pos, Coord::new(1, 2));
        assert_eq!(w.tile_at(Coord::new(1, 1)), Some(TileType::Dirt));
        assert_eq!(w.tile_at(Coord::new(0, 0)), Some(TileType::Water));
        assert!(w.boulders().contains_key(&Coord::new(1, 0)));
        assert_eq!(w.tile_at(Coord::new(1, 0)), Some(TileType::Floor));
        assert_eq!(w.tiles().len(), 6);
        assert_eq!(w.tutorial_line(), "");
    }

    #[test]
    fn tutorial_line_is_reserved_even_when_blank() {
        let w = parse("  Push the boulder!  \nP.b.\n", &tutorial()).unwrap();
        assert_eq!(w.tutorial_line(), "Push the boulder!");
        assert_eq!(w.player().pos, Coord::new(0, 0));
        assert_eq!(w.tiles().len(), 4);

        // Blank first line: still consumed as the tutorial line.
        let w = parse("\nP.\n", &tutorial()).unwrap();
        assert_eq!(w.tutorial_line(), "");
        assert_eq!(w.tiles().len(), 2);
    }

    #[test]
    fn tutorial_format_does_not_treat_first_line_as_grid() {
        // "P" on the first line is text, not a player start.
        assert_eq!(parse("P\n...\n", &tutorial()).unwrap_err(), LevelError::NoPlayerStart);
    }

    #[test]
    fn crlf_blank_lines_and_trailing_spaces() {
        let w = parse("\r\nP.k  \r\n\r\n   \r\n..D\r\n", &plain()).unwrap();
        // Two grid rows: blank and whitespace-only lines dropped.
        assert_eq!(w.player().pos, Coord::new(0, 1));
        assert_eq!(w.door().map(|d| d.pos), Some(Coord::new(2, 0)));
        // Trailing spaces were trimmed, not turned into floor.
        assert_eq!(w.tile_at(Coord::new(3, 1)), None);
        assert_eq!(w.tiles().len(), 6);
    }

    #[test]
    fn ragged_rows_leave_missing_cells_out_of_level() {
        let w = parse("P....\n.\n", &plain()).unwrap();
        assert_eq!(w.tile_at(Coord::new(4, 1)), Some(TileType::Floor));
        assert_eq!(w.tile_at(Coord::new(1, 0)), None);
    }

    #[test]
    fn leading_spaces_and_unknown_glyphs_are_floor() {
        let w = parse(" P?x\n", &plain()).unwrap();
        for x in 0..4 {
            assert_eq!(w.tile_at(Coord::new(x, 0)), Some(TileType::Floor));
        }
        assert_eq!(w.player().pos, Coord::new(1, 0));
    }

    #[test]
    fn tokens_carry_their_form() {
        let w = parse("PFGM\n", &plain()).unwrap();
        let form_at = |x| w.tokens().get(&Coord::new(x, 0)).map(|t| t.form);
        assert_eq!(form_at(1), Some(Form::Frog));
        assert_eq!(form_at(2), Some(Form::Gorilla));
        assert_eq!(form_at(3), Some(Form::Mole));
    }

    #[test]
    fn entity_ids_are_unique() {
        let w = parse("Pbbk\nFb..\n", &plain()).unwrap();
        let mut ids: Vec<EntityId> = w.boulders().values().copied()
            .chain(w.keys().values().copied())
            .chain(w.tokens().values().map(|t| t.id))
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn level_start_state() {
        let w = parse("hint\nP.D\n", &tutorial()).unwrap();
        assert_eq!(w.current_form(), Form::Chameleon);
        assert_eq!(w.available_forms().len(), 1);
        assert!(w.available_forms().contains(Form::Chameleon));
        assert_eq!(w.shapeshifts_remaining(), 3);
        assert!(!w.has_key());
        assert!(!w.door().unwrap().open);
        assert!(!w.is_completed());
        assert_eq!(w.spawn(), w.player().pos);
    }

    #[test]
    fn errors() {
        assert_eq!(parse("", &plain()).unwrap_err(), LevelError::EmptyGrid);
        assert_eq!(parse("\n \n\r\n", &plain()).unwrap_err(), LevelError::EmptyGrid);
        assert_eq!(parse("only text\n", &tutorial()).unwrap_err(), LevelError::EmptyGrid);
        assert_eq!(parse("...\n", &plain()).unwrap_err(), LevelError::NoPlayerStart);
        assert_eq!(
            parse("P.P\n", &plain()).unwrap_err(),
            LevelError::DuplicatePlayerStart { first: Coord::new(0, 0), second: Coord::new(2, 0) }
        );
        assert_eq!(
            parse("D\nPD\n", &plain()).unwrap_err(),
            LevelError::DuplicateDoor { first: Coord::new(0, 1), second: Coord::new(1, 0) }
        );
    }

    #[test]
    fn format_names_deserialize() {
        #[derive(Deserialize)]
        struct T { format: LevelFormat }
        let t: T = toml::from_str("format = \"plain\"").unwrap();
        assert_eq!(t.format, LevelFormat::Plain);
        let t: T = toml::from_str("format = \"tutorial\"").unwrap();
        assert_eq!(t.format, LevelFormat::Tutorial);
    }
}
