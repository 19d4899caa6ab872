/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Screen layout:
///   row 0   HUD: level, form, shifts left, next form, key
///   row 1   tutorial line (blank in plain format)
///   row 3+  the grid, top row = highest y
///   then    status message, help bar
///
/// The core's coordinates have y pointing up, so grid rows are drawn from
/// `max.y` down to `min.y`.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::DisplayConfig;
use crate::domain::entity::Coord;
use crate::domain::form::Form;
use crate::domain::rules::{BlockReason, CycleRefusal};
use crate::domain::tile::TileType;
use crate::sim::event::{CycleOutcome, MoveOutcome, Outcome};
use crate::sim::world::World;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gap between rows matches the cell colour on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect::<String>().trim_end().to_string()
    }
}

// ── Glyph tables ──

fn form_color(form: Form) -> Color {
    match form {
        Form::Chameleon => Color::Rgb { r: 120, g: 220, b: 90 },
        Form::Frog => Color::Rgb { r: 60, g: 200, b: 160 },
        Form::Gorilla => Color::Rgb { r: 200, g: 140, b: 80 },
        Form::Mole => Color::Rgb { r: 190, g: 150, b: 210 },
    }
}

fn form_glyph(form: Form) -> char {
    match form {
        Form::Chameleon => 'C',
        Form::Frog => 'F',
        Form::Gorilla => 'G',
        Form::Mole => 'M',
    }
}

/// Glyph, foreground, background for a tile; the flag says whether the
/// glyph repeats across the whole cell width.
fn tile_glyph(tile: TileType) -> (char, Color, Color, bool) {
    match tile {
        TileType::Floor => ('·', Color::Rgb { r: 70, g: 70, b: 90 }, Color::Reset, false),
        TileType::Wall => ('█', Color::Rgb { r: 110, g: 110, b: 130 }, Color::Reset, true),
        TileType::Dirt => ('▒', Color::Rgb { r: 140, g: 100, b: 50 }, Color::Rgb { r: 60, g: 40, b: 20 }, true),
        TileType::Water => ('≈', Color::Rgb { r: 90, g: 160, b: 255 }, Color::Rgb { r: 20, g: 40, b: 100 }, true),
    }
}

/// What to draw at `pos`: the topmost thing there. None = not part of the level.
fn glyph_at(w: &World, pos: Coord) -> Option<(char, Color, Color, bool)> {
    let tile = w.tile_at(pos)?;
    let (_, _, tile_bg, _) = tile_glyph(tile);

    if w.player().pos == pos {
        return Some(('@', form_color(w.current_form()), tile_bg, false));
    }
    if w.boulders().contains_key(&pos) {
        return Some(('●', Color::Rgb { r: 170, g: 160, b: 150 }, tile_bg, false));
    }
    if let Some(door) = w.door().filter(|d| d.pos == pos) {
        return Some(if door.open {
            ('▯', Color::Green, tile_bg, false)
        } else {
            ('▮', Color::Red, tile_bg, false)
        });
    }
    if w.keys().contains_key(&pos) {
        return Some(('k', Color::Yellow, tile_bg, false));
    }
    if let Some(token) = w.tokens().get(&pos) {
        return Some((form_glyph(token.form), form_color(token.form), tile_bg, false));
    }
    Some(tile_glyph(tile))
}

// ── Status messages ──

/// One-line feedback for an outcome, if it deserves one.
pub fn status_for(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Move(MoveOutcome::Blocked(reason)) => match reason {
            BlockReason::Terrain(TileType::Water) => Some("Only a frog can cross water.".into()),
            BlockReason::Water => Some("No safe landing beyond the water.".into()),
            BlockReason::ClosedDoor => Some("The door is locked. Find the key.".into()),
            BlockReason::Boulder => Some("The boulder won't budge.".into()),
            BlockReason::Terrain(TileType::Dirt) => Some("Only a mole can dig through dirt.".into()),
            BlockReason::Terrain(_) | BlockReason::OutOfLevel | BlockReason::LevelOver => None,
        },
        Outcome::Move(MoveOutcome::LevelComplete(_)) => Some("Level complete!".into()),
        Outcome::Move(m) => {
            let pickups = m.movement()?.pickups;
            if let Some(form) = pickups.unlocked {
                Some(format!("{form} form unlocked! Press Space to shift."))
            } else if pickups.door_opened {
                Some("Got the key. The door is open!".into())
            } else if pickups.key {
                Some("Got a key.".into())
            } else {
                None
            }
        }
        Outcome::Cycle(CycleOutcome::Changed { to, .. }) => Some(format!("You are now a {to}.")),
        Outcome::Cycle(CycleOutcome::NoChange(CycleRefusal::BudgetExhausted)) => {
            Some("No shapeshifts left. Press R to restart.".into())
        }
        Outcome::Cycle(CycleOutcome::NoChange(CycleRefusal::NothingToCycle)) => {
            Some("No other forms unlocked yet.".into())
        }
        Outcome::Cycle(CycleOutcome::NoChange(CycleRefusal::LevelOver)) => None,
    }
}

// ── Renderer ──

/// Everything outside the `World` the HUD shows.
pub struct Hud<'a> {
    pub level_index: usize,
    pub level_count: usize,
    pub level_name: &'a str,
    pub message: &'a str,
    pub pad_connected: bool,
}

/// Vertical offsets
const HUD_ROW: usize = 0;
const TUTORIAL_ROW: usize = 1;
const MAP_ROW: usize = 3;
const MAP_COL: usize = 1;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Terminal columns per tile.
    cell_w: usize,
    /// Key release events were requested from the terminal in `init`.
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new(display: &DisplayConfig) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            cell_w: cell_width(display.tile_size),
            keyboard_enhanced: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        // Kitty-protocol terminals report key releases; others only repeat presses.
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    /// Whether the terminal will send key release events.
    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.keyboard_enhanced = false;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &World, hud: &Hud) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.compose(world, hud);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colours; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, w: &World, hud: &Hud) {
        self.front.clear();

        // ── HUD row ──
        let next = w.next_form().map_or("-".to_string(), |f| f.to_string());
        let key = if w.has_key() { "yes" } else { "no" };
        let line = format!(
            " Level {}/{} {}  │  Form: {}  │  Shifts: {}  │  Next: {}  │  Key: {} ",
            hud.level_index + 1, hud.level_count, hud.level_name,
            w.current_form(), w.shapeshifts_remaining(), next, key,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &line, Color::White, HUD_BG);

        // ── Tutorial line ──
        if !w.tutorial_line().is_empty() {
            self.front.put_str(1, TUTORIAL_ROW, w.tutorial_line(), Color::Rgb { r: 200, g: 200, b: 220 }, Color::Reset);
        }

        // ── Grid ──
        let mut rows_drawn = 0;
        if let Some((min, max)) = w.bounds() {
            for (r, y) in (min.y..=max.y).rev().enumerate() {
                let row = MAP_ROW + r;
                if row >= self.front.height { break; }
                for (c, x) in (min.x..=max.x).enumerate() {
                    let col = MAP_COL + c * self.cell_w;
                    if col + self.cell_w > self.front.width { break; }
                    self.compose_tile(w, Coord::new(x, y), col, row);
                }
                rows_drawn = r + 1;
            }
        }

        // ── Message bar ──
        let msg_row = MAP_ROW + rows_drawn + 1;
        if !hud.message.is_empty() && msg_row < self.front.height {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" ◈ {} ", hud.message), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = msg_row + 2;
        if help_row < self.front.height {
            let pad = if hud.pad_connected { "  │  Pad: A shift  Y restart  Select quit" } else { "" };
            let help = format!(" Arrows/WASD: move  Space: shift  R: restart  Esc/Q: quit{pad}");
            self.front.put_str(0, help_row, &help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Write the visual for tile `pos` into `cell_w` columns starting at `col`.
    fn compose_tile(&mut self, w: &World, pos: Coord, col: usize, row: usize) {
        let Some((ch, fg, bg, repeat)) = glyph_at(w, pos) else { return };
        for i in 0..self.cell_w {
            let c = if i == 0 || repeat { ch } else { ' ' };
            self.front.set(col + i, row, Cell::new(c, fg, bg));
        }
    }
}

/// Columns per tile: `tile_size` 1.0 is two columns, which looks square
/// in most terminal fonts.
fn cell_width(tile_size: f32) -> usize {
    let w = (tile_size * 2.0).round();
    if w.is_finite() { (w as usize).clamp(1, 4) } else { 2 }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::{Movement, Pickups};
    use crate::domain::entity::Direction;
    use crate::sim::level::{parse, LevelFormat, ParseOptions};
    use crate::sim::step::attempt_move;

    fn world(text: &str) -> World {
        parse(text, &ParseOptions { format: LevelFormat::Tutorial, shapeshifts_per_level: 5 }).unwrap()
    }

    fn composed(w: &World, width: usize, height: usize, tile_size: f32) -> FrameBuffer {
        let mut r = Renderer::new(&DisplayConfig { tile_size });
        r.front.resize(width, height);
        let hud = Hud { level_index: 0, level_count: 3, level_name: "Test", message: "hi", pad_connected: false };
        r.compose(w, &hud);
        r.front
    }

    #[test]
    fn grid_is_drawn_top_row_first() {
        let w = world("Read me\n#P.k\nwbFD\n");
        let fb = composed(&w, 100, 12, 0.5);
        assert!(fb.row_text(HUD_ROW).contains("Level 1/3 Test"));
        assert!(fb.row_text(HUD_ROW).contains("Form: Chameleon"));
        assert!(fb.row_text(HUD_ROW).contains("Shifts: 5"));
        assert!(fb.row_text(HUD_ROW).contains("Next: -"));
        assert_eq!(fb.row_text(TUTORIAL_ROW), " Read me");
        assert_eq!(fb.row_text(MAP_ROW), " █@·k");
        assert_eq!(fb.row_text(MAP_ROW + 1), " ≈●F▮");
        assert!(fb.row_text(MAP_ROW + 3).contains("hi"));
    }

    #[test]
    fn wide_cells_repeat_fill_glyphs_only() {
        let w = world("\nP#\n");
        let fb = composed(&w, 40, 10, 1.0);
        assert_eq!(fb.row_text(MAP_ROW), " @ ██");
    }

    #[test]
    fn ragged_rows_leave_gaps() {
        let w = world("\n...P\n.\n");
        let fb = composed(&w, 40, 10, 0.5);
        assert_eq!(fb.row_text(MAP_ROW + 1), " ·");
    }

    #[test]
    fn cell_width_is_clamped() {
        assert_eq!(cell_width(1.0), 2);
        assert_eq!(cell_width(0.1), 1);
        assert_eq!(cell_width(10.0), 4);
        assert_eq!(cell_width(f32::NAN), 2);
    }

    #[test]
    fn water_hints_match_the_form() {
        let opts = ParseOptions { format: LevelFormat::Plain, shapeshifts_per_level: 5 };

        let mut w = parse("Pw", &opts).unwrap();
        let outcome = attempt_move(&mut w, Direction::Right);
        assert_eq!(outcome, MoveOutcome::Blocked(BlockReason::Terrain(TileType::Water)));
        assert_eq!(status_for(&Outcome::Move(outcome)).unwrap(), "Only a frog can cross water.");

        let mut w = parse("Pw#", &opts).unwrap();
        w.available_forms.insert(Form::Frog);
        w.player.form = Form::Frog;
        let outcome = attempt_move(&mut w, Direction::Right);
        assert_eq!(outcome, MoveOutcome::Blocked(BlockReason::Water));
        assert_eq!(status_for(&Outcome::Move(outcome)).unwrap(), "No safe landing beyond the water.");
    }

    #[test]
    fn keyboard_enhancement_starts_off() {
        let r = Renderer::new(&DisplayConfig { tile_size: 1.0 });
        assert!(!r.keyboard_enhanced());
    }

    #[test]
    fn status_messages() {
        let blocked = |r| status_for(&Outcome::Move(MoveOutcome::Blocked(r)));
        assert_eq!(blocked(BlockReason::Water).unwrap(), "No safe landing beyond the water.");
        assert_eq!(blocked(BlockReason::Terrain(TileType::Wall)), None);

        let moved = |pickups| {
            let m = Movement { from: Coord::new(0, 0), to: Coord::new(1, 0), jumped: false, pickups };
            status_for(&Outcome::Move(MoveOutcome::Moved(m)))
        };
        assert_eq!(moved(Pickups::default()), None);
        let unlock = Pickups { unlocked: Some(Form::Mole), ..Pickups::default() };
        assert_eq!(moved(unlock).unwrap(), "Mole form unlocked! Press Space to shift.");

        let shift = Outcome::Cycle(CycleOutcome::Changed { from: Form::Chameleon, to: Form::Frog });
        assert_eq!(status_for(&shift).unwrap(), "You are now a Frog.");
    }
}
