/// Keyboard input: terminal key events → `Command`s.
///
/// Every action is edge-triggered: a key produces a command when it goes
/// from "not held" to "held", so holding an arrow moves one cell, not one
/// cell per frame.
///
/// Release events are honored only when `Renderer::init` managed to enable
/// crossterm's keyboard enhancement; the caller sets `honor_release` from
/// it. Other terminals fall back to timeout-based release detection (their
/// auto-repeat arrives as a stream of Press events).
///
/// ## Bindings
///   Arrows / WASD  →  Move
///   Space          →  Cycle form
///   R              →  Reload level
///   Esc / Q        →  Quit
///   Ctrl+C         →  Quit

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// One player intent, from any input device.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    CycleForm,
    Reload,
    Quit,
}

/// Binding table for a single key event.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Quit),
            _ => None,
        };
    }
    let cmd = match key.code {
        KeyCode::Up => Command::Move(Direction::Up),
        KeyCode::Down => Command::Move(Direction::Down),
        KeyCode::Left => Command::Move(Direction::Left),
        KeyCode::Right => Command::Move(Direction::Right),
        KeyCode::Char(' ') => Command::CycleForm,
        KeyCode::Esc => Command::Quit,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Command::Move(Direction::Up),
            's' => Command::Move(Direction::Down),
            'a' => Command::Move(Direction::Left),
            'd' => Command::Move(Direction::Right),
            'r' => Command::Reload,
            'q' => Command::Quit,
            _ => return None,
        },
        _ => return None,
    };
    Some(cmd)
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Commands from fresh presses during the most recent drain, in order.
    commands: Vec<Command>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            commands: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and return this frame's commands.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        self.commands.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);

        std::mem::take(&mut self.commands)
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Enhancement not confirmed; rely on timeout-based expiry
            }
            _ => {
                let was_held = self.last_active
                    .get(&key.code)
                    .map_or(false, |t| now.duration_since(*t) < HOLD_TIMEOUT);
                self.last_active.insert(key.code, now);
                if !was_held {
                    if let Some(cmd) = command_for(&key) {
                        self.commands.push(cmd);
                    }
                }
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn bindings() {
        assert_eq!(command_for(&press(KeyCode::Left)), Some(Command::Move(Direction::Left)));
        assert_eq!(command_for(&press(KeyCode::Char('W'))), Some(Command::Move(Direction::Up)));
        assert_eq!(command_for(&press(KeyCode::Char(' '))), Some(Command::CycleForm));
        assert_eq!(command_for(&press(KeyCode::Char('r'))), Some(Command::Reload));
        assert_eq!(command_for(&press(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(command_for(&press(KeyCode::Char('x'))), None);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(command_for(&ctrl_c), Some(Command::Quit));
        let ctrl_d = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_eq!(command_for(&ctrl_d), None);
    }

    #[test]
    fn auto_repeat_is_one_command() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        for i in 0..5 {
            input.handle_key(press(KeyCode::Right), t0 + Duration::from_millis(30 * i));
        }
        assert_eq!(input.commands, vec![Command::Move(Direction::Right)]);

        // Pressed again after the hold expired.
        input.handle_key(press(KeyCode::Right), t0 + Duration::from_millis(500));
        assert_eq!(input.commands.len(), 2);
    }

    #[test]
    fn release_ignored_without_enhancement() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.handle_key(press(KeyCode::Char(' ')), t0);
        input.handle_key(release(KeyCode::Char(' ')), t0);
        // Still inside the hold window, so this reads as auto-repeat.
        input.handle_key(press(KeyCode::Char(' ')), t0 + Duration::from_millis(50));
        assert_eq!(input.commands, vec![Command::CycleForm]);
    }

    #[test]
    fn release_rearms_when_honored() {
        let mut input = InputState::new();
        input.honor_release = true;
        let t0 = Instant::now();
        input.handle_key(press(KeyCode::Char(' ')), t0);
        input.handle_key(release(KeyCode::Char(' ')), t0);
        input.handle_key(press(KeyCode::Char(' ')), t0);
        assert_eq!(input.commands, vec![Command::CycleForm, Command::CycleForm]);
    }
}
