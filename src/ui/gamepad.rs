/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move (one cell per push)
///   A                     →  Cycle form
///   Y                     →  Reload level
///   Select                →  Quit
///
/// Without the "gamepad" feature the tracker exists but never reports input.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::Direction;
use super::input::Command;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
#[derive(Clone, Debug, PartialEq, Eq)]
struct ActionMap {
    cycle: Vec<Btn>,
    reload: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            cycle:  vec![Btn::A],
            reload: vec![Btn::Y],
            quit:   vec![Btn::Select],
        }
    }
}

/// Index into the per-direction state arrays.
fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
enum DirSource {
    Dpad,
    Stick,
}

const DIRS: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons pressed since the last `drain_commands`, indexed by `Btn`.
    pressed: [bool; BTN_COUNT],

    /// D-pad held state, indexed by `dir_index`.
    dpad: [bool; 4],
    /// Stick-as-digital held state, indexed by `dir_index`.
    stick: [bool; 4],
    /// Directions that went from released to held since the last drain.
    dir_pressed: [bool; 4],
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(_) => (None, false),
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            pressed: [false; BTN_COUNT],
            dpad: [false; 4],
            stick: [false; 4],
            dir_pressed: [false; 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Lists with no recognizable button
    /// name keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let cy = parse_list(&cfg.cycle);
        if !cy.is_empty() { map.cycle = cy; }
        let rl = parse_list(&cfg.reload);
        if !rl.is_empty() { map.reload = rl; }
        let qt = parse_list(&cfg.quit);
        if !qt.is_empty() { map.quit = qt; }
    }

    /// Poll the pad and return commands for everything pressed since the
    /// previous call. Quit comes first so it is never starved by moves.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        let mut commands = Vec::new();
        if self.any_pressed(&self.action_map.quit) {
            commands.push(Command::Quit);
        }
        if self.any_pressed(&self.action_map.reload) {
            commands.push(Command::Reload);
        }
        if self.any_pressed(&self.action_map.cycle) {
            commands.push(Command::CycleForm);
        }
        for dir in DIRS {
            if self.dir_pressed[dir_index(dir)] {
                commands.push(Command::Move(dir));
            }
        }

        self.pressed = [false; BTN_COUNT];
        self.dir_pressed = [false; 4];
        commands
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        let held = [
            self.stick_y > STICK_DEADZONE,
            self.stick_y < -STICK_DEADZONE,
            self.stick_x < -STICK_DEADZONE,
            self.stick_x > STICK_DEADZONE,
        ];
        for (i, &now) in held.iter().enumerate() {
            self.set_direction(i, DirSource::Stick, now);
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad handled separately (not in Btn enum)
        let dpad_dir = match gilrs_btn {
            Button::DPadUp    => Some(Direction::Up),
            Button::DPadDown  => Some(Direction::Down),
            Button::DPadLeft  => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(dir) = dpad_dir {
            let i = dir_index(dir);
            self.set_direction(i, DirSource::Dpad, held);
            return;
        }

        if held {
            if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
                self.pressed[btn as usize] = true;
            }
        }
    }

    /// Update one source (d-pad or stick) for a direction, flagging a
    /// press when the direction as a whole goes from released to held.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set_direction(&mut self, i: usize, source: DirSource, held: bool) {
        let before = self.dpad[i] || self.stick[i];
        match source {
            DirSource::Dpad => self.dpad[i] = held,
            DirSource::Stick => self.stick[i] = held,
        }
        let after = self.dpad[i] || self.stick[i];
        if after && !before {
            self.dir_pressed[i] = true;
        }
    }

    // ── Internal ──

    fn any_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.pressed[b as usize])
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.pressed = [false; BTN_COUNT];
        self.dpad = [false; 4];
        self.stick = [false; 4];
        self.dir_pressed = [false; 4];
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
