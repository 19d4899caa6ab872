/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// Logging is not up yet when this runs (its directory comes from here),
/// so problems are collected in `GameConfig::problems` and logged by the
/// caller once the subscriber exists.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sim::level::{LevelFormat, ParseOptions, DEFAULT_SHAPESHIFTS};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub rules: RulesConfig,
    pub levels: LevelsConfig,
    pub display: DisplayConfig,
    pub gamepad: GamepadConfig,
    pub log: LogConfig,
    /// Non-fatal problems met while loading (unreadable or malformed file).
    pub problems: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub shapeshifts_per_level: u32,
}

#[derive(Clone, Debug)]
pub struct LevelsConfig {
    pub dir: PathBuf,
    pub format: LevelFormat,
    /// Explicit play order by file stem; empty means alphabetical.
    pub order: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub tile_size: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub cycle: Vec<String>,
    pub reload: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub filter: String,
}

impl GameConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            format: self.levels.format,
            shapeshifts_per_level: self.rules.shapeshifts_per_level,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    levels: TomlLevels,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_shapeshifts")]
    shapeshifts_per_level: u32,
}

#[derive(Deserialize, Debug)]
struct TomlLevels {
    #[serde(default = "default_levels_dir")]
    dir: String,
    #[serde(default)]
    format: LevelFormat,
    #[serde(default)]
    order: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_tile_size")]
    tile_size: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_cycle")]
    cycle: Vec<String>,
    #[serde(default = "default_reload")]
    reload: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_dir")]
    dir: String,
    #[serde(default = "default_log_filter")]
    filter: String,
}

// ── Defaults ──

fn default_shapeshifts() -> u32 { DEFAULT_SHAPESHIFTS }
fn default_levels_dir() -> String { "levels".into() }
fn default_tile_size() -> f32 { 1.0 }
fn default_cycle() -> Vec<String> { vec!["A".into()] }
fn default_reload() -> Vec<String> { vec!["Y".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_log_dir() -> String { "logs".into() }
fn default_log_filter() -> String { "info".into() }

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules { shapeshifts_per_level: default_shapeshifts() }
    }
}

impl Default for TomlLevels {
    fn default() -> Self {
        TomlLevels {
            dir: default_levels_dir(),
            format: LevelFormat::default(),
            order: Vec::new(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay { tile_size: default_tile_size() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            cycle: default_cycle(),
            reload: default_reload(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            dir: default_log_dir(),
            filter: default_log_filter(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        Self::load_from(&candidate_dirs())
    }

    /// Same as `load`, over an explicit list of directories.
    pub fn load_from(search_dirs: &[PathBuf]) -> Self {
        let mut problems = Vec::new();
        let (toml_cfg, config_dir) = load_toml(search_dirs, &mut problems);

        GameConfig {
            rules: RulesConfig {
                shapeshifts_per_level: toml_cfg.rules.shapeshifts_per_level,
            },
            levels: LevelsConfig {
                dir: resolve_dir(search_dirs, &toml_cfg.levels.dir),
                format: toml_cfg.levels.format,
                order: toml_cfg.levels.order,
            },
            display: DisplayConfig {
                tile_size: toml_cfg.display.tile_size,
            },
            gamepad: GamepadConfig {
                cycle: toml_cfg.gamepad.cycle,
                reload: toml_cfg.gamepad.reload,
                quit: toml_cfg.gamepad.quit,
            },
            log: LogConfig {
                dir: resolve_log_dir(search_dirs, config_dir.as_deref(), &toml_cfg.log.dir),
                filter: toml_cfg.log.filter,
            },
            problems,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::load_from(&[])
    }
}

/// Absolute paths are kept; relative ones are looked up in each candidate
/// directory, falling back to the path relative to CWD.
fn resolve_dir(search_dirs: &[PathBuf], name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    find_existing(search_dirs, name).unwrap_or_else(|| path.to_path_buf())
}

/// Like `resolve_dir`, but the log directory may not exist yet: a relative
/// path with no existing match is anchored next to the config file that
/// was loaded.
fn resolve_log_dir(search_dirs: &[PathBuf], config_dir: Option<&Path>, name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    find_existing(search_dirs, name)
        .or_else(|| config_dir.map(|d| d.join(name)))
        .unwrap_or_else(|| path.to_path_buf())
}

fn find_existing(search_dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    search_dirs.iter()
        .map(|d| d.join(name))
        .find(|p| p.is_dir())
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Returns the parsed config and the directory it was found in.
fn load_toml(search_dirs: &[PathBuf], problems: &mut Vec<String>) -> (TomlConfig, Option<PathBuf>) {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return (cfg, Some(dir.clone())),
                    Err(e) => {
                        problems.push(format!("{}: parse error, using defaults: {e}", path.display()));
                        return (TomlConfig::default(), Some(dir.clone()));
                    }
                },
                Err(e) => {
                    problems.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    (TomlConfig::default(), None)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
