/// Level sources for the host: individual `.txt` files from the levels
/// directory, or the embedded levels when the directory has none.
///
/// ## Directory loading
///   - every `*.txt` file, sorted by file name
///   - with an explicit `order` (file stems), only those files, in that
///     order; missing stems are logged and skipped
///   - the source name is the file stem
///
/// Files are not parsed here; the sequencer skips ones that fail.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::config::LevelsConfig;
use super::level::LevelFormat;
use super::sequencer::LevelSource;

/// Collect level sources according to the levels config.
pub fn discover(config: &LevelsConfig) -> Vec<LevelSource> {
    let files = load_from_directory(&config.dir);

    let sources: Vec<LevelSource> = if config.order.is_empty() {
        files
            .into_iter()
            .map(|(name, text)| LevelSource { name, text })
            .collect()
    } else {
        let mut files = files;
        config
            .order
            .iter()
            .filter_map(|stem| match files.remove(stem) {
                Some(text) => Some(LevelSource::new(stem.as_str(), text)),
                None => {
                    warn!(stem = %stem, dir = %config.dir.display(), "ordered level file not found");
                    None
                }
            })
            .collect()
    };

    if sources.is_empty() {
        info!(dir = %config.dir.display(), "no level files, using embedded levels");
        return embedded_levels(config.format);
    }
    info!(count = sources.len(), dir = %config.dir.display(), "level files found");
    sources
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

/// Stem → contents for every readable `.txt` file, ordered by name.
fn load_from_directory(dir: &Path) -> BTreeMap<String, String> {
    let mut results = BTreeMap::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return results,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().map_or(false, |e| e == "txt") {
            continue;
        }
        let stem = path.file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                results.insert(stem, text);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "unreadable level file"),
        }
    }

    results
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

struct Embedded {
    name: &'static str,
    tutorial: &'static str,
    rows: &'static [&'static str],
}

const EMBEDDED: &[Embedded] = &[
    Embedded {
        name: "First Steps",
        tutorial: "Grab the key, then walk through the door.",
        rows: &[
            "#######",
            "#P.k..#",
            "#####.#",
            "#D....#",
            "#######",
        ],
    },
    Embedded {
        name: "Leap",
        tutorial: "Take the frog token, press Space to shift, then hop over water.",
        rows: &[
            "#########",
            "#P.F.w.k#",
            "#######.#",
            "#D..w...#",
            "#########",
        ],
    },
    Embedded {
        name: "Heavy Lifting",
        tutorial: "A gorilla can push a boulder one cell.",
        rows: &[
            "#######",
            "#PG..k#",
            "###b###",
            "#.....#",
            "#D....#",
            "#######",
        ],
    },
    Embedded {
        name: "Burrow",
        tutorial: "Moles tunnel through dirt.",
        rows: &[
            "#########",
            "#P.M.ddk#",
            "#####d###",
            "#D...d..#",
            "#########",
        ],
    },
    Embedded {
        name: "All Together",
        tutorial: "Every form, limited shifts. Plan ahead.",
        rows: &[
            "###########",
            "#P.F.w..G.#",
            "#########b#",
            "#D.dd.kM..#",
            "#########.#",
            "###########",
        ],
    },
];

/// The embedded levels rendered as source text in the given format.
pub fn embedded_levels(format: LevelFormat) -> Vec<LevelSource> {
    EMBEDDED
        .iter()
        .map(|e| {
            let grid = e.rows.join("\n");
            let text = match format {
                LevelFormat::Plain => grid,
                LevelFormat::Tutorial => format!("{}\n{grid}", e.tutorial),
            };
            LevelSource::new(e.name, text)
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use crate::domain::entity::Direction;
    use crate::sim::level::ParseOptions;
    use crate::sim::sequencer::Sequencer;
    use crate::sim::session::Session;

    fn levels_config(dir: PathBuf, order: &[&str]) -> LevelsConfig {
        LevelsConfig {
            dir,
            format: LevelFormat::Plain,
            order: order.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn txt_files_sorted_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.txt"), "P..").unwrap();
        fs::write(tmp.path().join("a.txt"), "P.").unwrap();
        fs::write(tmp.path().join("notes.md"), "ignored").unwrap();
        let sources = discover(&levels_config(tmp.path().to_path_buf(), &[]));
        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(sources[1].text, "P..");
    }

    #[test]
    fn explicit_order_skips_missing() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("one.txt"), "P").unwrap();
        fs::write(tmp.path().join("two.txt"), "P.").unwrap();
        fs::write(tmp.path().join("three.txt"), "P..").unwrap();
        let sources = discover(&levels_config(tmp.path().to_path_buf(), &["two", "gone", "one"]));
        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["two", "one"]);
    }

    #[test]
    fn empty_or_missing_dir_falls_back_to_embedded() {
        let tmp = tempfile::tempdir().unwrap();
        let sources = discover(&levels_config(tmp.path().to_path_buf(), &[]));
        assert_eq!(sources.len(), EMBEDDED.len());

        let sources = discover(&levels_config(tmp.path().join("nope"), &[]));
        assert_eq!(sources[0].name, "First Steps");
    }

    #[test]
    fn embedded_levels_follow_format() {
        let plain = embedded_levels(LevelFormat::Plain);
        let tutorial = embedded_levels(LevelFormat::Tutorial);
        assert!(plain[0].text.starts_with('#'));
        assert!(tutorial[0].text.starts_with("Grab the key"));
    }

    /// Scripted solutions: R/L/U/D move, S shapeshifts.
    const SOLUTIONS: &[&str] = &[
        "RRRRDDLLLL",
        "RRSRRRDDLLLLL",
        "RRRRLLSDDLLD",
        "RRSRRRRLLDDLLLL",
        "RRSRRRRRSDDLLLLSLLLL",
    ];

    #[test]
    fn every_embedded_level_is_solvable() {
        for format in [LevelFormat::Plain, LevelFormat::Tutorial] {
            let opts = ParseOptions { format, ..ParseOptions::default() };
            let seq = Sequencer::new(embedded_levels(format), opts).unwrap();
            let mut session = Session::new(seq, ());

            for (level, script) in SOLUTIONS.iter().enumerate() {
                assert_eq!(session.sequencer().current_index(), level);
                let steps = script.len();
                for (i, c) in script.chars().enumerate() {
                    let dir = match c {
                        'R' => Direction::Right,
                        'L' => Direction::Left,
                        'U' => Direction::Up,
                        'D' => Direction::Down,
                        _ => {
                            assert!(!matches!(
                                session.request_cycle_form(),
                                crate::sim::event::CycleOutcome::NoChange(_)
                            ), "level {level} step {i}: shift refused");
                            continue;
                        }
                    };
                    let outcome = session.request_move(dir).unwrap();
                    assert!(!outcome.is_blocked(), "level {level} step {i}: {outcome:?}");
                    assert_eq!(outcome.is_level_complete(), i == steps - 1, "level {level} step {i}");
                }
            }
            // Wrapped back to the first level.
            assert_eq!(session.sequencer().current_index(), 0);
        }
    }
}
