/// Level sequencer: an ordered, wrapping list of level sources and the
/// live `World` built from the current one.
///
/// Loading is always from source text, so a reload rebuilds every piece of
/// level state (boulders, pickups, forms, budget, spawn) from scratch.
/// A level that fails to parse is skipped with a warning and the next one
/// is tried, wrapping, until every source has been attempted once.

use tracing::{info, warn};

use super::level::{parse, ParseOptions};
use super::world::World;

/// One level body plus a display name (file stem or built-in title).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSource {
    pub name: String,
    pub text: String,
}

impl LevelSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        LevelSource { name: name.into(), text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SequencerError {
    #[error("no levels to play")]
    NoLevels,
    #[error("none of the {attempted} levels could be loaded")]
    NoLoadableLevel { attempted: usize },
}

#[derive(Debug)]
pub struct Sequencer {
    sources: Vec<LevelSource>,
    options: ParseOptions,
    current: usize,
    world: World,
}

impl Sequencer {
    /// Build a sequencer and load the first loadable level from index 0.
    pub fn new(sources: Vec<LevelSource>, options: ParseOptions) -> Result<Self, SequencerError> {
        if sources.is_empty() {
            return Err(SequencerError::NoLevels);
        }
        let (current, world) = first_loadable(&sources, &options, 0)?;
        Ok(Sequencer { sources, options, current, world })
    }

    /// Load the level at `index`, wrapped into range (negative counts from
    /// the end). Unparseable levels are skipped forward. On error the
    /// previous world stays live.
    pub fn load(&mut self, index: isize) -> Result<(), SequencerError> {
        let start = index.rem_euclid(self.sources.len() as isize) as usize;
        let (current, world) = first_loadable(&self.sources, &self.options, start)?;
        self.current = current;
        self.world = world;
        Ok(())
    }

    /// Rebuild the current level from its source.
    pub fn reload(&mut self) -> Result<(), SequencerError> {
        self.load(self.current as isize)
    }

    /// Move to the next level, wrapping after the last.
    pub fn advance(&mut self) -> Result<(), SequencerError> {
        self.load(self.current as isize + 1)
    }

    // ── Queries ──

    pub fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn current_name(&self) -> &str {
        &self.sources[self.current].name
    }
}

/// Try `start`, `start + 1`, ... (wrapping) until one parses.
fn first_loadable(
    sources: &[LevelSource],
    options: &ParseOptions,
    start: usize,
) -> Result<(usize, World), SequencerError> {
    let len = sources.len();
    for attempt in 0..len {
        let index = (start + attempt) % len;
        let source = &sources[index];
        match parse(&source.text, options) {
            Ok(world) => {
                info!(index, name = %source.name, "level loaded");
                return Ok((index, world));
            }
            Err(e) => {
                warn!(index, name = %source.name, error = %e, "skipping unloadable level");
            }
        }
    }
    Err(SequencerError::NoLoadableLevel { attempted: len })
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
