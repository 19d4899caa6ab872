/// Session: the surface a presentation layer talks to.
///
/// Intents go in (`request_move`, `request_cycle_form`, `request_reload`),
/// outcomes come out twice: as the return value and through the
/// `OutcomeSink`. The sink sees a completing move before the next level is
/// loaded, then gets `on_level_loaded` for the new one.
///
/// One intent is fully resolved before the next is accepted; callers queue
/// input themselves.

use tracing::debug;

use crate::domain::entity::Direction;
use super::event::{CycleOutcome, MoveOutcome, Outcome};
use super::sequencer::{Sequencer, SequencerError};
use super::step;
use super::world::World;

/// Receives outcomes as they are resolved. Every method defaults to a no-op.
pub trait OutcomeSink {
    fn on_outcome(&mut self, _outcome: &Outcome) {}
    fn on_level_loaded(&mut self, _index: usize, _name: &str) {}
}

impl OutcomeSink for () {}

/// Collects everything for later draining.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub outcomes: Vec<Outcome>,
    /// `(index, name)` of each level loaded after construction.
    pub loaded: Vec<(usize, String)>,
}

impl RecordingSink {
    pub fn drain(&mut self) -> (Vec<Outcome>, Vec<(usize, String)>) {
        (std::mem::take(&mut self.outcomes), std::mem::take(&mut self.loaded))
    }
}

impl OutcomeSink for RecordingSink {
    fn on_outcome(&mut self, outcome: &Outcome) {
        self.outcomes.push(*outcome);
    }

    fn on_level_loaded(&mut self, index: usize, name: &str) {
        self.loaded.push((index, name.to_string()));
    }
}

pub struct Session<S: OutcomeSink> {
    sequencer: Sequencer,
    sink: S,
}

impl<S: OutcomeSink> Session<S> {
    pub fn new(sequencer: Sequencer, sink: S) -> Self {
        Session { sequencer, sink }
    }

    /// Resolve one move. A completing move advances to the next level;
    /// the error case is only reachable when no level can be loaded.
    pub fn request_move(&mut self, dir: Direction) -> Result<MoveOutcome, SequencerError> {
        let outcome = step::attempt_move(self.sequencer.world_mut(), dir);
        self.sink.on_outcome(&Outcome::Move(outcome));
        if outcome.is_level_complete() {
            debug!(index = self.sequencer.current_index(), "level complete, advancing");
            self.sequencer.advance()?;
            self.report_loaded();
        }
        Ok(outcome)
    }

    pub fn request_cycle_form(&mut self) -> CycleOutcome {
        let outcome = step::attempt_form_cycle(self.sequencer.world_mut());
        self.sink.on_outcome(&Outcome::Cycle(outcome));
        outcome
    }

    /// Restart the current level from its source.
    pub fn request_reload(&mut self) -> Result<(), SequencerError> {
        self.sequencer.reload()?;
        self.report_loaded();
        Ok(())
    }

    fn report_loaded(&mut self) {
        let index = self.sequencer.current_index();
        self.sink.on_level_loaded(index, self.sequencer.current_name());
    }

    // ── Queries ──

    pub fn world(&self) -> &World {
        self.sequencer.world()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
