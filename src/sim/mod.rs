pub mod event;
pub mod level;
pub mod sequencer;
pub mod session;
pub mod sources;
pub mod step;
pub mod world;
