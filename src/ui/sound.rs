/// Sound engine: procedural sound effects via rodio.
///
/// Every effect is generated as an in-memory WAV buffer at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Which effects an outcome triggers is decided by `cues_for`, which is
/// feature-independent. Compile without the "sound" feature to get a stub
/// `SoundEngine` that does nothing.

use strum::EnumIter;

use crate::sim::event::{CycleOutcome, MoveOutcome, Outcome};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter)]
pub enum Sfx {
    Step,
    Push,
    Key,
    Token,
    DoorOpen,
    Shapeshift,
    Bump,
    Complete,
}

/// Effects for one outcome, in play order.
pub fn cues_for(outcome: &Outcome) -> Vec<Sfx> {
    let mut cues = Vec::new();
    match outcome {
        Outcome::Move(MoveOutcome::Blocked(_)) => cues.push(Sfx::Bump),
        Outcome::Move(m) => {
            cues.push(match m {
                MoveOutcome::Pushed { .. } => Sfx::Push,
                _ => Sfx::Step,
            });
            if let Some(mv) = m.movement() {
                if mv.pickups.key {
                    cues.push(Sfx::Key);
                }
                if mv.pickups.door_opened {
                    cues.push(Sfx::DoorOpen);
                }
                if mv.pickups.unlocked.is_some() {
                    cues.push(Sfx::Token);
                }
            }
            if m.is_level_complete() {
                cues.push(Sfx::Complete);
            }
        }
        Outcome::Cycle(CycleOutcome::Changed { .. }) => cues.push(Sfx::Shapeshift),
        Outcome::Cycle(CycleOutcome::NoChange(_)) => cues.push(Sfx::Bump),
    }
    cues
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use strum::IntoEnumIterator;

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    /// Pre-generated WAV buffers, indexed by `Sfx as usize`.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let buffers: Vec<_> = Sfx::iter().map(|s| Arc::new(make_wav(&generate(s)))).collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(sfx as usize) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    fn generate(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Step => tone(330.0, 0.03, 0.12),
            Sfx::Push => thud(),
            Sfx::Key => notes(&[(1319.0, 0.05), (1760.0, 0.08)], 0.25), // E6, A6
            Sfx::Token => notes(&[(1047.0, 0.045), (1319.0, 0.045), (1568.0, 0.07)], 0.25), // C6 E6 G6
            Sfx::DoorOpen => sweep(220.0, 440.0, 0.2, 0.25),
            Sfx::Shapeshift => sweep(300.0, 900.0, 0.14, 0.2),
            Sfx::Bump => tone(110.0, 0.06, 0.2),
            Sfx::Complete => notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)], 0.3),
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn sample_count(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sine blip with a linear fade out.
    fn tone(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = sample_count(duration);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Note sequence, sine plus an octave for a brighter timbre.
    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in seq {
            let n = sample_count(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Linear pitch glide.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = sample_count(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = from + (to - from) * p;
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - p).powf(0.6) * volume
            })
            .collect()
    }

    /// Boulder scrape: low tone mixed with LCG noise.
    fn thud() -> Vec<f32> {
        let n = sample_count(0.12);
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                let tone = (t * (140.0 - p * 60.0) * TAU).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (tone * 0.6 + noise * 0.4) * (1.0 - p).powf(0.8) * 0.3
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a 16-bit mono PCM buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let block_align: u16 = bits_per_sample / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn every_effect_has_audio() {
            for sfx in Sfx::iter() {
                let wav = make_wav(&generate(sfx));
                assert!(wav.len() > 44, "{sfx:?}");
                assert_eq!(&wav[..4], b"RIFF");
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}
