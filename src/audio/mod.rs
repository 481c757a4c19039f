mod instrument;
mod output;
mod voice;

pub use instrument::{ToneConfig, ToneEnvelope, Wave};
pub use output::SynthStream;
pub use voice::{EnvelopeState, Voice, calculate_envelope, envelope_state};

use parking_lot::Mutex;
use tracing::info;

use crate::error::Result;

/// Something that can sound a tone. Implementations must tolerate being
/// called from any thread, many times in quick succession.
pub trait AudioSink: Send + Sync {
    fn trigger(&self, frequency: f32, duration: f32);

    /// Called on the first user interaction. Sinks that need a user gesture
    /// before producing sound open their device here.
    fn activate(&self) -> Result<()> {
        Ok(())
    }
}

/// Silent sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn trigger(&self, _frequency: f32, _duration: f32) {}
}

/// Synthesizer on the default output device, opened on first activation.
/// Triggers before that are dropped.
pub struct AudioOutput {
    tone: ToneConfig,
    synth: Mutex<Option<SynthStream>>,
}

impl AudioOutput {
    pub fn new(tone: ToneConfig) -> Self {
        Self {
            tone,
            synth: Mutex::new(None),
        }
    }
}

impl AudioSink for AudioOutput {
    fn trigger(&self, frequency: f32, duration: f32) {
        if let Some(synth) = self.synth.lock().as_ref() {
            synth.trigger(frequency, duration);
        }
    }

    fn activate(&self) -> Result<()> {
        let mut synth = self.synth.lock();
        if synth.is_none() {
            *synth = Some(SynthStream::start(self.tone.clone())?);
            info!("Audio output activated");
        }
        Ok(())
    }
}
