use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam::channel::{Receiver, Sender};
use parking_lot::Mutex;
use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Producer, Split},
};
use tracing::{error, info, warn};

use super::{ToneConfig, Voice};
use crate::error::{PianoError, Result};

const VOICE_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct VoiceCommand {
    pub frequency: f32,
    pub duration: f32,
}

/// Handle to a running output stream. The cpal stream itself lives on its
/// own thread and is dropped when this handle is.
pub struct SynthStream {
    producer: Mutex<HeapProd<VoiceCommand>>,
    _shutdown_tx: Sender<()>,
}

impl SynthStream {
    pub fn start(tone: ToneConfig) -> Result<Self> {
        let ring_buffer = HeapRb::<VoiceCommand>::new(VOICE_QUEUE_CAPACITY);
        let (producer, consumer) = ring_buffer.split();

        let (ready_tx, ready_rx) = crossbeam::channel::bounded::<Result<()>>(1);
        let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded::<()>(0);

        std::thread::Builder::new()
            .name("pianobar-audio".into())
            .spawn(move || audio_thread(tone, consumer, ready_tx, shutdown_rx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                producer: Mutex::new(producer),
                _shutdown_tx: shutdown_tx,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PianoError::Audio("audio thread exited during setup".into())),
        }
    }

    pub fn trigger(&self, frequency: f32, duration: f32) {
        let command = VoiceCommand {
            frequency,
            duration,
        };
        if self.producer.lock().try_push(command).is_err() {
            warn!("Voice queue full, dropping {frequency} Hz tone");
        }
    }
}

struct AudioState {
    consumer: HeapCons<VoiceCommand>,
    voices: Vec<Voice>,
    tone: ToneConfig,
    sample_rate: f32,
    num_channels: usize,
}

fn audio_thread(
    tone: ToneConfig,
    consumer: HeapCons<VoiceCommand>,
    ready_tx: Sender<Result<()>>,
    shutdown_rx: Receiver<()>,
) {
    let stream = match build_stream(tone, consumer) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    // Blocks until the owning SynthStream is dropped.
    let _ = shutdown_rx.recv();
    drop(stream);
    info!("Audio output closed");
}

fn build_stream(tone: ToneConfig, consumer: HeapCons<VoiceCommand>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| PianoError::Audio("no output device".into()))?;
    let config = device
        .default_output_config()
        .map_err(|e| PianoError::Audio(e.to_string()))?;
    let stream_config: cpal::StreamConfig = config.into();

    let num_channels = stream_config.channels as usize;
    let sample_rate = stream_config.sample_rate as f32;
    info!("Audio output: {} channels, {} Hz", num_channels, sample_rate);

    let mut state = AudioState {
        consumer,
        voices: Vec::with_capacity(32),
        tone,
        sample_rate,
        num_channels,
    };

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                audio_callback(data, &mut state);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| PianoError::Audio(e.to_string()))?;

    stream
        .play()
        .map_err(|e| PianoError::Audio(e.to_string()))?;

    Ok(stream)
}

fn audio_callback(data: &mut [f32], state: &mut AudioState) {
    while let Some(command) = state.consumer.try_pop() {
        state
            .voices
            .push(Voice::new(command.frequency, command.duration));
    }

    data.fill(0.0);
    if state.num_channels == 0 {
        return;
    }

    for frame in data.chunks_mut(state.num_channels) {
        let mut sample = 0.0;
        for voice in &mut state.voices {
            sample += voice.render_sample(state.tone.wave, &state.tone.envelope, state.sample_rate);
        }
        sample *= state.tone.volume;
        for out in frame.iter_mut() {
            *out = sample;
        }
    }

    let envelope = &state.tone.envelope;
    state.voices.retain(|voice| !voice.is_finished(envelope));
}
