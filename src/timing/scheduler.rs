use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Sender;
use tracing::info;

use super::{Melody, SessionHandle, session::spawn_session};
use crate::audio::AudioSink;
use crate::error::{PianoError, Result};
use crate::events::{PlaybackEvent, ScheduledEvent, SessionEvent, SessionId};

/// Silence after the last note before the session reports completion.
pub const COMPLETION_PADDING: f64 = 0.5;

/// Lays out one tone per note plus a trailing completion event, with offsets
/// and durations divided by `speed`. Events come back ordered by offset.
///
/// Every offset must fit in a [`Duration`]; a melody or speed that pushes the
/// completion past that is rejected.
pub fn plan(melody: &Melody, speed: f64) -> Result<Vec<ScheduledEvent>> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(PianoError::InvalidSpeed(speed));
    }
    melody.validate()?;

    let completion = melody.length() / speed + COMPLETION_PADDING;
    if Duration::try_from_secs_f64(completion).is_err() {
        return Err(out_of_range(melody, speed));
    }

    let mut events: Vec<ScheduledEvent> = melody
        .notes
        .iter()
        .map(|note| {
            let (start, duration) = note.scaled(speed);
            ScheduledEvent {
                at: start,
                event: PlaybackEvent::Tone {
                    pitch: note.pitch.clone(),
                    duration,
                },
            }
        })
        .collect();

    events.push(ScheduledEvent {
        at: completion,
        event: PlaybackEvent::Complete,
    });

    events.sort_by(|a, b| a.at.total_cmp(&b.at));
    Ok(events)
}

/// Blames the first note that is too long even at normal speed, otherwise
/// the speed.
fn out_of_range(melody: &Melody, speed: f64) -> PianoError {
    melody
        .notes
        .iter()
        .position(|note| Duration::try_from_secs_f64(note.end() + COMPLETION_PADDING).is_err())
        .map(|index| PianoError::InvalidNote {
            index,
            reason: format!(
                "ends at {} seconds, too late to schedule",
                melody.notes[index].end()
            ),
        })
        .unwrap_or(PianoError::InvalidSpeed(speed))
}

/// Owns the single active playback session.
pub struct PlaybackScheduler {
    sink: Arc<dyn AudioSink>,
    observer: Sender<SessionEvent>,
    current: Option<SessionHandle>,
    next_id: SessionId,
}

impl PlaybackScheduler {
    pub fn new(sink: Arc<dyn AudioSink>, observer: Sender<SessionEvent>) -> Self {
        Self {
            sink,
            observer,
            current: None,
            next_id: 0,
        }
    }

    /// Starts playing `melody`, cancelling whatever was playing before.
    /// A rejected request leaves the current session untouched.
    pub fn schedule(&mut self, melody: &Melody, speed: f64) -> Result<SessionHandle> {
        let events = plan(melody, speed)?;

        self.cancel();

        self.next_id += 1;
        let handle = spawn_session(
            self.next_id,
            events,
            self.sink.clone(),
            self.observer.clone(),
        )?;

        info!(
            "Session {}: playing \"{}\" ({} notes) at {}x",
            handle.id(),
            melody.title,
            melody.notes.len(),
            speed
        );

        self.current = Some(handle.clone());
        Ok(handle)
    }

    /// Cancels the current session, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
    }

    pub fn current(&self) -> Option<&SessionHandle> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.current.as_ref().is_some_and(SessionHandle::is_active)
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
