use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::audio::AudioSink;
use crate::events::{PlaybackEvent, ScheduledEvent, SessionEvent, SessionId};
use crate::pitch;

struct SessionShared {
    cancelled: AtomicBool,
    finished: AtomicBool,
    /// Dropping the sender wakes the worker.
    cancel_tx: Mutex<Option<Sender<()>>>,
}

/// One playback run. Clones refer to the same session.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    shared: Arc<SessionShared>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// True until the session completes or is cancelled.
    pub fn is_active(&self) -> bool {
        !self.shared.cancelled.load(Ordering::Acquire)
            && !self.shared.finished.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    /// Prevents every event that has not fired yet from having any effect.
    /// Calling it again, or after completion, does nothing.
    pub fn cancel(&self) {
        if self.shared.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.cancel_tx.lock().take();
        if !self.shared.finished.load(Ordering::Acquire) {
            debug!("Session {} cancelled", self.id);
        }
    }
}

/// Spawns the worker that fires `events` relative to now.
pub(crate) fn spawn_session(
    id: SessionId,
    events: Vec<ScheduledEvent>,
    sink: Arc<dyn AudioSink>,
    observer: Sender<SessionEvent>,
) -> std::io::Result<SessionHandle> {
    let (cancel_tx, cancel_rx) = crossbeam::channel::bounded::<()>(0);
    let shared = Arc::new(SessionShared {
        cancelled: AtomicBool::new(false),
        finished: AtomicBool::new(false),
        cancel_tx: Mutex::new(Some(cancel_tx)),
    });

    let worker = Worker {
        id,
        shared: shared.clone(),
        cancel_rx,
        sink,
        observer,
    };
    std::thread::Builder::new()
        .name(format!("pianobar-session-{id}"))
        .spawn(move || worker.run(events))?;

    Ok(SessionHandle { id, shared })
}

struct Worker {
    id: SessionId,
    shared: Arc<SessionShared>,
    cancel_rx: Receiver<()>,
    sink: Arc<dyn AudioSink>,
    observer: Sender<SessionEvent>,
}

impl Worker {
    fn run(self, events: Vec<ScheduledEvent>) {
        let start = Instant::now();

        for scheduled in events {
            let deadline = Duration::try_from_secs_f64(scheduled.at)
                .ok()
                .and_then(|offset| start.checked_add(offset));
            let woken = match deadline {
                Some(deadline) => self.cancel_rx.recv_deadline(deadline),
                // Beyond what the clock can represent: only cancellation ends it
                None => self.cancel_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match woken {
                Err(RecvTimeoutError::Timeout) => {}
                // Sender dropped: cancelled
                _ => return,
            }
            if self.shared.cancelled.load(Ordering::Acquire) {
                return;
            }
            self.dispatch(scheduled.event);
        }
    }

    fn dispatch(&self, event: PlaybackEvent) {
        match &event {
            PlaybackEvent::Tone { pitch, duration } => {
                if let Some(frequency) = pitch::frequency(pitch) {
                    self.sink.trigger(frequency, *duration as f32);
                }
            }
            PlaybackEvent::Complete => {
                self.shared.finished.store(true, Ordering::Release);
                debug!("Session {} complete", self.id);
            }
        }

        let _ = self.observer.send(SessionEvent {
            session: self.id,
            event,
        });
    }
}
