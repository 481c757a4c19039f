pub type SessionId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    /// Seconds after the session started
    pub at: f64,
    pub event: PlaybackEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Tone { pitch: String, duration: f64 },
    Complete,
}

/// A playback event as reported by a running session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub session: SessionId,
    pub event: PlaybackEvent,
}
