use thiserror::Error;

#[derive(Error, Debug)]
pub enum PianoError {
    #[error("playback speed must be a positive number, got {0}")]
    InvalidSpeed(f64),

    #[error("invalid note #{index}: {reason}")]
    InvalidNote { index: usize, reason: String },

    #[error("audio: {0}")]
    Audio(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("RON: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("RON: {0}")]
    RonSerialize(#[from] ron::Error),

    #[error("file watcher: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, PianoError>;
