pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod i18n;
pub mod input;
pub mod library;
pub mod pitch;
pub mod timing;
pub mod ui;

pub use config::Settings;
pub use engine::{EngineCommand, EngineHandle, EngineUpdate, spawn_engine};
pub use error::{PianoError, Result};
pub use library::SongLibrary;
pub use timing::{Melody, NoteEvent, PlaybackScheduler, SessionHandle};
pub use ui::PianoApp;
