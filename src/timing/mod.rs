mod scheduler;
mod sequence;
mod session;

pub use scheduler::{COMPLETION_PADDING, PlaybackScheduler, plan};
pub use sequence::{Melody, NoteEvent};
pub use session::SessionHandle;
