use serde::{Deserialize, Serialize};

use crate::error::{PianoError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: String,
    /// Seconds from the start of the melody
    pub time: f64,
    /// Seconds
    pub duration: f64,
}

impl NoteEvent {
    pub fn new(pitch: impl Into<String>, time: f64, duration: f64) -> Self {
        Self {
            pitch: pitch.into(),
            time,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.time + self.duration
    }

    /// Offset and duration once played at `speed`.
    pub fn scaled(&self, speed: f64) -> (f64, f64) {
        (self.time / speed, self.duration / speed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Melody {
    pub title: String,
    pub notes: Vec<NoteEvent>,
}

impl Melody {
    pub fn new(title: impl Into<String>, notes: Vec<NoteEvent>) -> Self {
        Self {
            title: title.into(),
            notes,
        }
    }

    /// End of the last sounding note, in unscaled seconds.
    pub fn length(&self) -> f64 {
        self.notes.iter().map(NoteEvent::end).fold(0.0, f64::max)
    }

    pub fn validate(&self) -> Result<()> {
        for (index, note) in self.notes.iter().enumerate() {
            if !note.time.is_finite() || note.time < 0.0 {
                return Err(PianoError::InvalidNote {
                    index,
                    reason: format!("start offset {} is not a non-negative number", note.time),
                });
            }
            if !note.duration.is_finite() || note.duration <= 0.0 {
                return Err(PianoError::InvalidNote {
                    index,
                    reason: format!("duration {} is not a positive number", note.duration),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_latest_note_end() {
        let melody = Melody::new(
            "overlap",
            vec![
                NoteEvent::new("C4", 0.0, 3.0),
                NoteEvent::new("D4", 1.0, 0.5),
            ],
        );
        assert_eq!(melody.length(), 3.0);
        assert_eq!(Melody::new("empty", vec![]).length(), 0.0);
    }

    #[test]
    fn scaling_divides_by_speed() {
        let note = NoteEvent::new("C4", 2.0, 1.0);
        assert_eq!(note.scaled(2.0), (1.0, 0.5));
        assert_eq!(note.scaled(0.5), (4.0, 2.0));
    }

    #[test]
    fn rejects_negative_offsets() {
        let melody = Melody::new("bad", vec![NoteEvent::new("C4", -1.0, 1.0)]);
        match melody.validate() {
            Err(PianoError::InvalidNote { index, .. }) => assert_eq!(index, 0),
            other => panic!("expected InvalidNote, got {:?}", other),
        }
    }

    #[test]
    fn rejects_zero_and_nan_durations() {
        let melody = Melody::new(
            "bad",
            vec![
                NoteEvent::new("C4", 0.0, 1.0),
                NoteEvent::new("D4", 1.0, 0.0),
            ],
        );
        assert!(matches!(
            melody.validate(),
            Err(PianoError::InvalidNote { index: 1, .. })
        ));

        let melody = Melody::new("bad", vec![NoteEvent::new("C4", 0.0, f64::NAN)]);
        assert!(melody.validate().is_err());
    }

    #[test]
    fn unknown_pitches_are_still_valid() {
        let melody = Melody::new("odd", vec![NoteEvent::new("X9", 0.0, 1.0)]);
        assert!(melody.validate().is_ok());
    }
}
