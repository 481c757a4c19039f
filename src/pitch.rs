/// Pitch name to frequency in Hz, C4 through G5.
pub const PITCHES: [(&str, f32); 20] = [
    ("C4", 261.63),
    ("C#4", 277.18),
    ("D4", 293.66),
    ("D#4", 311.13),
    ("E4", 329.63),
    ("F4", 349.23),
    ("F#4", 369.99),
    ("G4", 392.00),
    ("G#4", 415.30),
    ("A4", 440.00),
    ("A#4", 466.16),
    ("B4", 493.88),
    ("C5", 523.25),
    ("C#5", 554.37),
    ("D5", 587.33),
    ("D#5", 622.25),
    ("E5", 659.25),
    ("F5", 698.46),
    ("F#5", 739.99),
    ("G5", 783.99),
];

pub fn frequency(pitch: &str) -> Option<f32> {
    PITCHES
        .iter()
        .find(|(name, _)| *name == pitch)
        .map(|(_, freq)| *freq)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColor {
    White,
    Black,
}

#[derive(Debug, Clone, Copy)]
pub struct PianoKey {
    pub pitch: &'static str,
    pub color: KeyColor,
    /// Computer keyboard binding
    pub key: char,
}

const fn white(pitch: &'static str, key: char) -> PianoKey {
    PianoKey {
        pitch,
        color: KeyColor::White,
        key,
    }
}

const fn black(pitch: &'static str, key: char) -> PianoKey {
    PianoKey {
        pitch,
        color: KeyColor::Black,
        key,
    }
}

/// On-screen keyboard, left to right.
pub const PIANO_KEYS: [PianoKey; 18] = [
    white("C4", 'a'),
    black("C#4", 'w'),
    white("D4", 's'),
    black("D#4", 'e'),
    white("E4", 'd'),
    white("F4", 'f'),
    black("F#4", 't'),
    white("G4", 'g'),
    black("G#4", 'y'),
    white("A4", 'h'),
    black("A#4", 'u'),
    white("B4", 'j'),
    white("C5", 'k'),
    black("C#5", 'o'),
    white("D5", 'l'),
    black("D#5", 'p'),
    white("E5", ';'),
    white("F5", '\''),
];

/// Case-insensitive lookup of the pitch bound to a computer key.
pub fn pitch_for_key(key: char) -> Option<&'static str> {
    let key = key.to_ascii_lowercase();
    PIANO_KEYS.iter().find(|k| k.key == key).map(|k| k.pitch)
}
