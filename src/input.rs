use crate::pitch;

/// Computer keyboard as a piano. Keys are ignored while a text field has
/// focus so typing a song name does not play notes.
#[derive(Debug, Default)]
pub struct KeyboardInput {
    text_focus: bool,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text_focus(&mut self, focused: bool) {
        self.text_focus = focused;
    }

    pub fn pitch_for_key(&self, key: char) -> Option<&'static str> {
        if self.text_focus {
            return None;
        }
        pitch::pitch_for_key(key)
    }
}
