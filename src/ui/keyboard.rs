use std::collections::HashSet;

use eframe::egui;

use crate::pitch::{KeyColor, PIANO_KEYS, PianoKey};

const KEYBOARD_HEIGHT: f32 = 256.0;
const BLACK_KEY_HEIGHT_RATIO: f32 = 0.625;
const BLACK_KEY_WIDTH_RATIO: f32 = 0.75;

struct KeyRect {
    key: PianoKey,
    rect: egui::Rect,
}

/// On-screen keyboard. Returns the pitch pressed with the pointer this frame.
pub struct PianoKeyboard<'a> {
    active: &'a HashSet<String>,
}

impl<'a> PianoKeyboard<'a> {
    pub fn new(active: &'a HashSet<String>) -> Self {
        Self { active }
    }

    pub fn show(self, ui: &mut egui::Ui) -> Option<&'static str> {
        let size = egui::Vec2::new(ui.available_width(), KEYBOARD_HEIGHT);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::click());
        let rect = response.rect;

        let (white_keys, black_keys) = layout(rect);

        for key_rect in &white_keys {
            self.draw_key(&painter, key_rect);
        }
        for key_rect in &black_keys {
            self.draw_key(&painter, key_rect);
        }

        if !response.is_pointer_button_down_on() || !ui.input(|i| i.pointer.any_pressed()) {
            return None;
        }
        let pos = response.interact_pointer_pos()?;

        // black keys sit on top
        black_keys
            .iter()
            .chain(white_keys.iter())
            .find(|k| k.rect.contains(pos))
            .map(|k| k.key.pitch)
    }

    fn draw_key(&self, painter: &egui::Painter, key_rect: &KeyRect) {
        let is_active = self.active.contains(key_rect.key.pitch);
        let (fill, stroke, text) = match (key_rect.key.color, is_active) {
            (KeyColor::White, false) => (
                egui::Color32::WHITE,
                egui::Color32::from_rgb(200, 200, 200),
                egui::Color32::from_rgb(40, 40, 40),
            ),
            (KeyColor::White, true) => (
                egui::Color32::from_rgb(191, 219, 254),
                egui::Color32::from_rgb(96, 165, 250),
                egui::Color32::from_rgb(40, 40, 40),
            ),
            (KeyColor::Black, false) => (
                egui::Color32::from_rgb(20, 20, 20),
                egui::Color32::from_rgb(60, 60, 60),
                egui::Color32::WHITE,
            ),
            (KeyColor::Black, true) => (
                egui::Color32::from_rgb(37, 99, 235),
                egui::Color32::from_rgb(59, 130, 246),
                egui::Color32::WHITE,
            ),
        };

        let rounding = egui::CornerRadius {
            nw: 0,
            ne: 0,
            sw: 8,
            se: 8,
        };
        painter.rect_filled(key_rect.rect, rounding, fill);
        painter.rect_stroke(
            key_rect.rect,
            rounding,
            egui::Stroke::new(2.0, stroke),
            egui::StrokeKind::Inside,
        );

        let bottom = key_rect.rect.center_bottom();
        painter.text(
            bottom - egui::Vec2::new(0.0, 36.0),
            egui::Align2::CENTER_CENTER,
            key_rect.key.key.to_ascii_uppercase(),
            egui::FontId::proportional(14.0),
            text,
        );
        painter.text(
            bottom - egui::Vec2::new(0.0, 16.0),
            egui::Align2::CENTER_CENTER,
            key_rect.key.pitch,
            egui::FontId::proportional(11.0),
            text,
        );
    }
}

fn layout(rect: egui::Rect) -> (Vec<KeyRect>, Vec<KeyRect>) {
    let white_count = PIANO_KEYS
        .iter()
        .filter(|k| k.color == KeyColor::White)
        .count();
    let white_width = rect.width() / white_count as f32;
    let black_width = white_width * BLACK_KEY_WIDTH_RATIO;
    let black_height = rect.height() * BLACK_KEY_HEIGHT_RATIO;

    let mut white_keys = Vec::with_capacity(white_count);
    let mut black_keys = Vec::new();
    let mut whites_so_far = 0;

    for key in PIANO_KEYS {
        match key.color {
            KeyColor::White => {
                let left = rect.left() + whites_so_far as f32 * white_width;
                white_keys.push(KeyRect {
                    key,
                    rect: egui::Rect::from_min_size(
                        egui::Pos2::new(left, rect.top()),
                        egui::Vec2::new(white_width, rect.height()),
                    ),
                });
                whites_so_far += 1;
            }
            KeyColor::Black => {
                // straddles the boundary with the previous white key
                let center = rect.left() + whites_so_far as f32 * white_width;
                black_keys.push(KeyRect {
                    key,
                    rect: egui::Rect::from_min_size(
                        egui::Pos2::new(center - black_width / 2.0, rect.top()),
                        egui::Vec2::new(black_width, black_height),
                    ),
                });
            }
        }
    }

    (white_keys, black_keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::ZERO, egui::Vec2::new(704.0, KEYBOARD_HEIGHT))
    }

    #[test]
    fn lays_out_eleven_white_and_seven_black_keys() {
        let (white, black) = layout(keyboard_rect());
        assert_eq!(white.len(), 11);
        assert_eq!(black.len(), 7);
        assert_eq!(white[0].rect.width(), 64.0);
        assert_eq!(white[10].rect.right(), 704.0);
    }

    #[test]
    fn black_keys_straddle_white_boundaries() {
        let (white, black) = layout(keyboard_rect());
        let c_sharp = black.iter().find(|k| k.key.pitch == "C#4").unwrap();
        assert_eq!(c_sharp.rect.center().x, white[0].rect.right());
        assert!(c_sharp.rect.height() < white[0].rect.height());
    }
}
