mod keyboard;

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use eframe::egui;
use keyboard::PianoKeyboard;

use crate::i18n::Localizer;
use crate::library::SUGGESTIONS;
use crate::{EngineCommand, EngineHandle, EngineUpdate, Melody};

const CONTENT_WIDTH: f32 = 736.0;

pub struct PianoApp {
    engine: EngineHandle,
    localizer: Localizer,
    song_input: String,
    current_song: Option<Melody>,
    playing: bool,
    processing: bool,
    error_message: Option<String>,
    /// Pitch -> end of its highlight
    active_keys: HashMap<String, Instant>,
    text_focus: bool,
    audio_activated: bool,
}

impl PianoApp {
    pub fn new(engine: EngineHandle, localizer: Localizer) -> Self {
        Self {
            engine,
            localizer,
            song_input: String::new(),
            current_song: None,
            playing: false,
            processing: false,
            error_message: None,
            active_keys: HashMap::new(),
            text_focus: false,
            audio_activated: false,
        }
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.engine.command_tx.send(command);
    }

    fn process_engine_updates(&mut self) {
        while let Ok(update) = self.engine.update_rx.try_recv() {
            match update {
                EngineUpdate::SongLoaded { melody } => {
                    self.current_song = Some(melody);
                    self.processing = false;
                    self.error_message = None;
                    self.song_input.clear();
                }
                EngineUpdate::PlaybackState { playing } => {
                    self.playing = playing;
                }
                EngineUpdate::NoteOn { pitch, duration } => {
                    let until = Instant::now() + Duration::from_secs_f64(duration.max(0.0));
                    let entry = self.active_keys.entry(pitch).or_insert(until);
                    *entry = (*entry).max(until);
                }
                EngineUpdate::ClearKeys => {
                    self.active_keys.clear();
                }
                EngineUpdate::Error { message } => {
                    self.processing = false;
                    self.error_message = Some(message);
                }
            }
        }

        let now = Instant::now();
        self.active_keys.retain(|_, until| *until > now);
    }

    fn request_song(&mut self, query: String) {
        if query.trim().is_empty() {
            return;
        }
        self.processing = true;
        self.current_song = None;
        self.send(EngineCommand::RequestSong(query));
    }

    /// First click or key press anywhere opens the audio device.
    fn handle_first_interaction(&mut self, ctx: &egui::Context) {
        if self.audio_activated {
            return;
        }
        let interacted = ctx.input(|i| {
            i.pointer.any_pressed()
                || i.events
                    .iter()
                    .any(|e| matches!(e, egui::Event::Key { pressed: true, .. }))
        });
        if interacted {
            self.audio_activated = true;
            self.send(EngineCommand::ActivateAudio);
        }
    }

    fn handle_keys(&self, ctx: &egui::Context) {
        let keys: Vec<char> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        ..
                    } => key_char(*key),
                    _ => None,
                })
                .collect()
        });
        for key in keys {
            self.send(EngineCommand::PressKey(key));
        }
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Song Library...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_title("Open Song Library")
                        .add_filter("RON", &["ron"])
                        .pick_file()
                    {
                        self.send(EngineCommand::LoadLibrary(path));
                    }
                    ui.close();
                }

                ui.separator();

                if ui.button("Quit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn song_form(&mut self, ui: &mut egui::Ui) {
        let mut submit = false;

        ui.horizontal(|ui| {
            let input = ui.add_enabled(
                !self.processing,
                egui::TextEdit::singleline(&mut self.song_input)
                    .hint_text(self.localizer.t("songInputPlaceholder"))
                    .desired_width(CONTENT_WIDTH - 160.0),
            );

            let focused = input.has_focus();
            if focused != self.text_focus {
                self.text_focus = focused;
                self.send(EngineCommand::SetTextFocus(focused));
            }
            if input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }

            let label = if self.processing {
                self.localizer.t("processingButton")
            } else {
                self.localizer.t("parseSongButton")
            };
            let enabled = !self.processing && !self.song_input.trim().is_empty();
            if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                submit = true;
            }
        });

        if submit {
            self.request_song(self.song_input.clone());
        }
    }

    fn song_controls(&self, ui: &mut egui::Ui) {
        let Some(song) = &self.current_song else {
            return;
        };

        ui.separator();
        ui.horizontal(|ui| {
            let prefix = if self.playing {
                self.localizer.t("playingPrefix")
            } else {
                self.localizer.t("readyToPlayPrefix")
            };
            ui.heading(format!("♪ {}{}", prefix, song.title));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if self.playing {
                    if ui
                        .button(format!("⏹ {}", self.localizer.t("stopButton")))
                        .clicked()
                    {
                        self.send(EngineCommand::Stop);
                    }
                } else if ui
                    .button(format!("▶ {}", self.localizer.t("playButton")))
                    .clicked()
                {
                    self.send(EngineCommand::Play);
                }
            });
        });
    }

    fn suggestions(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading(self.localizer.t("suggestionsHeading"));
        });
        ui.horizontal_wrapped(|ui| {
            for (message_id, query) in SUGGESTIONS {
                let label = self.localizer.t(message_id).to_string();
                if ui
                    .add_enabled(!self.processing, egui::Button::new(label))
                    .clicked()
                {
                    self.song_input = query.to_string();
                    self.request_song(query.to_string());
                }
            }
        });
    }
}

/// Single-character keys as the character they type.
fn key_char(key: egui::Key) -> Option<char> {
    let mut chars = key.symbol_or_name().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

impl eframe::App for PianoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_engine_updates();
        self.handle_first_interaction(ctx);
        self.handle_keys(ctx);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ui);
        });

        if let Some(ref error) = self.error_message {
            egui::TopBottomPanel::top("error").show(ctx, |ui| {
                ui.colored_label(egui::Color32::RED, error);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.heading(
                    egui::RichText::new(self.localizer.t("appTitle"))
                        .size(40.0)
                        .strong()
                        .color(egui::Color32::from_rgb(37, 99, 235)),
                );
                ui.label(self.localizer.t("appSubtitle"));
                ui.add_space(24.0);
            });

            ui.vertical_centered(|ui| {
                ui.set_max_width(CONTENT_WIDTH);

                egui::Frame::group(ui.style()).show(ui, |ui| {
                    self.song_form(ui);
                    self.song_controls(ui);
                });

                ui.add_space(24.0);

                let active: HashSet<String> = self.active_keys.keys().cloned().collect();
                if let Some(pitch) = PianoKeyboard::new(&active).show(ui) {
                    self.send(EngineCommand::PlayPitch(pitch.to_string()));
                }

                ui.add_space(24.0);
                self.suggestions(ui);
            });
        });

        ctx.request_repaint();
    }
}
