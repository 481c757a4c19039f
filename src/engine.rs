use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use crossbeam::channel::{Receiver, Sender};
use notify::RecommendedWatcher;
use tracing::{debug, error, info, warn};

use crate::audio::AudioSink;
use crate::error::Result;
use crate::events::{PlaybackEvent, SessionEvent};
use crate::i18n::Localizer;
use crate::input::KeyboardInput;
use crate::library::{self, SongLibrary};
use crate::pitch;
use crate::timing::{Melody, PlaybackScheduler};
use crate::Settings;

const IDLE_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub enum EngineCommand {
    RequestSong(String),
    Play,
    Stop,
    PressKey(char),
    PlayPitch(String),
    SetTextFocus(bool),
    ActivateAudio,
    LoadLibrary(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineUpdate {
    SongLoaded { melody: Melody },
    PlaybackState { playing: bool },
    /// Highlight `pitch` for `duration` seconds
    NoteOn { pitch: String, duration: f64 },
    ClearKeys,
    Error { message: String },
}

pub struct EngineHandle {
    pub command_tx: Sender<EngineCommand>,
    pub update_rx: Receiver<EngineUpdate>,
}

pub fn spawn_engine(
    settings: Settings,
    library: Arc<ArcSwap<SongLibrary>>,
    sink: Arc<dyn AudioSink>,
    localizer: Localizer,
) -> EngineHandle {
    let (command_tx, command_rx) = crossbeam::channel::unbounded();
    let (update_tx, update_rx) = crossbeam::channel::unbounded();

    std::thread::spawn(move || {
        engine_thread(settings, library, sink, localizer, command_rx, update_tx);
    });

    EngineHandle {
        command_tx,
        update_rx,
    }
}

struct EngineState {
    settings: Settings,
    library: Arc<ArcSwap<SongLibrary>>,
    sink: Arc<dyn AudioSink>,
    localizer: Localizer,
    scheduler: PlaybackScheduler,
    input: KeyboardInput,
    current_song: Option<Melody>,
    autoplay_at: Option<Instant>,
    audio_activated: bool,
    library_watcher: Option<RecommendedWatcher>,
    update_tx: Sender<EngineUpdate>,
}

fn engine_thread(
    settings: Settings,
    library: Arc<ArcSwap<SongLibrary>>,
    sink: Arc<dyn AudioSink>,
    localizer: Localizer,
    command_rx: Receiver<EngineCommand>,
    update_tx: Sender<EngineUpdate>,
) {
    let (session_tx, session_rx) = crossbeam::channel::unbounded();
    let library_path = settings.library.clone();

    let mut state = EngineState {
        scheduler: PlaybackScheduler::new(sink.clone(), session_tx),
        settings,
        library,
        sink,
        localizer,
        input: KeyboardInput::new(),
        current_song: None,
        autoplay_at: None,
        audio_activated: false,
        library_watcher: None,
        update_tx,
    };

    if let Some(path) = library_path {
        state.load_library(path);
    }

    loop {
        let timeout = state
            .autoplay_at
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_WAIT);

        crossbeam::select! {
            recv(command_rx) -> msg => match msg {
                Ok(command) => state.handle_command(command),
                Err(_) => break,
            },
            recv(session_rx) -> msg => {
                if let Ok(event) = msg {
                    state.handle_session_event(event);
                }
            },
            default(timeout) => {},
        }

        if state.autoplay_at.is_some_and(|at| Instant::now() >= at) {
            state.autoplay_at = None;
            state.play();
        }
    }

    state.scheduler.cancel();
    info!("Engine stopped");
}

impl EngineState {
    fn send(&self, update: EngineUpdate) {
        let _ = self.update_tx.send(update);
    }

    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::RequestSong(query) => self.request_song(&query),
            EngineCommand::Play => self.play(),
            EngineCommand::Stop => self.stop(),
            EngineCommand::PressKey(key) => {
                if let Some(pitch) = self.input.pitch_for_key(key) {
                    self.play_pitch(pitch);
                }
            }
            EngineCommand::PlayPitch(pitch) => self.play_pitch(&pitch),
            EngineCommand::SetTextFocus(focused) => self.input.set_text_focus(focused),
            EngineCommand::ActivateAudio => self.activate_audio(),
            EngineCommand::LoadLibrary(path) => self.load_library(path),
        }
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        let current = self.scheduler.current().map(|h| h.id());
        if current != Some(event.session) {
            debug!("Dropping event from stale session {}", event.session);
            return;
        }

        match event.event {
            PlaybackEvent::Tone { pitch, duration } => {
                self.send(EngineUpdate::NoteOn { pitch, duration });
            }
            PlaybackEvent::Complete => {
                self.send(EngineUpdate::PlaybackState { playing: false });
                self.send(EngineUpdate::ClearKeys);
            }
        }
    }

    fn resolve(&self, query: &str) -> Result<Melody> {
        let melody = self.library.load().resolve(query);
        melody.validate()?;
        Ok(melody)
    }

    fn request_song(&mut self, query: &str) {
        if query.trim().is_empty() {
            return;
        }

        self.stop();
        self.current_song = None;

        match self.resolve(query) {
            Ok(melody) => {
                info!("Resolved \"{}\" to \"{}\"", query, melody.title);
                self.current_song = Some(melody.clone());
                self.autoplay_at =
                    Some(Instant::now() + Duration::from_millis(self.settings.autoplay_delay_ms));
                self.send(EngineUpdate::SongLoaded { melody });
            }
            Err(e) => {
                error!("Failed to resolve \"{}\": {}", query, e);
                self.send(EngineUpdate::Error {
                    message: self.localizer.t("parseErrorMessage").to_string(),
                });
            }
        }
    }

    fn play(&mut self) {
        let Some(song) = self.current_song.as_ref() else {
            return;
        };

        match self.scheduler.schedule(song, self.settings.playback_speed) {
            Ok(_) => self.send(EngineUpdate::PlaybackState { playing: true }),
            Err(e) => {
                error!("Failed to start playback of \"{}\": {}", song.title, e);
                self.send(EngineUpdate::Error {
                    message: self.localizer.t("playbackErrorMessage").to_string(),
                });
            }
        }
    }

    fn stop(&mut self) {
        self.autoplay_at = None;
        self.scheduler.cancel();
        self.send(EngineUpdate::PlaybackState { playing: false });
        self.send(EngineUpdate::ClearKeys);
    }

    fn play_pitch(&self, pitch: &str) {
        let Some(frequency) = pitch::frequency(pitch) else {
            return;
        };
        self.sink
            .trigger(frequency, self.settings.key_press_duration);
        self.send(EngineUpdate::NoteOn {
            pitch: pitch.to_string(),
            duration: self.settings.key_highlight as f64,
        });
    }

    fn activate_audio(&mut self) {
        if self.audio_activated {
            return;
        }
        self.audio_activated = true;
        if let Err(e) = self.sink.activate() {
            warn!("Audio unavailable, continuing silently: {}", e);
        }
    }

    fn load_library(&mut self, path: PathBuf) {
        match SongLibrary::load(&path) {
            Ok(loaded) => {
                info!("Loaded song library from {}", path.display());
                self.library.store(Arc::new(loaded));
            }
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                self.send(EngineUpdate::Error {
                    message: self.localizer.t("libraryErrorMessage").to_string(),
                });
                return;
            }
        }

        match library::watch(&path, self.library.clone()) {
            Ok(watcher) => self.library_watcher = Some(watcher),
            Err(e) => warn!("Not watching {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::NoteEvent;
    use crossbeam::channel::RecvTimeoutError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        tones: Mutex<Vec<(f32, f32)>>,
        activations: Mutex<usize>,
    }

    impl AudioSink for RecordingSink {
        fn trigger(&self, frequency: f32, duration: f32) {
            self.tones.lock().push((frequency, duration));
        }

        fn activate(&self) -> Result<()> {
            *self.activations.lock() += 1;
            Ok(())
        }
    }

    fn engine_with(library: SongLibrary) -> (EngineHandle, Arc<RecordingSink>) {
        engine_with_settings(
            library,
            Settings {
                playback_speed: 4.0,
                autoplay_delay_ms: 10,
                ..Settings::default()
            },
        )
    }

    fn engine_with_settings(
        library: SongLibrary,
        settings: Settings,
    ) -> (EngineHandle, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let handle = spawn_engine(
            settings,
            Arc::new(ArcSwap::from_pointee(library)),
            sink.clone(),
            Localizer::new("en-US").unwrap(),
        );
        (handle, sink)
    }

    fn next(handle: &EngineHandle) -> EngineUpdate {
        handle
            .update_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("engine update")
    }

    fn assert_quiet(handle: &EngineHandle) {
        assert_eq!(
            handle.update_rx.recv_timeout(Duration::from_millis(200)),
            Err(RecvTimeoutError::Timeout)
        );
    }

    #[test]
    fn requested_song_autoplays() {
        let (engine, _sink) = engine_with(SongLibrary::builtin());
        engine
            .command_tx
            .send(EngineCommand::RequestSong("Happy birthday".into()))
            .unwrap();

        // stop issued before resolving
        assert_eq!(next(&engine), EngineUpdate::PlaybackState { playing: false });
        assert_eq!(next(&engine), EngineUpdate::ClearKeys);

        match next(&engine) {
            EngineUpdate::SongLoaded { melody } => assert_eq!(melody.notes.len(), 12),
            other => panic!("expected SongLoaded, got {:?}", other),
        }
        assert_eq!(next(&engine), EngineUpdate::PlaybackState { playing: true });
        assert_eq!(
            next(&engine),
            EngineUpdate::NoteOn {
                pitch: "C4".into(),
                duration: 0.125
            }
        );

        engine.command_tx.send(EngineCommand::Stop).unwrap();
        let mut updates = Vec::new();
        while let Ok(update) = engine.update_rx.recv_timeout(Duration::from_millis(300)) {
            updates.push(update);
        }
        let stop_at = updates
            .iter()
            .position(|u| *u == EngineUpdate::PlaybackState { playing: false })
            .expect("stopped");
        assert_eq!(updates[stop_at + 1], EngineUpdate::ClearKeys);
        assert_eq!(updates.len(), stop_at + 2, "events after stop: {:?}", updates);
    }

    #[test]
    fn blank_requests_are_ignored() {
        let (engine, _sink) = engine_with(SongLibrary::builtin());
        engine
            .command_tx
            .send(EngineCommand::RequestSong("   ".into()))
            .unwrap();
        assert_quiet(&engine);
    }

    #[test]
    fn invalid_songs_report_a_localized_error() {
        let mut library = SongLibrary::builtin();
        library.insert(
            "Broken",
            Melody::new("Broken", vec![NoteEvent::new("C4", -2.0, 1.0)]),
        );
        let (engine, sink) = engine_with(library);
        engine
            .command_tx
            .send(EngineCommand::RequestSong("Broken".into()))
            .unwrap();

        assert_eq!(next(&engine), EngineUpdate::PlaybackState { playing: false });
        assert_eq!(next(&engine), EngineUpdate::ClearKeys);
        assert_eq!(
            next(&engine),
            EngineUpdate::Error {
                message: "Sorry, I had trouble parsing that song. Please try a different request."
                    .into()
            }
        );
        assert_quiet(&engine);

        engine.command_tx.send(EngineCommand::Play).unwrap();
        assert_quiet(&engine);
        assert!(sink.tones.lock().is_empty());
    }

    #[test]
    fn completion_clears_playback_state() {
        let mut library = SongLibrary::builtin();
        library.insert("Silence", Melody::new("Silence", vec![]));
        let (engine, _sink) = engine_with(library);
        engine
            .command_tx
            .send(EngineCommand::RequestSong("Silence".into()))
            .unwrap();

        let updates: Vec<EngineUpdate> = (0..6).map(|_| next(&engine)).collect();
        assert!(matches!(updates[2], EngineUpdate::SongLoaded { .. }));
        assert_eq!(updates[3], EngineUpdate::PlaybackState { playing: true });
        assert_eq!(updates[4], EngineUpdate::PlaybackState { playing: false });
        assert_eq!(updates[5], EngineUpdate::ClearKeys);
    }

    #[test]
    fn keys_play_unless_typing() {
        let (engine, sink) = engine_with(SongLibrary::builtin());

        engine.command_tx.send(EngineCommand::SetTextFocus(true)).unwrap();
        engine.command_tx.send(EngineCommand::PressKey('a')).unwrap();
        assert_quiet(&engine);

        engine.command_tx.send(EngineCommand::SetTextFocus(false)).unwrap();
        engine.command_tx.send(EngineCommand::PressKey('z')).unwrap();
        engine.command_tx.send(EngineCommand::PressKey('h')).unwrap();
        assert_eq!(
            next(&engine),
            EngineUpdate::NoteOn {
                pitch: "A4".into(),
                duration: 0.3f32 as f64
            }
        );
        assert_eq!(*sink.tones.lock(), vec![(440.0, 0.8)]);
    }

    #[test]
    fn pointer_presses_ignore_unknown_pitches() {
        let (engine, sink) = engine_with(SongLibrary::builtin());
        engine
            .command_tx
            .send(EngineCommand::PlayPitch("B9".into()))
            .unwrap();
        assert_quiet(&engine);

        engine
            .command_tx
            .send(EngineCommand::PlayPitch("G5".into()))
            .unwrap();
        assert!(matches!(next(&engine), EngineUpdate::NoteOn { .. }));
        assert_eq!(sink.tones.lock().len(), 1);
    }

    #[test]
    fn activates_audio_once() {
        let (engine, sink) = engine_with(SongLibrary::builtin());
        engine.command_tx.send(EngineCommand::ActivateAudio).unwrap();
        engine.command_tx.send(EngineCommand::ActivateAudio).unwrap();
        engine.command_tx.send(EngineCommand::PlayPitch("C4".into())).unwrap();
        next(&engine);
        assert_eq!(*sink.activations.lock(), 1);
    }

    #[test]
    fn missing_library_file_reports_error() {
        let (engine, _sink) = engine_with(SongLibrary::builtin());
        engine
            .command_tx
            .send(EngineCommand::LoadLibrary(PathBuf::from("/nonexistent/songs.ron")))
            .unwrap();
        assert_eq!(
            next(&engine),
            EngineUpdate::Error {
                message: "The song library could not be loaded.".into()
            }
        );
    }

    #[test]
    fn loaded_library_songs_can_be_requested() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{ "Jingle bells": (title: "Jingle Bells", notes: [(pitch: "E4", time: 0.0, duration: 0.5)]) }"#,
        )
        .unwrap();

        let (engine, _sink) = engine_with(SongLibrary::builtin());
        engine
            .command_tx
            .send(EngineCommand::LoadLibrary(file.path().to_path_buf()))
            .unwrap();
        engine
            .command_tx
            .send(EngineCommand::RequestSong("Jingle bells".into()))
            .unwrap();

        assert_eq!(next(&engine), EngineUpdate::PlaybackState { playing: false });
        assert_eq!(next(&engine), EngineUpdate::ClearKeys);
        match next(&engine) {
            EngineUpdate::SongLoaded { melody } => {
                assert_eq!(melody.title, "Jingle Bells");
                assert_eq!(melody.notes.len(), 1);
            }
            other => panic!("expected SongLoaded, got {:?}", other),
        }
    }

    #[test]
    fn replaced_song_stops_reporting_notes() {
        let mut library = SongLibrary::builtin();
        library.insert(
            "High",
            Melody::new(
                "High",
                vec![NoteEvent::new("A4", 0.0, 0.4), NoteEvent::new("B4", 0.4, 0.4)],
            ),
        );
        let (engine, _sink) = engine_with(library);

        engine
            .command_tx
            .send(EngineCommand::RequestSong("Happy birthday".into()))
            .unwrap();
        let opening = EngineUpdate::NoteOn {
            pitch: "C4".into(),
            duration: 0.125,
        };
        while next(&engine) != opening {}

        engine
            .command_tx
            .send(EngineCommand::RequestSong("High".into()))
            .unwrap();

        // longer than any gap in the first song, so its notes would show up
        let mut updates = Vec::new();
        while let Ok(update) = engine.update_rx.recv_timeout(Duration::from_millis(900)) {
            updates.push(update);
        }

        let started = updates
            .iter()
            .position(|u| *u == EngineUpdate::PlaybackState { playing: true })
            .expect("second song started");
        let pitches: Vec<&str> = updates[started..]
            .iter()
            .filter_map(|u| match u {
                EngineUpdate::NoteOn { pitch, .. } => Some(pitch.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(pitches, ["A4", "B4"]);
        assert_eq!(
            &updates[updates.len() - 2..],
            [
                EngineUpdate::PlaybackState { playing: false },
                EngineUpdate::ClearKeys
            ]
        );
    }

    #[test]
    fn playback_failures_are_localized() {
        let (engine, sink) = engine_with_settings(
            SongLibrary::builtin(),
            Settings {
                playback_speed: 0.0,
                autoplay_delay_ms: 10,
                ..Settings::default()
            },
        );
        engine
            .command_tx
            .send(EngineCommand::RequestSong("Happy birthday".into()))
            .unwrap();

        let updates: Vec<EngineUpdate> = (0..4).map(|_| next(&engine)).collect();
        assert!(matches!(updates[2], EngineUpdate::SongLoaded { .. }));
        assert_eq!(
            updates[3],
            EngineUpdate::Error {
                message: "Sorry, that song could not be played.".into()
            }
        );
        assert_quiet(&engine);
        assert!(sink.tones.lock().is_empty());
    }
}
