use std::sync::Arc;

use arc_swap::ArcSwap;
use pianobar::audio::AudioOutput;
use pianobar::i18n::{self, Localizer};
use pianobar::{PianoApp, Settings, SongLibrary, spawn_engine};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pianobar=info")),
        )
        .init();

    let settings = Settings::load_or_default(&Settings::default_path());

    let locale = settings.locale.clone().unwrap_or_else(i18n::system_locale);
    let localizer = Localizer::new(&locale)?;
    tracing::info!("Using locale {}", localizer.locale());

    let library = Arc::new(ArcSwap::from_pointee(SongLibrary::builtin()));
    let audio = Arc::new(AudioOutput::new(settings.tone.clone()));
    let engine = spawn_engine(settings, library, audio, localizer.clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 760.0])
            .with_title(localizer.t("appTitle")),
        ..Default::default()
    };

    eframe::run_native(
        "PianoBar",
        options,
        Box::new(|_cc| Ok(Box::new(PianoApp::new(engine, localizer)))),
    )?;

    Ok(())
}
