use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audio::ToneConfig;
use crate::error::Result;

pub const CONFIG_ENV: &str = "PIANOBAR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "pianobar.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Divides every offset and duration of a melody
    pub playback_speed: f64,
    /// Delay between resolving a song and starting it
    pub autoplay_delay_ms: u64,
    /// Seconds a key pressed by hand sounds for
    pub key_press_duration: f32,
    /// Seconds a key pressed by hand stays highlighted
    pub key_highlight: f32,
    /// Overrides the system locale
    pub locale: Option<String>,
    /// RON file of extra songs, watched for changes
    pub library: Option<PathBuf>,
    pub tone: ToneConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback_speed: 1.25,
            autoplay_delay_ms: 100,
            key_press_duration: 0.8,
            key_highlight: 0.3,
            locale: None,
            library: None,
            tone: ToneConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let ron_string = fs::read_to_string(path)?;
        let settings: Settings = ron::from_str(&ron_string)?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, ron_string)?;
        Ok(())
    }

    /// Defaults when the file is missing; a file that exists but does not
    /// parse is reported and ignored.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// `$PIANOBAR_CONFIG`, else `pianobar.ron` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}
