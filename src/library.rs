use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info};

use crate::error::Result;
use crate::timing::{Melody, NoteEvent};

/// Suggestion buttons: (message id, query).
pub const SUGGESTIONS: [(&str, &str); 8] = [
    ("happyBirthday", "Happy birthday"),
    ("twinkleTwinkle", "Twinkle twinkle little star"),
    ("maryHadLamb", "Mary had a little lamb"),
    ("jingleBells", "Jingle bells"),
    ("sadMelody", "Sad melody"),
    ("amazingGrace", "Amazing grace"),
    ("silentNight", "Silent night"),
    ("auldLangSyne", "Auld lang syne"),
];

fn melody(title: &str, notes: &[(&str, f64, f64)]) -> Melody {
    Melody::new(
        title,
        notes
            .iter()
            .map(|&(pitch, time, duration)| NoteEvent::new(pitch, time, duration))
            .collect(),
    )
}

/// Played for any query the library does not know.
pub fn fallback(title: &str) -> Melody {
    melody(
        title,
        &[
            ("C4", 0.0, 0.5),
            ("D4", 0.5, 0.5),
            ("E4", 1.0, 0.5),
            ("F4", 1.5, 0.5),
            ("G4", 2.0, 1.0),
        ],
    )
}

/// Named melodies, keyed by the exact query that selects them.
#[derive(Debug, Clone, Default)]
pub struct SongLibrary {
    songs: BTreeMap<String, Melody>,
}

impl SongLibrary {
    pub fn builtin() -> Self {
        let mut songs = BTreeMap::new();
        songs.insert(
            "Happy birthday".to_string(),
            melody(
                "Happy Birthday",
                &[
                    ("C4", 0.0, 0.5),
                    ("C4", 0.5, 0.5),
                    ("D4", 1.0, 1.0),
                    ("C4", 2.0, 1.0),
                    ("F4", 3.0, 1.0),
                    ("E4", 4.0, 2.0),
                    ("C4", 6.5, 0.5),
                    ("C4", 7.0, 0.5),
                    ("D4", 7.5, 1.0),
                    ("C4", 8.5, 1.0),
                    ("G4", 9.5, 1.0),
                    ("F4", 10.5, 2.0),
                ],
            ),
        );
        songs.insert(
            "Twinkle twinkle little star".to_string(),
            melody(
                "Twinkle Twinkle Little Star",
                &[
                    ("C4", 0.0, 0.5),
                    ("C4", 0.5, 0.5),
                    ("G4", 1.0, 0.5),
                    ("G4", 1.5, 0.5),
                    ("A4", 2.0, 0.5),
                    ("A4", 2.5, 0.5),
                    ("G4", 3.0, 1.0),
                    ("F4", 4.5, 0.5),
                    ("F4", 5.0, 0.5),
                    ("E4", 5.5, 0.5),
                    ("E4", 6.0, 0.5),
                    ("D4", 6.5, 0.5),
                    ("D4", 7.0, 0.5),
                    ("C4", 7.5, 1.0),
                ],
            ),
        );
        songs.insert(
            "Mary had a little lamb".to_string(),
            melody(
                "Mary Had a Little Lamb",
                &[
                    ("E4", 0.0, 0.5),
                    ("D4", 0.5, 0.5),
                    ("C4", 1.0, 0.5),
                    ("D4", 1.5, 0.5),
                    ("E4", 2.0, 0.5),
                    ("E4", 2.5, 0.5),
                    ("E4", 3.0, 1.0),
                    ("D4", 4.5, 0.5),
                    ("D4", 5.0, 0.5),
                    ("D4", 5.5, 1.0),
                    ("E4", 7.0, 0.5),
                    ("G4", 7.5, 0.5),
                    ("G4", 8.0, 1.0),
                ],
            ),
        );
        Self { songs }
    }

    /// Built-in songs overlaid with the ones in a RON file mapping query to
    /// melody.
    pub fn load(path: &Path) -> Result<Self> {
        let ron_string = fs::read_to_string(path)?;
        let user: BTreeMap<String, Melody> = ron::from_str(&ron_string)?;
        debug!("{} songs defined in {}", user.len(), path.display());

        let mut library = Self::builtin();
        library.songs.extend(user);
        Ok(library)
    }

    pub fn insert(&mut self, query: impl Into<String>, melody: Melody) {
        self.songs.insert(query.into(), melody);
    }

    pub fn get(&self, query: &str) -> Option<&Melody> {
        self.songs.get(query)
    }

    /// Exact-match lookup. Unknown queries get the fallback melody titled
    /// with the query itself.
    pub fn resolve(&self, query: &str) -> Melody {
        self.get(query).cloned().unwrap_or_else(|| fallback(query))
    }

}

/// Reloads `path` into `library` whenever the file changes. A file that fails
/// to load leaves the current library in place. Dropping the watcher stops it.
pub fn watch(path: &Path, library: Arc<ArcSwap<SongLibrary>>) -> Result<RecommendedWatcher> {
    let watched: PathBuf = path.to_path_buf();

    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if event.kind.is_modify() {
                    match SongLibrary::load(&watched) {
                        Ok(reloaded) => {
                            info!("Song library reloaded from {}", watched.display());
                            library.store(Arc::new(reloaded));
                        }
                        Err(e) => error!("Failed to reload {}: {}", watched.display(), e),
                    }
                }
            }
            Err(e) => error!("Watch error: {}", e),
        },
        Config::default(),
    )?;

    watcher.watch(path, RecursiveMode::NonRecursive)?;
    info!("Watching {} for song changes", path.display());
    Ok(watcher)
}
