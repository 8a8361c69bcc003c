// ============================================================================
// OVERLAY STORE — persisted per-filter user metadata
// ============================================================================
//
// The catalog never persists anything itself; it talks to an injected
// `OverlayStore`.  Store failures are never fatal: loads degrade to default
// overlays and saves log and carry on, because a broken settings file must
// not take filtering down with it.
// ============================================================================

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::log_warn;

/// User metadata attached to one filter key, independent of the filter
/// itself (it survives descriptor eviction and app upgrades).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOverlay {
    pub hidden: bool,
    pub favourite: bool,
    /// Star rating, `0..=3`.
    pub rating: u8,
}

impl UserOverlay {
    pub const MAX_RATING: u8 = 3;
}

impl Default for UserOverlay {
    fn default() -> Self {
        Self { hidden: false, favourite: false, rating: 0 }
    }
}

/// Injected persistence collaborator.
///
/// `load` is infallible by contract: implementations map every failure to
/// the default overlay (logging as appropriate).
pub trait OverlayStore: Send {
    fn load(&mut self, key: &str) -> UserOverlay;
    fn save(&mut self, key: &str, overlay: UserOverlay) -> Result<(), String>;
}

// ---------------------------------------------------------------------------
//  In-memory store
// ---------------------------------------------------------------------------

/// Session-only store; nothing survives the process.  The default for tests
/// and for configurations without a settings directory.
#[derive(Debug, Default)]
pub struct MemoryOverlayStore {
    map: HashMap<String, UserOverlay>,
}

impl MemoryOverlayStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OverlayStore for MemoryOverlayStore {
    fn load(&mut self, key: &str) -> UserOverlay {
        self.map.get(key).copied().unwrap_or_default()
    }

    fn save(&mut self, key: &str, overlay: UserOverlay) -> Result<(), String> {
        self.map.insert(key.to_string(), overlay);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
//  File-backed store
// ---------------------------------------------------------------------------

/// Whole-map bincode file, loaded once on first access and written through
/// on every save.  Overlay records are tiny, so rewriting the file beats
/// bookkeeping for partial updates.
pub struct FileOverlayStore {
    path: PathBuf,
    map: HashMap<String, UserOverlay>,
    loaded: bool,
}

impl FileOverlayStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, map: HashMap::new(), loaded: false }
    }

    fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        match File::open(&self.path) {
            Ok(file) => match bincode::deserialize_from(BufReader::new(file)) {
                Ok(map) => self.map = map,
                Err(e) => {
                    log_warn!("overlay store {:?} unreadable, using defaults: {}", self.path, e);
                }
            },
            // A missing file is the normal first-run state.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                log_warn!("overlay store {:?} unavailable, using defaults: {}", self.path, e);
            }
        }
    }

    fn write_through(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create {:?}: {}", parent, e))?;
        }
        let file = File::create(&self.path).map_err(|e| format!("create {:?}: {}", self.path, e))?;
        bincode::serialize_into(BufWriter::new(file), &self.map)
            .map_err(|e| format!("write {:?}: {}", self.path, e))
    }
}

impl OverlayStore for FileOverlayStore {
    fn load(&mut self, key: &str) -> UserOverlay {
        self.ensure_loaded();
        self.map.get(key).copied().unwrap_or_default()
    }

    fn save(&mut self, key: &str, overlay: UserOverlay) -> Result<(), String> {
        self.ensure_loaded();
        self.map.insert(key.to_string(), overlay);
        self.write_through()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryOverlayStore::new();
        assert_eq!(store.load("Sepia"), UserOverlay::default());
        let overlay = UserOverlay { hidden: true, favourite: true, rating: 2 };
        store.save("Sepia", overlay).unwrap();
        assert_eq!(store.load("Sepia"), overlay);
    }

    #[test]
    fn file_store_round_trips_across_instances() {
        let dir = std::env::temp_dir().join("photofe-store-test");
        let path = dir.join("overlays.bin");
        let _ = fs::remove_file(&path);

        let overlay = UserOverlay { hidden: false, favourite: true, rating: 3 };
        {
            let mut store = FileOverlayStore::new(path.clone());
            store.save("Vignette", overlay).unwrap();
        }
        let mut reopened = FileOverlayStore::new(path.clone());
        assert_eq!(reopened.load("Vignette"), overlay);
        assert_eq!(reopened.load("NoSuchKey"), UserOverlay::default());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let mut store = FileOverlayStore::new(PathBuf::from("/nonexistent/dir/overlays.bin"));
        assert_eq!(store.load("anything"), UserOverlay::default());
    }
}
