//! Track catalog.
//!
//! The playback pipeline only needs to resolve a track id to its on-disk
//! facts; that narrow interface is the [`Catalog`] trait. The bundled
//! [`MemoryCatalog`] is populated by the scanner and backs the server; a
//! relational store can slot in behind the same trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

/// A playable library entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub path: PathBuf,
    /// Lowercased file extension without the dot.
    pub suffix: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Source bitrate in kbps, 0 if unknown.
    pub bit_rate: u32,
    /// Duration in whole seconds, 0 if unknown.
    pub duration_secs: u32,
    pub size: u64,
    pub updated_at: SystemTime,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("track not found: {0}")]
    NotFound(String),
}

/// Read access to the track catalog.
pub trait Catalog: Send + Sync {
    fn resolve_track(&self, id: &str) -> Result<Track, CatalogError>;
    fn list_tracks(&self) -> Vec<Track>;
}

/// Stable track id derived from the library path, so rescans of an
/// unchanged library keep their ids.
pub fn track_id(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    hex::encode(&digest[..8])
}

/// In-memory catalog keyed by track id.
#[derive(Default)]
pub struct MemoryCatalog {
    tracks: RwLock<HashMap<String, Track>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a track.
    pub fn upsert(&self, track: Track) {
        let mut tracks = self.tracks.write();
        tracks.insert(track.id.clone(), track);
    }

    pub fn len(&self) -> usize {
        self.tracks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Catalog for MemoryCatalog {
    fn resolve_track(&self, id: &str) -> Result<Track, CatalogError> {
        let tracks = self.tracks.read();
        tracks
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    fn list_tracks(&self) -> Vec<Track> {
        let tracks = self.tracks.read();
        let mut all: Vec<Track> = tracks.values().cloned().collect();
        all.sort_by(|a, b| (&a.artist, &a.album, &a.title).cmp(&(&b.artist, &b.album, &b.title)));
        all
    }
}
