//! Media library scanner.
//!
//! Walks the configured music folder, batches the discovered audio files
//! into probe invocations, and feeds the resulting metadata into the
//! catalog.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::catalog::{track_id, MemoryCatalog, Track};
use crate::config::Config;
use crate::mime;

/// Files per probe invocation. One subprocess covers a whole batch; this
/// keeps argument lists well under platform limits on large libraries.
const PROBE_BATCH_SIZE: usize = 64;

/// Summary of one scan pass.
#[derive(Debug, Default, Clone)]
pub struct ScanSummary {
    pub files_found: usize,
    pub tracks_added: usize,
    pub files_skipped: usize,
}

/// Scanner for discovering and importing audio files.
pub struct Scanner {
    config: Arc<Config>,
    catalog: Arc<MemoryCatalog>,
}

impl Scanner {
    pub fn new(config: Arc<Config>, catalog: Arc<MemoryCatalog>) -> Self {
        Self { config, catalog }
    }

    /// Scan the configured music folder and import everything the probe
    /// recognizes. Batches that fail wholesale are logged and skipped;
    /// per-file drops are already handled inside the probe.
    pub async fn scan(&self) -> Result<ScanSummary> {
        let root = &self.config.library.music_folder;
        info!("Scanning music folder: {:?}", root);

        let files = load_audio_files(root);
        let mut summary = ScanSummary {
            files_found: files.len(),
            ..ScanSummary::default()
        };

        for batch in files.chunks(PROBE_BATCH_SIZE) {
            let metadata =
                match tonearm_av::extract_all_metadata(&self.config.transcoding.probe_command, batch)
                    .await
                {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        warn!(error = %e, "probe batch failed, skipping {} files", batch.len());
                        summary.files_skipped += batch.len();
                        continue;
                    }
                };

            for path in batch {
                match metadata.get(path) {
                    Some(md) => {
                        self.catalog.upsert(track_from_metadata(md));
                        summary.tracks_added += 1;
                    }
                    None => summary.files_skipped += 1,
                }
            }
        }

        info!(
            "Scan complete: {} files found, {} tracks added, {} skipped",
            summary.files_found, summary.tracks_added, summary.files_skipped
        );
        Ok(summary)
    }
}

/// Enumerate files under `root` whose extension maps to an audio MIME
/// type. Directories and non-audio entries are excluded.
pub fn load_audio_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| mime::audio_mime_type(&ext.to_ascii_lowercase()).is_some())
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

fn track_from_metadata(md: &tonearm_av::Metadata) -> Track {
    let path = md.file_path().to_path_buf();
    let title = if md.title().is_empty() {
        // Untagged files still deserve a display name.
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        md.title().to_string()
    };

    Track {
        id: track_id(&path),
        suffix: md.suffix().to_string(),
        title,
        artist: md.artist().to_string(),
        album: md.album().to_string(),
        bit_rate: md.bit_rate(),
        duration_secs: md.duration(),
        size: md.size(),
        updated_at: md.modification_time(),
        path,
    }
}
