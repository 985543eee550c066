//! Raw (direct) stream handle.

use std::path::PathBuf;
use std::time::SystemTime;

use tokio::fs::File;

use crate::catalog::Track;
use crate::mime;

/// Direct access to the original media file on disk. Seekable, so the HTTP
/// layer can serve range requests against it. No subprocess involved; the
/// file handle's lifetime is bound to the response.
#[derive(Debug, Clone)]
pub struct RawStream {
    path: PathBuf,
    content_type: &'static str,
    name: String,
    duration_secs: u32,
    size: u64,
    mod_time: SystemTime,
}

impl RawStream {
    pub fn for_track(track: &Track) -> Self {
        let name = track
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| track.id.clone());
        Self {
            path: track.path.clone(),
            content_type: mime::content_type_for(&track.suffix),
            name,
            duration_secs: track.duration_secs,
            size: track.size,
            mod_time: track.updated_at,
        }
    }

    /// Open the backing file for reading/seeking.
    pub async fn open(&self) -> std::io::Result<File> {
        File::open(&self.path).await
    }

    pub fn content_type(&self) -> &str {
        self.content_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mod_time(&self) -> SystemTime {
        self.mod_time
    }
}
