//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires a default config, an in-memory
//! catalog, and the full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tonearm::catalog::{track_id, MemoryCatalog, Track};
use tonearm::config::Config;
use tonearm::server::{create_router, AppContext};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory catalog and a temp library directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub catalog: Arc<MemoryCatalog>,
    pub dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The library folder
    /// is redirected into a fresh temp directory.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().unwrap();
        config.library.music_folder = dir.path().to_path_buf();

        let catalog = Arc::new(MemoryCatalog::new());
        let ctx = AppContext::new(Arc::new(config), catalog.clone());
        Self { ctx, catalog, dir }
    }

    /// Start an Axum server on a random port and return the harness
    /// together with the bound socket address.
    pub async fn with_server(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (harness, addr)
    }

    /// Write `data` into the library folder and register it in the catalog.
    pub fn add_track(&self, file_name: &str, data: &[u8], bit_rate: u32) -> Track {
        let path = self.dir.path().join(file_name);
        fs::write(&path, data).unwrap();
        let suffix = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let updated_at = fs::metadata(&path).unwrap().modified().unwrap();

        let track = Track {
            id: track_id(&path),
            suffix,
            title: file_name.to_string(),
            artist: "Test Artist".to_string(),
            album: "Test Album".to_string(),
            bit_rate,
            duration_secs: 180,
            size: data.len() as u64,
            updated_at,
            path,
        };
        self.catalog.upsert(track.clone());
        track
    }
}

/// Write an executable shell script, for faking external tools.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
