use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub transcoding: TranscodingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    4533
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root folder scanned for audio files.
    #[serde(default = "default_music_folder")]
    pub music_folder: PathBuf,
}

fn default_music_folder() -> PathBuf {
    PathBuf::from("./music")
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            music_folder: default_music_folder(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodingConfig {
    /// Allow serving downsampled streams. When disabled, requests that
    /// would need transcoding are rejected.
    #[serde(default)]
    pub downsampling_enabled: bool,

    /// Global bitrate ceiling in kbps applied to client requests
    /// (0 = no ceiling).
    #[serde(default)]
    pub max_bit_rate: u32,

    /// Command template for the metadata probe. `%s` expands to the input
    /// path batch.
    #[serde(default = "default_probe_command")]
    pub probe_command: String,

    /// Command template for the transcoder. `%s` expands to the source
    /// path, `%b` to the target bitrate.
    #[serde(default = "default_transcode_command")]
    pub transcode_command: String,

    /// Suffix of the transcoded output format; fixes the content type of
    /// every transcoded stream.
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

fn default_probe_command() -> String {
    "ffmpeg -i %s -f ffmetadata".to_string()
}

fn default_transcode_command() -> String {
    "ffmpeg -i %s -map 0:0 -b:a %bk -v 0 -f mp3 -".to_string()
}

fn default_output_suffix() -> String {
    "mp3".to_string()
}

impl Default for TranscodingConfig {
    fn default() -> Self {
        Self {
            downsampling_enabled: false,
            max_bit_rate: 0,
            probe_command: default_probe_command(),
            transcode_command: default_transcode_command(),
            output_suffix: default_output_suffix(),
        }
    }
}
