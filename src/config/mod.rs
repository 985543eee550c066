mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./tonearm.toml",
        "./config.toml",
        "~/.config/tonearm/config.toml",
        "/etc/tonearm/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.transcoding.probe_command.trim().is_empty() {
        anyhow::bail!("Probe command template cannot be empty");
    }

    if config.transcoding.downsampling_enabled
        && config.transcoding.transcode_command.trim().is_empty()
    {
        anyhow::bail!("Downsampling is enabled but the transcode command template is empty");
    }

    if !config.library.music_folder.exists() {
        tracing::warn!(
            "Music folder does not exist: {:?}",
            config.library.music_folder
        );
    }

    Ok(())
}
