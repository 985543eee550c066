//! Batch metadata probing via an external media-probing executable.
//!
//! One probe invocation covers a whole batch of files, which amortizes the
//! process-spawn cost across a library scan. The executable's combined
//! stdout/stderr text is split into per-file report blocks and each block is
//! parsed into a [`Metadata`] entity.

mod metadata;
mod parser;

pub use metadata::Metadata;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::SystemTime;

use tokio::process::Command;

use crate::{template, Error, Result};

/// Extract metadata for a batch of files with a single probe invocation.
///
/// The returned map only contains files the probe recognized as media:
/// files that cannot be stat'ed (deleted or moved since the scan) or whose
/// report block yields no tags are logged and silently dropped, so callers
/// must treat absence from the result as "skip this file."
///
/// The call blocks until the probing subprocess exits. Dropping the future
/// (e.g. through a caller-supplied timeout) kills the subprocess and
/// abandons the batch.
///
/// # Errors
///
/// - [`Error::ToolNotFound`] if the probe executable cannot be spawned.
/// - [`Error::ProbeFailed`] if the invocation produced no output at all.
/// - [`Error::EmptyTemplate`] if the configured template is empty.
pub async fn extract_all_metadata(
    probe_command: &str,
    paths: &[PathBuf],
) -> Result<HashMap<PathBuf, Metadata>> {
    let inputs: Vec<String> = paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    let cmd = template::render(probe_command, &inputs, None)?;

    tracing::trace!(program = %cmd.program, args = ?cmd.args, "executing probe command");
    let output = Command::new(&cmd.program)
        .args(&cmd.args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::tool_not_found(&cmd.program),
            _ => Error::Io(e),
        })?;

    // The probing executable reports to stderr and exits non-zero when run
    // without an output target; the exit status carries no signal here.
    // Only a completely empty capture means the probe failed.
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    if combined.is_empty() {
        return Err(Error::ProbeFailed);
    }

    let mut results = HashMap::new();
    for (file, block) in parser::split_report(&combined) {
        let path = PathBuf::from(&file);
        if let Some(md) = extract_metadata(&path, block) {
            results.insert(path, md);
        }
    }
    Ok(results)
}

/// Build a [`Metadata`] for one file, or `None` when the file should be
/// dropped from the batch (stat failure, or no recognizable tags).
fn extract_metadata(path: &Path, block: &str) -> Option<Metadata> {
    let stat = match std::fs::metadata(path) {
        Ok(stat) => stat,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "could not stat probed file, skipping");
            return None;
        }
    };

    let tags = parser::parse_tags(block);
    if tags.is_empty() {
        tracing::trace!(file = %path.display(), "not a media file, skipping");
        return None;
    }

    let mod_time = stat.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    Some(Metadata::new(path.to_path_buf(), stat.len(), mod_time, tags))
}
