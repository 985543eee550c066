//! Structured metadata extracted from a probe report.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

use regex::Regex;

static YEAR_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([12]\d\d\d)").expect("year regex"));

/// Metadata for a single probed audio file.
///
/// The raw tag map is the source of truth; the typed accessors are pure
/// views over it and return a zero value when a tag is absent or
/// unparsable. An instance is only constructed when at least one tag was
/// recognized, so an empty map never reaches callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    path: PathBuf,
    suffix: String,
    size: u64,
    mod_time: SystemTime,
    tags: HashMap<String, String>,
}

impl Metadata {
    pub(crate) fn new(
        path: PathBuf,
        size: u64,
        mod_time: SystemTime,
        tags: HashMap<String, String>,
    ) -> Self {
        let suffix = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        Self {
            path,
            suffix,
            size,
            mod_time,
            tags,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Lowercased file extension without the dot.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// File size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modification_time(&self) -> SystemTime {
        self.mod_time
    }

    pub fn title(&self) -> &str {
        self.tag("title")
    }

    pub fn album(&self) -> &str {
        self.tag("album")
    }

    pub fn artist(&self) -> &str {
        self.tag("artist")
    }

    pub fn album_artist(&self) -> &str {
        self.tag("album_artist")
    }

    pub fn composer(&self) -> &str {
        self.tag("composer")
    }

    pub fn genre(&self) -> &str {
        self.tag("genre")
    }

    pub fn comment(&self) -> &str {
        self.tag("comment")
    }

    /// Year extracted from the raw date tag, 0 when absent or unparsable.
    pub fn year(&self) -> u32 {
        self.parse_year("year")
    }

    /// `(number, total)` pair from the track tag, 0 for any missing side.
    pub fn track_number(&self) -> (u32, u32) {
        self.parse_tuple("track", "track_total")
    }

    /// `(number, total)` pair from the disc tag, 0 for any missing side.
    pub fn disc_number(&self) -> (u32, u32) {
        self.parse_tuple("disc", "disc_total")
    }

    /// Whether the report contained an attached video stream, which is how
    /// the probing executable reports embedded cover art.
    pub fn has_picture(&self) -> bool {
        self.tags.get("has_picture").map(String::as_str) == Some("Video")
    }

    pub fn compilation(&self) -> bool {
        self.parse_bool("compilation")
    }

    /// Duration in whole seconds, 0 when unknown.
    pub fn duration(&self) -> u32 {
        self.parse_duration("duration")
    }

    /// Bitrate in kbps, 0 when unknown.
    pub fn bit_rate(&self) -> u32 {
        self.parse_int("bitrate")
    }

    fn tag(&self, name: &str) -> &str {
        self.tags.get(name).map(String::as_str).unwrap_or_default()
    }

    fn parse_int(&self, name: &str) -> u32 {
        match self.tags.get(name) {
            Some(v) => v.trim().parse().unwrap_or(0),
            None => 0,
        }
    }

    fn parse_year(&self, name: &str) -> u32 {
        let Some(v) = self.tags.get(name) else {
            return 0;
        };
        match YEAR_RX.captures(v) {
            Some(cap) => cap[1].parse().unwrap_or(0),
            None => {
                // A present-but-unmatched date is a report shape we have not
                // seen before; worth a diagnostic, not a failure.
                tracing::error!(file = %self.path.display(), date = %v, "could not parse year from date tag");
                0
            }
        }
    }

    fn parse_tuple(&self, num_tag: &str, total_tag: &str) -> (u32, u32) {
        let Some(v) = self.tags.get(num_tag) else {
            return (0, 0);
        };
        match v.split_once('/') {
            Some((num, total)) => (
                num.trim().parse().unwrap_or(0),
                total.trim().parse().unwrap_or(0),
            ),
            None => {
                let num = v.trim().parse().unwrap_or(0);
                let total = self
                    .tags
                    .get(total_tag)
                    .and_then(|t| t.trim().parse().ok())
                    .unwrap_or(0);
                (num, total)
            }
        }
    }

    fn parse_bool(&self, name: &str) -> bool {
        self.tags
            .get(name)
            .map(|v| v.trim() == "1")
            .unwrap_or(false)
    }

    fn parse_duration(&self, name: &str) -> u32 {
        let Some(v) = self.tags.get(name) else {
            return 0;
        };
        parse_timestamp(v).unwrap_or(0)
    }
}

/// Convert an `HH:MM:SS[.fraction]` timestamp into whole seconds since
/// midnight.
fn parse_timestamp(value: &str) -> Option<u32> {
    let mut parts = value.split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds as u32)
}
