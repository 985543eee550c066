//! Parsing of the probe executable's human-readable report.
//!
//! The probing executable interleaves one report block per input file into a
//! single text stream. Each block opens with a header line of the form
//! `Input #0, mp3, from '/path/to/file.mp3':` followed by indented
//! `key : value` tag lines and a duration/bitrate summary line.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static INPUT_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Input #\d+,.*,\sfrom\s'(.*)'").expect("input regex"));

static DURATION_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s\sDuration: ([\d.:]+).*bitrate: (\d+)").expect("duration regex")
});

/// Ordered table of (pattern, tag) pairs matched against each report line.
///
/// Patterns are anchored to the leading-whitespace-and-label shape the
/// probing executable uses for tag lines. The first match of a given tag
/// wins; later occurrences never overwrite it, since the report repeats
/// stream-level metadata.
static TAG_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)^\s{4,6}title\s+:\s(.*)", "title"),
        (r"(?i)^\s{4,6}album\s+:\s(.*)", "album"),
        (r"(?i)^\s{4,6}artist\s+:\s(.*)", "artist"),
        (r"(?i)^\s{4,6}album_artist\s+:\s(.*)", "album_artist"),
        (r"(?i)^\s{4,6}TCM\s+:\s(.*)", "composer"),
        (r"(?i)^\s{4,6}genre\s+:\s(.*)", "genre"),
        (r"(?i)^\s{4,6}comment\s+:\s(.*)", "comment"),
        (r"(?i)^\s{4,6}compilation\s+:(.*)", "compilation"),
        (r"(?i)^\s{4,6}date\s+:\s(.*)", "year"),
        (r"(?i)^\s{4,6}tracktotal\s+:\s(.*)", "track_total"),
        (r"(?i)^\s{4,6}track\s+:\s(.*)", "track"),
        (r"(?i)^\s{4,6}disctotal\s+:\s(.*)", "disc_total"),
        (r"(?i)^\s{4,6}disc\s+:\s(.*)", "disc"),
        (r"(?i)^\s{4,6}TPA\s+:\s(.*)", "disc"),
        (r"^\s{4}Stream #\d+:\d+: (Video):.*", "has_picture"),
    ]
    .into_iter()
    .map(|(rx, tag)| (Regex::new(rx).expect("tag regex"), tag))
    .collect()
});

/// Split the combined probe output into non-overlapping per-file report
/// blocks, keyed by the path named in each header line.
///
/// Header detection is best-effort: a warning line that happens to match the
/// header shape would misalign record boundaries, and that ambiguity is
/// accepted rather than second-guessed.
pub(crate) fn split_report(output: &str) -> HashMap<String, &str> {
    let headers: Vec<_> = INPUT_RX.captures_iter(output).collect();

    let mut blocks = HashMap::new();
    for (i, cap) in headers.iter().enumerate() {
        let (Some(whole), Some(file)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let start = whole.end();
        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(output.len());
        blocks.insert(file.as_str().to_string(), &output[start..end]);
    }
    blocks
}

/// Scan one report block line by line and collect recognized tags.
pub(crate) fn parse_tags(block: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();

    for line in block.lines() {
        if line.is_empty() {
            continue;
        }

        let mut matched = false;
        for (rx, tag) in TAG_PATTERNS.iter() {
            if tags.contains_key(*tag) {
                continue;
            }
            if let Some(cap) = rx.captures(line) {
                if let Some(value) = cap.get(1) {
                    tags.insert(tag.to_string(), value.as_str().to_string());
                    matched = true;
                    break;
                }
            }
        }
        if matched || tags.contains_key("duration") {
            continue;
        }

        if let Some(cap) = DURATION_RX.captures(line) {
            if let (Some(duration), Some(bitrate)) = (cap.get(1), cap.get(2)) {
                tags.insert("duration".to_string(), duration.as_str().to_string());
                tags.insert("bitrate".to_string(), bitrate.as_str().to_string());
            }
        }
    }

    tags
}
