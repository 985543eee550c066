//! Stream selection.
//!
//! [`MediaStreamer`] turns a playback request into either a raw or a
//! transcoded stream handle. The choice is a pure function of the source
//! bitrate, the requested ceiling and format, and the read-only transcoding
//! configuration; nothing else feeds into it.

mod raw;
mod transcoded;

pub use raw::RawStream;
pub use transcoded::TranscodedStream;

use std::sync::Arc;
use std::time::SystemTime;

use crate::catalog::Catalog;
use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("track not found: {0}")]
    NotFound(String),

    #[error("transcoding unavailable")]
    TranscodeUnavailable,

    #[error(transparent)]
    Tool(tonearm_av::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// A missing executable or an empty template means transcoding is
    /// misconfigured, which callers treat the same as disabled.
    pub(crate) fn from_tool_error(e: tonearm_av::Error) -> Self {
        match e {
            tonearm_av::Error::EmptyTemplate | tonearm_av::Error::ToolNotFound { .. } => {
                Self::TranscodeUnavailable
            }
            other => Self::Tool(other),
        }
    }
}

/// Stream handle handed to the HTTP layer: exactly one of the two shapes
/// per request.
pub enum MediaStream {
    Raw(RawStream),
    Transcoded(TranscodedStream),
}

impl MediaStream {
    pub fn content_type(&self) -> &str {
        match self {
            Self::Raw(s) => s.content_type(),
            Self::Transcoded(s) => s.content_type(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Raw(s) => s.name(),
            Self::Transcoded(s) => s.name(),
        }
    }

    pub fn duration_secs(&self) -> u32 {
        match self {
            Self::Raw(s) => s.duration_secs(),
            Self::Transcoded(s) => s.duration_secs(),
        }
    }

    pub fn mod_time(&self) -> SystemTime {
        match self {
            Self::Raw(s) => s.mod_time(),
            Self::Transcoded(s) => s.mod_time(),
        }
    }
}

/// Delivery choice for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Raw,
    Transcode(u32),
}

/// Decide between raw and transcoded delivery.
///
/// Raw wins when the client asked for the original (`format == "raw"`),
/// requested no ceiling, or the source already satisfies the ceiling.
fn select_delivery(source_bit_rate: u32, max_bit_rate: u32, format: &str) -> Delivery {
    if format == "raw" {
        return Delivery::Raw;
    }
    if max_bit_rate == 0 {
        return Delivery::Raw;
    }
    if max_bit_rate >= source_bit_rate {
        return Delivery::Raw;
    }
    Delivery::Transcode(max_bit_rate)
}

/// Builds stream handles for playback requests.
pub struct MediaStreamer {
    catalog: Arc<dyn Catalog>,
    config: Arc<Config>,
}

impl MediaStreamer {
    pub fn new(catalog: Arc<dyn Catalog>, config: Arc<Config>) -> Self {
        Self { catalog, config }
    }

    /// Resolve `id` and build the stream handle for this request.
    ///
    /// # Errors
    ///
    /// - [`StreamError::NotFound`] when the catalog does not know `id`.
    /// - [`StreamError::TranscodeUnavailable`] when transcoding is needed
    ///   but disabled or misconfigured.
    pub fn new_stream(
        &self,
        id: &str,
        max_bit_rate: u32,
        format: &str,
    ) -> Result<MediaStream, StreamError> {
        let track = self
            .catalog
            .resolve_track(id)
            .map_err(|_| StreamError::NotFound(id.to_string()))?;

        let transcoding = &self.config.transcoding;
        let ceiling = transcoding.max_bit_rate;
        let effective = if max_bit_rate > 0 && ceiling > 0 {
            max_bit_rate.min(ceiling)
        } else {
            max_bit_rate
        };

        match select_delivery(track.bit_rate, effective, format) {
            Delivery::Raw => {
                tracing::debug!(track = %track.id, "serving raw stream");
                Ok(MediaStream::Raw(RawStream::for_track(&track)))
            }
            Delivery::Transcode(bit_rate) => {
                if !transcoding.downsampling_enabled {
                    return Err(StreamError::TranscodeUnavailable);
                }
                tracing::debug!(track = %track.id, bit_rate, "serving transcoded stream");
                Ok(MediaStream::Transcoded(TranscodedStream::spawn(
                    transcoding,
                    &track,
                    bit_rate,
                )?))
            }
        }
    }
}
