//! Streaming and listing routes.
//!
//! Raw streams are servable byte ranges over the original file (`206
//! Partial Content`); transcoded streams have no known length and are sent
//! as a full sequential body with no range support.

use std::io::SeekFrom;
use std::time::SystemTime;

use crate::catalog::Catalog;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::server::{error::AppError, AppContext};
use crate::streaming::{MediaStream, RawStream, StreamError, TranscodedStream};

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    id: String,

    /// Requested bitrate ceiling in kbps; 0 or absent means no limit.
    #[serde(rename = "maxBitRate", default)]
    max_bit_rate: i64,

    /// Requested format; `raw` forces the original bytes through.
    #[serde(default)]
    format: Option<String>,
}

/// `GET /rest/stream?id=&maxBitRate=&format=`
pub async fn stream(
    State(ctx): State<AppContext>,
    Query(params): Query<StreamParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let max_bit_rate = params.max_bit_rate.max(0) as u32;
    let format = params.format.as_deref().unwrap_or("");

    match ctx.streamer.new_stream(&params.id, max_bit_rate, format)? {
        MediaStream::Raw(raw) => serve_raw(raw, &headers, false).await,
        MediaStream::Transcoded(stream) => serve_transcoded(stream),
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    id: String,
}

/// `GET /rest/download?id=`: always the original bytes.
pub async fn download(
    State(ctx): State<AppContext>,
    Query(params): Query<DownloadParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    match ctx.streamer.new_stream(&params.id, 0, "raw")? {
        MediaStream::Raw(raw) => serve_raw(raw, &headers, true).await,
        MediaStream::Transcoded(_) => {
            // A raw request never selects transcoding.
            Err(StreamError::TranscodeUnavailable.into())
        }
    }
}

/// `GET /rest/tracks`: catalog listing.
pub async fn list_tracks(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    let tracks: Vec<_> = ctx
        .catalog
        .list_tracks()
        .into_iter()
        .map(|t| {
            json!({
                "id": t.id,
                "title": t.title,
                "artist": t.artist,
                "album": t.album,
                "suffix": t.suffix,
                "bitRate": t.bit_rate,
                "duration": t.duration_secs,
                "size": t.size,
            })
        })
        .collect();
    Json(json!({ "tracks": tracks }))
}

async fn serve_raw(
    raw: RawStream,
    headers: &HeaderMap,
    attachment: bool,
) -> Result<Response, AppError> {
    let mut file = raw.open().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::from(StreamError::NotFound(raw.name().to_string()))
        } else {
            AppError::from(e)
        }
    })?;
    let file_size = file.metadata().await?.len();

    let range = headers
        .get(header::RANGE)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| parse_range_header(s, file_size));

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, raw.content_type())
        .header(header::LAST_MODIFIED, http_date(raw.mod_time()))
        .header("X-Content-Duration", raw.duration_secs().to_string())
        .header(header::ACCEPT_RANGES, "bytes");
    if attachment {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", raw.name()),
        );
    }

    let response = match range {
        Some((start, end)) => {
            let length = end - start + 1;
            file.seek(SeekFrom::Start(start)).await?;
            let body = Body::from_stream(ReaderStream::new(file.take(length)));

            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_LENGTH, length.to_string())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, file_size),
                )
                .body(body)
        }
        None => {
            let body = Body::from_stream(ReaderStream::new(file));

            builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, file_size.to_string())
                .body(body)
        }
    };

    response.map_err(|e| AppError::from(std::io::Error::other(e)))
}

fn serve_transcoded(stream: TranscodedStream) -> Result<Response, AppError> {
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, stream.content_type().to_string())
        .header(header::LAST_MODIFIED, http_date(stream.mod_time()))
        .header("X-Content-Duration", stream.duration_secs().to_string());

    // No Content-Length and no range support: the encoded size is unknown
    // until the subprocess finishes.
    builder
        .body(Body::from_stream(stream.into_byte_stream()))
        .map_err(|e| AppError::from(std::io::Error::other(e)))
}

fn http_date(time: SystemTime) -> String {
    chrono::DateTime::<chrono::Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Parse an HTTP Range header.
///
/// Supports `bytes=0-499`, `bytes=500-`, and `bytes=-500` (last 500
/// bytes). Unsatisfiable or malformed ranges yield `None` and the full
/// file is served instead.
fn parse_range_header(value: &str, file_size: u64) -> Option<(u64, u64)> {
    let ranges = value.strip_prefix("bytes=")?;
    let (start, end) = ranges.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    match (start.is_empty(), end.is_empty()) {
        // bytes=-500 (suffix)
        (true, false) => {
            let suffix_len: u64 = end.parse().ok()?;
            if suffix_len == 0 || file_size == 0 {
                return None;
            }
            Some((file_size.saturating_sub(suffix_len), file_size - 1))
        }
        // bytes=500- (open end)
        (false, true) => {
            let start: u64 = start.parse().ok()?;
            if start >= file_size {
                return None;
            }
            Some((start, file_size - 1))
        }
        // bytes=0-499
        (false, false) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            if start >= file_size || start > end {
                return None;
            }
            Some((start, end.min(file_size - 1)))
        }
        // bytes=-
        (true, true) => None,
    }
}
