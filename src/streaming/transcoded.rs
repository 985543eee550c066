//! Transcoded stream handle.

use std::io;
use std::time::SystemTime;

use bytes::Bytes;
use tokio_stream::wrappers::ReceiverStream;
use tonearm_av::TranscodeProcess;

use crate::catalog::Track;
use crate::config::TranscodingConfig;
use crate::mime;
use crate::streaming::StreamError;

/// A live transcoding subprocess serving one request. Sequential only: the
/// HTTP layer streams the full body with no range support. The content type
/// is fixed to the configured output format, not the source's.
pub struct TranscodedStream {
    process: TranscodeProcess,
    bit_rate: u32,
    content_type: &'static str,
    name: String,
    duration_secs: u32,
    mod_time: SystemTime,
}

impl TranscodedStream {
    /// Render the transcode template for `track` at `bit_rate` kbps and
    /// spawn the encoder.
    pub fn spawn(
        config: &TranscodingConfig,
        track: &Track,
        bit_rate: u32,
    ) -> Result<Self, StreamError> {
        let inputs = vec![track.path.to_string_lossy().into_owned()];
        let cmd = tonearm_av::render(&config.transcode_command, &inputs, Some(bit_rate))
            .map_err(StreamError::from_tool_error)?;

        tracing::debug!(program = %cmd.program, args = ?cmd.args, "spawning transcoder");
        let process = TranscodeProcess::spawn(&cmd.program, &cmd.args)
            .map_err(StreamError::from_tool_error)?;

        let name = format!(
            "{}.{}",
            track
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| track.id.clone()),
            config.output_suffix
        );

        Ok(Self {
            process,
            bit_rate,
            content_type: mime::content_type_for(&config.output_suffix),
            name,
            duration_secs: track.duration_secs,
            mod_time: track.updated_at,
        })
    }

    /// Target bitrate in kbps.
    pub fn bit_rate(&self) -> u32 {
        self.bit_rate
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

    pub fn mod_time(&self) -> SystemTime {
        self.mod_time
    }

    /// Consume the handle, yielding the encoder's output chunks. Dropping
    /// the stream terminates the subprocess.
    pub fn into_byte_stream(self) -> ReceiverStream<io::Result<Bytes>> {
        self.process.into_stream()
    }
}
