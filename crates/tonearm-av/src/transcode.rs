//! Transcoding subprocess lifecycle.
//!
//! A [`TranscodeProcess`] owns one spawned encoder. Its stdout is pumped
//! chunk by chunk into a bounded channel, so a slow consumer backpressures
//! the pump and, once the OS pipe fills, the encoder itself. Every spawn is
//! matched by exactly one reap: on natural exit the child is waited on and
//! a non-zero status surfaces as a read error on the stream; when the
//! consumer drops the stream early the pipe is closed, the child gets a
//! bounded grace period to exit on its own, and is killed if it does not.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{Error, Result};

/// Read granularity for the stdout pump.
const CHUNK_SIZE: usize = 32 * 1024;

/// In-flight chunks between the pump and the consumer. Kept small so that
/// backpressure reaches the encoder quickly.
const CHANNEL_CAPACITY: usize = 4;

/// How long a child may keep running after its output pipe is closed
/// before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// A live transcoding subprocess exposing its stdout as a byte stream.
pub struct TranscodeProcess {
    tool: String,
    rx: mpsc::Receiver<io::Result<Bytes>>,
}

impl TranscodeProcess {
    /// Spawn the rendered transcode command.
    ///
    /// stderr is drained to the log; stdout is streamed incrementally, in
    /// order, without waiting for the process to finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] if the executable does not exist,
    /// or [`Error::Io`] for other spawn failures.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let tool = Path::new(program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.to_string());

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => Error::tool_not_found(program),
                _ => Error::Io(e),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::subprocess_failed(&tool, "stdout was not captured"))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(tool.clone(), stderr));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(pump(tool.clone(), child, stdout, tx));

        Ok(Self { tool, rx })
    }

    /// Short name of the spawned tool, for diagnostics.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Consume the process handle, yielding its output as a stream of byte
    /// chunks. Dropping the stream before it ends terminates the subprocess.
    pub fn into_stream(self) -> ReceiverStream<io::Result<Bytes>> {
        ReceiverStream::new(self.rx)
    }
}

async fn pump(
    tool: String,
    mut child: Child,
    mut stdout: ChildStdout,
    tx: mpsc::Sender<io::Result<Bytes>>,
) {
    let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
    loop {
        buf.reserve(CHUNK_SIZE);
        match stdout.read_buf(&mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(Ok(buf.split().freeze())).await.is_err() {
                    // Consumer went away (client disconnect).
                    drop(stdout);
                    terminate(&tool, &mut child).await;
                    return;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                drop(stdout);
                terminate(&tool, &mut child).await;
                return;
            }
        }
    }

    drop(stdout);
    match child.wait().await {
        Ok(status) if status.success() => {
            tracing::debug!(%tool, "transcoder finished");
        }
        Ok(status) => {
            tracing::warn!(%tool, %status, "transcoder exited abnormally");
            let _ = tx
                .send(Err(io::Error::other(format!("{tool} exited with {status}"))))
                .await;
        }
        Err(e) => {
            let _ = tx.send(Err(e)).await;
        }
    }
}

/// Reap a child whose output is no longer wanted. The read end of its
/// stdout pipe is already closed, so most encoders exit on their own once
/// their next write fails; stragglers are killed after [`EXIT_GRACE`].
async fn terminate(tool: &str, child: &mut Child) {
    match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
        Ok(Ok(status)) => {
            tracing::debug!(%tool, %status, "transcoder exited after stream close");
        }
        Ok(Err(e)) => {
            tracing::warn!(%tool, error = %e, "failed waiting for transcoder");
        }
        Err(_) => {
            tracing::warn!(%tool, "transcoder outlived grace period, killing");
            if let Err(e) = child.kill().await {
                tracing::warn!(%tool, error = %e, "failed to kill transcoder");
            }
        }
    }
}

async fn drain_stderr(tool: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if !line.trim().is_empty() {
            tracing::debug!(%tool, "{}", line);
        }
    }
}
