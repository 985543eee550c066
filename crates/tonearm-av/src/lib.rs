//! # tonearm-av
//!
//! External audio tool orchestration for the tonearm music server.
//!
//! This crate owns everything that touches external executables:
//! - Rendering configured command-line templates into executable + args
//! - Batch metadata probing and parsing of the probe report
//! - Transcoding subprocess lifecycle with incremental output streaming
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! # async fn example() -> tonearm_av::Result<()> {
//! let batch = vec![PathBuf::from("/music/track.mp3")];
//! let metadata = tonearm_av::extract_all_metadata("ffmpeg -i %s -f ffmetadata", &batch).await?;
//! for (path, md) in &metadata {
//!     println!("{}: {} ({} kbps)", path.display(), md.title(), md.bit_rate());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod probe;
pub mod template;
pub mod tools;
pub mod transcode;

// Re-exports
pub use error::{Error, Result};
pub use probe::{extract_all_metadata, Metadata};
pub use template::{render, RenderedCommand};
pub use tools::{check_tool, require_tool, ToolInfo};
pub use transcode::TranscodeProcess;
