//! Command-line template rendering for external tool invocations.
//!
//! Probe and transcode commands are configured as space-separated templates
//! such as `ffmpeg -i %s -map 0:0 -b:a %bk -v 0 -f mp3 -`. Tokens are
//! whitespace-delimited only; no shell quoting is interpreted, so paths with
//! spaces pass through as single arguments.

use crate::{Error, Result};

/// Token that expands to the input path list.
const INPUT_PLACEHOLDER: &str = "%s";

/// Argument inserted between consecutive input paths when a single `%s`
/// fans out to a batch (the template supplies the flag for the first input).
const INPUT_SEPARATOR: &str = "-i";

/// Placeholder replaced by the numeric bitrate inside a token, so `%bk`
/// renders as e.g. `128k`.
const BITRATE_PLACEHOLDER: &str = "%b";

/// A rendered command line: executable name plus argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Render a command template against a batch of input paths and an optional
/// target bitrate.
///
/// A single `%s` occurrence expands to all inputs, each but the first
/// preceded by the `-i` separator argument, matching how the target
/// executable accepts multiple inputs. `%b` is replaced by the bitrate
/// number within its token. All other tokens pass through unchanged.
///
/// # Errors
///
/// Returns [`Error::EmptyTemplate`] if the template contains no tokens.
pub fn render(template: &str, inputs: &[String], bit_rate: Option<u32>) -> Result<RenderedCommand> {
    if template.split_whitespace().next().is_none() {
        return Err(Error::EmptyTemplate);
    }

    let mut tokens = Vec::new();
    let mut first_input = true;
    for token in template.split_whitespace() {
        if token == INPUT_PLACEHOLDER {
            for input in inputs {
                if !first_input {
                    tokens.push(INPUT_SEPARATOR.to_string());
                }
                tokens.push(input.clone());
                first_input = false;
            }
            continue;
        }
        match bit_rate {
            Some(rate) if token.contains(BITRATE_PLACEHOLDER) => {
                tokens.push(token.replacen(BITRATE_PLACEHOLDER, &rate.to_string(), 1));
            }
            _ => tokens.push(token.to_string()),
        }
    }

    if tokens.is_empty() {
        // Degenerate case: the template was nothing but `%s` and the batch
        // was empty.
        return Err(Error::EmptyTemplate);
    }

    let program = tokens.remove(0);
    Ok(RenderedCommand {
        program,
        args: tokens,
    })
}
