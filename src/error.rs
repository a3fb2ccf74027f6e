// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use std::io;

//==============================================================================
// Error taxonomy
//==============================================================================

custom_error::custom_error! {
    /// Closed error taxonomy for the collector.
    ///
    /// [`Fail::Fatal`] terminates the process; the remaining variants are
    /// scoped to a single connection or a single record and are always
    /// logged and handled locally by the stage that observes them.
    #[derive(PartialEq)]
    pub Fail

    /// Startup-time failure: bad arguments, or the listener could not be
    /// bound. The process exits with status 1 after logging this.
    Fatal{reason: String} = "fatal error: {reason}",

    /// The peer's connection was lost or closed; the reception worker
    /// tears the connection down but the pool keeps serving other peers.
    ConnectionLost{reason: String} = "connection lost: {reason}",

    /// A single record failed to decompress. The category mirrors the
    /// distinct zlib return codes an operator would want to tell apart.
    Decompression{category: DecompressionError} = "decompression failed: {category}",

    /// A single record could not be written because its output file could
    /// not be opened.
    Store{reason: String} = "failed to open output file: {reason}",
}

/// Categorized decompression failure, mirroring the zlib `Z_*` return
/// codes so a log line can tell an out-of-memory failure apart from a
/// corrupt-input one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressionError {
    /// Not enough memory to complete decompression (`Z_MEM_ERROR`).
    OutOfMemory,
    /// The destination buffer was too small for the inflated data
    /// (`Z_BUF_ERROR`).
    BufferTooSmall,
    /// The input was incomplete or corrupt (`Z_DATA_ERROR`).
    CorruptData,
}

impl std::fmt::Display for DecompressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            DecompressionError::OutOfMemory => "not enough memory for decompression",
            DecompressionError::BufferTooSmall => "destination buffer too small",
            DecompressionError::CorruptData => "incomplete or corrupted input data",
        };
        f.write_str(msg)
    }
}

impl From<io::Error> for Fail {
    fn from(e: io::Error) -> Self {
        Fail::ConnectionLost {
            reason: e.to_string(),
        }
    }
}

/// Convenience alias used throughout the pipeline stages.
pub type Result<T> = std::result::Result<T, Fail>;

#[cfg(test)]
mod tests {
    use super::*;

    /// The decompression category is carried through to the display text,
    /// since it's what ends up in the `[DCMP]` log line.
    #[test]
    fn decompression_error_display_mentions_category() {
        let err = Fail::Decompression {
            category: DecompressionError::CorruptData,
        };
        assert!(format!("{}", err).contains("incomplete or corrupted"));
    }
}
