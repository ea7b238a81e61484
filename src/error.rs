//! Error types for the `animdump` crate.
//!
//! This module defines [`AnimDumpError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry the context needed to
//! diagnose a failed run without re-running it: the input path, the output
//! path, and the frame index where applicable.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;

/// The unified error type for all `animdump` operations.
///
/// Every public method that can fail returns `Result<T, AnimDumpError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnimDumpError {
    /// A command-line flag that takes a value was given none.
    #[error("missing argument after option '{option}'")]
    MissingArgument {
        /// The flag as it was spelled on the command line.
        option: String,
    },

    /// The animated container could not be decoded.
    #[error("Error decoding file: {path}: {reason}")]
    Decode {
        /// Input file that failed to decode.
        path: PathBuf,
        /// Underlying reason reported by the decoder.
        reason: String,
    },

    /// A single frame could not be written.
    #[error("Error while saving frame {frame_index} of {input} to '{output}': {reason}")]
    Encode {
        /// Input file the frame came from.
        input: PathBuf,
        /// Output path that could not be written.
        output: PathBuf,
        /// Zero-based index of the failing frame.
        frame_index: usize,
        /// Underlying reason reported by the encoder.
        reason: String,
    },

    /// A decoded frame buffer does not match the canvas size.
    #[error(
        "Frame {frame_index} has {actual} bytes, expected {expected} (canvas width × height × 4)"
    )]
    InvalidFrameBuffer {
        /// Index of the offending frame.
        frame_index: usize,
        /// Byte length implied by the canvas.
        expected: usize,
        /// Byte length actually supplied.
        actual: usize,
    },

    /// The container declared a zero-sized canvas.
    #[error("Invalid canvas dimensions: {width}×{height}")]
    InvalidCanvas {
        /// Declared canvas width.
        width: u32,
        /// Declared canvas height.
        height: u32,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl AnimDumpError {
    /// Wrap any error raised while decoding `path`.
    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AnimDumpError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Frame index of an [`Encode`](AnimDumpError::Encode) failure.
    pub fn frame_index(&self) -> Option<usize> {
        match self {
            AnimDumpError::Encode { frame_index, .. } => Some(*frame_index),
            AnimDumpError::InvalidFrameBuffer { frame_index, .. } => Some(*frame_index),
            _ => None,
        }
    }
}
