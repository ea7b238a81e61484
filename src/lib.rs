//! # animdump
//!
//! Dump the frames of animated images as numbered still images.
//!
//! `animdump` decodes an animated GIF, APNG or WebP into full-canvas RGBA
//! frames and writes each one as `<folder>/<prefix><NNNN>.<suffix>` in PNG,
//! TIFF or PAM format, powered by the [`image`](https://crates.io/crates/image)
//! crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use animdump::{AnimationConfig, FrameExporter};
//!
//! let exporter = FrameExporter::default();
//! let summary = exporter.export_animation("input.gif", &AnimationConfig::new())?;
//! // ./dump_0000.png, ./dump_0001.png, ...
//! println!("{} frames", summary.frames_written());
//! # Ok::<(), animdump::AnimDumpError>(())
//! ```
//!
//! ### Several inputs
//!
//! ```no_run
//! use animdump::{AnimationConfig, ExportOptions, FrameExporter, OutputFormat, RunPolicy};
//!
//! let config = AnimationConfig::new()
//!     .with_folder("out")
//!     .with_prefix("f_")
//!     .with_format(OutputFormat::Tiff);
//!
//! let report = FrameExporter::default().export_all(
//!     ["a.webp", "b.gif"],
//!     &config,
//!     &ExportOptions::new(),
//!     RunPolicy::ContinueOnError,
//! );
//! assert!(!report.any_error());
//! ```
//!
//! ## Custom collaborators
//!
//! Decoding and encoding sit behind the [`ContainerDecoder`] and
//! [`StillImageEncoder`] traits; [`FrameExporter::new`] accepts any pair.

pub mod animation;
pub mod config;
mod conversion;
pub mod decode;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod progress;

pub use animation::{ColorLayout, ContainerKind, DecodedAnimation, FrameBufferView, RgbaFrame};
pub use config::{AnimationConfig, ExportOptions, OutputFormat};
pub use decode::{ContainerDecoder, ImageContainerDecoder};
pub use encode::{ImageStillEncoder, StillImageEncoder};
pub use error::AnimDumpError;
pub use pipeline::{ExportSummary, FrameExporter, RunObserver, RunPolicy, RunReport};
pub use progress::{ProgressCallback, ProgressInfo};
