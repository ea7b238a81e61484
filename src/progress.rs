//! Progress reporting.
//!
//! This module provides [`ProgressCallback`] for monitoring frame export and
//! [`ProgressInfo`] for progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use animdump::{
//!     AnimationConfig, ExportOptions, FrameExporter, ProgressCallback, ProgressInfo,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{}: {pct:.1}% complete", info.input.display());
//!         }
//!     }
//! }
//!
//! let options = ExportOptions::new().with_progress(Arc::new(PrintProgress));
//! let exporter = FrameExporter::default();
//! exporter.export_animation_with_options("input.gif", &AnimationConfig::new(), &options)?;
//! # Ok::<(), animdump::AnimDumpError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A snapshot of export progress for one input file.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Input file being exported.
    pub input: PathBuf,
    /// How many frames have been written so far.
    pub current: u64,
    /// Total frames in the animation.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known and non-zero.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the export started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Index of the frame just written.
    pub current_frame: Option<u64>,
}

/// Trait for receiving progress updates during export.
///
/// Progress callbacks are infallible: they observe but cannot halt the
/// export.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during an export.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks progress timing for one input and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    input: PathBuf,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        input: &Path,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            input: input.to_path_buf(),
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one written frame and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, frame_index: u64) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(Some(frame_index));
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final progress report.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, frame_index: Option<u64>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed
                    .div_f64(self.current as f64)
                    .mul_f64(remaining as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            input: self.input.clone(),
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_index,
        };

        self.callback.on_progress(&info);
    }
}
