//! Frame export pipeline.
//!
//! [`FrameExporter`] drives one [`ContainerDecoder`] and one
//! [`StillImageEncoder`]: each input is decoded once, then every frame is
//! written to `<folder>/<prefix><NNNN>.<suffix>` in frame order.
//!
//! Failure policy:
//!
//! - A decode failure writes nothing for that input.
//! - An encode failure stops the current input at the failing frame. Frames
//!   already written stay on disk and nothing is retried.
//! - What happens to the remaining inputs of a run is chosen by the caller
//!   through [`RunPolicy`]; a [`RunObserver`] sees each input start and
//!   each failure as it happens.
//!
//! # Example
//!
//! ```no_run
//! use animdump::{AnimationConfig, FrameExporter, OutputFormat};
//!
//! let exporter = FrameExporter::default();
//! let config = AnimationConfig::new()
//!     .with_folder("frames")
//!     .with_format(OutputFormat::Tiff);
//!
//! let summary = exporter.export_animation("input.gif", &config)?;
//! println!("wrote {} frames", summary.frames_written());
//! # Ok::<(), animdump::AnimDumpError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    config::{AnimationConfig, ExportOptions},
    decode::{ContainerDecoder, ImageContainerDecoder},
    encode::{ImageStillEncoder, StillImageEncoder},
    error::AnimDumpError,
    progress::ProgressTracker,
};

/// Frame indices from here on no longer fit the four-digit padding.
const PADDING_LIMIT: usize = 10_000;

/// What a multi-file run does after one input fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    /// Stop at the first failing input; later inputs are not attempted.
    #[default]
    AbortOnFirstError,
    /// Report the failure and carry on with the next input.
    ContinueOnError,
}

/// Result of exporting one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ExportSummary {
    /// Input file that was exported.
    pub input: PathBuf,
    /// Every file written, in frame order.
    pub written: Vec<PathBuf>,
    /// Display delay of each written frame, where the container had one.
    pub delays_ms: Vec<Option<u32>>,
}

impl ExportSummary {
    pub fn frames_written(&self) -> usize {
        self.written.len()
    }

    /// Sum of the known frame delays, in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.delays_ms.iter().flatten().map(|&delay| u64::from(delay)).sum()
    }
}

/// Result of a multi-file run.
#[derive(Debug, Default)]
#[must_use]
pub struct RunReport {
    /// Inputs the pipeline was invoked on.
    pub attempted: usize,
    /// Summaries of the inputs that exported completely.
    pub succeeded: Vec<ExportSummary>,
    /// Every failure, in the order it happened.
    pub failures: Vec<AnimDumpError>,
}

impl RunReport {
    /// `true` if any input failed.
    pub fn any_error(&self) -> bool {
        !self.failures.is_empty()
    }

    /// The first failure of the run, if any.
    pub fn first_error(&self) -> Option<&AnimDumpError> {
        self.failures.first()
    }

    /// Frames written across every successful input.
    pub fn frames_written(&self) -> usize {
        self.succeeded.iter().map(ExportSummary::frames_written).sum()
    }
}

/// Hooks called by [`FrameExporter::export_all_observed`] as a run
/// progresses. Every method defaults to doing nothing.
pub trait RunObserver {
    /// Called before `input` is decoded.
    fn before_input(&mut self, _input: &Path) {}

    /// Called once an input has been exported completely.
    fn on_exported(&mut self, _summary: &ExportSummary) {}

    /// Called for each failing input. `aborting` is `true` when the policy
    /// ends the run here.
    fn on_failure(&mut self, _error: &AnimDumpError, _aborting: bool) {}
}

/// Reports failures through `log::error!`.
struct LogFailures;

impl RunObserver for LogFailures {
    fn on_failure(&mut self, error: &AnimDumpError, _aborting: bool) {
        log::error!("{error}");
    }
}

/// Decodes animated containers and exports their frames as still images.
#[derive(Debug, Clone)]
pub struct FrameExporter<D = ImageContainerDecoder, E = ImageStillEncoder> {
    decoder: D,
    encoder: E,
}

impl Default for FrameExporter {
    fn default() -> Self {
        Self::new(ImageContainerDecoder::new(), ImageStillEncoder::new())
    }
}

impl<D: ContainerDecoder, E: StillImageEncoder> FrameExporter<D, E> {
    pub fn new(decoder: D, encoder: E) -> Self {
        Self { decoder, encoder }
    }

    /// Export every frame of `path` with default options.
    ///
    /// # Errors
    ///
    /// - [`AnimDumpError::Decode`] if the container cannot be decoded; no
    ///   file is written.
    /// - [`AnimDumpError::Encode`] for the first frame that cannot be
    ///   written; earlier frames of this input remain on disk.
    pub fn export_animation<P: AsRef<Path>>(
        &self,
        path: P,
        config: &AnimationConfig,
    ) -> Result<ExportSummary, AnimDumpError> {
        self.export_animation_with_options(path, config, &ExportOptions::default())
    }

    /// Export every frame of `path`, reporting progress through `options`.
    ///
    /// # Errors
    ///
    /// Same as [`export_animation`](FrameExporter::export_animation).
    pub fn export_animation_with_options<P: AsRef<Path>>(
        &self,
        path: P,
        config: &AnimationConfig,
        options: &ExportOptions,
    ) -> Result<ExportSummary, AnimDumpError> {
        let input = path.as_ref();

        let animation = self.decoder.decode(input).map_err(|error| match error {
            AnimDumpError::Decode { .. } => error,
            other => AnimDumpError::decode(input, other),
        })?;
        let frame_count = animation.frame_count();

        let mut summary = ExportSummary {
            input: input.to_path_buf(),
            written: Vec::with_capacity(frame_count),
            delays_ms: Vec::with_capacity(frame_count),
        };

        if frame_count == 0 {
            log::info!("{}: no frames to export", input.display());
            return Ok(summary);
        }

        if frame_count > PADDING_LIMIT {
            log::warn!(
                "{}: {frame_count} frames; indices past {} use more than four digits",
                input.display(),
                PADDING_LIMIT - 1,
            );
        }

        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            input,
            Some(frame_count as u64),
            options.batch_size,
        );

        let frames = animation.frames().iter().zip(animation.views());
        for (frame_index, (frame, view)) in frames.enumerate() {
            let output = config.output_path(frame_index);
            let encode_error = |reason: String| AnimDumpError::Encode {
                input: input.to_path_buf(),
                output: output.clone(),
                frame_index,
                reason,
            };

            if frame_index == 0 {
                fs::create_dir_all(&config.folder)
                    .map_err(|error| encode_error(error.to_string()))?;
            }

            log::debug!(
                "Frame {frame_index}: {}×{} stride {} ({} bytes), delay {} -> {}",
                view.width(),
                view.height(),
                view.stride(),
                view.size(),
                frame
                    .delay_ms
                    .map_or_else(|| "unknown".to_string(), |delay| format!("{delay} ms")),
                output.display(),
            );

            self.encoder
                .save(&view, config.format, &output)
                .map_err(|error| encode_error(error.to_string()))?;

            summary.written.push(output);
            summary.delays_ms.push(frame.delay_ms);
            tracker.advance(frame_index as u64);
        }

        tracker.finish();
        log::info!(
            "{}: exported {} frames as {}",
            input.display(),
            summary.frames_written(),
            config.pattern(),
        );

        Ok(summary)
    }

    /// Export every input in order, applying `policy` after a failure.
    ///
    /// Each failure is logged once and recorded in the report; the report's
    /// [`any_error`](RunReport::any_error) drives the process exit status.
    pub fn export_all<I, P>(
        &self,
        inputs: I,
        config: &AnimationConfig,
        options: &ExportOptions,
        policy: RunPolicy,
    ) -> RunReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.export_all_observed(inputs, config, options, policy, &mut LogFailures)
    }

    /// Like [`export_all`](FrameExporter::export_all), but reports each
    /// input and failure to `observer` instead of the log.
    pub fn export_all_observed<I, P, O>(
        &self,
        inputs: I,
        config: &AnimationConfig,
        options: &ExportOptions,
        policy: RunPolicy,
        observer: &mut O,
    ) -> RunReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        O: RunObserver + ?Sized,
    {
        let mut report = RunReport::default();

        for input in inputs {
            let input = input.as_ref();
            report.attempted += 1;
            observer.before_input(input);

            match self.export_animation_with_options(input, config, options) {
                Ok(summary) => {
                    observer.on_exported(&summary);
                    report.succeeded.push(summary);
                }
                Err(error) => {
                    let aborting = policy == RunPolicy::AbortOnFirstError;
                    observer.on_failure(&error, aborting);
                    report.failures.push(error);
                    if aborting {
                        break;
                    }
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        animation::{ContainerKind, DecodedAnimation, FrameBufferView, RgbaFrame},
        config::OutputFormat,
    };

    /// Produces `frames` solid 2×2 frames, or fails for paths containing "bad".
    struct FakeDecoder {
        frames: usize,
    }

    impl ContainerDecoder for FakeDecoder {
        fn decode(&self, path: &Path) -> Result<DecodedAnimation, AnimDumpError> {
            if path.to_string_lossy().contains("bad") {
                return Err(AnimDumpError::decode(path, "corrupt"));
            }
            let frames = (0..self.frames)
                .map(|index| {
                    RgbaFrame::new(vec![index as u8; 16]).with_delay_ms(10 * (index as u32 + 1))
                })
                .collect();
            DecodedAnimation::new(2, 2, ContainerKind::Other, frames)
        }
    }

    /// Records calls instead of writing, failing at `fail_at` if set.
    #[derive(Default)]
    struct RecordingEncoder {
        fail_at: Option<usize>,
        calls: RefCell<Vec<(PathBuf, OutputFormat, u32, u32, usize, u8)>>,
    }

    impl StillImageEncoder for RecordingEncoder {
        fn save(
            &self,
            view: &FrameBufferView<'_>,
            format: OutputFormat,
            path: &Path,
        ) -> Result<(), AnimDumpError> {
            let mut calls = self.calls.borrow_mut();
            if Some(calls.len()) == self.fail_at {
                return Err(std::io::Error::other("disk full").into());
            }
            calls.push((
                path.to_path_buf(),
                format,
                view.width(),
                view.height(),
                view.stride(),
                view.pixels()[0],
            ));
            Ok(())
        }
    }

    /// Builds an animation whose second frame is one byte short.
    struct ShortBufferDecoder;

    impl ContainerDecoder for ShortBufferDecoder {
        fn decode(&self, _path: &Path) -> Result<DecodedAnimation, AnimDumpError> {
            let frames = vec![RgbaFrame::new(vec![0; 16]), RgbaFrame::new(vec![0; 15])];
            DecodedAnimation::new(2, 2, ContainerKind::Other, frames)
        }
    }

    /// Records what a run reported, in order.
    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
    }

    impl RunObserver for EventLog {
        fn before_input(&mut self, input: &Path) {
            self.events.push(format!("start {}", input.display()));
        }

        fn on_exported(&mut self, summary: &ExportSummary) {
            self.events
                .push(format!("done {} {}", summary.input.display(), summary.frames_written()));
        }

        fn on_failure(&mut self, error: &AnimDumpError, aborting: bool) {
            let path = match error {
                AnimDumpError::Decode { path, .. } => path.display().to_string(),
                other => other.to_string(),
            };
            self.events.push(format!("failed {path} aborting={aborting}"));
        }
    }

    fn config_in(directory: &Path) -> AnimationConfig {
        AnimationConfig::new().with_folder(directory)
    }

    #[test]
    fn exports_frames_in_order() {
        let directory = tempfile::tempdir().unwrap();
        let encoder = RecordingEncoder::default();
        let exporter = FrameExporter::new(FakeDecoder { frames: 3 }, &encoder);
        let config = config_in(directory.path()).with_format(OutputFormat::Pam);

        let summary = exporter.export_animation("anim.webp", &config).unwrap();
        assert_eq!(summary.frames_written(), 3);
        assert_eq!(summary.delays_ms, [Some(10), Some(20), Some(30)]);
        assert_eq!(summary.duration_ms(), 60);

        let calls = encoder.calls.borrow();
        for (index, call) in calls.iter().enumerate() {
            assert_eq!(call.0, directory.path().join(format!("dump_{index:04}.pam")));
            assert_eq!(call.1, OutputFormat::Pam);
            assert_eq!((call.2, call.3, call.4), (2, 2, 8));
            assert_eq!(call.5, index as u8);
        }
    }

    #[test]
    fn zero_frames_is_not_an_error() {
        let encoder = RecordingEncoder::default();
        let exporter = FrameExporter::new(FakeDecoder { frames: 0 }, &encoder);
        let config = AnimationConfig::new().with_folder("never_created");

        let summary = exporter.export_animation("empty.gif", &config).unwrap();
        assert_eq!(summary.frames_written(), 0);
        assert!(encoder.calls.borrow().is_empty());
        assert!(!Path::new("never_created").exists());
    }

    #[test]
    fn decode_failure_writes_nothing() {
        let encoder = RecordingEncoder::default();
        let exporter = FrameExporter::new(FakeDecoder { frames: 3 }, &encoder);

        let error = exporter
            .export_animation("bad.gif", &AnimationConfig::new())
            .unwrap_err();
        assert!(matches!(error, AnimDumpError::Decode { .. }));
        assert!(encoder.calls.borrow().is_empty());
    }

    #[test]
    fn encode_failure_stops_at_failing_frame() {
        let directory = tempfile::tempdir().unwrap();
        let encoder = RecordingEncoder {
            fail_at: Some(2),
            ..Default::default()
        };
        let exporter = FrameExporter::new(FakeDecoder { frames: 5 }, &encoder);

        let error = exporter
            .export_animation("anim.gif", &config_in(directory.path()))
            .unwrap_err();

        assert_eq!(error.frame_index(), Some(2));
        match &error {
            AnimDumpError::Encode { input, output, .. } => {
                assert_eq!(input, Path::new("anim.gif"));
                assert_eq!(output, &directory.path().join("dump_0002.png"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(encoder.calls.borrow().len(), 2);
    }

    #[test]
    fn abort_policy_stops_the_run() {
        let directory = tempfile::tempdir().unwrap();
        let encoder = RecordingEncoder::default();
        let exporter = FrameExporter::new(FakeDecoder { frames: 1 }, &encoder);

        let report = exporter.export_all(
            ["a.gif", "bad.gif", "c.gif"],
            &config_in(directory.path()),
            &ExportOptions::new(),
            RunPolicy::AbortOnFirstError,
        );

        assert!(report.any_error());
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded.len(), 1);
        assert!(matches!(
            report.first_error(),
            Some(AnimDumpError::Decode { .. })
        ));
    }

    #[test]
    fn continue_policy_processes_every_input() {
        let directory = tempfile::tempdir().unwrap();
        let encoder = RecordingEncoder::default();
        let exporter = FrameExporter::new(FakeDecoder { frames: 2 }, &encoder);

        let report = exporter.export_all(
            ["a.gif", "bad.gif", "c.gif"],
            &config_in(directory.path()),
            &ExportOptions::new(),
            RunPolicy::ContinueOnError,
        );

        assert!(report.any_error());
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.frames_written(), 4);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn clean_run_reports_no_error() {
        let directory = tempfile::tempdir().unwrap();
        let exporter = FrameExporter::new(FakeDecoder { frames: 1 }, RecordingEncoder::default());

        let report = exporter.export_all(
            Vec::<PathBuf>::new(),
            &config_in(directory.path()),
            &ExportOptions::new(),
            RunPolicy::default(),
        );

        assert!(!report.any_error());
        assert_eq!(report.attempted, 0);
        assert!(report.first_error().is_none());
    }

    #[test]
    fn decoder_buffer_errors_surface_as_decode_errors() {
        let directory = tempfile::tempdir().unwrap();
        let encoder = RecordingEncoder::default();
        let exporter = FrameExporter::new(ShortBufferDecoder, &encoder);

        let error = exporter
            .export_animation("short.gif", &config_in(directory.path()))
            .unwrap_err();

        match error {
            AnimDumpError::Decode { path, reason } => {
                assert_eq!(path, Path::new("short.gif"));
                assert!(reason.contains("Frame 1"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(encoder.calls.borrow().is_empty());
    }

    #[test]
    fn observer_sees_inputs_and_failures_in_order() {
        let directory = tempfile::tempdir().unwrap();
        let exporter = FrameExporter::new(FakeDecoder { frames: 2 }, RecordingEncoder::default());
        let mut observer = EventLog::default();

        let report = exporter.export_all_observed(
            ["a.gif", "bad.gif", "c.gif"],
            &config_in(directory.path()),
            &ExportOptions::new(),
            RunPolicy::ContinueOnError,
            &mut observer,
        );

        assert_eq!(report.attempted, 3);
        assert_eq!(
            observer.events,
            [
                "start a.gif",
                "done a.gif 2",
                "start bad.gif",
                "failed bad.gif aborting=false",
                "start c.gif",
                "done c.gif 2",
            ]
        );
    }

    #[test]
    fn observer_is_told_when_the_run_aborts() {
        let directory = tempfile::tempdir().unwrap();
        let exporter = FrameExporter::new(FakeDecoder { frames: 1 }, RecordingEncoder::default());
        let mut observer = EventLog::default();

        let report = exporter.export_all_observed(
            ["bad.gif", "c.gif"],
            &config_in(directory.path()),
            &ExportOptions::new(),
            RunPolicy::AbortOnFirstError,
            &mut observer,
        );

        assert_eq!(report.attempted, 1);
        assert_eq!(
            observer.events,
            ["start bad.gif", "failed bad.gif aborting=true"]
        );
    }
}
