//! Export configuration.
//!
//! [`AnimationConfig`] describes where frames go and how they are named and
//! encoded. It is resolved once per run and shared read-only across every
//! input file. [`ExportOptions`] threads operational settings (progress
//! reporting) through the pipeline without polluting every signature.
//!
//! # Example
//!
//! ```
//! use animdump::{AnimationConfig, OutputFormat};
//!
//! let config = AnimationConfig::new()
//!     .with_folder("out")
//!     .with_prefix("f_")
//!     .with_format(OutputFormat::Tiff);
//!
//! assert_eq!(config.suffix(), "tiff");
//! assert_eq!(config.output_path(1), std::path::Path::new("out/f_0001.tiff"));
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Default destination folder.
pub const DEFAULT_FOLDER: &str = ".";

/// Default filename prefix.
pub const DEFAULT_PREFIX: &str = "dump_";

/// Still-image format used for exported frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Portable Network Graphics. This is the default.
    #[default]
    Png,
    /// Tagged Image File Format.
    Tiff,
    /// Portable Arbitrary Map (`P7`, `RGB_ALPHA` tuple type).
    Pam,
}

impl OutputFormat {
    /// File suffix written after the frame index, without the dot.
    pub fn suffix(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Pam => "pam",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OutputFormat::Png => write!(f, "PNG"),
            OutputFormat::Tiff => write!(f, "TIFF"),
            OutputFormat::Pam => write!(f, "PAM"),
        }
    }
}

/// Naming and format settings for one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationConfig {
    /// Destination folder for exported frames.
    pub folder: PathBuf,
    /// Prefix placed before the zero-padded frame index.
    pub prefix: String,
    /// Encoder selected for every frame.
    pub format: OutputFormat,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationConfig {
    /// Create a configuration with the defaults: folder `.`, prefix `dump_`,
    /// PNG output.
    pub fn new() -> Self {
        Self {
            folder: PathBuf::from(DEFAULT_FOLDER),
            prefix: DEFAULT_PREFIX.to_string(),
            format: OutputFormat::default(),
        }
    }

    /// Set the destination folder.
    #[must_use]
    pub fn with_folder<P: AsRef<Path>>(mut self, folder: P) -> Self {
        self.folder = folder.as_ref().to_path_buf();
        self
    }

    /// Set the filename prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Suffix derived from the output format.
    pub fn suffix(&self) -> &'static str {
        self.format.suffix()
    }

    /// File name for frame `index`: prefix, four-digit index, suffix.
    ///
    /// Indices of 10000 and above are not truncated; they simply take more
    /// digits.
    pub fn file_name(&self, index: usize) -> String {
        format!("{}{index:04}.{}", self.prefix, self.suffix())
    }

    /// Full output path for frame `index`.
    pub fn output_path(&self, index: usize) -> PathBuf {
        self.folder.join(self.file_name(index))
    }

    /// Human-readable naming pattern, e.g. `./dump_xxxx.png`.
    pub fn pattern(&self) -> String {
        format!(
            "{}/{}xxxx.{}",
            self.folder.display(),
            self.prefix,
            self.suffix()
        )
    }
}

/// Operational settings for an export.
///
/// All fields have sensible defaults: a default-constructed value reports
/// no progress.
#[derive(Clone)]
pub struct ExportOptions {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for ExportOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExportOptions")
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportOptions {
    /// Create options with no progress callback and batch size 1.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }
}
