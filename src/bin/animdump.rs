use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use animdump::{
    AnimDumpError, AnimationConfig, ExportOptions, ExportSummary, FrameExporter, OutputFormat,
    ProgressCallback, ProgressInfo, RunObserver, RunPolicy,
};
use clap::{CommandFactory, Parser, error::ErrorKind};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

const CLI_AFTER_HELP: &str = "Options may also be written with a single dash (-folder, -tiff, -help, ...).\n\nExamples:\n  animdump anim.webp\n  animdump -tiff -folder out -prefix f_ a.gif b.png\n  animdump -keep-going -progress *.webp";

/// Version of the `image` crate this binary is built against.
const IMAGE_VERSION: &str = "0.25";

/// Exit status when invoked without any argument.
const EXIT_NO_ARGUMENTS: i32 = 2;

/// Flags that take a value.
const VALUE_OPTIONS: &[&str] = &["folder", "prefix"];

/// Flags that take no value.
const FLAG_OPTIONS: &[&str] = &[
    "tiff",
    "pam",
    "keep-going",
    "progress",
    "verbose",
    "help",
    "version",
];

#[derive(Debug, Parser)]
#[command(
    name = "animdump",
    about = "Dump the frames of animated images as numbered still images",
    after_help = CLI_AFTER_HELP,
    disable_version_flag = true,
    args_override_self = true
)]
struct Cli {
    /// Dump folder.
    #[arg(long, value_name = "PATH", default_value = animdump::config::DEFAULT_FOLDER)]
    folder: PathBuf,

    /// Prefix for dumped frames.
    #[arg(long, value_name = "TEXT", default_value = animdump::config::DEFAULT_PREFIX)]
    prefix: String,

    /// Save frames as TIFF.
    #[arg(long, overrides_with = "pam")]
    tiff: bool,

    /// Save frames as PAM.
    #[arg(long, overrides_with = "tiff")]
    pam: bool,

    /// Continue with the next file after a failure instead of aborting.
    #[arg(long)]
    keep_going: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Show debug logging output.
    #[arg(long, short)]
    verbose: bool,

    /// Print version information and exit.
    #[arg(long)]
    version: bool,

    /// Animated images to dump.
    inputs: Vec<PathBuf>,
}

impl Cli {
    fn format(&self) -> OutputFormat {
        if self.pam {
            OutputFormat::Pam
        } else if self.tiff {
            OutputFormat::Tiff
        } else {
            OutputFormat::Png
        }
    }

    fn config(&self) -> AnimationConfig {
        AnimationConfig::new()
            .with_folder(&self.folder)
            .with_prefix(self.prefix.clone())
            .with_format(self.format())
    }

    fn policy(&self) -> RunPolicy {
        if self.keep_going {
            RunPolicy::ContinueOnError
        } else {
            RunPolicy::AbortOnFirstError
        }
    }
}

/// Rewrite single-dash flags into clap's double-dash form and move every
/// other token behind `--` so it is taken as an input path verbatim.
///
/// The first element is the program name and is passed through.
fn normalize_args<I>(args: I) -> Result<Vec<OsString>, AnimDumpError>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let mut options: Vec<OsString> = args.next().into_iter().collect();
    let mut inputs = Vec::new();

    while let Some(arg) = args.next() {
        if let Some((name, value)) = arg.to_str().and_then(split_joined_value) {
            options.push(OsString::from(format!("--{name}={value}")));
            continue;
        }

        let Some(name) = arg.to_str().and_then(option_name) else {
            inputs.push(arg);
            continue;
        };

        if VALUE_OPTIONS.contains(&name) {
            let value = args.next().ok_or_else(|| AnimDumpError::MissingArgument {
                option: arg.to_string_lossy().into_owned(),
            })?;
            let mut joined = OsString::from(format!("--{name}="));
            joined.push(value);
            options.push(joined);
        } else {
            options.push(OsString::from(format!("--{name}")));
        }
    }

    if !inputs.is_empty() {
        options.push(OsString::from("--"));
        options.extend(inputs);
    }
    Ok(options)
}

/// Canonical long name for a recognised flag, in either dash style.
fn option_name(arg: &str) -> Option<&'static str> {
    let bare = arg
        .strip_prefix("--")
        .or_else(|| arg.strip_prefix('-'))?;
    match bare {
        "h" => Some("help"),
        "v" => Some("verbose"),
        _ => VALUE_OPTIONS
            .iter()
            .chain(FLAG_OPTIONS)
            .find(|known| **known == bare)
            .copied(),
    }
}

/// Split `-folder=out` or `--folder=out` into its name and value.
fn split_joined_value(arg: &str) -> Option<(&'static str, &str)> {
    let (flag, value) = arg.split_once('=')?;
    let name = option_name(flag).filter(|name| VALUE_OPTIONS.contains(name))?;
    Some((name, value))
}

fn version_text() -> String {
    format!(
        "animdump version: {}\nDecoder: image {IMAGE_VERSION} (GIF, APNG, WebP)\nEncoders: image {IMAGE_VERSION} (PNG, TIFF, PAM)",
        env!("CARGO_PKG_VERSION"),
    )
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .try_init();
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        self.bar.set_message(info.input.display().to_string());
    }
}

/// Prints each input as it starts and each failure as it happens.
struct ConsoleReport {
    pattern: String,
}

impl RunObserver for ConsoleReport {
    fn before_input(&mut self, input: &Path) {
        println!("Decoding file: {} as {}", input.display(), self.pattern);
    }

    fn on_exported(&mut self, summary: &ExportSummary) {
        log::debug!(
            "{}: {} frame(s) written, {} ms of animation",
            summary.input.display(),
            summary.frames_written(),
            summary.duration_ms(),
        );
    }

    fn on_failure(&mut self, error: &AnimDumpError, aborting: bool) {
        eprintln!("{} {error}", "error:".red().bold());
        if aborting {
            eprintln!("{}", " Aborting.".red());
        }
    }
}

/// Returns `Ok(true)` when every input was exported.
fn run(args: Vec<OsString>) -> Result<bool, Box<dyn std::error::Error>> {
    let cli = match Cli::try_parse_from(normalize_args(args)?) {
        Ok(cli) => cli,
        Err(error) if error.kind() == ErrorKind::DisplayHelp => {
            error.print()?;
            return Ok(true);
        }
        Err(error) => {
            error.print()?;
            return Ok(false);
        }
    };

    if cli.version {
        println!("{}", version_text());
        return Ok(true);
    }

    init_logging(cli.verbose);

    let config = cli.config();
    let policy = cli.policy();
    let exporter = FrameExporter::default();

    let progress = if cli.progress {
        Some(Arc::new(TerminalProgress::new()?))
    } else {
        None
    };
    let mut options = ExportOptions::new();
    if let Some(progress) = &progress {
        options = options.with_progress(progress.clone());
    }

    let mut console = ConsoleReport {
        pattern: config.pattern(),
    };
    let report = exporter.export_all_observed(&cli.inputs, &config, &options, policy, &mut console);

    if let Some(progress) = progress {
        progress.bar.finish_and_clear();
    }

    Ok(!report.any_error())
}

fn main() {
    let args: Vec<OsString> = std::env::args_os().collect();
    if args.len() < 2 {
        let _ = Cli::command().print_help();
        process::exit(EXIT_NO_ARGUMENTS);
    }

    match run(args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            process::exit(1);
        }
    }
}
