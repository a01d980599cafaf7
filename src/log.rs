//! Console and log file output for BSMFA.
//!
//! Progress messages are printed to stdout and warnings to stderr. For `run`, both also go to log
//! files in the results folder, so negative inflow and clamped stock warnings can be reviewed
//! after a long run.
use anyhow::{Context, Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Metadata, Record};
use std::env;
use std::fmt::Arguments;
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// Overrides the log level in `settings.toml`
const LOG_LEVEL_ENV_VAR: &str = "BSMFA_LOG_LEVEL";

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Log level used when neither `BSMFA_LOG_LEVEL` nor `settings.toml` sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

const PROGRESS_LOG_FILE_NAME: &str = "bsmfa_info.log";
const WARNINGS_LOG_FILE_NAME: &str = "bsmfa_error.log";

/// Whether [`init`] has succeeded
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Start logging at the level from `BSMFA_LOG_LEVEL` or else `settings_level`.
///
/// If `log_dir` is given, progress and warnings are also written to log files there. The
/// progress file always records at least `info`.
pub fn init(settings_level: &str, log_dir: Option<&Path>) -> Result<()> {
    let level = env::var(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| settings_level.to_string());
    let level = parse_log_level(&level)?;

    let mut dispatch = Dispatch::new().chain(console_dispatch(level));
    if let Some(log_dir) = log_dir {
        dispatch = dispatch.chain(file_dispatch(log_dir, level)?);
    }
    dispatch.apply().context("Logger already initialised")?;

    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

fn parse_log_level(level: &str) -> Result<LevelFilter> {
    Ok(match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    })
}

fn is_progress(metadata: &Metadata) -> bool {
    metadata.level() > LevelFilter::Warn
}

/// Progress to stdout and warnings to stderr, coloured only when writing to a terminal
fn console_dispatch(level: LevelFilter) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let stdout_colours = std::io::stdout().is_terminal().then_some(colours);
    let stderr_colours = std::io::stderr().is_terminal().then_some(colours);

    Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(is_progress)
                .format(move |out, message, record| {
                    write_line(out, message, record, stdout_colours.as_ref());
                })
                .level(level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    write_line(out, message, record, stderr_colours.as_ref());
                })
                .level(level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        )
}

/// Plain-text progress and warnings files in `log_dir`, replacing any from an earlier run
fn file_dispatch(log_dir: &Path, level: LevelFilter) -> Result<Dispatch> {
    let create = |file_name: &str| {
        let path = log_dir.join(file_name);
        File::create(&path)
            .with_context(|| format!("Could not create log file {}", path.display()))
    };

    Ok(Dispatch::new()
        .format(|out, message, record| write_line(out, message, record, None))
        .chain(
            Dispatch::new()
                .filter(is_progress)
                .level(level.max(LevelFilter::Info))
                .chain(create(PROGRESS_LOG_FILE_NAME)?),
        )
        .chain(
            Dispatch::new()
                .level(LevelFilter::Warn)
                .chain(create(WARNINGS_LOG_FILE_NAME)?),
        ))
}

/// `[time level target] message`
fn write_line(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    colours: Option<&ColoredLevelConfig>,
) {
    let time = Local::now().format("%H:%M:%S");
    let target = record.target();
    match colours {
        Some(colours) => out.finish(format_args!(
            "[{time} {} {target}] {message}",
            colours.color(record.level())
        )),
        None => out.finish(format_args!("[{time} {} {target}] {message}", record.level())),
    }
}
