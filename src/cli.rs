//! The `bsmfa` command line.
use crate::input::load_model;
use crate::log;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// Project building floor area and the material flows of construction and demolition.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Print the command line reference as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for a single run, overriding `settings.toml`
#[derive(Args, Default)]
pub struct RunOpts {
    /// Folder for the results (default: bsmfa_results/<model name>)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Replace the contents of a non-empty results folder
    #[arg(long)]
    pub overwrite: bool,
    /// Also write the cohort stock and negative inflow CSV files
    #[arg(long)]
    pub debug_model: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every scenario of a model and write the results.
    Run {
        /// Model folder containing model.toml and the input CSV files.
        model_dir: PathBuf,
        #[command(flatten)]
        opts: RunOpts,
    },
    /// List, inspect, extract or run the bundled example models.
    Example {
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Load and check a model's inputs without running it.
    Validate {
        /// Model folder containing model.toml and the input CSV files.
        model_dir: PathBuf,
    },
    /// Show or edit settings.toml.
    Settings {
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

/// Parse the command line and carry out the command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    match cli.command {
        Some(Commands::Run { model_dir, opts }) => handle_run_command(&model_dir, &opts, None),
        Some(Commands::Example { subcommand }) => subcommand.execute(),
        Some(Commands::Validate { model_dir }) => handle_validate_command(&model_dir, None),
        Some(Commands::Settings { subcommand }) => subcommand.execute(),
        None => {
            println!("{}", Cli::command().render_long_help());
            Ok(())
        }
    }
}

/// Use the given settings, or else load them from `settings.toml`
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Run a model and write its results.
///
/// The results folder is created before logging starts, because the log files are written into
/// it.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = settings_or_load(settings)?;
    settings.debug_model |= opts.debug_model;
    settings.overwrite |= opts.overwrite;

    let output_path = match &opts.output_dir {
        Some(path) => path.clone(),
        None => get_output_dir(model_path)?,
    };
    let overwriting = create_output_directory(&output_path, settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    log::init(&settings.log_level, Some(&output_path))
        .context("Failed to initialise logging.")?;
    if overwriting {
        warn!("Overwriting results in {}", output_path.display());
    }

    let model = load_model(model_path).context("Failed to load model.")?;
    info!(
        "Loaded model from {} ({} scenarios, {} construction scenarios)",
        model_path.display(),
        model.scenarios.len(),
        model.construction_scenarios.len()
    );
    info!("Writing results to {}", output_path.display());

    crate::simulation::run(&model, &output_path, settings.debug_model)?;
    info!("Run complete");

    Ok(())
}

/// Load a model to check its inputs. No log files are written.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    load_model(model_path).context("Failed to validate model.")?;
    info!("{} is a valid model", model_path.display());

    Ok(())
}
