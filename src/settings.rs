//! User settings for BSMFA, read from `settings.toml` in the user's config folder.
//!
//! Every setting is optional. Options given on the command line for a single run take precedence.
use crate::get_bsmfa_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Context, Result, anyhow};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const TEMPLATE_HEADER: &str = "# BSMFA settings
# Defaults are shown commented out. Uncomment a setting to change it.
";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Where BSMFA looks for `settings.toml`
pub fn get_settings_file_path() -> PathBuf {
    get_bsmfa_config_dir().join(SETTINGS_FILE_NAME)
}

/// BSMFA user settings
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Level of detail for console and log file messages (off, error, warn, info, debug or trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Replace the contents of a non-empty results folder instead of stopping
    #[serde(default)]
    pub overwrite: bool,
    /// Also write the cohort stock and negative inflow CSV files
    #[serde(default)]
    pub debug_model: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
            debug_model: false,
        }
    }
}

impl Settings {
    /// Load the user's settings, using the defaults if there is no settings file
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if file_path.is_file() {
            read_toml(file_path)
        } else {
            Ok(Settings::default())
        }
    }

    /// A settings file listing every setting with its description and default value.
    ///
    /// All settings are commented out, so the file loads to [`Settings::default`].
    pub fn template() -> Result<String> {
        let defaults = toml::Table::try_from(Settings::default())
            .context("Could not convert default settings to TOML")?;

        let mut out = TEMPLATE_HEADER.to_string();
        for (name, value) in &defaults {
            let docs = Settings::get_field_docs(name)
                .map_err(|_| anyhow!("No description for setting {name}"))?;
            writeln!(&mut out, "\n# {docs}")?;
            writeln!(&mut out, "# {name} = {value}")?;
        }

        Ok(out)
    }
}
