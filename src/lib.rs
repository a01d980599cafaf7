//! Common functionality for BSMFA, a building stock material flow analysis tool.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod building;
pub mod cli;
pub mod floor_area;
pub mod id;
pub mod input;
pub mod interpolation;
pub mod log;
pub mod material;
pub mod model;
pub mod output;
pub mod scenario;
pub mod settings;
pub mod simulation;
pub mod stock;
pub mod structural_system;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the path to the folder where program configuration files are stored
pub fn get_bsmfa_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No config dir found on this platform, so fall back to the current directory
        return PathBuf::new();
    };

    config_dir.push("bsmfa");
    config_dir
}
