//! Integration tests for checking a model's inputs.
use bsmfa::cli::handle_validate_command;
use bsmfa::input::load_model;
use bsmfa::log::is_logger_initialised;
use bsmfa::settings::Settings;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const DEMO_MODEL_DIR: &str = "demos/simple";

/// Copy the demo model to `dest`, replacing the contents of one input file
fn copy_demo_with(dest: &Path, file_name: &str, contents: &str) {
    for entry in fs::read_dir(DEMO_MODEL_DIR).unwrap() {
        let path = entry.unwrap().path();
        fs::copy(&path, dest.join(path.file_name().unwrap())).unwrap();
    }
    fs::write(dest.join(file_name), contents).unwrap();
}

/// The demo model validates, and logging is started without writing log files.
#[test]
fn test_validate_demo_model() {
    unsafe { std::env::set_var("BSMFA_LOG_LEVEL", "off") };

    assert!(!is_logger_initialised());
    handle_validate_command(Path::new(DEMO_MODEL_DIR), Some(Settings::default())).unwrap();
    assert!(is_logger_initialised());
    assert!(!Path::new(DEMO_MODEL_DIR).join("bsmfa_info.log").exists());
}

/// A construction scenario naming a structural system the model lacks is rejected.
#[test]
fn test_validate_unknown_structural_system() {
    let dir = tempdir().unwrap();
    copy_demo_with(
        dir.path(),
        "construction_scenarios.csv",
        "construction_scenario_id,structural_system_id,new_share\nbaseline,adobe,1.0\n",
    );

    let err = load_model(dir.path()).unwrap_err();
    assert!(
        err.chain()
            .any(|cause| cause.to_string() == "Unknown ID adobe found"),
        "{err:?}"
    );
}

/// Survey years for the age structure must lie on the model's time axis.
#[test]
fn test_validate_survey_year_out_of_range() {
    let dir = tempdir().unwrap();
    let model_toml = fs::read_to_string(Path::new(DEMO_MODEL_DIR).join("model.toml"))
        .unwrap()
        .replace("survey_years = [2005, 2015]", "survey_years = [1990]");
    copy_demo_with(dir.path(), "model.toml", &model_toml);

    let err = load_model(dir.path()).unwrap_err();
    assert!(
        err.chain()
            .any(|cause| cause.to_string() == "Survey year 1990 is outside the model years"),
        "{err:?}"
    );
}
