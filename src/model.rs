//! The model represents the static input data provided by the user.
use crate::input::material::read_material_intensities;
use crate::input::scenario::read_scenarios;
use crate::input::structural_system::{read_construction_scenarios, read_structural_systems};
use crate::material::MaterialIntensityMap;
use crate::scenario::ScenarioMap;
use crate::stock::TimeAxis;
use crate::structural_system::{ConstructionScenarioMap, StructuralSystemMap};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub mod parameters;
pub use parameters::{AgeDistributionParameters, FloorAreaParameters, ModelParameters};

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Every model year
    pub time_axis: TimeAxis,
    /// Socio-economic scenarios to run
    pub scenarios: ScenarioMap,
    /// Structural systems the floor area is split between
    pub structural_systems: StructuralSystemMap,
    /// Mixes of structural systems for new construction
    pub construction_scenarios: ConstructionScenarioMap,
    /// Material intensities of each structural system
    pub material_intensities: MaterialIntensityMap,
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let model_dir = model_dir.as_ref();
        let parameters = ModelParameters::from_path(model_dir)?;
        let time_axis = parameters.time_axis()?;
        let scenarios = read_scenarios(model_dir, (parameters.start_year, parameters.end_year))?;
        let structural_systems = read_structural_systems(model_dir)?;
        let construction_scenarios = read_construction_scenarios(model_dir, &structural_systems)?;
        let material_intensities = read_material_intensities(model_dir, &structural_systems)?;

        Ok(Model {
            model_path: model_dir.to_path_buf(),
            parameters,
            time_axis,
            scenarios,
            structural_systems,
            construction_scenarios,
            material_intensities,
        })
    }
}
