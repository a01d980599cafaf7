//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::building::{BuildingType, BuildingTypeMap};
use crate::input::{check_fractions_sum_to_one, input_err_msg, read_toml, try_insert};
use crate::interpolation::InterpolationMethod;
use crate::stock::{LifetimeSpec, NegativeInflowPolicy, TimeAxis};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_balance_tolerance, f64, 1e-6);
define_param_default!(default_base_floor_area_per_capita, f64, 347.0);
define_param_default!(default_country_area, f64, 9.14759e6);
define_param_default!(default_density_elasticity, f64, -0.03);
define_param_default!(default_historical_income_elasticity, f64, 0.42);
define_param_default!(default_age_bin_width, u32, 10);

/// Parameters of the floor-area elasticity model
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct FloorAreaParameters {
    /// Floor area per capita in the base year (m²/person)
    #[serde(default = "default_base_floor_area_per_capita")]
    pub base_floor_area_per_capita: f64,
    /// Land area used to calculate population density (km²)
    #[serde(default = "default_country_area")]
    pub country_area: f64,
    /// Elasticity of floor area per capita with respect to population density
    #[serde(default = "default_density_elasticity")]
    pub density_elasticity: f64,
    /// Elasticity of floor area per capita with respect to income, up to the base year
    #[serde(default = "default_historical_income_elasticity")]
    pub historical_income_elasticity: f64,
}

impl Default for FloorAreaParameters {
    fn default() -> Self {
        Self {
            base_floor_area_per_capita: default_base_floor_area_per_capita(),
            country_area: default_country_area(),
            density_elasticity: default_density_elasticity(),
            historical_income_elasticity: default_historical_income_elasticity(),
        }
    }
}

/// Which years to report the binned age structure of the floor area stock for
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct AgeDistributionParameters {
    /// Years in which building surveys were carried out
    #[serde(default)]
    pub survey_years: Vec<u32>,
    /// Width of each age bin in years
    #[serde(default = "default_age_bin_width")]
    pub bin_width: u32,
}

impl Default for AgeDistributionParameters {
    fn default() -> Self {
        Self {
            survey_years: Vec::new(),
            bin_width: default_age_bin_width(),
        }
    }
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// First year of the simulation
    pub start_year: u32,
    /// Last year of the simulation
    pub end_year: u32,
    /// The last year with observed data; projections start in the year after
    pub base_year: u32,
    /// How to interpolate population and GDP anchor points
    #[serde(default)]
    pub interpolation: InterpolationMethod,
    /// What to do when the floor area stock shrinks faster than buildings are demolished
    #[serde(default)]
    pub negative_inflow_policy: NegativeInflowPolicy,
    /// Relative tolerance for the mass-balance check of each stock model
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: f64,
    /// Parameters of the floor-area elasticity model
    #[serde(default)]
    pub floor_area: FloorAreaParameters,
    /// Survey years for the age structure output
    #[serde(default)]
    pub age_distribution: AgeDistributionParameters,
    /// Lifetime of buildings when split by structural system
    pub structural_lifetime: LifetimeSpec,
    /// The building types, in the order they appear in the file
    #[serde(rename = "building_types")]
    building_types_raw: Vec<BuildingType>,
    /// The building types, keyed by ID
    #[serde(skip)]
    pub building_types: BuildingTypeMap,
}

/// Check that the model years are valid
fn check_years(start_year: u32, end_year: u32, base_year: u32) -> Result<()> {
    ensure!(
        start_year < end_year,
        "start_year must be before end_year"
    );
    ensure!(
        (start_year..end_year).contains(&base_year),
        "base_year must be between start_year and the year before end_year"
    );

    Ok(())
}

/// Check that the `balance_tolerance` parameter is valid
fn check_balance_tolerance(value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "balance_tolerance must be a finite number greater than zero"
    );

    Ok(())
}

/// Check the parameters of the floor-area elasticity model
fn check_floor_area_parameters(params: &FloorAreaParameters) -> Result<()> {
    ensure!(
        params.base_floor_area_per_capita.is_finite() && params.base_floor_area_per_capita > 0.0,
        "base_floor_area_per_capita must be a finite number greater than zero"
    );
    ensure!(
        params.country_area.is_finite() && params.country_area > 0.0,
        "country_area must be a finite number greater than zero"
    );
    ensure!(
        params.density_elasticity.is_finite() && params.historical_income_elasticity.is_finite(),
        "Elasticities must be finite numbers"
    );

    Ok(())
}

/// Check that the survey years are model years and the bins are non-empty
fn check_age_distribution_parameters(
    params: &AgeDistributionParameters,
    start_year: u32,
    end_year: u32,
) -> Result<()> {
    ensure!(params.bin_width > 0, "bin_width must be greater than zero");
    for year in &params.survey_years {
        ensure!(
            (start_year..=end_year).contains(year),
            "Survey year {year} is outside the model years"
        );
    }

    Ok(())
}

/// Check that the building types are unique, split the floor area fully and have usable lifetimes
fn build_building_type_map(
    building_types: &[BuildingType],
    n_years: usize,
) -> Result<BuildingTypeMap> {
    ensure!(!building_types.is_empty(), "No building types defined");

    let mut map = BuildingTypeMap::new();
    for building_type in building_types {
        building_type
            .lifetime
            .resolve(n_years)
            .with_context(|| format!("Invalid lifetime for building type {}", building_type.id))?;
        try_insert(&mut map, &building_type.id, building_type.clone())?;
    }

    check_fractions_sum_to_one(map.values().map(|bt| bt.floor_area_share))
        .context("Invalid floor_area_share values for building types")?;

    Ok(map)
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let mut model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    pub(crate) fn validate(&mut self) -> Result<()> {
        check_years(self.start_year, self.end_year, self.base_year)?;
        check_balance_tolerance(self.balance_tolerance)?;
        check_floor_area_parameters(&self.floor_area)?;
        check_age_distribution_parameters(&self.age_distribution, self.start_year, self.end_year)?;

        let n_years = self.years().len();
        self.structural_lifetime
            .resolve(n_years)
            .context("Invalid structural_lifetime")?;
        self.building_types = build_building_type_map(&self.building_types_raw, n_years)?;

        Ok(())
    }

    /// Every model year, from `start_year` to `end_year`
    pub fn years(&self) -> Vec<u32> {
        (self.start_year..=self.end_year).collect()
    }

    /// The model years as a time axis for stock models
    pub fn time_axis(&self) -> Result<TimeAxis> {
        Ok(TimeAxis::from_range(self.start_year..=self.end_year)?)
    }

    /// Index of the base year on the time axis
    pub fn base_year_index(&self) -> usize {
        (self.base_year - self.start_year) as usize
    }
}
