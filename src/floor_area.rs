//! Demand for floor area, projected from population and income.
//!
//! Floor area per capita follows the EDGE elasticity model. Up to the base year it is
//! `alpha * GDP^beta * D^gamma`, where `D` is population density and `alpha` is calibrated so that
//! the base year matches the observed floor area per capita. After the base year it grows from the
//! previous year with the scenario's income elasticity instead of the historical one.
use crate::model::{FloorAreaParameters, ModelParameters};
use crate::scenario::Scenario;
use crate::units::{Dimensionless, FloorArea};
use anyhow::{Context, Result};
use log::debug;

/// Square metres in one unit of [`FloorArea`]
const SQUARE_METRES_PER_UNIT: f64 = 1e6;

/// Population, income and floor area per capita of a scenario in every model year
#[derive(Debug, Clone, PartialEq)]
pub struct FloorAreaDemand {
    /// Population
    pub population: Vec<f64>,
    /// GDP per capita
    pub gdp_per_capita: Vec<f64>,
    /// Floor area per capita (m²/person)
    pub floor_area_per_capita: Vec<f64>,
}

impl FloorAreaDemand {
    /// Interpolate the scenario's drivers onto the model years and project floor area per capita
    pub fn for_scenario(scenario: &Scenario, params: &ModelParameters) -> Result<Self> {
        let years = params.years();
        let population = scenario
            .population
            .interpolate(&years, params.interpolation)
            .with_context(|| format!("Could not interpolate population for {}", scenario.id))?;
        let gdp_per_capita = scenario
            .gdp_per_capita
            .interpolate(&years, params.interpolation)
            .with_context(|| format!("Could not interpolate GDP for {}", scenario.id))?;

        let floor_area_per_capita = project_floor_area_per_capita(
            &params.floor_area,
            scenario.income_elasticity,
            &population,
            &gdp_per_capita,
            params.base_year_index(),
        );

        Ok(Self {
            population,
            gdp_per_capita,
            floor_area_per_capita,
        })
    }

    /// Total floor area stock for a building type with the given share, in every year
    pub fn stock(&self, share: Dimensionless) -> Vec<FloorArea> {
        self.population
            .iter()
            .zip(&self.floor_area_per_capita)
            .map(|(population, per_capita)| {
                FloorArea(population * per_capita / SQUARE_METRES_PER_UNIT) * share
            })
            .collect()
    }
}

/// Floor area per capita in every year.
///
/// # Arguments
///
/// * `params` - Calibration and elasticities of the floor area model
/// * `income_elasticity` - Income elasticity used after the base year
/// * `population` - Population in every year
/// * `gdp_per_capita` - GDP per capita in every year
/// * `base_index` - Index of the base year
pub fn project_floor_area_per_capita(
    params: &FloorAreaParameters,
    income_elasticity: f64,
    population: &[f64],
    gdp_per_capita: &[f64],
    base_index: usize,
) -> Vec<f64> {
    let beta = params.historical_income_elasticity;
    let gamma = params.density_elasticity;
    let density = population
        .iter()
        .map(|population| population / params.country_area)
        .collect::<Vec<_>>();

    let alpha = params.base_floor_area_per_capita
        / (gdp_per_capita[base_index].powf(beta) * density[base_index].powf(gamma));
    debug!("Calibrated floor area model: alpha = {alpha}");

    let mut floor_area = Vec::with_capacity(population.len());
    for (t, (gdp, density_t)) in gdp_per_capita.iter().zip(&density).enumerate() {
        let value = if t <= base_index {
            alpha * gdp.powf(beta) * density_t.powf(gamma)
        } else {
            let income_ratio = gdp / gdp_per_capita[t - 1];
            let density_ratio = density_t / density[t - 1];
            floor_area[t - 1] * income_ratio.powf(income_elasticity) * density_ratio.powf(gamma)
        };
        floor_area.push(value);
    }

    floor_area
}
