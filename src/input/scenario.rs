//! Code for reading in scenarios and their population and GDP projections.
use super::series::{read_gdp, read_population};
use super::{input_err_msg, read_csv, try_insert};
use crate::scenario::{Scenario, ScenarioID, ScenarioMap};
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::path::Path;

const SCENARIOS_FILE_NAME: &str = "scenarios.csv";

#[derive(Deserialize, PartialEq, Debug)]
struct ScenarioRaw {
    id: ScenarioID,
    description: String,
    income_elasticity: f64,
}

/// Read scenarios from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `years` - First and last model year
///
/// # Returns
///
/// A map of [`Scenario`]s, keyed by scenario ID
pub fn read_scenarios(model_dir: &Path, years: (u32, u32)) -> Result<ScenarioMap> {
    let file_path = model_dir.join(SCENARIOS_FILE_NAME);
    let raw = read_scenarios_from_iter(read_csv(&file_path)?.into_iter())
        .with_context(|| input_err_msg(&file_path))?;

    let scenario_ids: IndexSet<_> = raw.keys().cloned().collect();
    let population = read_population(model_dir, &scenario_ids, years)?;
    let gdp = read_gdp(model_dir, &scenario_ids, years)?;

    // Both series maps are in the same order as the scenarios
    Ok(raw
        .into_iter()
        .zip(population.into_values())
        .zip(gdp.into_values())
        .map(|(((id, scenario), population), gdp_per_capita)| {
            let scenario = Scenario {
                id: id.clone(),
                description: scenario.description,
                income_elasticity: scenario.income_elasticity,
                population,
                gdp_per_capita,
            };
            (id, scenario)
        })
        .collect())
}

fn read_scenarios_from_iter<I>(iter: I) -> Result<IndexMap<ScenarioID, ScenarioRaw>>
where
    I: Iterator<Item = ScenarioRaw>,
{
    let mut map = IndexMap::new();
    for scenario in iter {
        ensure!(
            scenario.income_elasticity.is_finite(),
            "income_elasticity for scenario {} must be a finite number",
            scenario.id
        );
        let id = scenario.id.clone();
        try_insert(&mut map, &id, scenario)?;
    }

    Ok(map)
}
