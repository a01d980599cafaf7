//! Code for reading in structural systems and construction scenarios.
use super::{
    check_fractions_sum_to_one, deserialise_proportion, input_err_msg, read_csv, try_insert,
};
use crate::id::IDCollection;
use crate::structural_system::{
    ConstructionScenario, ConstructionScenarioID, ConstructionScenarioMap, StructuralSystem,
    StructuralSystemID, StructuralSystemMap,
};
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const STRUCTURAL_SYSTEMS_FILE_NAME: &str = "structural_systems.csv";
const CONSTRUCTION_SCENARIOS_FILE_NAME: &str = "construction_scenarios.csv";

#[derive(Deserialize, PartialEq, Debug)]
struct StructuralSystemRaw {
    id: StructuralSystemID,
    description: String,
    #[serde(deserialize_with = "deserialise_proportion")]
    existing_share: Dimensionless,
}

#[derive(Deserialize, PartialEq, Debug)]
struct ConstructionShareRaw {
    construction_scenario_id: ConstructionScenarioID,
    structural_system_id: StructuralSystemID,
    #[serde(deserialize_with = "deserialise_proportion")]
    new_share: Dimensionless,
}

/// Read structural systems from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A map of [`StructuralSystem`]s, keyed by structural system ID
pub fn read_structural_systems(model_dir: &Path) -> Result<StructuralSystemMap> {
    let file_path = model_dir.join(STRUCTURAL_SYSTEMS_FILE_NAME);
    let systems = read_csv(&file_path)?;
    read_structural_systems_from_iter(systems.into_iter())
        .with_context(|| input_err_msg(&file_path))
}

fn read_structural_systems_from_iter<I>(iter: I) -> Result<StructuralSystemMap>
where
    I: Iterator<Item = StructuralSystemRaw>,
{
    let mut map = StructuralSystemMap::new();
    for raw in iter {
        let system = StructuralSystem {
            id: raw.id.clone(),
            description: raw.description,
            existing_share: raw.existing_share,
        };
        try_insert(&mut map, &raw.id, system)?;
    }

    check_fractions_sum_to_one(map.values().map(|system| system.existing_share))
        .context("Invalid existing_share values")?;

    Ok(map)
}

/// Read the construction scenarios, i.e. the structural system mix of new floor area.
///
/// Structural systems not listed for a scenario get no new floor area in it.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `systems` - All structural systems
pub fn read_construction_scenarios(
    model_dir: &Path,
    systems: &StructuralSystemMap,
) -> Result<ConstructionScenarioMap> {
    let file_path = model_dir.join(CONSTRUCTION_SCENARIOS_FILE_NAME);
    let shares = read_csv(&file_path)?;
    read_construction_scenarios_from_iter(shares.into_iter(), systems)
        .with_context(|| input_err_msg(&file_path))
}

fn read_construction_scenarios_from_iter<I>(
    iter: I,
    systems: &StructuralSystemMap,
) -> Result<ConstructionScenarioMap>
where
    I: Iterator<Item = ConstructionShareRaw>,
{
    let mut map = ConstructionScenarioMap::new();
    for raw in iter {
        let system_id = systems.get_id(&raw.structural_system_id)?;
        let scenario = map
            .entry(raw.construction_scenario_id.clone())
            .or_insert_with(|| ConstructionScenario {
                id: raw.construction_scenario_id.clone(),
                new_shares: IndexMap::new(),
            });
        ensure!(
            scenario
                .new_shares
                .insert(system_id.clone(), raw.new_share)
                .is_none(),
            "Duplicate share for {system_id} in construction scenario {}",
            raw.construction_scenario_id
        );
    }

    for scenario in map.values() {
        check_fractions_sum_to_one(scenario.new_shares.values().copied()).with_context(|| {
            format!("Invalid new_share values for construction scenario {}", scenario.id)
        })?;
    }

    Ok(map)
}
