//! Functionality for running the building stock simulation.
use crate::building::{BuildingType, BuildingTypeID};
use crate::floor_area::FloorAreaDemand;
use crate::model::Model;
use crate::output::{DataWriter, write_metadata};
use crate::scenario::Scenario;
use crate::stock::DynamicStockModel;
use crate::structural_system::ConstructionScenarioID;
use crate::units::FloorArea;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{info, warn};
use std::path::Path;

pub mod age;
pub use age::{AgeBin, binned_age_distribution};
pub mod material;
pub use material::{MaterialFlow, MaterialFlows};
pub mod structure;
pub use structure::{StructuralFlows, SystemFlows, split_by_structural_system};

/// Floor area and material flows under one construction scenario
#[derive(Debug, Clone)]
pub struct ConstructionFlows {
    /// Floor area flows split by structural system
    pub structural: StructuralFlows,
    /// Material flows caused by construction and demolition
    pub materials: MaterialFlows,
}

/// Everything calculated for a single socio-economic scenario
#[derive(Debug, Clone)]
pub struct ScenarioFlows {
    /// Stock-driven floor area model for each building type
    pub building_types: IndexMap<BuildingTypeID, DynamicStockModel>,
    /// Age structure of each building type in the survey years
    pub age_structure: IndexMap<BuildingTypeID, Vec<AgeBin>>,
    /// Flows for each construction scenario
    pub construction: IndexMap<ConstructionScenarioID, ConstructionFlows>,
}

/// Run the simulation.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write additional information (e.g. cohort stocks) to file
pub fn run(model: &Model, output_path: &Path, debug_model: bool) -> Result<()> {
    write_metadata(output_path, &model.model_path).context("Failed to save metadata")?;
    let mut writer = DataWriter::create(output_path, debug_model)?;

    for scenario in model.scenarios.values() {
        info!("Scenario: {}", scenario.id);
        let flows = run_scenario(model, scenario)?;
        writer.write_scenario(&scenario.id, &flows)?;
    }

    writer.flush()?;

    Ok(())
}

/// Calculate floor area and material flows for one scenario, under every construction scenario
pub fn run_scenario(model: &Model, scenario: &Scenario) -> Result<ScenarioFlows> {
    let params = &model.parameters;
    let demand = FloorAreaDemand::for_scenario(scenario, params)?;

    let building_types = params
        .building_types
        .values()
        .map(|building_type| {
            let dsm = building_type_stock_model(model, &demand, building_type).with_context(
                || {
                    format!(
                        "Failed to model floor area of building type {} in scenario {}",
                        building_type.id, scenario.id
                    )
                },
            )?;
            Ok((building_type.id.clone(), dsm))
        })
        .collect::<Result<IndexMap<_, _>>>()?;

    let mut construction = IndexMap::new();
    for construction_scenario in model.construction_scenarios.values() {
        let structural = split_by_structural_system(
            &model.time_axis,
            params.base_year_index(),
            building_types.values(),
            &model.structural_systems,
            construction_scenario,
            &params.structural_lifetime,
        )
        .with_context(|| {
            format!(
                "Failed to split floor area for scenario {} with construction scenario {}",
                scenario.id, construction_scenario.id
            )
        })?;

        let materials = MaterialFlows::calculate(&structural, &model.material_intensities);
        construction.insert(
            construction_scenario.id.clone(),
            ConstructionFlows {
                structural,
                materials,
            },
        );
    }

    let age_structure = building_types
        .iter()
        .map(|(id, dsm)| (id.clone(), survey_age_structure(model, dsm)))
        .collect();

    let last = model.time_axis.len() - 1;
    let total_stock: f64 = building_types
        .values()
        .map(|dsm| dsm.stock_by_cohort().year_total(last))
        .sum();
    info!(
        "Floor area in {}: {:.1} million m² across {} building types",
        model.time_axis[last],
        total_stock,
        building_types.len()
    );

    Ok(ScenarioFlows {
        building_types,
        age_structure,
        construction,
    })
}

/// Binned age structure of a building type in every survey year
fn survey_age_structure(model: &Model, dsm: &DynamicStockModel) -> Vec<AgeBin> {
    let params = &model.parameters.age_distribution;
    params
        .survey_years
        .iter()
        .filter_map(|year| model.time_axis.position(*year))
        .flat_map(|year_index| binned_age_distribution(dsm, year_index, params.bin_width))
        .collect()
}

/// Build the stock-driven model for one building type, warning about anything suspicious
fn building_type_stock_model(
    model: &Model,
    demand: &FloorAreaDemand,
    building_type: &BuildingType,
) -> Result<DynamicStockModel> {
    let params = &model.parameters;
    let stock = demand
        .stock(building_type.floor_area_share)
        .into_iter()
        .map(FloorArea::value)
        .collect_vec();
    let dsm = DynamicStockModel::stock_driven_with_policy(
        &model.time_axis,
        &stock,
        &building_type.lifetime,
        params.negative_inflow_policy,
    )?;

    for negative in dsm.negative_inflows() {
        if negative.corrected {
            warn!(
                "Floor area of {} shrinks faster than demolition in {}: removed {:.4} million m² \
                 from existing cohorts",
                building_type.id, negative.year, negative.shortfall
            );
        } else {
            warn!(
                "Floor area of {} shrinks faster than demolition in {}: negative inflow of {:.4} \
                 million m²",
                building_type.id, negative.year, negative.shortfall
            );
        }
    }

    let report = dsm.balance_report(params.balance_tolerance);
    if !report.is_within_tolerance() {
        warn!(
            "Mass balance of {} not closed: residual of {:e} in {} exceeds tolerance of {:e}",
            building_type.id, report.max_abs_residual, report.year, report.tolerance
        );
    }

    Ok(dsm)
}
