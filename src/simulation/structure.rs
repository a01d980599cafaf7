//! Splitting the floor area stock between structural systems.
//!
//! Buildings standing in the base year are assigned to structural systems with the
//! `existing_share` of each system and then demolished according to the structural lifetime. Floor
//! area built after the base year is assigned with the `new_share` of a construction scenario. Only
//! the years after the base year are reported.
use crate::stock::{DynamicStockModel, LifetimeSpec, TimeAxis};
use crate::structural_system::{ConstructionScenario, StructuralSystemID, StructuralSystemMap};
use crate::units::{Dimensionless, FloorArea};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{info, warn};

/// Stock, inflow and outflow of floor area for one structural system
#[derive(Debug, Clone, PartialEq)]
pub struct SystemFlows {
    /// Floor area in use
    pub stock: Vec<FloorArea>,
    /// Floor area built
    pub inflow: Vec<FloorArea>,
    /// Floor area demolished
    pub outflow: Vec<FloorArea>,
}

/// Floor area flows of every structural system for the years after the base year
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralFlows {
    years: TimeAxis,
    systems: IndexMap<StructuralSystemID, SystemFlows>,
}

impl StructuralFlows {
    /// The reported years
    pub fn years(&self) -> &[u32] {
        self.years.years()
    }

    /// Iterate over the flows of each structural system
    pub fn iter(&self) -> impl Iterator<Item = (&StructuralSystemID, &SystemFlows)> {
        self.systems.iter()
    }

    /// Flows for a single structural system
    pub fn get(&self, id: &StructuralSystemID) -> Option<&SystemFlows> {
        self.systems.get(id)
    }

    /// Stock summed over all structural systems
    pub fn total_stock(&self) -> Vec<FloorArea> {
        (0..self.years.len())
            .map(|t| self.systems.values().map(|flows| flows.stock[t]).sum())
            .collect()
    }
}

/// Convert a series of values to floor area
fn to_floor_area(values: impl IntoIterator<Item = f64>) -> Vec<FloorArea> {
    values.into_iter().map(FloorArea).collect()
}

/// Split the stock described by the building-type models between structural systems.
///
/// # Arguments
///
/// * `years` - The full model time axis
/// * `base_index` - Index of the base year on `years`
/// * `building_types` - Stock-driven models for each building type
/// * `systems` - The structural systems and their shares of the existing stock
/// * `construction` - The shares of new floor area
/// * `lifetime` - Lifetime of buildings of every structural system
pub fn split_by_structural_system<'a, I>(
    years: &TimeAxis,
    base_index: usize,
    building_types: I,
    systems: &StructuralSystemMap,
    construction: &ConstructionScenario,
    lifetime: &LifetimeSpec,
) -> Result<StructuralFlows>
where
    I: IntoIterator<Item = &'a DynamicStockModel>,
{
    let switch_index = base_index + 1;
    let future_years = years.tail(switch_index)?;

    // Sum the cohorts standing in the base year and the construction afterwards
    let mut initial_stock = vec![0.0; switch_index];
    let mut new_inflow = vec![0.0; future_years.len()];
    let mut reference_stock = vec![0.0; future_years.len()];
    for model in building_types {
        let cohorts = model.stock_by_cohort().cohorts_in_year(base_index);
        for (total, value) in initial_stock.iter_mut().zip(cohorts) {
            *total += value;
        }
        for (total, value) in new_inflow
            .iter_mut()
            .zip(&model.total_inflow()[switch_index..])
        {
            *total += value;
        }
        for (total, value) in reference_stock
            .iter_mut()
            .zip(&model.total_stock()[switch_index..])
        {
            *total += value;
        }
    }

    // Negative values can only arise when negative inflows are kept
    if new_inflow.iter().chain(&initial_stock).any(|value| *value < 0.0) {
        warn!("Negative floor area treated as zero when splitting by structural system");
    }
    initial_stock.iter_mut().for_each(|value| *value = value.max(0.0));
    new_inflow.iter_mut().for_each(|value| *value = value.max(0.0));

    let mut flows = IndexMap::new();
    for system in systems.values() {
        let system_flows = system_flows(
            years,
            switch_index,
            system.existing_share,
            construction.new_share(&system.id),
            &initial_stock,
            &new_inflow,
            lifetime,
        )
        .with_context(|| format!("Failed to model floor area of structural system {}", system.id))?;
        flows.insert(system.id.clone(), system_flows);
    }

    let structural = StructuralFlows {
        years: future_years,
        systems: flows,
    };
    info!(
        "Mean difference between structural and building-type stock ({}): {:.3}%",
        construction.id,
        mean_percentage_difference(&structural.total_stock(), &reference_stock)
    );

    Ok(structural)
}

/// Combine the evolution of the existing stock with new construction for one system
fn system_flows(
    years: &TimeAxis,
    switch_index: usize,
    existing_share: Dimensionless,
    new_share: Dimensionless,
    initial_stock: &[f64],
    new_inflow: &[f64],
    lifetime: &LifetimeSpec,
) -> Result<SystemFlows> {
    let existing_share = existing_share.value();
    let new_share = new_share.value();

    let initial_stock = initial_stock.iter().map(|v| v * existing_share).collect_vec();
    let existing =
        DynamicStockModel::from_initial_stock(years, &initial_stock, switch_index, lifetime)?;

    let new_inflow = new_inflow.iter().map(|v| v * new_share).collect_vec();
    let new_lifetime = lifetime.skip_cohorts(switch_index);
    let future_years = years.tail(switch_index)?;
    let new = DynamicStockModel::inflow_driven(&future_years, &new_inflow, &new_lifetime)?;

    let existing_stock = &existing.total_stock()[switch_index..];
    let existing_outflow = &existing.total_outflow()[switch_index..];
    let new_stock = new.total_stock();
    let new_outflow = new.total_outflow();

    Ok(SystemFlows {
        stock: to_floor_area(existing_stock.iter().zip(&new_stock).map(|(a, b)| a + b)),
        inflow: to_floor_area(new.total_inflow().iter().copied()),
        outflow: to_floor_area(existing_outflow.iter().zip(&new_outflow).map(|(a, b)| a + b)),
    })
}

/// Mean relative difference (in %) between two stock series, over years with non-zero reference
fn mean_percentage_difference(stock: &[FloorArea], reference: &[f64]) -> f64 {
    let differences = stock
        .iter()
        .zip(reference)
        .filter(|(_, reference)| **reference > 0.0)
        .map(|(stock, reference)| 100.0 * (stock.value() - reference).abs() / reference)
        .collect_vec();
    if differences.is_empty() {
        return 0.0;
    }

    differences.iter().sum::<f64>() / differences.len() as f64
}
