//! The module responsible for writing output data to disk.
use crate::building::BuildingTypeID;
use crate::material::MaterialID;
use crate::scenario::ScenarioID;
use crate::simulation::{AgeBin, ConstructionFlows, ScenarioFlows};
use crate::stock::DynamicStockModel;
use crate::structural_system::{ConstructionScenarioID, StructuralSystemID};
use crate::units::{FloorArea, Mass};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;
pub use metadata::write_metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "bsmfa_results";

/// The output file name for floor area flows by building type
const FLOOR_AREA_FLOWS_FILE_NAME: &str = "floor_area_flows.csv";

/// The output file name for floor area flows by structural system
const STRUCTURAL_FLOWS_FILE_NAME: &str = "structural_flows.csv";

/// The output file name for material flows
const MATERIAL_FLOWS_FILE_NAME: &str = "material_flows.csv";

/// The output file name for the age structure in survey years
const AGE_DISTRIBUTION_FILE_NAME: &str = "age_distribution.csv";

/// The output file name for the stock of each cohort
const COHORT_STOCK_FILE_NAME: &str = "debug_cohort_stock.csv";

/// The output file name for negative inflows
const NEGATIVE_INFLOW_FILE_NAME: &str = "debug_negative_inflow.csv";

/// Get the default output directory for the model specified at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model, if it doesn't already exist.
///
/// # Returns
///
/// Whether the contents of an existing, non-empty folder will be overwritten. An error is returned
/// if the folder is non-empty and `allow_overwrite` is false.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        if is_empty {
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to replace its contents."
        );

        return Ok(true);
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// Represents a row in the floor area flows CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct FloorAreaFlowRow {
    scenario_id: ScenarioID,
    building_type_id: BuildingTypeID,
    year: u32,
    stock: f64,
    inflow: f64,
    outflow: f64,
    stock_change: f64,
    balance_residual: f64,
}

/// Represents a row in the structural flows CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct StructuralFlowRow {
    scenario_id: ScenarioID,
    construction_scenario_id: ConstructionScenarioID,
    structural_system_id: StructuralSystemID,
    year: u32,
    stock: FloorArea,
    inflow: FloorArea,
    outflow: FloorArea,
}

/// Represents a row in the material flows CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct MaterialFlowRow {
    scenario_id: ScenarioID,
    construction_scenario_id: ConstructionScenarioID,
    year: u32,
    material: MaterialID,
    inflow: Mass,
    outflow: Mass,
}

/// Represents a row in the age distribution CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct AgeDistributionRow {
    scenario_id: ScenarioID,
    building_type_id: BuildingTypeID,
    year: u32,
    min_age: u32,
    max_age: u32,
    share: f64,
}

/// Represents a row in the cohort stock CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CohortStockRow {
    scenario_id: ScenarioID,
    building_type_id: BuildingTypeID,
    year: u32,
    cohort: u32,
    stock: f64,
}

/// Represents a row in the negative inflow CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct NegativeInflowRow {
    scenario_id: ScenarioID,
    building_type_id: BuildingTypeID,
    year: u32,
    shortfall: f64,
    corrected: bool,
}

/// For writing extra debug information about the model
struct DebugDataWriter {
    cohort_stock_writer: csv::Writer<File>,
    negative_inflow_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            cohort_stock_writer: new_writer(COHORT_STOCK_FILE_NAME)?,
            negative_inflow_writer: new_writer(NEGATIVE_INFLOW_FILE_NAME)?,
        })
    }

    /// Write the non-zero entries of the cohort stock matrix
    fn write_cohort_stock(
        &mut self,
        scenario_id: &ScenarioID,
        building_type_id: &BuildingTypeID,
        dsm: &DynamicStockModel,
    ) -> Result<()> {
        let years = dsm.years();
        for (t, row) in dsm.stock_by_cohort().iter_rows().enumerate() {
            for (c, stock) in row.iter().enumerate().filter(|(_, stock)| **stock != 0.0) {
                let row = CohortStockRow {
                    scenario_id: scenario_id.clone(),
                    building_type_id: building_type_id.clone(),
                    year: years[t],
                    cohort: years[c],
                    stock: *stock,
                };
                self.cohort_stock_writer.serialize(row)?;
            }
        }

        Ok(())
    }

    /// Write the years in which a negative inflow was needed
    fn write_negative_inflows(
        &mut self,
        scenario_id: &ScenarioID,
        building_type_id: &BuildingTypeID,
        dsm: &DynamicStockModel,
    ) -> Result<()> {
        for negative in dsm.negative_inflows() {
            let row = NegativeInflowRow {
                scenario_id: scenario_id.clone(),
                building_type_id: building_type_id.clone(),
                year: negative.year,
                shortfall: negative.shortfall,
                corrected: negative.corrected,
            };
            self.negative_inflow_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.cohort_stock_writer.flush()?;
        self.negative_inflow_writer.flush()?;

        Ok(())
    }
}

/// An object for writing scenario results to file
pub struct DataWriter {
    floor_area_writer: csv::Writer<File>,
    structural_writer: csv::Writer<File>,
    material_writer: csv::Writer<File>,
    age_writer: csv::Writer<File>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(output_path: &Path, save_debug_info: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let debug_writer = if save_debug_info {
            // Create debug CSV files
            Some(DebugDataWriter::create(output_path)?)
        } else {
            None
        };

        Ok(Self {
            floor_area_writer: new_writer(FLOOR_AREA_FLOWS_FILE_NAME)?,
            structural_writer: new_writer(STRUCTURAL_FLOWS_FILE_NAME)?,
            material_writer: new_writer(MATERIAL_FLOWS_FILE_NAME)?,
            age_writer: new_writer(AGE_DISTRIBUTION_FILE_NAME)?,
            debug_writer,
        })
    }

    /// Write all results for a scenario
    pub fn write_scenario(
        &mut self,
        scenario_id: &ScenarioID,
        flows: &ScenarioFlows,
    ) -> Result<()> {
        for (building_type_id, dsm) in &flows.building_types {
            self.write_floor_area_flows(scenario_id, building_type_id, dsm)?;
            if let Some(wtr) = &mut self.debug_writer {
                wtr.write_cohort_stock(scenario_id, building_type_id, dsm)?;
                wtr.write_negative_inflows(scenario_id, building_type_id, dsm)?;
            }
        }
        for (building_type_id, bins) in &flows.age_structure {
            self.write_age_distribution(scenario_id, building_type_id, bins)?;
        }
        for (construction_id, construction) in &flows.construction {
            self.write_structural_flows(scenario_id, construction_id, construction)?;
            self.write_material_flows(scenario_id, construction_id, construction)?;
        }

        Ok(())
    }

    /// Write the stock, inflow and outflow of a building type, with its balance residuals
    fn write_floor_area_flows(
        &mut self,
        scenario_id: &ScenarioID,
        building_type_id: &BuildingTypeID,
        dsm: &DynamicStockModel,
    ) -> Result<()> {
        let stock = dsm.total_stock();
        let outflow = dsm.total_outflow();
        let stock_change = dsm.stock_change();
        let residuals = dsm.check_balance();
        for (t, year) in dsm.years().iter().enumerate() {
            let row = FloorAreaFlowRow {
                scenario_id: scenario_id.clone(),
                building_type_id: building_type_id.clone(),
                year: *year,
                stock: stock[t],
                inflow: dsm.total_inflow()[t],
                outflow: outflow[t],
                stock_change: stock_change[t],
                balance_residual: residuals[t],
            };
            self.floor_area_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the binned age structure of a building type
    fn write_age_distribution(
        &mut self,
        scenario_id: &ScenarioID,
        building_type_id: &BuildingTypeID,
        bins: &[AgeBin],
    ) -> Result<()> {
        for bin in bins {
            let row = AgeDistributionRow {
                scenario_id: scenario_id.clone(),
                building_type_id: building_type_id.clone(),
                year: bin.year,
                min_age: bin.min_age,
                max_age: bin.max_age,
                share: bin.share,
            };
            self.age_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write floor area flows by structural system
    fn write_structural_flows(
        &mut self,
        scenario_id: &ScenarioID,
        construction_id: &ConstructionScenarioID,
        flows: &ConstructionFlows,
    ) -> Result<()> {
        let years = flows.structural.years();
        for (system_id, system_flows) in flows.structural.iter() {
            for (t, year) in years.iter().enumerate() {
                let row = StructuralFlowRow {
                    scenario_id: scenario_id.clone(),
                    construction_scenario_id: construction_id.clone(),
                    structural_system_id: system_id.clone(),
                    year: *year,
                    stock: system_flows.stock[t],
                    inflow: system_flows.inflow[t],
                    outflow: system_flows.outflow[t],
                };
                self.structural_writer.serialize(row)?;
            }
        }

        Ok(())
    }

    /// Write material flows
    fn write_material_flows(
        &mut self,
        scenario_id: &ScenarioID,
        construction_id: &ConstructionScenarioID,
        flows: &ConstructionFlows,
    ) -> Result<()> {
        let years = flows.materials.years();
        for (t, year) in years.iter().enumerate() {
            for (material, material_flow) in flows.materials.iter() {
                let row = MaterialFlowRow {
                    scenario_id: scenario_id.clone(),
                    construction_scenario_id: construction_id.clone(),
                    year: *year,
                    material: material.clone(),
                    inflow: material_flow.inflow[t],
                    outflow: material_flow.outflow[t],
                };
                self.material_writer.serialize(row)?;
            }
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.floor_area_writer.flush()?;
        self.structural_writer.flush()?;
        self.material_writer.flush()?;
        self.age_writer.flush()?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{model, scenario};
    use crate::model::Model;
    use crate::scenario::Scenario;
    use crate::simulation::run_scenario;
    use itertools::Itertools;
    use rstest::{fixture, rstest};
    use tempfile::tempdir;

    #[fixture]
    fn flows(model: Model, scenario: Scenario) -> ScenarioFlows {
        run_scenario(&model, &scenario).unwrap()
    }

    fn read_rows<T: for<'de> Deserialize<'de>>(file_path: &Path) -> Vec<T> {
        csv::Reader::from_path(file_path)
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap()
    }

    #[rstest]
    fn test_write_scenario(flows: ScenarioFlows) {
        let scenario_id = ScenarioID::new("SSP2");
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path(), false).unwrap();
            writer.write_scenario(&scenario_id, &flows).unwrap();
            writer.flush().unwrap();
        }

        let floor_area: Vec<FloorAreaFlowRow> =
            read_rows(&dir.path().join(FLOOR_AREA_FLOWS_FILE_NAME));
        assert_eq!(floor_area.len(), 2 * 31);
        assert_eq!(floor_area[0].year, 2000);
        assert_eq!(floor_area[0].building_type_id, BuildingTypeID::new("residential"));
        assert!(floor_area.iter().all(|row| row.balance_residual.abs() < 1e-6));

        // Two construction scenarios, two structural systems and three materials
        let structural: Vec<StructuralFlowRow> =
            read_rows(&dir.path().join(STRUCTURAL_FLOWS_FILE_NAME));
        assert_eq!(structural.len(), 2 * 2 * 15);
        assert_eq!(structural[0].year, 2016);
        assert_eq!(
            structural[0].construction_scenario_id,
            ConstructionScenarioID::new("baseline")
        );
        assert_eq!(
            structural[30].construction_scenario_id,
            ConstructionScenarioID::new("timber_high")
        );

        let materials: Vec<MaterialFlowRow> =
            read_rows(&dir.path().join(MATERIAL_FLOWS_FILE_NAME));
        assert_eq!(materials.len(), 2 * 3 * 15);

        // Ages 0-9 and 10-19 in 2015 for each building type
        let ages: Vec<AgeDistributionRow> =
            read_rows(&dir.path().join(AGE_DISTRIBUTION_FILE_NAME));
        assert_eq!(ages.len(), 2 * 2);
        assert_eq!((ages[1].min_age, ages[1].max_age), (10, 19));
        assert!(ages.iter().all(|row| row.year == 2015));

        // Debug files are only written when requested
        assert!(!dir.path().join(COHORT_STOCK_FILE_NAME).exists());
    }

    #[rstest]
    fn test_write_debug_info(flows: ScenarioFlows) {
        let scenario_id = ScenarioID::new("SSP2");
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path(), true).unwrap();
            writer.write_scenario(&scenario_id, &flows).unwrap();
            writer.flush().unwrap();
        }

        let cohorts: Vec<CohortStockRow> = read_rows(&dir.path().join(COHORT_STOCK_FILE_NAME));
        assert!(!cohorts.is_empty());
        assert!(cohorts.iter().all(|row| row.cohort <= row.year && row.stock != 0.0));

        // The fixture's floor area never shrinks, so there are no negative inflows
        let contents = fs::read_to_string(dir.path().join(NEGATIVE_INFLOW_FILE_NAME)).unwrap();
        assert!(contents.is_empty());
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();

        // New directory
        let output_dir = dir.path().join("results");
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // Existing, empty directory
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // Existing, non-empty directory
        File::create(output_dir.join("file.txt")).unwrap();
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
    }
}
