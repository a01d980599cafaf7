//! Code for reading the population and GDP anchor points of each scenario.
use super::{input_err_msg, read_csv};
use crate::id::IDCollection;
use crate::interpolation::AnchorSeries;
use crate::scenario::ScenarioID;
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

const POPULATION_FILE_NAME: &str = "population.csv";
const GDP_FILE_NAME: &str = "gdp.csv";

/// A map of anchor series, keyed by scenario ID
pub type AnchorSeriesMap = IndexMap<ScenarioID, AnchorSeries>;

#[derive(Deserialize, PartialEq, Debug)]
struct PopulationRaw {
    scenario_id: ScenarioID,
    year: u32,
    population: f64,
}

#[derive(Deserialize, PartialEq, Debug)]
struct GDPRaw {
    scenario_id: ScenarioID,
    year: u32,
    gdp_per_capita: f64,
}

/// A row of an anchor point file
trait AnchorRecord: DeserializeOwned {
    /// Name of the value column, for error messages
    const VALUE_NAME: &'static str;

    fn into_parts(self) -> (ScenarioID, u32, f64);
}

impl AnchorRecord for PopulationRaw {
    const VALUE_NAME: &'static str = "population";

    fn into_parts(self) -> (ScenarioID, u32, f64) {
        (self.scenario_id, self.year, self.population)
    }
}

impl AnchorRecord for GDPRaw {
    const VALUE_NAME: &'static str = "gdp_per_capita";

    fn into_parts(self) -> (ScenarioID, u32, f64) {
        (self.scenario_id, self.year, self.gdp_per_capita)
    }
}

/// Read population anchor points for every scenario.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `scenario_ids` - All known scenario IDs
/// * `years` - First and last model year, which the anchors must cover
pub fn read_population(
    model_dir: &Path,
    scenario_ids: &IndexSet<ScenarioID>,
    years: (u32, u32),
) -> Result<AnchorSeriesMap> {
    read_anchor_file::<PopulationRaw>(&model_dir.join(POPULATION_FILE_NAME), scenario_ids, years)
}

/// Read GDP per capita anchor points for every scenario.
///
/// See [`read_population`] for the arguments.
pub fn read_gdp(
    model_dir: &Path,
    scenario_ids: &IndexSet<ScenarioID>,
    years: (u32, u32),
) -> Result<AnchorSeriesMap> {
    read_anchor_file::<GDPRaw>(&model_dir.join(GDP_FILE_NAME), scenario_ids, years)
}

fn read_anchor_file<T: AnchorRecord>(
    file_path: &Path,
    scenario_ids: &IndexSet<ScenarioID>,
    years: (u32, u32),
) -> Result<AnchorSeriesMap> {
    let records = read_csv::<T>(file_path)?;
    read_anchor_series_from_iter(
        records.into_iter().map(AnchorRecord::into_parts),
        T::VALUE_NAME,
        scenario_ids,
        years,
    )
    .with_context(|| input_err_msg(file_path))
}

fn read_anchor_series_from_iter<I>(
    iter: I,
    value_name: &str,
    scenario_ids: &IndexSet<ScenarioID>,
    (start_year, end_year): (u32, u32),
) -> Result<AnchorSeriesMap>
where
    I: Iterator<Item = (ScenarioID, u32, f64)>,
{
    let mut points: IndexMap<ScenarioID, Vec<(u32, f64)>> = IndexMap::new();
    for (scenario_id, year, value) in iter {
        let scenario_id = scenario_ids.get_id(&scenario_id)?;
        ensure!(
            value.is_finite() && value > 0.0,
            "{value_name} for scenario {scenario_id} in {year} must be a finite number greater \
            than zero"
        );
        points.entry(scenario_id).or_default().push((year, value));
    }

    let mut map = AnchorSeriesMap::new();
    for scenario_id in scenario_ids {
        let scenario_points = points
            .shift_remove(scenario_id)
            .with_context(|| format!("No {value_name} data for scenario {scenario_id}"))?;
        let series = AnchorSeries::new(scenario_points)
            .with_context(|| format!("Invalid {value_name} data for scenario {scenario_id}"))?;

        let (first, last) = series.year_range();
        ensure!(
            first <= start_year && last >= end_year,
            "{value_name} data for scenario {scenario_id} must cover the model years \
            ({start_year}-{end_year}), but only covers {first}-{last}"
        );
        map.insert(scenario_id.clone(), series);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[fixture]
    fn scenario_ids() -> IndexSet<ScenarioID> {
        ["SSP1".into(), "SSP2".into()].into_iter().collect()
    }

    fn points(rows: &[(&str, u32, f64)]) -> impl Iterator<Item = (ScenarioID, u32, f64)> {
        rows.iter()
            .map(|(id, year, value)| ((*id).into(), *year, *value))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[rstest]
    fn test_read_anchor_series_from_iter(scenario_ids: IndexSet<ScenarioID>) {
        let iter = points(&[
            ("SSP1", 2000, 1.0),
            ("SSP2", 2000, 2.0),
            ("SSP1", 2010, 3.0),
            ("SSP2", 2010, 4.0),
        ]);
        let map =
            read_anchor_series_from_iter(iter, "population", &scenario_ids, (2000, 2010)).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["SSP1"].values(), [1.0, 3.0]);
        assert_eq!(map["SSP2"].year_range(), (2000, 2010));
    }

    #[rstest]
    #[case(&[("SSP3", 2000, 1.0)], "Unknown ID SSP3 found")]
    #[case(
        &[("SSP1", 2000, 0.0)],
        "population for scenario SSP1 in 2000 must be a finite number greater than zero"
    )]
    #[case(
        &[("SSP1", 2000, 1.0), ("SSP1", 2010, 1.0)],
        "No population data for scenario SSP2"
    )]
    #[case(
        &[("SSP1", 2000, 1.0), ("SSP1", 2005, 1.0), ("SSP2", 2000, 1.0), ("SSP2", 2010, 1.0)],
        "population data for scenario SSP1 must cover the model years (2000-2010), but only \
        covers 2000-2005"
    )]
    #[case(
        &[("SSP1", 2010, 1.0), ("SSP1", 2000, 1.0), ("SSP2", 2000, 1.0), ("SSP2", 2010, 1.0)],
        "Invalid population data for scenario SSP1"
    )]
    fn test_read_anchor_series_from_iter_invalid(
        scenario_ids: IndexSet<ScenarioID>,
        #[case] rows: &[(&str, u32, f64)],
        #[case] msg: &str,
    ) {
        assert_error!(
            read_anchor_series_from_iter(points(rows), "population", &scenario_ids, (2000, 2010)),
            msg
        );
    }

    #[rstest]
    fn test_read_gdp(scenario_ids: IndexSet<ScenarioID>) {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(GDP_FILE_NAME)).unwrap();
            writeln!(
                file,
                "scenario_id,year,gdp_per_capita\nSSP1,2000,40000\nSSP1,2020,50000\n\
                SSP2,2000,40000\nSSP2,2020,45000"
            )
            .unwrap();
        }

        let map = read_gdp(dir.path(), &scenario_ids, (2000, 2020)).unwrap();
        assert_eq!(map["SSP2"].values(), [40000.0, 45000.0]);
    }
}
