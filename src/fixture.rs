//! Fixtures for tests

use crate::building::{BuildingType, BuildingTypeMap};
use crate::interpolation::AnchorSeries;
use crate::material::MaterialIntensityMap;
use crate::model::{Model, ModelParameters};
use crate::scenario::Scenario;
use crate::stock::LifetimeSpec;
use crate::structural_system::{
    ConstructionScenario, ConstructionScenarioMap, StructuralSystem, StructuralSystemMap,
};
use crate::units::{Dimensionless, MaterialIntensity};
use indexmap::indexmap;
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

const MODEL_PARAMETERS_TOML: &str = r#"
start_year = 2000
end_year = 2030
base_year = 2015
interpolation = "linear"

[structural_lifetime]
distribution = "weibull"
shape = 3.0
scale = 100.0

[age_distribution]
survey_years = [2015]
bin_width = 10

[[building_types]]
id = "residential"
floor_area_share = 0.75
lifetime = { distribution = "normal", mean = 80.0, std_dev = 16.0 }

[[building_types]]
id = "commercial"
floor_area_share = 0.25
lifetime = { distribution = "fixed", mean = 70.0 }
"#;

#[fixture]
pub fn building_types() -> BuildingTypeMap {
    indexmap! {
        "residential".into() => BuildingType {
            id: "residential".into(),
            description: String::new(),
            floor_area_share: Dimensionless(0.75),
            lifetime: LifetimeSpec::normal(80.0, 16.0),
        },
        "commercial".into() => BuildingType {
            id: "commercial".into(),
            description: String::new(),
            floor_area_share: Dimensionless(0.25),
            lifetime: LifetimeSpec::fixed(70.0),
        },
    }
}

#[fixture]
pub fn model_parameters() -> ModelParameters {
    let mut params: ModelParameters = toml::from_str(MODEL_PARAMETERS_TOML).unwrap();
    params.validate().unwrap();
    params
}

#[fixture]
pub fn scenario() -> Scenario {
    Scenario {
        id: "SSP2".into(),
        description: "Middle of the road".into(),
        income_elasticity: 0.5,
        population: AnchorSeries::new([
            (2000, 5.0e6),
            (2010, 5.5e6),
            (2020, 6.0e6),
            (2030, 6.2e6),
        ])
        .unwrap(),
        gdp_per_capita: AnchorSeries::new([
            (2000, 3.0e4),
            (2010, 3.5e4),
            (2020, 4.2e4),
            (2030, 5.0e4),
        ])
        .unwrap(),
    }
}

#[fixture]
pub fn structural_systems() -> StructuralSystemMap {
    indexmap! {
        "light_wood".into() => StructuralSystem {
            id: "light_wood".into(),
            description: "Light wood frame".into(),
            existing_share: Dimensionless(0.6),
        },
        "steel_frame".into() => StructuralSystem {
            id: "steel_frame".into(),
            description: "Steel frame".into(),
            existing_share: Dimensionless(0.4),
        },
    }
}

#[fixture]
pub fn construction_scenario() -> ConstructionScenario {
    ConstructionScenario {
        id: "baseline".into(),
        new_shares: indexmap! {
            "light_wood".into() => Dimensionless(0.3),
            "steel_frame".into() => Dimensionless(0.7),
        },
    }
}

#[fixture]
pub fn construction_scenarios(
    construction_scenario: ConstructionScenario,
) -> ConstructionScenarioMap {
    let timber_high = ConstructionScenario {
        id: "timber_high".into(),
        new_shares: indexmap! {
            "light_wood".into() => Dimensionless(0.8),
            "steel_frame".into() => Dimensionless(0.2),
        },
    };

    indexmap! {
        construction_scenario.id.clone() => construction_scenario,
        timber_high.id.clone() => timber_high,
    }
}

#[fixture]
pub fn material_intensities() -> MaterialIntensityMap {
    let mut map = MaterialIntensityMap::default();
    map.insert("light_wood".into(), "lumber".into(), MaterialIntensity(40.0));
    map.insert("light_wood".into(), "concrete".into(), MaterialIntensity(100.0));
    map.insert("steel_frame".into(), "steel".into(), MaterialIntensity(75.0));
    map.insert("steel_frame".into(), "concrete".into(), MaterialIntensity(500.0));
    map
}

#[fixture]
pub fn model(
    model_parameters: ModelParameters,
    scenario: Scenario,
    structural_systems: StructuralSystemMap,
    construction_scenarios: ConstructionScenarioMap,
    material_intensities: MaterialIntensityMap,
) -> Model {
    let time_axis = model_parameters.time_axis().unwrap();
    Model {
        model_path: PathBuf::from("model"),
        parameters: model_parameters,
        time_axis,
        scenarios: indexmap! { scenario.id.clone() => scenario },
        structural_systems,
        construction_scenarios,
        material_intensities,
    }
}
