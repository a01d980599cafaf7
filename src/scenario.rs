//! Socio-economic scenarios which drive the demand for floor area.
use crate::id::define_id_type;
use crate::interpolation::AnchorSeries;
use indexmap::IndexMap;

define_id_type! {ScenarioID}

/// A map of [`Scenario`]s, keyed by scenario ID
pub type ScenarioMap = IndexMap<ScenarioID, Scenario>;

/// A projection of population and income (e.g. a shared socio-economic pathway)
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// A unique identifier for the scenario (e.g. SSP1)
    pub id: ScenarioID,
    /// A text description of the scenario
    pub description: String,
    /// Elasticity of floor area per capita with respect to income after the base year
    pub income_elasticity: f64,
    /// Population anchor points
    pub population: AnchorSeries,
    /// GDP per capita anchor points
    pub gdp_per_capita: AnchorSeries,
}
