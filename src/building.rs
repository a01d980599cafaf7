//! Building types, which divide the total floor area into separately modelled stocks.
use crate::id::define_id_type;
use crate::input::deserialise_proportion;
use crate::stock::LifetimeSpec;
use crate::units::Dimensionless;
use indexmap::IndexMap;
use serde::Deserialize;

define_id_type! {BuildingTypeID}

/// A map of [`BuildingType`]s, keyed by building type ID
pub type BuildingTypeMap = IndexMap<BuildingTypeID, BuildingType>;

/// A category of buildings (e.g. residential) with its own lifetime
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildingType {
    /// A unique identifier for the building type
    pub id: BuildingTypeID,
    /// A text description of the building type
    #[serde(default)]
    pub description: String,
    /// Share of the total floor area per capita taken up by this building type
    #[serde(deserialize_with = "deserialise_proportion")]
    pub floor_area_share: Dimensionless,
    /// How long buildings of this type stay in service
    pub lifetime: LifetimeSpec,
}
