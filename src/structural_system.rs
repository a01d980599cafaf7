//! Structural systems (e.g. steel frame, light wood frame) which the floor area is built with, and
//! the construction scenarios which decide how new floor area is split between them.
use crate::id::define_id_type;
use crate::units::Dimensionless;
use indexmap::IndexMap;

define_id_type! {StructuralSystemID}
define_id_type! {ConstructionScenarioID}

/// A map of [`StructuralSystem`]s, keyed by structural system ID
pub type StructuralSystemMap = IndexMap<StructuralSystemID, StructuralSystem>;

/// A map of [`ConstructionScenario`]s, keyed by construction scenario ID
pub type ConstructionScenarioMap = IndexMap<ConstructionScenarioID, ConstructionScenario>;

/// A way of building floor area, which determines the materials it contains
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralSystem {
    /// A unique identifier for the structural system
    pub id: StructuralSystemID,
    /// A text description of the structural system
    pub description: String,
    /// Share of the floor area standing in the base year which uses this system
    pub existing_share: Dimensionless,
}

/// The mix of structural systems used for floor area built after the base year
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionScenario {
    /// A unique identifier for the construction scenario
    pub id: ConstructionScenarioID,
    /// Share of new floor area built with each structural system
    pub new_shares: IndexMap<StructuralSystemID, Dimensionless>,
}

impl ConstructionScenario {
    /// The share of new floor area built with `system` (zero if the scenario does not use it)
    pub fn new_share(&self, system: &StructuralSystemID) -> Dimensionless {
        self.new_shares
            .get(system)
            .copied()
            .unwrap_or(Dimensionless(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    #[test]
    fn test_new_share() {
        let scenario = ConstructionScenario {
            id: "timber_high".into(),
            new_shares: indexmap! {"mass_timber".into() => Dimensionless(0.6)},
        };
        assert_eq!(scenario.new_share(&"mass_timber".into()), Dimensionless(0.6));
        assert_eq!(scenario.new_share(&"steel".into()), Dimensionless(0.0));
    }
}
