//! Code for reading in the material intensities of structural systems.
use super::{input_err_msg, read_csv};
use crate::id::IDCollection;
use crate::material::{MaterialID, MaterialIntensityMap};
use crate::structural_system::{StructuralSystemID, StructuralSystemMap};
use crate::units::MaterialIntensity;
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use std::path::Path;

const MATERIAL_INTENSITIES_FILE_NAME: &str = "material_intensities.csv";

#[derive(Deserialize, PartialEq, Debug)]
struct MaterialIntensityRaw {
    structural_system_id: StructuralSystemID,
    material: MaterialID,
    intensity: MaterialIntensity,
}

/// Read the material intensities (kg/m²) of each structural system.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `systems` - All structural systems
pub fn read_material_intensities(
    model_dir: &Path,
    systems: &StructuralSystemMap,
) -> Result<MaterialIntensityMap> {
    let file_path = model_dir.join(MATERIAL_INTENSITIES_FILE_NAME);
    let intensities = read_csv(&file_path)?;
    read_material_intensities_from_iter(intensities.into_iter(), systems)
        .with_context(|| input_err_msg(&file_path))
}

fn read_material_intensities_from_iter<I>(
    iter: I,
    systems: &StructuralSystemMap,
) -> Result<MaterialIntensityMap>
where
    I: Iterator<Item = MaterialIntensityRaw>,
{
    let mut map = MaterialIntensityMap::default();
    for raw in iter {
        let system_id = systems.get_id(&raw.structural_system_id)?;
        ensure!(
            raw.intensity.is_finite() && raw.intensity >= MaterialIntensity(0.0),
            "Intensity of {} in {system_id} must be a finite, non-negative number",
            raw.material
        );

        let material = raw.material.clone();
        ensure!(
            map.insert(system_id.clone(), raw.material, raw.intensity)
                .is_none(),
            "Duplicate intensity for {material} in {system_id}"
        );
    }

    for system_id in systems.keys() {
        if !map.contains_system(system_id) {
            warn!("No material intensities provided for structural system {system_id}");
        }
    }

    Ok(map)
}
