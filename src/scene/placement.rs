//! Plate filtering and positioning on the virtual build plate

use super::Aabb;
use crate::config::SceneConfig;
use crate::model::{DecodedModel, ObjectRecord};
use crate::transform::Transform;
use log::debug;

/// One object instance to render
#[derive(Debug, Clone, Copy)]
pub struct Instance<'m> {
    /// Instanced object
    pub object: &'m ObjectRecord,
    /// Placement in source space
    pub transform: Transform,
    /// Material forcing every mesh of this instance
    pub material_override: Option<usize>,
}

/// How the geometry was positioned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementCase {
    /// Aligned to the selected plate's bounding box from metadata
    PlateBounds,
    /// Shifted by the selected plate's offset from metadata
    ///
    /// The offset is the plate origin in model space. Subtracting it puts the
    /// plate's contents in plate-local coordinates, which share their origin
    /// with the virtual plate, so no further centering is applied.
    PlateOffset,
    /// Centered on the virtual plate and rested on the bed
    Centered,
}

/// Pick the instances to render
///
/// With a selected plate and plate assignments present, only placements on
/// that plate are kept; when that leaves nothing the full set is used. A
/// model without placements renders every object once, untransformed.
///
/// Returns the instances and the plate that was actually applied.
pub fn select_instances(
    model: &DecodedModel,
    selected_plate: Option<u32>,
) -> (Vec<Instance<'_>>, Option<u32>) {
    if model.placements.is_empty() {
        let instances = model
            .objects
            .iter()
            .map(|object| Instance {
                object,
                transform: Transform::identity(),
                material_override: None,
            })
            .collect();
        return (instances, None);
    }

    let to_instances = |plate: Option<u32>| {
        model
            .placements
            .iter()
            .filter(|p| plate.is_none() || p.plate == plate)
            .filter_map(|p| {
                model.object(&p.object_id).map(|object| Instance {
                    object,
                    transform: p.transform,
                    material_override: p.material_override,
                })
            })
            .collect::<Vec<_>>()
    };

    if let Some(plate) = selected_plate.filter(|_| model.has_plate_assignments()) {
        let filtered = to_instances(Some(plate));
        if !filtered.is_empty() {
            return (filtered, Some(plate));
        }
        debug!("Plate {} has no placements, showing all plates", plate);
    }

    (to_instances(None), None)
}

/// Translation (output space) that puts the geometry on the virtual plate
///
/// `plate` is the plate actually rendered. Plate metadata uses source X/Y,
/// which land on output X/Z.
pub fn placement_translation(
    bounds: &Aabb,
    model: &DecodedModel,
    plate: Option<u32>,
    config: &SceneConfig,
) -> (PlacementCase, [f64; 3]) {
    let center = config.plate_center();
    let metadata = plate.and_then(|p| model.plates.get(&p));

    if let Some(plate_bounds) = metadata.and_then(|m| m.bounds) {
        let plate_center = plate_bounds.center();
        let dx = plate_bounds.min[0] - bounds.min[0] + (center[0] - plate_center[0]);
        let dz = plate_bounds.min[1] - bounds.min[2] + (center[1] - plate_center[1]);
        return (PlacementCase::PlateBounds, [dx, 0.0, dz]);
    }

    if let Some(offset) = metadata.and_then(|m| m.offset) {
        return (PlacementCase::PlateOffset, [-offset[0], 0.0, -offset[1]]);
    }

    let group_center = bounds.center();
    (
        PlacementCase::Centered,
        [
            center[0] - group_center[0],
            -bounds.min[1],
            center[1] - group_center[2],
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bounds2, MeshRecord, PlacementRecord, PlateBounds, SourceFormat};

    fn model_with_plates(plates: &[Option<u32>]) -> DecodedModel {
        let mut model = DecodedModel::new(SourceFormat::ThreeMf);
        let mut object = ObjectRecord::new("1");
        let mut mesh = MeshRecord::new(0);
        mesh.vertices = vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        mesh.triangles = vec![[0, 1, 2]];
        object.meshes.push(mesh);
        model.objects.push(object);
        for (i, &plate) in plates.iter().enumerate() {
            let mut placement = PlacementRecord::new("1");
            placement.transform = Transform::translation(i as f64 * 10.0, 0.0, 0.0);
            placement.plate = plate;
            model.placements.push(placement);
        }
        model
    }

    #[test]
    fn test_filter_by_plate() {
        let model = model_with_plates(&[Some(1), Some(2), Some(2)]);
        let (instances, plate) = select_instances(&model, Some(2));
        assert_eq!(instances.len(), 2);
        assert_eq!(plate, Some(2));
    }

    #[test]
    fn test_unmatched_plate_falls_back_to_all() {
        let model = model_with_plates(&[Some(1), Some(2)]);
        let (unfiltered, _) = select_instances(&model, None);
        let (stale, plate) = select_instances(&model, Some(9));
        assert_eq!(stale.len(), unfiltered.len());
        assert_eq!(plate, None);
    }

    #[test]
    fn test_no_plate_assignments_ignores_selection() {
        let model = model_with_plates(&[None, None]);
        let (instances, plate) = select_instances(&model, Some(1));
        assert_eq!(instances.len(), 2);
        assert_eq!(plate, None);
    }

    #[test]
    fn test_no_placements_renders_objects() {
        let model = model_with_plates(&[]);
        let (instances, _) = select_instances(&model, None);
        assert_eq!(instances.len(), 1);
        assert!(instances[0].transform.is_identity());
    }

    #[test]
    fn test_plate_bounds_case() {
        let mut model = model_with_plates(&[Some(1)]);
        model.plates.insert(
            1,
            PlateBounds {
                bounds: Some(Bounds2::from_array([100.0, 100.0, 120.0, 110.0])),
                offset: Some([50.0, 50.0]),
            },
        );
        let bounds = Aabb {
            min: [400.0, 0.0, 30.0],
            max: [420.0, 5.0, 40.0],
        };
        let config = SceneConfig::new();
        let (case, offset) = placement_translation(&bounds, &model, Some(1), &config);
        assert_eq!(case, PlacementCase::PlateBounds);

        let placed = bounds.translated(offset);
        // Same size as the plate box, so it ends up centered
        assert_eq!(placed.center()[0], 128.0);
        assert_eq!(placed.center()[2], 128.0);
        assert_eq!(placed.min[1], 0.0);
    }

    #[test]
    fn test_plate_offset_case() {
        let mut model = model_with_plates(&[Some(2)]);
        model.plates.insert(
            2,
            PlateBounds {
                bounds: None,
                offset: Some([307.0, -10.0]),
            },
        );
        let bounds = Aabb {
            min: [400.0, 0.0, 30.0],
            max: [420.0, 5.0, 40.0],
        };
        let (case, offset) =
            placement_translation(&bounds, &model, Some(2), &SceneConfig::new());
        assert_eq!(case, PlacementCase::PlateOffset);
        assert_eq!(offset, [-307.0, 0.0, 10.0]);
    }

    #[test]
    fn test_without_selected_plate_centers() {
        let mut model = model_with_plates(&[Some(1)]);
        model.plates.insert(1, PlateBounds::default());
        let bounds = Aabb {
            min: [0.0, 2.0, 0.0],
            max: [10.0, 4.0, 20.0],
        };
        let (case, offset) = placement_translation(&bounds, &model, None, &SceneConfig::new());
        assert_eq!(case, PlacementCase::Centered);
        assert_eq!(offset, [123.0, -2.0, 118.0]);
    }
}
