//! Scene assembly
//!
//! Turns a [`DecodedModel`] into Y-up, plate-positioned geometry batched by
//! material, plus a camera framing the result. The source is Z-up; every
//! source-space transform is applied before the axis swap.

mod batch;
mod camera;
mod placement;

use crate::config::SceneConfig;
use crate::error::{Error, Result};
use crate::model::DecodedModel;
use crate::transform::to_y_up;
use log::debug;

pub use batch::{MaterialBatch, parse_color, palette_color};
pub use camera::{CAMERA_DISTANCE_FACTOR, CameraFrame};
pub use placement::{Instance, PlacementCase, placement_translation, select_instances};

/// Axis-aligned bounding box in output (Y-up) space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: [f64; 3],
    /// Maximum corner
    pub max: [f64; 3],
}

impl Aabb {
    /// A box containing nothing
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    /// Whether no point has been added
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Grow the box to contain `point`
    pub fn include(&mut self, point: [f64; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(point[i]);
            self.max[i] = self.max[i].max(point[i]);
        }
    }

    /// Center point
    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    /// Extent along each axis
    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Largest extent
    pub fn largest_extent(&self) -> f64 {
        let [x, y, z] = self.size();
        x.max(y).max(z)
    }

    /// Box moved by `offset`
    pub fn translated(&self, offset: [f64; 3]) -> Aabb {
        Aabb {
            min: [
                self.min[0] + offset[0],
                self.min[1] + offset[1],
                self.min[2] + offset[2],
            ],
            max: [
                self.max[0] + offset[0],
                self.max[1] + offset[1],
                self.max[2] + offset[2],
            ],
        }
    }
}

/// Geometry of one mesh instance in output space
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WorldMesh {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
    pub material: usize,
}

/// A positioned, colored, renderable model
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// One batch per material in ascending material order
    pub batches: Vec<MaterialBatch>,
    /// Bounds of the final geometry
    pub bounds: Aabb,
    /// Camera looking at the geometry
    pub camera: CameraFrame,
    /// Which placement heuristic positioned the geometry
    pub placement: PlacementCase,
    /// Plate actually rendered, `None` when everything is shown
    pub plate: Option<u32>,
}

impl Scene {
    /// Total triangle count over all batches
    pub fn triangle_count(&self) -> usize {
        self.batches.iter().map(|b| b.indices.len() / 3).sum()
    }
}

/// Builds scenes for one configuration
///
/// # Example
///
/// ```no_run
/// use plate_preview::{DecodeConfig, SceneBuilder, SceneConfig, parser::decode_3mf};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let model = decode_3mf(std::fs::read("benchy.3mf")?, &DecodeConfig::default())?;
/// let config = SceneConfig::new().with_colors(["#f2f2f2", "#ff6a13"]);
/// let scene = SceneBuilder::new(&config).build(&model)?;
/// println!("{} batches, camera at {:?}", scene.batches.len(), scene.camera.position);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SceneBuilder<'c> {
    config: &'c SceneConfig,
}

impl<'c> SceneBuilder<'c> {
    /// Create a builder for `config`
    pub fn new(config: &'c SceneConfig) -> Self {
        Self { config }
    }

    /// Build the scene for a decoded model
    pub fn build(&self, model: &DecodedModel) -> Result<Scene> {
        let (instances, plate) = select_instances(model, self.config.selected_plate);

        let mut meshes = Vec::new();
        let mut bounds = Aabb::empty();
        for instance in &instances {
            for mesh in &instance.object.meshes {
                let vertices: Vec<[f64; 3]> = mesh
                    .vertices
                    .iter()
                    .map(|&v| to_y_up(instance.transform.apply(v)))
                    .collect();
                let triangles: Vec<[u32; 3]> = mesh
                    .triangles
                    .iter()
                    .filter(|t| t.iter().all(|&i| (i as usize) < vertices.len()))
                    .copied()
                    .collect();
                if triangles.len() < mesh.triangles.len() {
                    debug!(
                        "Object '{}': skipping {} triangles with out-of-range vertex indices",
                        instance.object.id,
                        mesh.triangles.len() - triangles.len()
                    );
                }
                if triangles.is_empty() {
                    continue;
                }

                vertices.iter().for_each(|&v| bounds.include(v));
                meshes.push(WorldMesh {
                    vertices,
                    triangles,
                    material: instance.material_override.unwrap_or(mesh.material),
                });
            }
        }

        if bounds.is_empty() {
            return Err(Error::NoMeshesFound(
                "nothing to render for the current selection".to_string(),
            ));
        }

        let (case, offset) = placement_translation(&bounds, model, plate, self.config);
        debug!(
            "Placing {} instances with {:?}, offset {:?}",
            instances.len(),
            case,
            offset
        );
        for mesh in &mut meshes {
            for v in &mut mesh.vertices {
                v[0] += offset[0];
                v[1] += offset[1];
                v[2] += offset[2];
            }
        }
        let bounds = bounds.translated(offset);

        Ok(Scene {
            batches: batch::batch_by_material(meshes, &self.config.colors),
            bounds,
            camera: CameraFrame::frame(&bounds),
            placement: case,
            plate,
        })
    }
}
