//! Decoded model data
//!
//! Everything here is produced by one decode pass and replaced wholesale on
//! the next load. Object ids come from the file and are only unique within
//! one archive.

use crate::transform::Transform;
use std::collections::BTreeMap;

/// Which decoder produced a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Zip-packaged 3D manufacturing format
    ThreeMf,
    /// Stereolithography triangle soup
    Stl,
}

/// Triangle geometry with one resolved material
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRecord {
    /// Vertex positions in source space
    pub vertices: Vec<[f64; 3]>,
    /// Vertex-index triplets
    pub triangles: Vec<[u32; 3]>,
    /// Resolved material (extruder) index, 0-based
    pub material: usize,
}

impl MeshRecord {
    /// Create an empty mesh
    pub fn new(material: usize) -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
            material,
        }
    }

    /// Whether the mesh has both vertices and triangles
    pub fn is_well_formed(&self) -> bool {
        !self.vertices.is_empty() && !self.triangles.is_empty()
    }

    /// Drop triangles that index past the vertex list
    ///
    /// Returns the number of triangles removed.
    pub fn retain_valid_triangles(&mut self) -> usize {
        let vertex_count = self.vertices.len();
        let before = self.triangles.len();
        self.triangles
            .retain(|t| t.iter().all(|&i| (i as usize) < vertex_count));
        before - self.triangles.len()
    }

    /// Copy of the mesh with every vertex passed through `transform`
    pub fn transformed(&self, transform: &Transform) -> MeshRecord {
        MeshRecord {
            vertices: self.vertices.iter().map(|&v| transform.apply(v)).collect(),
            triangles: self.triangles.clone(),
            material: self.material,
        }
    }
}

/// One or more meshes under a shared object id
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    /// Object id as written in the file
    pub id: String,
    /// Display name, from the object element or the settings entry
    pub name: Option<String>,
    /// Material used by meshes without a part-level assignment
    pub default_material: usize,
    /// Plate this object belongs to, when known
    pub plate: Option<u32>,
    /// Object geometry; never empty once decoding finishes
    pub meshes: Vec<MeshRecord>,
}

impl ObjectRecord {
    /// Create an object without geometry
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            default_material: 0,
            plate: None,
            meshes: Vec::new(),
        }
    }

    /// Total vertex count over all meshes
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    /// Total triangle count over all meshes
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangles.len()).sum()
    }
}

/// A build item: one positioned instance of an object
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRecord {
    /// Referenced object id
    pub object_id: String,
    /// Placement in source space
    pub transform: Transform,
    /// Effective plate after precedence resolution
    pub plate: Option<u32>,
    /// Material forcing every mesh of this instance
    pub material_override: Option<usize>,
}

impl PlacementRecord {
    /// Create a placement with the identity transform
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            transform: Transform::identity(),
            plate: None,
            material_override: None,
        }
    }
}

/// Axis-aligned 2D box in source X/Y
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    /// Minimum corner
    pub min: [f64; 2],
    /// Maximum corner
    pub max: [f64; 2],
}

impl Bounds2 {
    /// Create a box from `[min_x, min_y, max_x, max_y]`
    pub fn from_array(values: [f64; 4]) -> Self {
        Self {
            min: [values[0].min(values[2]), values[1].min(values[3])],
            max: [values[0].max(values[2]), values[1].max(values[3])],
        }
    }

    /// Center point
    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }
}

/// What the metadata says about one plate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateBounds {
    /// Bounding box of everything on the plate
    pub bounds: Option<Bounds2>,
    /// Position of the plate in model space
    pub offset: Option<[f64; 2]>,
}

/// Result of decoding one file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedModel {
    /// Decoder that produced this model
    pub source_format: SourceFormat,
    /// Objects with at least one well-formed mesh
    pub objects: Vec<ObjectRecord>,
    /// Build items whose object id resolved
    pub placements: Vec<PlacementRecord>,
    /// Per-plate metadata keyed by plate number
    pub plates: BTreeMap<u32, PlateBounds>,
}

impl DecodedModel {
    /// Create an empty model
    pub fn new(source_format: SourceFormat) -> Self {
        Self {
            source_format,
            objects: Vec::new(),
            placements: Vec::new(),
            plates: BTreeMap::new(),
        }
    }

    /// Look up an object by id
    pub fn object(&self, id: &str) -> Option<&ObjectRecord> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Total number of meshes over all objects
    pub fn mesh_count(&self) -> usize {
        self.objects.iter().map(|o| o.meshes.len()).sum()
    }

    /// Whether any placement carries a plate assignment
    pub fn has_plate_assignments(&self) -> bool {
        self.placements.iter().any(|p| p.plate.is_some())
    }

    /// Sorted, de-duplicated plates referenced by placements
    pub fn plate_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.placements.iter().filter_map(|p| p.plate).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
