//! Material batching and palette lookup

use super::WorldMesh;
use crate::config::DEFAULT_COLOR;
use nalgebra::Vector3;
use std::collections::BTreeMap;

/// All geometry of one material merged into a single buffer set
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialBatch {
    /// Material index shared by the batch
    pub material: usize,
    /// Linear RGB in `0.0..=1.0`
    pub color: [f32; 3],
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Smooth vertex normals, one per position
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices into `positions`
    pub indices: Vec<u32>,
}

impl MaterialBatch {
    fn new(material: usize, color: [f32; 3]) -> Self {
        Self {
            material,
            color,
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn append(&mut self, mesh: WorldMesh) {
        let base = self.positions.len() as u32;
        self.positions.extend(
            mesh.vertices
                .iter()
                .map(|v| [v[0] as f32, v[1] as f32, v[2] as f32]),
        );
        self.indices
            .extend(mesh.triangles.iter().flatten().map(|&i| base + i));
    }
}

/// Group meshes by material and merge each group
pub(crate) fn batch_by_material(meshes: Vec<WorldMesh>, palette: &[String]) -> Vec<MaterialBatch> {
    let mut batches: BTreeMap<usize, MaterialBatch> = BTreeMap::new();

    for mesh in meshes {
        batches
            .entry(mesh.material)
            .or_insert_with(|| MaterialBatch::new(mesh.material, palette_color(palette, mesh.material)))
            .append(mesh);
    }

    batches
        .into_values()
        .map(|mut batch| {
            batch.normals = vertex_normals(&batch.positions, &batch.indices);
            batch
        })
        .collect()
}

/// Color for a material index, or the default color
pub fn palette_color(palette: &[String], material: usize) -> [f32; 3] {
    palette
        .get(material)
        .and_then(|c| parse_color(c))
        .unwrap_or(DEFAULT_COLOR)
}

/// Parse `#rrggbb`, `rrggbb`, `#rgb` or `#rrggbbaa` (alpha ignored)
pub fn parse_color(value: &str) -> Option<[f32; 3]> {
    let hex = value.trim().trim_start_matches('#');
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);

    match hex.len() {
        3 => {
            let mut rgb = [0.0; 3];
            for (i, c) in hex.chars().enumerate() {
                let digit = c.to_digit(16)? as f32;
                rgb[i] = digit * 17.0 / 255.0;
            }
            Some(rgb)
        }
        6 | 8 if hex.is_ascii() => Some([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ]),
        _ => None,
    }
}

/// Area-weighted smooth normals
///
/// Vertices that only touch degenerate triangles get a zero normal.
fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vector3::<f32>::zeros(); positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        let pa = Vector3::from(positions[a]);
        let pb = Vector3::from(positions[b]);
        let pc = Vector3::from(positions[c]);
        // Cross product length is twice the area, which is the weight we want
        let face = (pb - pa).cross(&(pc - pa));
        accumulated[a] += face;
        accumulated[b] += face;
        accumulated[c] += face;
    }

    accumulated
        .into_iter()
        .map(|n| {
            let n = n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);
            [n.x, n.y, n.z]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(material: usize, y: f64) -> WorldMesh {
        WorldMesh {
            vertices: vec![[0.0, y, 0.0], [0.0, y, 1.0], [1.0, y, 0.0]],
            triangles: vec![[0, 1, 2]],
            material,
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000"), Some([1.0, 0.0, 0.0]));
        assert_eq!(parse_color("00FF00"), Some([0.0, 1.0, 0.0]));
        assert_eq!(parse_color("#fff"), Some([1.0, 1.0, 1.0]));
        assert_eq!(parse_color("#0000ffcc"), Some([0.0, 0.0, 1.0]));
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("#12345"), None);
    }

    #[test]
    fn test_palette_fallback() {
        let palette = vec!["#000000".to_string(), "not a color".to_string()];
        assert_eq!(palette_color(&palette, 0), [0.0, 0.0, 0.0]);
        assert_eq!(palette_color(&palette, 1), DEFAULT_COLOR);
        assert_eq!(palette_color(&palette, 7), DEFAULT_COLOR);
    }

    #[test]
    fn test_batches_merge_by_material() {
        let palette = vec!["#ff0000".to_string(), "#0000ff".to_string()];
        let batches = batch_by_material(
            vec![triangle(1, 0.0), triangle(0, 1.0), triangle(1, 2.0)],
            &palette,
        );

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].material, 0);
        assert_eq!(batches[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(batches[1].material, 1);
        assert_eq!(batches[1].color, [0.0, 0.0, 1.0]);
        assert_eq!(batches[1].positions.len(), 6);
        // Second mesh indices are rebased past the first mesh's vertices
        assert_eq!(batches[1].indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_normals_point_up_for_flat_triangle() {
        let batches = batch_by_material(vec![triangle(0, 0.0)], &[]);
        for normal in &batches[0].normals {
            assert!((normal[1] - 1.0).abs() < 1e-6, "normal {:?}", normal);
        }
    }
}
