//! STL input
//!
//! STL has no objects, plates or materials. A file becomes one object with
//! id `"1"` on material 0 and no build items, so the scene builder centers
//! it on the plate.

use crate::error::{Error, Result};
use crate::model::{DecodedModel, MeshRecord, ObjectRecord, SourceFormat};
use log::{debug, info};
use std::io::Cursor;

/// Object id given to the single STL object
pub const STL_OBJECT_ID: &str = "1";

/// Decode ASCII or binary STL bytes
pub fn decode_stl(bytes: Vec<u8>) -> Result<DecodedModel> {
    let mut cursor = Cursor::new(bytes);
    let indexed = stl_io::read_stl(&mut cursor).map_err(Error::MalformedStl)?;

    let mut mesh = MeshRecord::new(0);
    mesh.vertices = indexed
        .vertices
        .iter()
        .map(|v| [f64::from(v[0]), f64::from(v[1]), f64::from(v[2])])
        .collect();
    mesh.triangles = indexed
        .faces
        .iter()
        .filter_map(|face| {
            let [a, b, c] = face.vertices;
            Some([
                u32::try_from(a).ok()?,
                u32::try_from(b).ok()?,
                u32::try_from(c).ok()?,
            ])
        })
        .collect();

    let dropped = mesh.retain_valid_triangles();
    if dropped > 0 {
        debug!("STL: dropped {} triangles with out-of-range vertex indices", dropped);
    }
    if !mesh.is_well_formed() {
        return Err(Error::no_meshes("STL input"));
    }

    info!(
        "Decoded STL: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangles.len()
    );

    let mut object = ObjectRecord::new(STL_OBJECT_ID);
    object.meshes.push(mesh);

    let mut model = DecodedModel::new(SourceFormat::Stl);
    model.objects.push(object);
    Ok(model)
}
