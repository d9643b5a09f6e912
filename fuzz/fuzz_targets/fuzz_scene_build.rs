#![no_main]

use libfuzzer_sys::arbitrary::{Arbitrary, Result, Unstructured};
use libfuzzer_sys::fuzz_target;
use plate_preview::{
    DecodedModel, MeshRecord, ObjectRecord, PlacementRecord, SceneBuilder, SceneConfig,
    SourceFormat, Transform,
};

#[derive(Debug)]
struct FuzzModel {
    vertices: Vec<[f64; 3]>,
    triangles: Vec<[u32; 3]>,
    placements: Vec<(Option<u32>, [f64; 12])>,
    selected: Option<u32>,
}

impl<'a> Arbitrary<'a> for FuzzModel {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        let vertex_count = u.int_in_range(1..=100u32)?;
        let mut vertices = Vec::new();
        for _ in 0..vertex_count {
            vertices.push([u.arbitrary()?, u.arbitrary()?, u.arbitrary()?]);
        }

        // Some indices land past the vertex list
        let triangle_count = u.int_in_range(1..=50)?;
        let mut triangles = Vec::new();
        for _ in 0..triangle_count {
            triangles.push([
                u.int_in_range(0..=vertex_count * 2)?,
                u.int_in_range(0..=vertex_count * 2)?,
                u.int_in_range(0..=vertex_count * 2)?,
            ]);
        }

        let placement_count = u.int_in_range(0..=4)?;
        let mut placements = Vec::new();
        for _ in 0..placement_count {
            placements.push((u.arbitrary()?, u.arbitrary()?));
        }

        Ok(FuzzModel {
            vertices,
            triangles,
            placements,
            selected: u.arbitrary()?,
        })
    }
}

fuzz_target!(|input: FuzzModel| {
    let mut mesh = MeshRecord::new(0);
    mesh.vertices = input.vertices;
    mesh.triangles = input.triangles;

    let mut object = ObjectRecord::new("1");
    object.meshes.push(mesh);

    let mut model = DecodedModel::new(SourceFormat::ThreeMf);
    model.objects.push(object);
    for (plate, values) in input.placements {
        let mut placement = PlacementRecord::new("1");
        placement.transform = Transform::from_values(&values);
        placement.plate = plate;
        model.placements.push(placement);
    }

    let config = SceneConfig::new().with_selected_plate(input.selected);
    let _ = SceneBuilder::new(&config).build(&model);
});
