//! Shared helpers for integration tests
//!
//! Archives are built in memory; nothing touches the filesystem.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const CONTENT_TYPES: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"##;

pub const RELS: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"##;

/// Zip the given `(name, content)` entries
pub fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer
}

/// A 3MF archive with the standard package entries, the main model and any
/// extra entries
pub fn build_3mf(model: &str, extra: &[(&str, &str)]) -> Vec<u8> {
    let mut entries = vec![
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        ("3D/3dmodel.model", model),
    ];
    entries.extend_from_slice(extra);
    build_zip(&entries)
}

/// Wrap resources and build items in a model document
pub fn model_xml(resources: &str, build: &str) -> String {
    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xml:lang="en-US" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02" xmlns:p="http://schemas.microsoft.com/3dmanufacturing/production/2015/06">
  <resources>
{resources}
  </resources>
  <build>
{build}
  </build>
</model>"##
    )
}

/// Mesh element for a tetrahedron of edge `size` at the origin
pub fn tetrahedron_mesh(size: f64) -> String {
    format!(
        r##"<mesh>
        <vertices>
          <vertex x="0" y="0" z="0"/>
          <vertex x="{size}" y="0" z="0"/>
          <vertex x="0" y="{size}" z="0"/>
          <vertex x="0" y="0" z="{size}"/>
        </vertices>
        <triangles>
          <triangle v1="0" v2="2" v3="1"/>
          <triangle v1="0" v2="1" v3="3"/>
          <triangle v1="0" v2="3" v3="2"/>
          <triangle v1="1" v2="2" v3="3"/>
        </triangles>
      </mesh>"##
    )
}

/// Object element holding a tetrahedron mesh
pub fn tetrahedron_object(id: u32, extra_attrs: &str) -> String {
    format!(
        r#"    <object id="{id}" type="model" {extra_attrs}>
      {}
    </object>"#,
        tetrahedron_mesh(10.0)
    )
}

/// ASCII STL for the same tetrahedron
pub fn tetrahedron_stl() -> String {
    let facets = [
        ([0.0, 0.0, 0.0], [0.0, 10.0, 0.0], [10.0, 0.0, 0.0]),
        ([0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 0.0, 10.0]),
        ([0.0, 0.0, 0.0], [0.0, 0.0, 10.0], [0.0, 10.0, 0.0]),
        ([10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]),
    ];
    let mut stl = String::from("solid tetra\n");
    for (a, b, c) in facets {
        stl.push_str("  facet normal 0 0 0\n    outer loop\n");
        for v in [a, b, c] {
            stl.push_str(&format!("      vertex {} {} {}\n", v[0], v[1], v[2]));
        }
        stl.push_str("    endloop\n  endfacet\n");
    }
    stl.push_str("endsolid tetra\n");
    stl
}
