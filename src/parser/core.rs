//! Core model-document parsing
//!
//! This module walks one model-description XML document and collects its
//! objects (with inline mesh or component list) and build items. Nothing is
//! resolved here: component references, settings and plate metadata are
//! applied by the caller.

use crate::error::Result;
use crate::model::MeshRecord;
use crate::transform::Transform;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{
    extruder_attribute, get_attr_by_local_name, get_local_name, lenient_f64, lenient_u32,
    parse_attributes, plate_attribute, transform_attribute,
};

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// An `<object>` element as written
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectElement {
    /// `id` attribute
    pub id: String,
    /// `name` attribute
    pub name: Option<String>,
    /// Vendor `extruder` attribute, 1-based
    pub extruder: Option<usize>,
    /// Plate attribute
    pub plate: Option<u32>,
    /// Inline mesh, material not yet resolved
    pub mesh: Option<MeshRecord>,
    /// `<component>` children
    pub components: Vec<ComponentElement>,
}

impl ObjectElement {
    fn new(id: String) -> Self {
        Self {
            id,
            name: None,
            extruder: None,
            plate: None,
            mesh: None,
            components: Vec::new(),
        }
    }
}

/// A `<component>` element as written
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentElement {
    /// `objectid` attribute
    pub object_id: String,
    /// Entry holding the referenced object, from a `path` attribute in any namespace
    pub path: Option<String>,
    /// Component transform
    pub transform: Transform,
    /// Vendor `extruder` attribute, 1-based
    pub extruder: Option<usize>,
}

/// A build `<item>` element as written
#[derive(Debug, Clone, PartialEq)]
pub struct ItemElement {
    /// `objectid` attribute
    pub object_id: Option<String>,
    /// Item transform
    pub transform: Transform,
    /// Vendor `extruder` attribute, 1-based
    pub extruder: Option<usize>,
    /// Plate attribute
    pub plate: Option<u32>,
}

/// One parsed model-description document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Objects in document order
    pub objects: Vec<ObjectElement>,
    /// Build items in document order
    pub items: Vec<ItemElement>,
}

impl Document {
    /// Look up an object by id
    pub fn object(&self, id: &str) -> Option<&ObjectElement> {
        self.objects.iter().find(|o| o.id == id)
    }
}

/// Parse a model-description document
///
/// Fails only on malformed XML. Missing numeric attributes are 0, objects
/// without an `id` are skipped.
pub fn parse_document(xml: &str) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut document = Document::default();
    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut in_resources = false;
    let mut in_build = false;
    let mut current_object: Option<ObjectElement> = None;
    let mut current_mesh: Option<MeshRecord> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name();
                match get_local_name(&String::from_utf8_lossy(name.as_ref())) {
                    "resources" => in_resources = true,
                    "build" => in_build = true,
                    "object" if in_resources => current_object = parse_object(e)?,
                    "mesh" if current_object.is_some() => current_mesh = Some(MeshRecord::new(0)),
                    other => handle_leaf(
                        other,
                        e,
                        in_build,
                        &mut current_object,
                        &mut current_mesh,
                        &mut document,
                    )?,
                }
            }
            Event::Empty(ref e) => {
                let name = e.name();
                match get_local_name(&String::from_utf8_lossy(name.as_ref())) {
                    "object" if in_resources => {
                        // An object without children has no geometry
                    }
                    other => handle_leaf(
                        other,
                        e,
                        in_build,
                        &mut current_object,
                        &mut current_mesh,
                        &mut document,
                    )?,
                }
            }
            Event::End(ref e) => {
                let name = e.name();
                match get_local_name(&String::from_utf8_lossy(name.as_ref())) {
                    "resources" => in_resources = false,
                    "build" => in_build = false,
                    "mesh" => {
                        if let (Some(object), Some(mesh)) =
                            (current_object.as_mut(), current_mesh.take())
                        {
                            object.mesh = Some(mesh);
                        }
                    }
                    "object" => {
                        if let Some(object) = current_object.take() {
                            document.objects.push(object);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(document)
}

/// Elements that carry data but no children we care about
fn handle_leaf(
    name: &str,
    e: &BytesStart,
    in_build: bool,
    current_object: &mut Option<ObjectElement>,
    current_mesh: &mut Option<MeshRecord>,
    document: &mut Document,
) -> Result<()> {
    match name {
        "vertex" => {
            if let Some(mesh) = current_mesh.as_mut() {
                mesh.vertices.push(parse_vertex(e)?);
            }
        }
        "triangle" => {
            if let Some(mesh) = current_mesh.as_mut() {
                mesh.triangles.push(parse_triangle(e)?);
            }
        }
        "component" => {
            if let Some(object) = current_object.as_mut() {
                if let Some(component) = parse_component(e)? {
                    object.components.push(component);
                }
            }
        }
        "item" if in_build => document.items.push(parse_build_item(e)?),
        _ => {}
    }
    Ok(())
}

/// Parse object element attributes
fn parse_object(e: &BytesStart) -> Result<Option<ObjectElement>> {
    let attrs = parse_attributes(e)?;

    let Some(id) = attrs.get("id") else {
        log::debug!("Skipping object without id");
        return Ok(None);
    };

    let mut object = ObjectElement::new(id.trim().to_string());
    object.name = attrs.get("name").cloned();
    object.extruder = extruder_attribute(&attrs);
    object.plate = plate_attribute(&attrs);
    Ok(Some(object))
}

/// Parse vertex element attributes
fn parse_vertex(e: &BytesStart) -> Result<[f64; 3]> {
    let mut vertex = [0.0; 3];

    for attr_result in e.attributes() {
        let attr = attr_result?;
        match attr.key.as_ref() {
            b"x" => vertex[0] = lenient_f64(&attr.value),
            b"y" => vertex[1] = lenient_f64(&attr.value),
            b"z" => vertex[2] = lenient_f64(&attr.value),
            _ => {}
        }
    }

    Ok(vertex)
}

/// Parse triangle element attributes
fn parse_triangle(e: &BytesStart) -> Result<[u32; 3]> {
    let mut triangle = [0; 3];

    for attr_result in e.attributes() {
        let attr = attr_result?;
        match attr.key.as_ref() {
            b"v1" => triangle[0] = lenient_u32(&attr.value),
            b"v2" => triangle[1] = lenient_u32(&attr.value),
            b"v3" => triangle[2] = lenient_u32(&attr.value),
            _ => {}
        }
    }

    Ok(triangle)
}

/// Parse component element attributes
fn parse_component(e: &BytesStart) -> Result<Option<ComponentElement>> {
    let attrs = parse_attributes(e)?;

    let Some(object_id) = attrs.get("objectid") else {
        log::debug!("Skipping component without objectid");
        return Ok(None);
    };

    Ok(Some(ComponentElement {
        object_id: object_id.trim().to_string(),
        path: get_attr_by_local_name(&attrs, "path").cloned(),
        transform: transform_attribute(&attrs),
        extruder: extruder_attribute(&attrs),
    }))
}

/// Parse build item element attributes
fn parse_build_item(e: &BytesStart) -> Result<ItemElement> {
    let attrs = parse_attributes(e)?;

    Ok(ItemElement {
        object_id: attrs.get("objectid").map(|id| id.trim().to_string()),
        transform: transform_attribute(&attrs),
        extruder: extruder_attribute(&attrs),
        plate: plate_attribute(&attrs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_CORNER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <resources>
    <object id="1" name="Corner" type="model">
      <mesh>
        <vertices>
          <vertex x="0" y="0" z="0"/>
          <vertex x="1" y="0" z="0"/>
          <vertex x="0" y="1" z="0"/>
          <vertex x="0" y="0" z="1"/>
        </vertices>
        <triangles>
          <triangle v1="0" v2="2" v3="1"/>
          <triangle v1="0" v2="1" v3="3"/>
        </triangles>
      </mesh>
    </object>
  </resources>
  <build>
    <item objectid="1" transform="1 0 0 0 1 0 0 0 1 5 5 0"/>
  </build>
</model>"#;

    #[test]
    fn test_parse_minimal_document() {
        let document = parse_document(CUBE_CORNER).unwrap();
        assert_eq!(document.objects.len(), 1);

        let object = &document.objects[0];
        assert_eq!(object.id, "1");
        assert_eq!(object.name.as_deref(), Some("Corner"));
        let mesh = object.mesh.as_ref().unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangles, vec![[0, 2, 1], [0, 1, 3]]);

        assert_eq!(document.items.len(), 1);
        assert_eq!(document.items[0].object_id.as_deref(), Some("1"));
        assert_eq!(document.items[0].transform.apply([0.0; 3]), [5.0, 5.0, 0.0]);
    }

    #[test]
    fn test_missing_and_malformed_numbers_are_zero() {
        let xml = r#"<model><resources><object id="7"><mesh>
<vertices><vertex x="abc" y="2"/></vertices>
<triangles><triangle v1="0" v3="x"/></triangles>
</mesh></object></resources></model>"#;
        let document = parse_document(xml).unwrap();
        let mesh = document.objects[0].mesh.as_ref().unwrap();
        assert_eq!(mesh.vertices, vec![[0.0, 2.0, 0.0]]);
        assert_eq!(mesh.triangles, vec![[0, 0, 0]]);
    }

    #[test]
    fn test_parse_components_with_path_and_extruder() {
        let xml = r#"<model xmlns:p="http://schemas.microsoft.com/3dmanufacturing/production/2015/06">
  <resources>
    <object id="2" p:plate_id="3">
      <components>
        <component p:path="/3D/Objects/object_1.model" objectid="1" transform="1 0 0 0 1 0 0 0 1 0 0 10"/>
        <component objectid="4" b:extruder="2"/>
      </components>
    </object>
  </resources>
  <build><item objectid="2" plater_id="1"/><item transform="1 0 0 0 1 0 0 0 1 0 0 0"/></build>
</model>"#;
        let document = parse_document(xml).unwrap();
        let object = document.object("2").unwrap();
        assert_eq!(object.plate, Some(3));
        assert!(object.mesh.is_none());
        assert_eq!(object.components.len(), 2);
        assert_eq!(
            object.components[0].path.as_deref(),
            Some("/3D/Objects/object_1.model")
        );
        assert_eq!(object.components[0].transform.apply([0.0; 3]), [0.0, 0.0, 10.0]);
        assert_eq!(object.components[1].extruder, Some(2));

        assert_eq!(document.items[0].plate, Some(1));
        assert_eq!(document.items[1].object_id, None);
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(parse_document("<model><resources><object id=\"1\"></resources>").is_err());
    }
}
