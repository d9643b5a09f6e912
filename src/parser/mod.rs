//! 3MF geometry extraction
//!
//! Decoding is lenient: numeric attributes that are missing or malformed
//! become 0, and any auxiliary entry (slicer settings, plate metadata,
//! component parts) that is missing or unreadable only disables the feature
//! it feeds. The decode fails only when no model entry can be read or when
//! nothing renderable comes out of it.

mod core;
mod plates;
mod settings;

use crate::archive::Archive;
use crate::config::DecodeConfig;
use crate::error::{Error, Result};
use crate::model::*;
use crate::transform::Transform;
use log::{debug, info, warn};
use quick_xml::escape::unescape;
use std::collections::{HashMap, HashSet};

pub use self::core::{ComponentElement, Document, ItemElement, ObjectElement, parse_document};
pub use plates::{PlateMetadata, parse_plate_json, plate_number};
pub use settings::{ModelSettings, ObjectSettings, parse_model_settings};

/// Plate attribute spellings seen in the wild, compared case-insensitively
pub const PLATE_ATTRIBUTE_NAMES: [&str; 4] = ["plate_id", "plater_id", "plateid", "platerid"];

/// Decode a 3MF archive into the preview data model
///
/// # Example
///
/// ```no_run
/// use plate_preview::{DecodeConfig, parser::decode_3mf};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("benchy.3mf")?;
/// let model = decode_3mf(bytes, &DecodeConfig::default())?;
/// println!("{} objects, {} placements", model.objects.len(), model.placements.len());
/// # Ok(())
/// # }
/// ```
pub fn decode_3mf(bytes: Vec<u8>, config: &DecodeConfig) -> Result<DecodedModel> {
    let mut archive = Archive::from_bytes(bytes)?;

    let model_path = archive
        .locate_model_entry(config.allow_any_model_entry)
        .ok_or_else(|| Error::NoMeshesFound("archive has no model entry".to_string()))?;

    let xml = archive.read_entry(&model_path).map_err(|e| {
        warn!("Failed to read model entry '{}': {}", model_path, e);
        Error::no_meshes(&model_path)
    })?;
    let document = parse_document(&xml).map_err(|e| {
        warn!("Failed to parse model entry '{}': {}", model_path, e);
        Error::no_meshes(&model_path)
    })?;

    let settings = settings::load(&mut archive);
    let plate_metadata = plates::load(&mut archive);

    let model = assemble(&mut archive, &document, &settings, &plate_metadata);
    if model.mesh_count() == 0 {
        return Err(Error::no_meshes(&model_path));
    }

    info!(
        "Decoded '{}': {} objects, {} meshes, {} placements, {} plates",
        model_path,
        model.objects.len(),
        model.mesh_count(),
        model.placements.len(),
        model.plates.len()
    );
    Ok(model)
}

/// Build the data model from a parsed document and its auxiliary data
fn assemble(
    archive: &mut Archive,
    document: &Document,
    settings: &ModelSettings,
    plate_metadata: &PlateMetadata,
) -> DecodedModel {
    let mut model = DecodedModel::new(SourceFormat::ThreeMf);
    let mut resolver = ComponentResolver::new(archive, document);

    // Objects that only exist to be pulled in as parts are not rendered on
    // their own.
    let part_only: HashSet<&str> = document
        .objects
        .iter()
        .flat_map(|o| o.components.iter())
        .filter(|c| c.path.is_none())
        .map(|c| c.object_id.as_str())
        .filter(|id| !document.items.iter().any(|i| i.object_id.as_deref() == Some(*id)))
        .collect();

    for element in &document.objects {
        if part_only.contains(element.id.as_str()) {
            continue;
        }
        if let Some(object) = resolve_object(element, &mut resolver, settings, plate_metadata) {
            model.objects.push(object);
        }
    }

    for item in &document.items {
        let Some(object_id) = item.object_id.as_deref() else {
            debug!("Skipping build item without objectid");
            continue;
        };
        let Some(object_plate) = model.object(object_id).map(|o| o.plate) else {
            debug!("Skipping build item for unknown object '{}'", object_id);
            continue;
        };

        model.placements.push(PlacementRecord {
            object_id: object_id.to_string(),
            transform: item.transform,
            plate: item.plate.or(object_plate),
            material_override: item.extruder.map(extruder_to_material),
        });
    }

    model.plates = plate_metadata.plates.clone();
    model
}

/// Resolve one object element into a record, or `None` if it has no geometry
fn resolve_object(
    element: &ObjectElement,
    resolver: &mut ComponentResolver<'_>,
    settings: &ModelSettings,
    plate_metadata: &PlateMetadata,
) -> Option<ObjectRecord> {
    let object_settings = settings.objects.get(&element.id);

    let mut object = ObjectRecord::new(element.id.clone());
    object.name = element
        .name
        .clone()
        .or_else(|| object_settings.and_then(|s| s.name.clone()));
    object.default_material = element
        .extruder
        .or_else(|| object_settings.and_then(|s| s.extruder))
        .map(extruder_to_material)
        .unwrap_or(0);
    object.plate = element
        .plate
        .or_else(|| settings.object_plates.get(&element.id).copied())
        .or_else(|| {
            object
                .name
                .as_ref()
                .and_then(|name| plate_metadata.names.get(name).copied())
        });

    if let Some(mesh) = &element.mesh {
        let mut mesh = mesh.clone();
        mesh.material = object.default_material;
        push_mesh(&mut object, mesh);
    }

    for component in &element.components {
        let material = component
            .extruder
            .or_else(|| object_settings.and_then(|s| s.parts.get(&component.object_id).copied()))
            .map(extruder_to_material)
            .unwrap_or(object.default_material);

        for mesh in resolver.meshes_for(component) {
            let mut mesh = mesh.transformed(&component.transform);
            mesh.material = material;
            push_mesh(&mut object, mesh);
        }
    }

    if object.meshes.is_empty() {
        debug!("Object '{}' has no usable mesh", element.id);
        return None;
    }
    Some(object)
}

fn push_mesh(object: &mut ObjectRecord, mut mesh: MeshRecord) {
    let dropped = mesh.retain_valid_triangles();
    if dropped > 0 {
        debug!(
            "Object '{}': dropped {} triangles with out-of-range vertex indices",
            object.id, dropped
        );
    }
    if mesh.is_well_formed() {
        object.meshes.push(mesh);
    } else {
        debug!("Object '{}': discarding mesh without triangles", object.id);
    }
}

/// Convert a 1-based extruder number into a 0-based material index
pub fn extruder_to_material(extruder: usize) -> usize {
    extruder.saturating_sub(1)
}

/// Loads the meshes that components point at
///
/// Entries named by a component path are parsed at most once per decode.
/// Only the referenced object's own mesh is used; components inside part
/// entries are not followed.
struct ComponentResolver<'a> {
    archive: &'a mut Archive,
    main: &'a Document,
    external: HashMap<String, Option<Document>>,
}

impl<'a> ComponentResolver<'a> {
    fn new(archive: &'a mut Archive, main: &'a Document) -> Self {
        Self {
            archive,
            main,
            external: HashMap::new(),
        }
    }

    fn meshes_for(&mut self, component: &ComponentElement) -> Vec<MeshRecord> {
        let document = match &component.path {
            Some(path) => match self.external_document(path) {
                Some(document) => document,
                None => return Vec::new(),
            },
            None => self.main,
        };

        let Some(target) = document.object(&component.object_id) else {
            debug!(
                "Component references unknown object '{}'{}",
                component.object_id,
                component
                    .path
                    .as_ref()
                    .map(|p| format!(" in '{}'", p))
                    .unwrap_or_default()
            );
            return Vec::new();
        };

        if !target.components.is_empty() {
            debug!(
                "Object '{}' has nested components, which are not followed",
                target.id
            );
        }

        target.mesh.iter().cloned().collect()
    }

    fn external_document(&mut self, path: &str) -> Option<&Document> {
        if !self.external.contains_key(path) {
            let document = match self.archive.read_entry(path) {
                Ok(xml) => match parse_document(&xml) {
                    Ok(document) => Some(document),
                    Err(e) => {
                        warn!("Failed to parse component entry '{}': {}", path, e);
                        None
                    }
                },
                Err(e) => {
                    debug!("Component entry '{}' unavailable: {}", path, e);
                    None
                }
            };
            self.external.insert(path.to_string(), document);
        }
        self.external.get(path).and_then(Option::as_ref)
    }
}

/// Extract local name from a potentially namespaced XML name
///
/// - `"p:path"` returns `"path"`
/// - `"object"` returns `"object"`
pub(crate) fn get_local_name(name_str: &str) -> &str {
    match name_str.rfind(':') {
        Some(pos) => &name_str[pos + 1..],
        None => name_str,
    }
}

/// Parse attributes from an XML element into a map keyed by qualified name
pub(crate) fn parse_attributes(e: &quick_xml::events::BytesStart) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::with_capacity(8);

    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        attrs.insert(key, attribute_text(&attr.value));
    }

    Ok(attrs)
}

/// Attribute value with XML entities decoded
///
/// Text with an unknown or broken entity is kept as written.
pub(crate) fn attribute_text(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    match unescape(&text) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(e) => {
            debug!("Keeping attribute text '{}' as written: {}", text, e);
            text.into_owned()
        }
    }
}

/// Get an attribute value by its local name, regardless of namespace prefix
pub(crate) fn get_attr_by_local_name<'m>(
    attrs: &'m HashMap<String, String>,
    local_name: &str,
) -> Option<&'m String> {
    attrs
        .get(local_name)
        .or_else(|| attrs.iter().find(|(k, _)| get_local_name(k) == local_name).map(|(_, v)| v))
}

/// Plate number from any accepted plate attribute spelling
pub(crate) fn plate_attribute(attrs: &HashMap<String, String>) -> Option<u32> {
    attrs.iter().find_map(|(key, value)| {
        let local = get_local_name(key).to_ascii_lowercase();
        if PLATE_ATTRIBUTE_NAMES.contains(&local.as_str()) {
            value.trim().parse::<u32>().ok()
        } else {
            None
        }
    })
}

/// Extruder number from a vendor-namespaced `extruder` attribute
pub(crate) fn extruder_attribute(attrs: &HashMap<String, String>) -> Option<usize> {
    get_attr_by_local_name(attrs, "extruder").and_then(|v| v.trim().parse::<usize>().ok())
}

/// Parse a float, treating malformed or non-finite text as 0
pub(crate) fn lenient_f64(value: &[u8]) -> f64 {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse a vertex index, treating malformed text as 0
pub(crate) fn lenient_u32(value: &[u8]) -> u32 {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(0)
}

/// Transform from an optional attribute value
pub(crate) fn transform_attribute(attrs: &HashMap<String, String>) -> Transform {
    attrs
        .get("transform")
        .map(|value| Transform::parse(value))
        .unwrap_or_default()
}
