//! Slicer settings entry (`Metadata/model_settings.config`)
//!
//! ```xml
//! <config>
//!   <object id="2">
//!     <metadata key="name" value="Bracket"/>
//!     <metadata key="extruder" value="1"/>
//!     <part id="1" subtype="normal_part">
//!       <metadata key="extruder" value="3"/>
//!     </part>
//!   </object>
//!   <plate>
//!     <metadata key="plater_id" value="1"/>
//!     <model_instance>
//!       <metadata key="object_id" value="2"/>
//!     </model_instance>
//!   </plate>
//! </config>
//! ```
//!
//! Part ids match the `objectid` of the parent object's components.

use crate::archive::{Archive, MODEL_SETTINGS_PATH};
use crate::error::{Error, Result};
use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

use super::{PLATE_ATTRIBUTE_NAMES, get_local_name, parse_attributes};

/// Settings for one object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSettings {
    /// Display name
    pub name: Option<String>,
    /// Object extruder, 1-based
    pub extruder: Option<usize>,
    /// Part extruders keyed by part id, 1-based
    pub parts: HashMap<String, usize>,
}

/// Everything read from the settings entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSettings {
    /// Per-object settings keyed by object id
    pub objects: HashMap<String, ObjectSettings>,
    /// Plate assignment keyed by object id
    pub object_plates: HashMap<String, u32>,
}

/// Read the settings entry, or empty settings when it is missing or broken
pub(crate) fn load(archive: &mut Archive) -> ModelSettings {
    let xml = match archive.read_entry(MODEL_SETTINGS_PATH) {
        Ok(xml) => xml,
        Err(e) => {
            debug!("No model settings: {}", e);
            return ModelSettings::default();
        }
    };

    parse_model_settings(&xml).unwrap_or_else(|e| {
        warn!("Ignoring unreadable '{}': {}", MODEL_SETTINGS_PATH, e);
        ModelSettings::default()
    })
}

/// Where in the settings tree the parser is
enum Scope {
    Object(String),
    Part { object: String, part: String },
    Plate,
    Instance,
}

/// Parse the settings XML
pub fn parse_model_settings(xml: &str) -> Result<ModelSettings> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut settings = ModelSettings::default();
    let mut buf = Vec::new();
    let mut scopes: Vec<Scope> = Vec::new();
    let mut plate_id: Option<u32> = None;
    let mut plate_objects: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name();
                let name = String::from_utf8_lossy(name.as_ref());
                match get_local_name(&name) {
                    "object" => {
                        let id = required_id(e)?;
                        settings.objects.entry(id.clone()).or_default();
                        scopes.push(Scope::Object(id));
                    }
                    "part" => {
                        let object = match scopes.last() {
                            Some(Scope::Object(id)) => id.clone(),
                            _ => String::new(),
                        };
                        let part = required_id(e)?;
                        scopes.push(Scope::Part { object, part });
                    }
                    "plate" => {
                        plate_id = None;
                        plate_objects.clear();
                        scopes.push(Scope::Plate);
                    }
                    "model_instance" => scopes.push(Scope::Instance),
                    "metadata" => apply_metadata(
                        e,
                        scopes.last(),
                        &mut settings,
                        &mut plate_id,
                        &mut plate_objects,
                    )?,
                    _ => {}
                }
            }
            Event::Empty(ref e) => {
                let name = e.name();
                if get_local_name(&String::from_utf8_lossy(name.as_ref())) == "metadata" {
                    apply_metadata(
                        e,
                        scopes.last(),
                        &mut settings,
                        &mut plate_id,
                        &mut plate_objects,
                    )?;
                }
            }
            Event::End(ref e) => {
                let name = e.name();
                match get_local_name(&String::from_utf8_lossy(name.as_ref())) {
                    "object" | "part" | "model_instance" => {
                        scopes.pop();
                    }
                    "plate" => {
                        scopes.pop();
                        match plate_id {
                            Some(plate) => {
                                for object_id in plate_objects.drain(..) {
                                    settings.object_plates.entry(object_id).or_insert(plate);
                                }
                            }
                            None => debug!("Plate block without plate id ignored"),
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

    Ok(settings)
}

fn required_id(e: &BytesStart) -> Result<String> {
    parse_attributes(e)?
        .remove("id")
        .map(|id| id.trim().to_string())
        .ok_or_else(|| Error::XmlAttr("settings element missing id".to_string()))
}

fn apply_metadata(
    e: &BytesStart,
    scope: Option<&Scope>,
    settings: &mut ModelSettings,
    plate_id: &mut Option<u32>,
    plate_objects: &mut Vec<String>,
) -> Result<()> {
    let attrs = parse_attributes(e)?;
    let (Some(key), Some(value)) = (attrs.get("key"), attrs.get("value")) else {
        return Ok(());
    };
    let value = value.trim();

    match scope {
        Some(Scope::Object(id)) => {
            let object = settings.objects.entry(id.clone()).or_default();
            match key.as_str() {
                "name" => object.name = Some(value.to_string()),
                "extruder" => object.extruder = value.parse().ok(),
                _ => {}
            }
        }
        Some(Scope::Part { object, part }) if key == "extruder" => {
            if let Ok(extruder) = value.parse() {
                settings
                    .objects
                    .entry(object.clone())
                    .or_default()
                    .parts
                    .insert(part.clone(), extruder);
            }
        }
        Some(Scope::Plate) => {
            if PLATE_ATTRIBUTE_NAMES.contains(&key.to_ascii_lowercase().as_str()) {
                *plate_id = value.parse().ok();
            }
        }
        Some(Scope::Instance) if key == "object_id" => plate_objects.push(value.to_string()),
        _ => {}
    }
    Ok(())
}
