//! Per-plate metadata entries (`Metadata/plate_<N>.json`)

use crate::archive::Archive;
use crate::error::Result;
use crate::model::{Bounds2, PlateBounds};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

const PLATE_ENTRY_PREFIX: &str = "Metadata/plate_";
const PLATE_ENTRY_SUFFIX: &str = ".json";

#[derive(Debug, Default, Deserialize)]
struct PlateJson {
    #[serde(default)]
    bbox_all: Option<Vec<f64>>,
    #[serde(default)]
    bbox_objects: Vec<PlateObjectJson>,
    #[serde(default)]
    offset: Option<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct PlateObjectJson {
    #[serde(default)]
    name: Option<String>,
}

/// Plate data merged from every plate entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateMetadata {
    /// Bounds and offset keyed by plate number
    pub plates: BTreeMap<u32, PlateBounds>,
    /// Plate number keyed by object name; the lowest plate wins on duplicates
    pub names: HashMap<String, u32>,
}

/// Plate number encoded in a plate entry name
///
/// `Metadata/plate_3.json` yields 3.
pub fn plate_number(entry: &str) -> Option<u32> {
    entry
        .strip_prefix(PLATE_ENTRY_PREFIX)?
        .strip_suffix(PLATE_ENTRY_SUFFIX)?
        .parse()
        .ok()
}

/// Parse one plate entry into its bounds and object names
pub fn parse_plate_json(json: &str) -> Result<(PlateBounds, Vec<String>)> {
    let plate: PlateJson = serde_json::from_str(json)?;

    let bounds = plate
        .bbox_all
        .as_deref()
        .and_then(|values| <[f64; 4]>::try_from(values).ok())
        .filter(|values| values.iter().all(|v| v.is_finite()))
        .map(Bounds2::from_array);
    let offset = plate
        .offset
        .as_deref()
        .and_then(|values| <[f64; 2]>::try_from(values).ok());
    let names = plate
        .bbox_objects
        .into_iter()
        .filter_map(|object| object.name)
        .collect();

    Ok((PlateBounds { bounds, offset }, names))
}

/// Read every plate entry, skipping the ones that fail
pub(crate) fn load(archive: &mut Archive) -> PlateMetadata {
    let mut entries: Vec<(u32, String)> = archive
        .entry_names()
        .into_iter()
        .filter_map(|name| plate_number(&name).map(|n| (n, name)))
        .collect();
    entries.sort();

    let mut metadata = PlateMetadata::default();
    for (plate, entry) in entries {
        let json = match archive.read_entry(&entry) {
            Ok(json) => json,
            Err(e) => {
                debug!("Plate entry '{}' unavailable: {}", entry, e);
                continue;
            }
        };
        match parse_plate_json(&json) {
            Ok((bounds, names)) => {
                for name in names {
                    metadata.names.entry(name).or_insert(plate);
                }
                metadata.plates.insert(plate, bounds);
            }
            Err(e) => warn!("Ignoring unreadable plate entry '{}': {}", entry, e),
        }
    }
    metadata
}
