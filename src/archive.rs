//! Zip container access for 3MF files
//!
//! 3MF files are ZIP archives following the Open Packaging Conventions. This
//! module only reads: it opens the container, lists entry names and returns
//! entry contents. Lookups are linear scans; archives hold tens of entries.

use crate::error::{Error, Result};
use crate::parser::attribute_text;
use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use urlencoding::decode;
use zip::ZipArchive;

/// Main 3D model entry path within the archive
pub const MODEL_PATH: &str = "3D/3dmodel.model";

/// Suffix identifying the main model entry wherever it lives
pub const MODEL_SUFFIX: &str = "/3dmodel.model";

/// Extension of any model-description entry
pub const MODEL_EXTENSION: &str = ".model";

/// Package relationships entry
pub const RELS_PATH: &str = "_rels/.rels";

/// Per-object and per-plate slicer settings
pub const MODEL_SETTINGS_PATH: &str = "Metadata/model_settings.config";

/// 3D model relationship type
pub const MODEL_REL_TYPE: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";

/// Read-only view over a zip container held in memory
pub struct Archive {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl Archive {
    /// Open a byte buffer as a zip container
    ///
    /// Fails with [`Error::CorruptArchive`] when the bytes are not a zip file.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive })
    }

    /// Get an entry as text
    pub fn read_entry(&mut self, path: &str) -> Result<String> {
        let name = normalize_entry_path(path);
        let mut file = self
            .archive
            .by_name(&name)
            .map_err(|_| Error::MissingEntry(name.clone()))?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Get an entry as binary data
    pub fn read_entry_binary(&mut self, path: &str) -> Result<Vec<u8>> {
        let name = normalize_entry_path(path);
        let mut file = self
            .archive
            .by_name(&name)
            .map_err(|_| Error::MissingEntry(name.clone()))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Check if an entry exists
    pub fn has_entry(&mut self, path: &str) -> bool {
        self.archive.by_name(&normalize_entry_path(path)).is_ok()
    }

    /// All entry names in archive order
    pub fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// First entry whose name satisfies `predicate`
    pub fn find_entry<F>(&self, mut predicate: F) -> Option<String>
    where
        F: FnMut(&str) -> bool,
    {
        self.archive
            .file_names()
            .find(|&name| predicate(name))
            .map(str::to_string)
    }

    /// Number of entries in the archive
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Whether the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Locate the main model-description entry
    ///
    /// Tried in order: the package relationship targeting a 3D model, the
    /// standard path, any entry ending in `/3dmodel.model`, and (when
    /// `allow_any_model` is set) any entry ending in `.model`.
    pub fn locate_model_entry(&mut self, allow_any_model: bool) -> Option<String> {
        match self.discover_model_path() {
            Ok(path) if self.has_entry(&path) => return Some(path),
            Ok(path) => debug!("Model relationship points to missing entry '{}'", path),
            Err(e) => debug!("No usable model relationship: {}", e),
        }

        if self.has_entry(MODEL_PATH) {
            return Some(MODEL_PATH.to_string());
        }

        let suffix_match = self.find_entry(|name| {
            let lower = name.to_ascii_lowercase();
            lower.ends_with(MODEL_SUFFIX) || lower == MODEL_SUFFIX[1..]
        });
        if suffix_match.is_some() {
            return suffix_match;
        }

        if allow_any_model {
            return self.find_entry(|name| name.to_ascii_lowercase().ends_with(MODEL_EXTENSION));
        }

        None
    }

    /// Discover the model path from the package relationships
    fn discover_model_path(&mut self) -> Result<String> {
        let rels_content = self.read_entry(RELS_PATH)?;

        let mut reader = Reader::from_str(&rels_content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(ref e) | Event::Start(ref e) => {
                    if !e.local_name().as_ref().ends_with(b"Relationship") {
                        buf.clear();
                        continue;
                    }

                    let mut target = None;
                    let mut rel_type = None;

                    for attr in e.attributes() {
                        let attr = attr?;
                        let value = attribute_text(&attr.value);
                        match attr.key.as_ref() {
                            b"Target" => target = Some(value),
                            b"Type" => rel_type = Some(value),
                            _ => {}
                        }
                    }

                    if let (Some(t), Some(rt)) = (target, rel_type) {
                        if rt == MODEL_REL_TYPE {
                            return Ok(normalize_entry_path(&t));
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Err(Error::MissingEntry(
            "3D model relationship not found".to_string(),
        ))
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("entries", &self.archive.len())
            .finish()
    }
}

/// Turn a part name as written in XML into a zip entry name
///
/// Part names are absolute (`/3D/Objects/object_1.model`) and may be
/// percent-encoded; zip entry names are relative and raw UTF-8.
pub fn normalize_entry_path(path: &str) -> String {
    let stripped = path.strip_prefix('/').unwrap_or(path);
    match decode(stripped) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => stripped.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_text_buffer_is_corrupt_archive() {
        let result = Archive::from_bytes(b"solid cube\nendsolid cube\n".to_vec());
        assert!(matches!(result, Err(Error::CorruptArchive(_))));
    }

    #[test]
    fn test_read_entry_and_missing_entry() {
        let bytes = build_zip(&[("Metadata/plate_1.json", "{}")]);
        let mut archive = Archive::from_bytes(bytes).unwrap();

        assert_eq!(archive.read_entry("Metadata/plate_1.json").unwrap(), "{}");
        assert_eq!(archive.read_entry("/Metadata/plate_1.json").unwrap(), "{}");
        assert!(matches!(
            archive.read_entry(MODEL_SETTINGS_PATH),
            Err(Error::MissingEntry(_))
        ));
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_locate_standard_model_path() {
        let bytes = build_zip(&[("Metadata/plate_1.json", "{}"), (MODEL_PATH, "<model/>")]);
        let mut archive = Archive::from_bytes(bytes).unwrap();
        assert_eq!(archive.locate_model_entry(false).as_deref(), Some(MODEL_PATH));
    }

    #[test]
    fn test_locate_model_via_relationship() {
        let rels = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/main%20part.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;
        let bytes = build_zip(&[(RELS_PATH, rels), ("3D/main part.model", "<model/>")]);
        let mut archive = Archive::from_bytes(bytes).unwrap();
        assert_eq!(
            archive.locate_model_entry(false).as_deref(),
            Some("3D/main part.model")
        );
    }

    #[test]
    fn test_locate_model_by_suffix() {
        let bytes = build_zip(&[("Exported/3DModel.model", "<model/>")]);
        let mut archive = Archive::from_bytes(bytes).unwrap();
        assert_eq!(
            archive.locate_model_entry(false).as_deref(),
            Some("Exported/3DModel.model")
        );
    }

    #[test]
    fn test_any_model_fallback_is_configurable() {
        let bytes = build_zip(&[("3D/part.model", "<model/>")]);
        let mut archive = Archive::from_bytes(bytes).unwrap();
        assert_eq!(archive.locate_model_entry(false), None);
        assert_eq!(
            archive.locate_model_entry(true).as_deref(),
            Some("3D/part.model")
        );
    }

    #[test]
    fn test_normalize_entry_path() {
        assert_eq!(
            normalize_entry_path("/3D/Objects/object_1.model"),
            "3D/Objects/object_1.model"
        );
        assert_eq!(normalize_entry_path("/2D/test%C3%86file.model"), "2D/testÆfile.model");
    }
}
