//! # plate-preview
//!
//! Decode 3MF and STL models and turn them into renderable, plate-positioned
//! scenes.
//!
//! 3MF files are ZIP containers holding XML model data. Slicer-produced
//! archives add per-object settings (`Metadata/model_settings.config`) and
//! per-plate metadata (`Metadata/plate_N.json`); both are used to assign
//! materials and plates and to position each plate on a virtual build plate.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Lenient 3MF decoding: components, external component files, build items
//! - Material and plate assignment from item, component and settings data
//! - ASCII and binary STL
//! - Plate filtering, placement, per-material batching and camera framing
//! - Async fetching with last-load-wins semantics (`fetch` feature)
//!
//! ## Example
//!
//! ```no_run
//! use plate_preview::{ModelFormat, SceneConfig, Viewer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("calibration.3mf")?;
//!
//! let mut viewer = Viewer::new(SceneConfig::new().with_colors(["#ffffff", "#ff6a13"]));
//! viewer.load_bytes(ModelFormat::ThreeMf, bytes);
//! viewer.set_selected_plate(Some(1));
//!
//! if let Some(scene) = viewer.scene() {
//!     println!("{} triangles in {} batches", scene.triangle_count(), scene.batches.len());
//! } else if let Some(message) = viewer.error() {
//!     eprintln!("{}", message);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod parser;
pub mod scene;
pub mod stl;
pub mod transform;
pub mod viewer;

pub use config::{DecodeConfig, FetchConfig, SceneConfig};
pub use error::{Error, Result};
#[cfg(feature = "fetch")]
pub use loader::Loader;
pub use loader::{LoadGeneration, LoadTicket, ModelFormat, decode};
pub use model::{
    Bounds2, DecodedModel, MeshRecord, ObjectRecord, PlacementRecord, PlateBounds, SourceFormat,
};
pub use parser::decode_3mf;
pub use scene::{Aabb, CameraFrame, MaterialBatch, PlacementCase, Scene, SceneBuilder};
pub use stl::decode_stl;
pub use transform::Transform;
pub use viewer::Viewer;
