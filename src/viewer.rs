//! Viewer state: the installed scene and the model it was built from
//!
//! The render loop only reads [`Viewer::scene`]. Every load, plate change or
//! palette change drops the current scene before the next one is built.

use crate::config::{DecodeConfig, SceneConfig};
use crate::error::Result;
use crate::loader::{LoadGeneration, LoadTicket, ModelFormat, decode};
use crate::model::DecodedModel;
use crate::scene::{Scene, SceneBuilder};
use log::{debug, warn};

#[cfg(feature = "fetch")]
use crate::loader::Loader;

/// One model view
#[derive(Debug, Default)]
pub struct Viewer {
    decode_config: DecodeConfig,
    scene_config: SceneConfig,
    generation: LoadGeneration,
    model: Option<DecodedModel>,
    scene: Option<Scene>,
    error: Option<String>,
    loading: bool,
}

impl Viewer {
    /// Create an empty viewer
    pub fn new(scene_config: SceneConfig) -> Self {
        Self {
            scene_config,
            ..Self::default()
        }
    }

    /// Use a non-default decoder configuration
    pub fn with_decode_config(mut self, decode_config: DecodeConfig) -> Self {
        self.decode_config = decode_config;
        self
    }

    /// Currently installed scene
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Model behind the installed scene
    pub fn model(&self) -> Option<&DecodedModel> {
        self.model.as_ref()
    }

    /// Message for the error state, if the last load failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a load is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Scene configuration in effect
    pub fn scene_config(&self) -> &SceneConfig {
        &self.scene_config
    }

    /// Plates the loaded model assigns placements to
    pub fn plates(&self) -> Vec<u32> {
        self.model.as_ref().map(DecodedModel::plate_ids).unwrap_or_default()
    }

    /// Shared generation counter, for loads driven outside the viewer
    pub fn generation(&self) -> LoadGeneration {
        self.generation.clone()
    }

    /// Start a load and get its ticket
    pub fn begin_load(&mut self) -> LoadTicket {
        self.loading = true;
        self.error = None;
        self.generation.begin()
    }

    /// Install the result of the load identified by `ticket`
    ///
    /// Returns `false` and changes nothing when a newer load has started
    /// since. A failed load clears the scene and keeps only its message.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<DecodedModel>) -> bool {
        if !self.generation.is_current(ticket) {
            debug!("Discarding result of superseded load {:?}", ticket);
            return false;
        }

        self.loading = false;
        self.clear();
        match result {
            Ok(model) => {
                self.model = Some(model);
                self.rebuild();
            }
            Err(e) => {
                warn!("Model load failed: {}", e);
                self.error = Some(e.user_message());
            }
        }
        true
    }

    /// Decode bytes that are already in memory
    pub fn load_bytes(&mut self, format: ModelFormat, bytes: Vec<u8>) -> bool {
        let ticket = self.begin_load();
        let result = decode(format, bytes, &self.decode_config);
        self.finish_load(ticket, result)
    }

    /// Fetch, decode and install the model at `url`
    ///
    /// Returns `false` when the result was discarded because another load
    /// started in the meantime.
    #[cfg(feature = "fetch")]
    pub async fn load(&mut self, loader: &Loader, url: &str, format_override: Option<&str>) -> bool {
        let ticket = self.begin_load();
        let decode_config = self.decode_config.clone();
        let result = loader.load(url, format_override, &decode_config).await;
        self.finish_load(ticket, result)
    }

    /// Show only `plate`, or every plate with `None`
    pub fn set_selected_plate(&mut self, plate: Option<u32>) {
        self.scene_config.selected_plate = plate;
        self.rebuild();
    }

    /// Replace the material palette
    pub fn set_colors(&mut self, colors: Vec<String>) {
        self.scene_config.colors = colors;
        self.rebuild();
    }

    /// Replace the build volume
    pub fn set_build_volume(&mut self, build_volume: [f64; 3]) {
        self.scene_config.build_volume = build_volume;
        self.rebuild();
    }

    /// Drop the model and scene, and ignore any load still in flight
    pub fn unmount(&mut self) {
        self.generation.invalidate();
        self.loading = false;
        self.error = None;
        self.clear();
    }

    fn clear(&mut self) {
        self.scene = None;
        self.model = None;
    }

    fn rebuild(&mut self) {
        self.scene = None;
        let Some(model) = &self.model else {
            return;
        };
        match SceneBuilder::new(&self.scene_config).build(model) {
            Ok(scene) => {
                self.error = None;
                self.scene = Some(scene);
            }
            Err(e) => {
                warn!("Scene build failed: {}", e);
                self.error = Some(e.user_message());
            }
        }
    }
}
