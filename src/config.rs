//! Caller-supplied configuration
//!
//! All configuration structs follow the same builder style: `new()` gives
//! the defaults and `with_*` methods override one field at a time.

use std::time::Duration;

/// Default build volume in millimeters (X, Y, Z in source convention)
pub const DEFAULT_BUILD_VOLUME: [f64; 3] = [256.0, 256.0, 256.0];

/// Color used when the palette has no usable entry for a material
pub const DEFAULT_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

/// Options for the geometry decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Accept any `*.model` entry when no `3dmodel.model` entry exists
    pub allow_any_model_entry: bool,
}

impl DecodeConfig {
    /// Create the default decoder configuration
    pub fn new() -> Self {
        Self {
            allow_any_model_entry: true,
        }
    }

    /// Enable or disable the `*.model` fallback
    pub fn with_any_model_entry(mut self, allow: bool) -> Self {
        self.allow_any_model_entry = allow;
        self
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for the scene builder
///
/// # Example
///
/// ```
/// use plate_preview::SceneConfig;
///
/// let config = SceneConfig::new()
///     .with_build_volume([220.0, 220.0, 250.0])
///     .with_colors(["#ff0000", "#00ff00"])
///     .with_selected_plate(Some(2));
/// assert_eq!(config.plate_center(), [110.0, 110.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Build volume extents in source convention (X, Y, Z-up)
    pub build_volume: [f64; 3],
    /// Per-material color strings, indexed by material
    pub colors: Vec<String>,
    /// Plate to render, or all plates when `None`
    pub selected_plate: Option<u32>,
}

impl SceneConfig {
    /// Create the default scene configuration
    pub fn new() -> Self {
        Self {
            build_volume: DEFAULT_BUILD_VOLUME,
            colors: Vec::new(),
            selected_plate: None,
        }
    }

    /// Set the build volume
    pub fn with_build_volume(mut self, build_volume: [f64; 3]) -> Self {
        self.build_volume = build_volume;
        self
    }

    /// Set the material palette
    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = colors.into_iter().map(Into::into).collect();
        self
    }

    /// Select a plate
    pub fn with_selected_plate(mut self, plate: Option<u32>) -> Self {
        self.selected_plate = plate;
        self
    }

    /// Center of the virtual build plate in source X/Y
    pub fn plate_center(&self) -> [f64; 2] {
        [self.build_volume[0] / 2.0, self.build_volume[1] / 2.0]
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for fetching model bytes
#[derive(Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Bearer token attached as an `Authorization` header
    pub bearer_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl FetchConfig {
    /// Create the default fetch configuration
    pub fn new() -> Self {
        Self {
            bearer_token: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Attach a bearer token to every request
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchConfig")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(DecodeConfig::default().allow_any_model_entry);
        let scene = SceneConfig::default();
        assert_eq!(scene.build_volume, DEFAULT_BUILD_VOLUME);
        assert!(scene.colors.is_empty());
        assert_eq!(scene.selected_plate, None);
        assert_eq!(scene.plate_center(), [128.0, 128.0]);
    }

    #[test]
    fn test_fetch_config_redacts_token() {
        let config = FetchConfig::new().with_bearer_token("secret-token");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}
