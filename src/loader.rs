//! Fetching and format dispatch
//!
//! A load is: pick the format from the file name (or an explicit override),
//! fetch the bytes, decode them. Unsupported formats fail before any network
//! work. Loads are not cancelled; instead each one takes a ticket from a
//! [`LoadGeneration`] and its result is dropped if a newer load started.

use crate::config::DecodeConfig;
use crate::error::{Error, Result};
use crate::model::DecodedModel;
use crate::parser::decode_3mf;
use crate::stl::decode_stl;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "fetch")]
use crate::config::FetchConfig;
#[cfg(feature = "fetch")]
use log::{debug, info};

#[cfg(feature = "fetch")]
const USER_AGENT: &str = concat!("plate-preview/", env!("CARGO_PKG_VERSION"));

/// Input formats the decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// Zip-packaged 3D manufacturing format
    ThreeMf,
    /// Stereolithography, ASCII or binary
    Stl,
}

impl ModelFormat {
    /// Format for a file extension, case-insensitive
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "3mf" => Some(ModelFormat::ThreeMf),
            "stl" => Some(ModelFormat::Stl),
            _ => None,
        }
    }

    /// Pick the format from an override or from the extension of `source`
    ///
    /// `source` may be a URL; query string and fragment are ignored.
    ///
    /// ```
    /// use plate_preview::ModelFormat;
    ///
    /// assert_eq!(
    ///     ModelFormat::detect("https://printers.local/files/Benchy.3MF?token=x", None).unwrap(),
    ///     ModelFormat::ThreeMf
    /// );
    /// assert!(ModelFormat::detect("part.obj", None).is_err());
    /// ```
    pub fn detect(source: &str, override_format: Option<&str>) -> Result<Self> {
        if let Some(format) = override_format {
            return Self::from_extension(format)
                .ok_or_else(|| Error::UnsupportedFormat(format.to_string()));
        }

        let path = source.split(['?', '#']).next().unwrap_or(source);
        let file_name = path.rsplit('/').next().unwrap_or(path);
        file_name
            .rsplit_once('.')
            .and_then(|(_, extension)| Self::from_extension(extension))
            .ok_or_else(|| Error::UnsupportedFormat(file_name.to_string()))
    }
}

/// Decode bytes in the given format
pub fn decode(format: ModelFormat, bytes: Vec<u8>, config: &DecodeConfig) -> Result<DecodedModel> {
    match format {
        ModelFormat::ThreeMf => decode_3mf(bytes, config),
        ModelFormat::Stl => decode_stl(bytes),
    }
}

/// Ticket identifying one load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Generation counter guarding against stale load results
///
/// Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct LoadGeneration {
    current: Arc<AtomicU64>,
}

impl LoadGeneration {
    /// Create a counter with no load started
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load; every earlier ticket becomes stale
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Invalidate every outstanding ticket without starting a load
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether `ticket` belongs to the most recent load
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }
}

/// Fetches model bytes over HTTP(S)
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct Loader {
    client: reqwest::Client,
    config: FetchConfig,
}

#[cfg(feature = "fetch")]
impl Loader {
    /// Create a loader
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch the raw bytes at `url`
    ///
    /// Transport errors and non-success statuses are
    /// [`Error::NetworkFailure`].
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    /// Detect the format, fetch and decode
    pub async fn load(
        &self,
        url: &str,
        format_override: Option<&str>,
        config: &DecodeConfig,
    ) -> Result<DecodedModel> {
        let format = ModelFormat::detect(url, format_override)?;
        let bytes = self.fetch(url).await?;
        let model = decode(format, bytes, config)?;
        info!("Loaded {:?} model from {}", format, url);
        Ok(model)
    }
}
