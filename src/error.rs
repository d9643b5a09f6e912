//! Error types for model preview
//!
//! Every error carries a code so the category is visible in logs and in the
//! message shown to the user.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: Archive and input errors
//! - **E2xxx**: XML and JSON errors in auxiliary entries
//! - **E3xxx**: Model content errors
//! - **E4xxx**: Unsupported input
//! - **E5xxx**: Transport errors
//!
//! Only some of these stop a load. Errors raised while reading optional
//! entries (settings, plate metadata, component parts) are logged and the
//! corresponding feature is skipped; see [`Error::is_fatal`].

use thiserror::Error;

/// Result type for preview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to the user when the input bytes cannot be decoded at all
pub const UNSUPPORTED_FILE_MESSAGE: &str = "unsupported file format";

/// Errors that can occur while loading and decoding a model
#[derive(Error, Debug)]
pub enum Error {
    /// The input is not a valid zip container
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - The file is plain text or some other binary format
    /// - Truncated download
    #[error("[E1002] Corrupt archive: {0}")]
    CorruptArchive(#[from] zip::result::ZipError),

    /// An entry was requested that the archive does not contain
    ///
    /// **Error Code**: E1003
    ///
    /// Raised for optional entries as well; callers decide whether the
    /// absence matters.
    #[error("[E1003] Missing archive entry: {0}")]
    MissingEntry(String),

    /// STL input could not be read
    ///
    /// **Error Code**: E1004
    #[error("[E1004] Malformed STL: {0}")]
    MalformedStl(#[source] std::io::Error),

    /// I/O error while reading an archive entry
    ///
    /// **Error Code**: E1001
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// JSON parsing error in plate metadata
    ///
    /// **Error Code**: E2006
    #[error("[E2006] JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The archive opened but no usable mesh was decoded
    ///
    /// **Error Code**: E3003
    ///
    /// **Common Causes**:
    /// - No model entry in the archive
    /// - Meshes that declare vertices but no triangles
    #[error("[E3003] No meshes found: {0}")]
    NoMeshesFound(String),

    /// The file extension or format override is not one we decode
    ///
    /// **Error Code**: E4003
    #[error("[E4003] Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Fetching the model bytes failed
    ///
    /// **Error Code**: E5001
    #[error("[E5001] Network failure: {0}")]
    NetworkFailure(String),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

#[cfg(feature = "fetch")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkFailure(err.to_string())
    }
}

impl Error {
    /// Create a NoMeshesFound error naming the decoded source
    pub fn no_meshes(source: &str) -> Self {
        Error::NoMeshesFound(format!("'{}' contains no mesh with both vertices and triangles", source))
    }

    /// Whether this error stops the current load
    ///
    /// Auxiliary-entry errors (missing entry, XML/JSON trouble, I/O inside the
    /// archive) only disable the feature that needed the entry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::CorruptArchive(_)
                | Error::MalformedStl(_)
                | Error::NoMeshesFound(_)
                | Error::UnsupportedFormat(_)
                | Error::NetworkFailure(_)
        )
    }

    /// Single human-readable line for the error state of the viewer
    pub fn user_message(&self) -> String {
        match self {
            Error::CorruptArchive(_) | Error::MalformedStl(_) => {
                UNSUPPORTED_FILE_MESSAGE.to_string()
            }
            Error::NoMeshesFound(_) => "no meshes found in file".to_string(),
            Error::UnsupportedFormat(format) => {
                format!("{}: {}", UNSUPPORTED_FILE_MESSAGE, format)
            }
            Error::NetworkFailure(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
