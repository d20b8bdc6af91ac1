// SPDX-License-Identifier: GPL-3.0-only

//! Decode backends
//!
//! A backend turns a prepared [`PixelBuffer`] into at most one payload.
//! Two backends exist:
//!
//! - [`LocalDecoder`]: fast, deterministic, works on luminance only
//! - [`MlDecoder`]: adapter over an asynchronous [`BarcodeDetector`] that
//!   reports every candidate it sees; consumes RGB
//!
//! The dispatcher only ever talks to the [`DecodeBackend`] trait.

pub mod local;
pub mod ml;

pub use local::LocalDecoder;
pub use ml::{BarcodeDetector, GridDetector, MlDecoder};

use crate::camera::FrameRotation;
use crate::constants::library;
use crate::errors::ErrorKind;
use crate::media::{BufferFormat, PixelBuffer};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Result of decoding one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A payload was read; ends the session
    Found(String),
    /// Nothing readable in this frame; keep scanning
    NotFound,
    /// Decoding failed; ends the session
    Error(ErrorKind),
}

impl DecodeResult {
    /// Whether this result ends the scan session
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DecodeResult::NotFound)
    }
}

/// Which backend a session decodes with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BackendKind {
    #[default]
    Local,
    Ml,
}

impl BackendKind {
    /// Resolve a host-supplied library identifier
    ///
    /// Unknown or empty identifiers fall back to the local decoder.
    pub fn from_identifier(identifier: &str) -> Self {
        let identifier = identifier.trim().to_ascii_lowercase();
        match identifier.as_str() {
            library::ML | library::ML_ALIAS => BackendKind::Ml,
            library::LOCAL | library::LOCAL_ALIAS => BackendKind::Local,
            _ => BackendKind::Local,
        }
    }

    /// Canonical identifier
    pub fn identifier(&self) -> &'static str {
        match self {
            BackendKind::Local => library::LOCAL,
            BackendKind::Ml => library::ML,
        }
    }

    /// Error kind reported when this backend fails
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            BackendKind::Local => ErrorKind::LocalLibraryError,
            BackendKind::Ml => ErrorKind::MlLibraryError,
        }
    }

    /// Buffer layout this backend consumes
    pub fn input_format(&self) -> BufferFormat {
        match self {
            BackendKind::Local => BufferFormat::Luma,
            BackendKind::Ml => BufferFormat::Rgb,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Ml => write!(f, "ml"),
        }
    }
}

/// A decoding capability
///
/// Implementations must not touch shared state beyond their own
/// resources; one instance serves every frame of a session.
pub trait DecodeBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn input_format(&self) -> BufferFormat {
        self.kind().input_format()
    }

    /// Decode one prepared buffer
    ///
    /// `rotation` is the rotation still outstanding after pre-processing.
    fn decode(&self, buffer: PixelBuffer, rotation: FrameRotation) -> BoxFuture<'_, DecodeResult>;
}

/// Construct the default backend for a kind
pub fn create_backend(kind: BackendKind) -> Arc<dyn DecodeBackend> {
    match kind {
        BackendKind::Local => Arc::new(LocalDecoder::new()),
        BackendKind::Ml => Arc::new(MlDecoder::default()),
    }
}

/// Construct a backend from a host-supplied library identifier
pub fn create_backend_for(identifier: &str) -> Arc<dyn DecodeBackend> {
    create_backend(BackendKind::from_identifier(identifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_selection() {
        assert_eq!(BackendKind::from_identifier("zxing"), BackendKind::Local);
        assert_eq!(BackendKind::from_identifier("mlkit"), BackendKind::Ml);
        assert_eq!(BackendKind::from_identifier(" MLKit "), BackendKind::Ml);
        assert_eq!(BackendKind::from_identifier("ml"), BackendKind::Ml);
    }

    #[test]
    fn test_unknown_identifier_falls_back_to_local() {
        assert_eq!(BackendKind::from_identifier(""), BackendKind::Local);
        assert_eq!(BackendKind::from_identifier("unknown"), BackendKind::Local);
        assert_eq!(create_backend_for("unknown").kind(), BackendKind::Local);
        assert_eq!(create_backend_for("").kind(), BackendKind::Local);
    }

    #[test]
    fn test_backend_properties() {
        assert_eq!(BackendKind::Local.error_kind(), ErrorKind::LocalLibraryError);
        assert_eq!(BackendKind::Ml.error_kind(), ErrorKind::MlLibraryError);
        assert_eq!(create_backend(BackendKind::Ml).input_format(), BufferFormat::Rgb);
        assert_eq!(create_backend(BackendKind::Local).input_format(), BufferFormat::Luma);
    }

    #[test]
    fn test_not_found_is_not_terminal() {
        assert!(!DecodeResult::NotFound.is_terminal());
        assert!(DecodeResult::Found("x".into()).is_terminal());
        assert!(DecodeResult::Error(ErrorKind::GeneralScanningError).is_terminal());
    }
}
