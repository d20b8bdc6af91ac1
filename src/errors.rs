// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanning pipeline
//!
//! Two layers live here. [`ErrorKind`] is the host-facing taxonomy: every
//! terminal failure of a scan session is reported as exactly one kind, each
//! with a stable numeric code and description. [`ScanError`] is the
//! internal error type returned by fallible pipeline functions; it always
//! knows which [`ErrorKind`] it surfaces as.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Terminal failure reported to the host
///
/// The numeric codes are part of the host contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Camera permission was refused (reported by the permission flow)
    CameraPermissionDenied,
    /// Scan configuration was rejected at session start
    InvalidParameters,
    /// Session ended by the host before anything was decoded
    ScanCancelled,
    /// Failure in frame conversion/geometry or an unrecognised fault
    GeneralScanningError,
    /// The fast local decoder failed
    LocalLibraryError,
    /// The detector-based decoder failed
    MlLibraryError,
}

impl ErrorKind {
    /// All kinds, for iteration in tests and host bindings
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::CameraPermissionDenied,
        ErrorKind::InvalidParameters,
        ErrorKind::ScanCancelled,
        ErrorKind::GeneralScanningError,
        ErrorKind::LocalLibraryError,
        ErrorKind::MlLibraryError,
    ];

    /// Stable numeric code sent to the host
    pub fn code(&self) -> i32 {
        match self {
            ErrorKind::CameraPermissionDenied => 7,
            ErrorKind::InvalidParameters => 10,
            ErrorKind::ScanCancelled => 6,
            ErrorKind::GeneralScanningError => 4,
            ErrorKind::LocalLibraryError => 11,
            ErrorKind::MlLibraryError => 12,
        }
    }

    /// Human-readable description sent alongside the code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::CameraPermissionDenied => {
                "Scanning cancelled due to missing camera permissions."
            }
            ErrorKind::InvalidParameters => "Scanning parameters are invalid.",
            ErrorKind::ScanCancelled => "Scanning cancelled.",
            ErrorKind::GeneralScanningError => "Error while trying to scan code.",
            ErrorKind::LocalLibraryError => {
                "There was an error scanning the barcode with the local decoder."
            }
            ErrorKind::MlLibraryError => {
                "There was an error scanning the barcode with the detector-based decoder."
            }
        }
    }

    /// Look up a kind by its numeric code
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.code())
    }
}

/// Malformed camera frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Width or height is zero
    EmptyFrame,
    /// Fewer planes than the declared format needs
    PlaneCount { expected: usize, actual: usize },
    /// A plane holds fewer bytes than its declared geometry requires
    PlaneTooShort {
        plane: usize,
        required: usize,
        actual: usize,
    },
    /// A plane declares a zero row or pixel stride
    InvalidStride { plane: usize },
}

/// Main pipeline error type
#[derive(Debug, Clone)]
pub enum ScanError {
    /// Frame could not be converted
    Frame(FrameError),
    /// Configuration rejected
    Config(String),
    /// A decode backend failed
    Decoder { kind: ErrorKind, message: String },
    /// Generic error with message
    Other(String),
}

impl ScanError {
    /// Build a decoder error attributed to the given backend error kind
    pub fn decoder(kind: ErrorKind, message: impl Into<String>) -> Self {
        ScanError::Decoder {
            kind,
            message: message.into(),
        }
    }

    /// The host-facing kind this error surfaces as
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::Frame(_) | ScanError::Other(_) => ErrorKind::GeneralScanningError,
            ScanError::Config(_) => ErrorKind::InvalidParameters,
            ScanError::Decoder { kind, .. } => *kind,
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::EmptyFrame => write!(f, "Frame has zero width or height"),
            FrameError::PlaneCount { expected, actual } => {
                write!(f, "Expected {} planes, got {}", expected, actual)
            }
            FrameError::PlaneTooShort {
                plane,
                required,
                actual,
            } => write!(
                f,
                "Plane {} too short: {} bytes required, {} available",
                plane, required, actual
            ),
            FrameError::InvalidStride { plane } => write!(f, "Plane {} has a zero stride", plane),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Frame(e) => write!(f, "Frame error: {}", e),
            ScanError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ScanError::Decoder { kind, message } => {
                write!(f, "Decoder error ({}): {}", kind.code(), message)
            }
            ScanError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ScanError {}
impl std::error::Error for FrameError {}

impl From<FrameError> for ScanError {
    fn from(err: FrameError) -> Self {
        ScanError::Frame(err)
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Config(err.to_string())
    }
}

impl From<String> for ScanError {
    fn from(msg: String) -> Self {
        ScanError::Other(msg)
    }
}

impl From<&str> for ScanError {
    fn from(msg: &str) -> Self {
        ScanError::Other(msg.to_string())
    }
}
