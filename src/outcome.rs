// SPDX-License-Identifier: GPL-3.0-only

//! Terminal outcome of a scan session and its host result-code form
//!
//! The host activity protocol reports a scan as a request code, a result
//! code and an optional text payload. [`ScanOutcome`] converts between that
//! triple and the typed outcome.

use crate::constants::host::{RESULT_CANCELED, RESULT_OK, SCAN_REQUEST_CODE};
use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a scan session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanOutcome {
    Success(String),
    Failure(ErrorKind),
}

impl ScanOutcome {
    /// Result code the host expects for this outcome
    pub fn result_code(&self) -> i32 {
        match self {
            ScanOutcome::Success(_) => RESULT_OK,
            ScanOutcome::Failure(kind) => kind.code(),
        }
    }

    /// Payload text, for a success
    pub fn payload(&self) -> Option<&str> {
        match self {
            ScanOutcome::Success(text) => Some(text),
            ScanOutcome::Failure(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanOutcome::Success(_))
    }

    /// Interpret a host activity result
    pub fn from_result_code(request_code: i32, result_code: i32, payload: Option<&str>) -> Self {
        if request_code != SCAN_REQUEST_CODE {
            return ScanOutcome::Failure(ErrorKind::GeneralScanningError);
        }

        match result_code {
            RESULT_OK => match payload {
                Some(text) if !text.is_empty() => ScanOutcome::Success(text.to_string()),
                _ => ScanOutcome::Failure(ErrorKind::GeneralScanningError),
            },
            RESULT_CANCELED => ScanOutcome::Failure(ErrorKind::ScanCancelled),
            code => ScanOutcome::Failure(
                ErrorKind::from_code(code).unwrap_or(ErrorKind::GeneralScanningError),
            ),
        }
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanOutcome::Success(text) => write!(f, "scanned: {}", text),
            ScanOutcome::Failure(kind) => write!(f, "failed: {}", kind),
        }
    }
}

impl From<ErrorKind> for ScanOutcome {
    fn from(kind: ErrorKind) -> Self {
        ScanOutcome::Failure(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result_code() {
        let outcome = ScanOutcome::Success("hello".into());
        assert_eq!(outcome.result_code(), -1);
        assert_eq!(outcome.payload(), Some("hello"));
    }

    #[test]
    fn test_failure_result_code_is_error_code() {
        for kind in ErrorKind::ALL {
            assert_eq!(ScanOutcome::Failure(kind).result_code(), kind.code());
        }
    }

    #[test]
    fn test_wrong_request_code() {
        assert_eq!(
            ScanOutcome::from_result_code(1, -1, Some("x")),
            ScanOutcome::Failure(ErrorKind::GeneralScanningError)
        );
    }

    #[test]
    fn test_ok_requires_payload() {
        assert_eq!(
            ScanOutcome::from_result_code(112, -1, Some("abc")),
            ScanOutcome::Success("abc".into())
        );
        assert_eq!(
            ScanOutcome::from_result_code(112, -1, Some("")),
            ScanOutcome::Failure(ErrorKind::GeneralScanningError)
        );
        assert_eq!(
            ScanOutcome::from_result_code(112, -1, None),
            ScanOutcome::Failure(ErrorKind::GeneralScanningError)
        );
    }

    #[test]
    fn test_canceled_and_error_codes() {
        assert_eq!(
            ScanOutcome::from_result_code(112, 0, None),
            ScanOutcome::Failure(ErrorKind::ScanCancelled)
        );
        assert_eq!(
            ScanOutcome::from_result_code(112, 12, None),
            ScanOutcome::Failure(ErrorKind::MlLibraryError)
        );
        assert_eq!(
            ScanOutcome::from_result_code(112, 99, None),
            ScanOutcome::Failure(ErrorKind::GeneralScanningError)
        );
    }
}
