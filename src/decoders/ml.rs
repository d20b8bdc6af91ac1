// SPDX-License-Identifier: GPL-3.0-only

//! Detector-based decoder
//!
//! Wraps an asynchronous [`BarcodeDetector`] that reports every candidate
//! symbol it sees. The first candidate's payload wins; an empty list or a
//! blank payload means nothing was found in this frame.

use crate::camera::FrameRotation;
use crate::decoders::local::detect_qr_codes;
use crate::decoders::{BackendKind, DecodeBackend, DecodeResult};
use crate::errors::{ErrorKind, ScanError, ScanResult};
use crate::frame_processor::types::DetectedCode;
use crate::media::PixelBuffer;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// An asynchronous symbol detector
pub trait BarcodeDetector: Send + Sync {
    /// Report all candidate symbols in an image
    ///
    /// `rotation` is how far the image is still rotated from upright.
    /// Candidates carry their payload when readable and, when the detector
    /// can locate them, their bounds in normalized image coordinates.
    fn process(
        &self,
        image: PixelBuffer,
        rotation: FrameRotation,
    ) -> BoxFuture<'_, ScanResult<Vec<DetectedCode>>>;
}

/// Default detector: every QR grid rqrr can locate, read or not
#[derive(Debug, Default, Clone, Copy)]
pub struct GridDetector;

impl BarcodeDetector for GridDetector {
    fn process(
        &self,
        image: PixelBuffer,
        _rotation: FrameRotation,
    ) -> BoxFuture<'_, ScanResult<Vec<DetectedCode>>> {
        async move {
            tokio::task::spawn_blocking(move || detect_qr_codes(&image.to_luma()))
                .await
                .map_err(|e| ScanError::decoder(ErrorKind::MlLibraryError, e.to_string()))
        }
        .boxed()
    }
}

/// Decoder backed by a [`BarcodeDetector`]
pub struct MlDecoder {
    detector: Arc<dyn BarcodeDetector>,
}

impl Default for MlDecoder {
    fn default() -> Self {
        Self::new(GridDetector)
    }
}

impl MlDecoder {
    pub fn new(detector: impl BarcodeDetector + 'static) -> Self {
        Self {
            detector: Arc::new(detector),
        }
    }
}

impl DecodeBackend for MlDecoder {
    fn kind(&self) -> BackendKind {
        BackendKind::Ml
    }

    fn decode(&self, buffer: PixelBuffer, rotation: FrameRotation) -> BoxFuture<'_, DecodeResult> {
        async move {
            match self.detector.process(buffer, rotation).await {
                Ok(codes) => {
                    trace!(candidates = codes.len(), "Detector finished");
                    first_payload(codes)
                }
                Err(e) => {
                    warn!(error = %e, "Detector failed");
                    DecodeResult::Error(ErrorKind::MlLibraryError)
                }
            }
        }
        .boxed()
    }
}

/// Take the first candidate's payload, if it has a non-blank one
fn first_payload(codes: Vec<DetectedCode>) -> DecodeResult {
    match codes.into_iter().next().and_then(|code| code.raw_value) {
        Some(value) if !value.trim().is_empty() => {
            debug!(len = value.len(), "Detector found code");
            DecodeResult::Found(value)
        }
        _ => DecodeResult::NotFound,
    }
}
