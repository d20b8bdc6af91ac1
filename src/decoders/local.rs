// SPDX-License-Identifier: GPL-3.0-only

//! Fast local decoder
//!
//! Binarizes the luminance image and searches it for QR grids with rqrr.
//! In try-harder mode a frame that yields nothing is retried inverted
//! (light-on-dark symbols) and at half resolution (symbols too large or
//! too noisy at full size). Finding nothing is not an error.

use crate::camera::FrameRotation;
use crate::constants::local_decoder::MIN_DOWNSCALE_DIMENSION;
use crate::decoders::{BackendKind, DecodeBackend, DecodeResult};
use crate::errors::{ErrorKind, ScanError, ScanResult};
use crate::frame_processor::types::{CodeFormat, DetectedCode, FrameRegion};
use crate::media::PixelBuffer;
use futures::FutureExt;
use futures::future::BoxFuture;
use image::GrayImage;
use image::imageops::{self, FilterType};
use std::borrow::Cow;
use tracing::{debug, trace, warn};

/// Preprocessing pass applied before grid detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Raw,
    Inverted,
    Downscaled,
}

const TRY_HARDER: [Strategy; 3] = [Strategy::Raw, Strategy::Inverted, Strategy::Downscaled];

/// Local QR decoder
pub struct LocalDecoder {
    try_harder: bool,
}

impl Default for LocalDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalDecoder {
    /// Create a decoder with try-harder enabled
    pub fn new() -> Self {
        Self { try_harder: true }
    }

    /// Create a decoder that only runs the plain pass
    pub fn single_pass() -> Self {
        Self { try_harder: false }
    }
}

impl DecodeBackend for LocalDecoder {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn decode(&self, buffer: PixelBuffer, _rotation: FrameRotation) -> BoxFuture<'_, DecodeResult> {
        let try_harder = self.try_harder;

        async move {
            // Run detection in a blocking task to avoid blocking the async runtime
            match tokio::task::spawn_blocking(move || decode_sync(&buffer, try_harder)).await {
                Ok(Ok(Some(content))) => DecodeResult::Found(content),
                Ok(Ok(None)) => DecodeResult::NotFound,
                Ok(Err(e)) => {
                    warn!(error = %e, "Local decoder failed");
                    DecodeResult::Error(ErrorKind::LocalLibraryError)
                }
                Err(e) => {
                    warn!(error = %e, "Local decode task panicked");
                    DecodeResult::Error(ErrorKind::LocalLibraryError)
                }
            }
        }
        .boxed()
    }
}

/// Synchronous decode (runs in blocking task)
fn decode_sync(buffer: &PixelBuffer, try_harder: bool) -> ScanResult<Option<String>> {
    let start = std::time::Instant::now();
    let (width, height) = buffer.dimensions();
    if width == 0 || height == 0 {
        return Err(ScanError::decoder(
            ErrorKind::LocalLibraryError,
            "cannot decode an empty buffer",
        ));
    }

    let luma: Cow<'_, GrayImage> = match buffer {
        PixelBuffer::Luma(img) => Cow::Borrowed(img),
        PixelBuffer::Rgb(_) => Cow::Owned(buffer.to_luma()),
    };

    let strategies = if try_harder {
        &TRY_HARDER[..]
    } else {
        &TRY_HARDER[..1]
    };

    for &strategy in strategies {
        let found = match strategy {
            Strategy::Raw => first_payload(&luma),
            Strategy::Inverted => {
                let mut inverted = luma.clone().into_owned();
                imageops::invert(&mut inverted);
                first_payload(&inverted)
            }
            Strategy::Downscaled => {
                if width.min(height) < MIN_DOWNSCALE_DIMENSION {
                    continue;
                }
                let small = imageops::resize(&*luma, width / 2, height / 2, FilterType::Triangle);
                first_payload(&small)
            }
        };

        if let Some(content) = found {
            debug!(
                ?strategy,
                elapsed_ms = start.elapsed().as_millis(),
                "Local decoder found code"
            );
            return Ok(Some(content));
        }
        trace!(?strategy, "No code in pass");
    }

    Ok(None)
}

fn first_payload(img: &GrayImage) -> Option<String> {
    detect_qr_codes(img)
        .into_iter()
        .find_map(|code| code.raw_value)
}

/// Locate every QR grid in a luminance image and try to read each one
///
/// Grids that fail to decode are still reported, without a payload.
pub(crate) fn detect_qr_codes(img: &GrayImage) -> Vec<DetectedCode> {
    let (width, height) = img.dimensions();
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            img.get_pixel(x as u32, y as u32).0[0]
        });

    prepared
        .detect_grids()
        .into_iter()
        .map(|grid| {
            let raw_value = match grid.decode() {
                Ok((_, content)) => Some(content),
                Err(e) => {
                    debug!(error = ?e, "Failed to decode QR grid");
                    None
                }
            };

            // Bounding box of the four grid corners
            let xs = grid.bounds.iter().map(|p| p.x.clamp(0, width as i32) as u32);
            let ys = grid.bounds.iter().map(|p| p.y.clamp(0, height as i32) as u32);
            let (min_x, max_x) = (xs.clone().min().unwrap_or(0), xs.max().unwrap_or(0));
            let (min_y, max_y) = (ys.clone().min().unwrap_or(0), ys.max().unwrap_or(0));

            DetectedCode::new(raw_value, CodeFormat::QrCode).with_bounds(FrameRegion::from_pixels(
                min_x,
                min_y,
                max_x - min_x,
                max_y - min_y,
                width,
                height,
            ))
        })
        .collect()
}
