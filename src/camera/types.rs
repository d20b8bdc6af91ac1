// SPDX-License-Identifier: GPL-3.0-only

//! Camera frame types
//!
//! A [`Frame`] is owned by exactly one pipeline stage at a time. It is moved
//! from the camera into the dispatcher and from there into the analysis
//! task. The camera producer stalls until each frame is released, so the
//! release hook runs from `Drop`: whichever path a frame leaves the
//! pipeline by, it is released exactly once.

use crate::errors::FrameError;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

type ReleaseFn = Box<dyn FnOnce() + Send + 'static>;

/// One plane of pixel samples
#[derive(Debug, Clone)]
pub struct Plane {
    pub data: Arc<[u8]>,
    /// Bytes between the starts of consecutive rows
    pub row_stride: usize,
    /// Bytes between consecutive samples of a row (2 for interleaved chroma)
    pub pixel_stride: usize,
}

impl Plane {
    pub fn new(data: impl Into<Arc<[u8]>>, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data: data.into(),
            row_stride,
            pixel_stride,
        }
    }

    /// Plane with one byte per sample
    pub fn packed(data: impl Into<Arc<[u8]>>, row_stride: usize) -> Self {
        Self::new(data, row_stride, 1)
    }

    /// Bytes needed to address `width` x `height` samples with this layout
    pub fn required_len(&self, width: usize, height: usize) -> usize {
        if width == 0 || height == 0 {
            return 0;
        }
        (height - 1) * self.row_stride + (width - 1) * self.pixel_stride + 1
    }

    #[inline]
    pub(crate) fn sample(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.row_stride + x * self.pixel_stride]
    }
}

/// Memory layout of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameFormat {
    /// Three-plane 4:2:0 with per-plane strides (Y, U, V)
    ///
    /// Chroma pixel stride 1 is fully planar, 2 is semi-planar.
    Yuv420,
    /// Y plane + interleaved VU plane
    Nv21,
    /// Y plane + interleaved UV plane
    Nv12,
    /// Single luminance plane
    Gray8,
}

impl FrameFormat {
    /// Number of planes the layout carries
    pub fn plane_count(&self) -> usize {
        match self {
            Self::Yuv420 => 3,
            Self::Nv21 | Self::Nv12 => 2,
            Self::Gray8 => 1,
        }
    }

    pub fn has_chroma(&self) -> bool {
        !matches!(self, Self::Gray8)
    }
}

/// Clockwise rotation needed to display the frame upright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameRotation {
    #[default]
    None,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl FrameRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    ///
    /// Returns `None` for angles that are not a multiple of 90.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(FrameRotation::None),
            90 => Some(FrameRotation::Rotate90),
            180 => Some(FrameRotation::Rotate180),
            270 => Some(FrameRotation::Rotate270),
            _ => None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            FrameRotation::None => 0,
            FrameRotation::Rotate90 => 90,
            FrameRotation::Rotate180 => 180,
            FrameRotation::Rotate270 => 270,
        }
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, FrameRotation::Rotate90 | FrameRotation::Rotate270)
    }
}

impl fmt::Display for FrameRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A single camera capture
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub planes: Vec<Plane>,
    pub rotation: FrameRotation,
    pub captured_at: Instant,
    release: Option<ReleaseFn>,
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        format: FrameFormat,
        planes: Vec<Plane>,
        rotation: FrameRotation,
    ) -> Self {
        Self {
            width,
            height,
            format,
            planes,
            rotation,
            captured_at: Instant::now(),
            release: None,
        }
    }

    /// Attach the hook that hands the buffer back to the camera
    pub fn with_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(release));
        self
    }

    /// Get a plane, failing if the frame carries fewer planes
    pub fn plane(&self, index: usize) -> Result<&Plane, FrameError> {
        self.planes.get(index).ok_or(FrameError::PlaneCount {
            expected: self.format.plane_count(),
            actual: self.planes.len(),
        })
    }

    /// Release the frame now instead of at end of scope
    pub fn release(self) {}
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("planes", &self.planes.len())
            .field("rotation", &self.rotation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_release_runs_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);

        let frame = Frame::new(
            2,
            2,
            FrameFormat::Gray8,
            vec![Plane::packed(vec![0u8; 4], 2)],
            FrameRotation::None,
        )
        .with_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        frame.release();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(FrameRotation::from_degrees(90), Some(FrameRotation::Rotate90));
        assert_eq!(FrameRotation::from_degrees(-90), Some(FrameRotation::Rotate270));
        assert_eq!(FrameRotation::from_degrees(360), Some(FrameRotation::None));
        assert_eq!(FrameRotation::from_degrees(45), None);
        assert!(FrameRotation::Rotate270.swaps_dimensions());
        assert!(!FrameRotation::Rotate180.swaps_dimensions());
    }

    #[test]
    fn test_required_len() {
        let plane = Plane::new(vec![0u8; 64], 16, 2);
        // last sample of a 4x3 interleaved chroma block: row 2, column 3
        assert_eq!(plane.required_len(4, 3), 2 * 16 + 3 * 2 + 1);
        assert_eq!(plane.required_len(0, 3), 0);
    }

    #[test]
    fn test_missing_plane() {
        let frame = Frame::new(2, 2, FrameFormat::Nv21, vec![], FrameRotation::None);
        assert_eq!(
            frame.plane(1).unwrap_err(),
            FrameError::PlaneCount {
                expected: 2,
                actual: 0
            }
        );
    }
}
