// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing results
//!
//! These types describe what the dispatcher did with a frame and what a
//! detector saw in it.

use crate::decoders::DecodeResult;
use std::fmt;
use tokio::task::JoinHandle;

/// Where a detected symbol sits in the buffer it was found in
///
/// All four values are fractions of the buffer's width or height, so a host
/// can map them onto a preview of any size.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FrameRegion {
    /// Normalize a pixel rectangle against a `frame_width` x `frame_height` buffer
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let fw = frame_width.max(1) as f32;
        let fh = frame_height.max(1) as f32;
        Self {
            x: x as f32 / fw,
            y: y as f32 / fh,
            width: width as f32 / fw,
            height: height as f32 / fh,
        }
    }

    /// Whether a normalized point lies inside the region
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Symbology of a detected code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeFormat {
    QrCode,
    Unknown,
}

/// One candidate reported by a detector
///
/// A detector may report symbols it located but could not read; those carry
/// no raw value. `bounds` is the axis-aligned box around the symbol's
/// corners, for hosts that highlight what was found.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedCode {
    /// Decoded payload, if the symbol could be read
    pub raw_value: Option<String>,
    pub format: CodeFormat,
    /// Location in normalized buffer coordinates, if known
    pub bounds: Option<FrameRegion>,
}

impl DetectedCode {
    pub fn new(raw_value: Option<String>, format: CodeFormat) -> Self {
        Self {
            raw_value,
            format,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: FrameRegion) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// Where a scan session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next frame
    Idle,
    /// One frame is being converted or decoded
    Analyzing,
    /// A result was delivered or the session was cancelled
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Analyzing => write!(f, "analyzing"),
            SessionState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Why a frame was released without analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The session already ended
    Terminated,
    /// Scanning waits for the host's scan button
    Disarmed,
    /// Another frame is in flight
    Busy,
    /// Too soon after the last accepted frame
    Throttled,
}

/// Outcome of handing a frame to [`FrameDispatcher::submit`](super::FrameDispatcher::submit)
#[derive(Debug)]
pub enum Admission {
    /// Frame is being analysed; the handle resolves to the decode result
    Accepted(JoinHandle<DecodeResult>),
    /// Frame was released untouched
    Dropped(DropReason),
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted(_))
    }

    pub fn drop_reason(&self) -> Option<DropReason> {
        match self {
            Admission::Accepted(_) => None,
            Admission::Dropped(reason) => Some(*reason),
        }
    }
}
