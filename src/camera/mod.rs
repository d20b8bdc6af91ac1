// SPDX-License-Identifier: GPL-3.0-only

//! Camera-side types consumed by the analysis pipeline

pub mod types;

pub use types::{Frame, FrameFormat, FrameRotation, Plane};
