// SPDX-License-Identifier: GPL-3.0-only

//! Frame pre-processing ahead of decoding
//!
//! Camera frames arrive as multi-plane YUV 4:2:0. Before a decoder sees
//! them they go through two stages:
//!
//! # Conversion
//!
//! [`yuv_converter`] turns a [`Frame`](crate::camera::Frame) into a
//! [`PixelBuffer`], either luminance only (straight from the Y plane) or
//! packed RGB, depending on what the selected decoder consumes.
//!
//! # Geometry
//!
//! [`geometry`] rotates perpendicular frames upright and crops to the
//! centered scan region the on-screen aim rectangle corresponds to.

pub mod geometry;
pub mod pixel_buffer;
pub mod yuv_converter;

// Re-export commonly used types
pub use geometry::ScanRegion;
pub use pixel_buffer::{BufferFormat, PixelBuffer};
