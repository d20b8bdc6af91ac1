// SPDX-License-Identifier: GPL-3.0-only

//! Barcode scanning core
//!
//! Takes a stream of camera frames, analyses at most one at a time, and
//! reports the first decoded payload (or a terminal error) exactly once.
//!
//! # Architecture
//!
//! - [`camera`]: frame and plane types, rotation hints, RAII frame release
//! - [`media`]: YUV to luma/RGB conversion, rotation and scan-region crop
//! - [`decoders`]: the decode backend trait, local and detector-based backends
//! - [`frame_processor`]: the per-session dispatcher and result channel
//! - [`config`]: host scan parameters and pipeline configuration
//! - [`outcome`]: host result-code mapping
//!
//! # Example
//!
//! ```ignore
//! let (results, outcome) = ResultChannel::channel();
//! let dispatcher = FrameDispatcher::new(ScanConfig::default(), results)?;
//! dispatcher.run(camera_frames).await;
//! println!("{}", outcome.await?);
//! ```

pub mod camera;
pub mod config;
pub mod constants;
pub mod decoders;
pub mod errors;
pub mod frame_processor;
pub mod logging;
pub mod media;
pub mod outcome;

// Re-export commonly used types
pub use camera::{Frame, FrameFormat, FrameRotation, Plane};
pub use config::{ScanConfig, ScanParameters};
pub use decoders::{BackendKind, BarcodeDetector, DecodeBackend, DecodeResult};
pub use errors::{ErrorKind, ScanError, ScanResult};
pub use frame_processor::{Admission, DropReason, FrameDispatcher, ResultChannel, SessionState};
pub use outcome::ScanOutcome;
