// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module for per-session frame analysis
//!
//! The [`FrameDispatcher`] admits camera frames one at a time, runs them
//! through conversion, geometry and a decode backend, and reports the
//! session's single outcome through a [`ResultChannel`].

pub mod dispatcher;
pub mod result_channel;
pub mod types;

pub use dispatcher::{BackendFactory, DispatcherBuilder, FrameDispatcher};
pub use result_channel::ResultChannel;
pub use types::{Admission, CodeFormat, DetectedCode, DropReason, FrameRegion, SessionState};
