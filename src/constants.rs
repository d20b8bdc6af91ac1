// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Fraction of the frame used for the scan region's width
///
/// In portrait the region is square and this ratio is applied to the
/// frame's short side.
pub const DEFAULT_WIDTH_RATIO: f64 = 0.6;

/// Fraction of the frame height used for the scan region in landscape
pub const DEFAULT_HEIGHT_RATIO: f64 = 0.5;

/// Default minimum time between two analysed frames
pub const DEFAULT_MIN_ANALYSIS_INTERVAL: Duration = Duration::from_millis(500);

/// Scanning library identifiers accepted from the host
pub mod library {
    /// Fast local decoder
    pub const LOCAL: &str = "zxing";
    /// Alternative spelling for the local decoder
    pub const LOCAL_ALIAS: &str = "local";
    /// Detector-based decoder
    pub const ML: &str = "mlkit";
    /// Alternative spelling for the detector-based decoder
    pub const ML_ALIAS: &str = "ml";
}

/// Result/request codes exchanged with the host activity
pub mod host {
    /// Request code tagging a scan request
    pub const SCAN_REQUEST_CODE: i32 = 112;
    /// Result code for a successful scan
    pub const RESULT_OK: i32 = -1;
    /// Result code the host uses when the user backs out
    pub const RESULT_CANCELED: i32 = 0;
}

/// Local decoder tuning
pub mod local_decoder {
    /// Frames smaller than this (short side, pixels) skip the downscaled pass
    pub const MIN_DOWNSCALE_DIMENSION: u32 = 320;
}
