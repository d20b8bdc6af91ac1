// SPDX-License-Identifier: GPL-3.0-only

//! Scan configuration
//!
//! [`ScanParameters`] is the request as the host sends it (JSON, every field
//! optional). [`ScanConfig`] is what the pipeline actually runs with; it is
//! derived from the parameters and validated once at session start.

use crate::constants::{DEFAULT_HEIGHT_RATIO, DEFAULT_MIN_ANALYSIS_INTERVAL, DEFAULT_WIDTH_RATIO};
use crate::decoders::BackendKind;
use crate::errors::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which camera the host should open
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum CameraDirection {
    #[default]
    Back,
    Front,
}

impl CameraDirection {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Back),
            2 => Some(Self::Front),
            _ => None,
        }
    }
}

/// Orientation lock requested by the host
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum ScanOrientation {
    Portrait,
    Landscape,
    /// Follow the device (starts out portrait)
    #[default]
    Adaptive,
}

impl ScanOrientation {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Portrait),
            2 => Some(Self::Landscape),
            3 => Some(Self::Adaptive),
            _ => None,
        }
    }
}

/// Scan request as received from the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanParameters {
    /// Instructions shown above the aim rectangle
    pub scan_instructions: Option<String>,
    /// 1 = back, 2 = front
    pub camera_direction: Option<i32>,
    /// 1 = portrait, 2 = landscape, 3 = adaptive
    pub scan_orientation: Option<i32>,
    /// Require the user to press a button before frames are analysed
    pub scan_button: Option<bool>,
    /// Label of the scan button
    pub scan_text: Option<String>,
    /// Decoder identifier ("zxing", "mlkit", ...)
    #[serde(alias = "androidScanningLibrary")]
    pub scanning_library: Option<String>,
}

impl ScanParameters {
    /// Parse the host's JSON request
    pub fn from_json(json: &str) -> ScanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Camera direction, defaulting to the back camera when absent
    pub fn camera_direction(&self) -> ScanResult<CameraDirection> {
        match self.camera_direction {
            None => Ok(CameraDirection::default()),
            Some(code) => CameraDirection::from_code(code)
                .ok_or_else(|| ScanError::Config(format!("unknown camera direction {}", code))),
        }
    }

    /// Orientation lock, defaulting to adaptive when absent
    pub fn orientation(&self) -> ScanResult<ScanOrientation> {
        match self.scan_orientation {
            None => Ok(ScanOrientation::default()),
            Some(code) => ScanOrientation::from_code(code)
                .ok_or_else(|| ScanError::Config(format!("unknown scan orientation {}", code))),
        }
    }
}

/// Pipeline configuration for one scan session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Decoder identifier; unknown values fall back to the local decoder
    pub scanning_library: String,
    /// Scan region width ratio, in (0, 1]
    pub width_ratio: f64,
    /// Scan region height ratio (landscape only), in (0, 1]
    pub height_ratio: f64,
    /// Device currently held in portrait
    pub portrait: bool,
    /// Minimum milliseconds between analysed frames; `None` disables throttling
    pub min_analysis_interval_ms: Option<u64>,
    /// Frames are ignored until the host arms scanning
    pub scan_button: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scanning_library: String::new(),
            width_ratio: DEFAULT_WIDTH_RATIO,
            height_ratio: DEFAULT_HEIGHT_RATIO,
            portrait: true,
            min_analysis_interval_ms: Some(DEFAULT_MIN_ANALYSIS_INTERVAL.as_millis() as u64),
            scan_button: false,
        }
    }
}

impl ScanConfig {
    /// Build a pipeline configuration from a host request
    ///
    /// Rejects unknown orientation or camera codes.
    pub fn from_parameters(params: &ScanParameters) -> ScanResult<Self> {
        params.camera_direction()?;
        let orientation = params.orientation()?;

        let config = Self {
            scanning_library: params.scanning_library.clone().unwrap_or_default(),
            portrait: orientation != ScanOrientation::Landscape,
            scan_button: params.scan_button.unwrap_or(false),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Selected decoder
    pub fn backend_kind(&self) -> BackendKind {
        BackendKind::from_identifier(&self.scanning_library)
    }

    /// Throttle interval, if any
    pub fn min_analysis_interval(&self) -> Option<Duration> {
        self.min_analysis_interval_ms.map(Duration::from_millis)
    }

    /// Check ratios are usable for region computation
    pub fn validate(&self) -> ScanResult<()> {
        for (name, ratio) in [
            ("width_ratio", self.width_ratio),
            ("height_ratio", self.height_ratio),
        ] {
            if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
                return Err(ScanError::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        Ok(())
    }
}
