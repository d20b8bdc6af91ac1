// SPDX-License-Identifier: GPL-3.0-only

//! Diagnostic output for hosts without their own subscriber

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Install a formatting subscriber
///
/// `RUST_LOG` takes precedence over `default_directive`, e.g.
/// `RUST_LOG=barcode_scan=debug`. Returns false if a global subscriber was
/// already installed, in which case nothing changes.
pub fn init(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_target(true)
        .with_level(true)
        .try_init()
        .is_ok()
}
