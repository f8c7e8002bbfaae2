//! Strata Telemetry - logging setup shared by the Strata tools.
//!
//! # Example
//!
//! ```rust,no_run
//! use strata_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), strata_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("strata_settings=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
