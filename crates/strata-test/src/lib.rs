//! Strata Test - Shared test utilities for the Strata workspace.
//!
//! Fixture documents, temporary fixture directories and logging setup used
//! as a dev-dependency by the other crates.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! strata-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use strata_test::{FixtureDir, fixture_env};
//!
//! #[test]
//! fn loads_fixture() {
//!     let fixtures = FixtureDir::new();
//!     let path = fixtures.path("settings.yml");
//!     // ... load `path` with `fixture_env()` as the variable set
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
