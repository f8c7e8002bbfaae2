#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Plain settings trees and the deep-merge engine.
//!
//! This crate is the leaf of the Strata workspace. It knows nothing about
//! files, environment variables or navigation; it only defines the inert
//! [`Value`] tree every source parses into and the rules for laying one tree
//! over another.
//!
//! # Usage
//!
//! ```rust
//! use strata_core::{MergeOptions, Value, merged};
//!
//! let base: Value = [("ary", Value::from(vec![1, 2]))].into_iter().collect();
//! let overlay: Value = [("ary", Value::from(vec![3]))].into_iter().collect();
//!
//! let replaced = merged(&base, &overlay, &MergeOptions::default());
//! assert_eq!(replaced.get("ary"), Some(&Value::from(vec![3])));
//!
//! let appended = merged(&base, &overlay, &MergeOptions::default().appending_arrays());
//! assert_eq!(appended.get("ary"), Some(&Value::from(vec![1, 2, 3])));
//! ```

/// Deep merge of plain trees.
pub mod merge;
/// The plain tree value model.
pub mod value;

pub use merge::{MergeObserver, MergeOptions, deep_merge, deep_merge_observed, merged};
pub use value::{Deferred, Mapping, Value, key_from_value};
