//! Deep merge of plain settings trees.
//!
//! The merge is a right-biased overlay: keys only present on the current
//! side are kept, keys present on the incoming side win unless a policy in
//! [`MergeOptions`] says otherwise. Mappings merge recursively; sequences
//! follow the array policy; everything else is replaced.

mod deep;
mod options;

pub use deep::{MergeObserver, deep_merge, deep_merge_observed, merged};
pub use options::MergeOptions;
