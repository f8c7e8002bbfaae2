use std::fmt;
use std::sync::Arc;

use super::Value;

/// A zero-argument computation standing in for a value.
///
/// The closure runs every time the surrounding tree is exported. Results are
/// never cached, so a deferred leaf can report values that change between
/// exports. Clones share the same closure.
#[derive(Clone)]
pub struct Deferred(Arc<dyn Fn() -> Value + Send + Sync>);

impl Deferred {
    /// Wrap a closure as a deferred leaf.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the closure. Deferred values nested in the result are
    /// evaluated as well.
    #[must_use]
    pub fn evaluate(&self) -> Value {
        (self.0)().resolve()
    }

    /// Returns `true` when both handles share the same closure.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}
