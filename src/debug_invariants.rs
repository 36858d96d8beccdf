//! Structural self-checks for mesh containers.
//!
//! Checks run after every collective rebuild in debug builds, and in release
//! builds when the `check-invariants` (or `strict-invariants`) feature is on.

use crate::mesh_error::MeshError;

/// Types that can verify their own structural invariants.
pub trait DebugInvariants {
    /// Panic on the first violated invariant when checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), MeshError>;
}

/// `Ok(())` if `cond` holds, otherwise an [`MeshError::InvariantViolation`]
/// carrying the lazily built message.
pub fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<(), MeshError> {
    if cond {
        Ok(())
    } else {
        Err(MeshError::InvariantViolation(msg()))
    }
}

/// Run a fallible check and panic on error when invariant checking is
/// enabled; compiles to nothing otherwise.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
