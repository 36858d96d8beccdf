//! `PointId`: a strong, zero-cost handle for mesh entities
//!
//! Nodes and elements are both addressed by a `PointId`. The two live in
//! separate id spaces inside a mesh, but share the handle type so that id
//! arithmetic (seeds, offsets, maxima) is written once.
//!
//! `PointId` wraps a `NonZeroU64`: 0 is reserved as an invalid or sentinel
//! value, which keeps `Option<PointId>` the same size as a `u64`.

use crate::mesh_error::MeshError;
use std::{fmt, num::NonZeroU64};

/// Mesh-wide identifier of a node or an element.
///
/// # Memory layout
/// This type is `repr(transparent)`, meaning it has the same ABI and
/// alignment as its single field (`NonZeroU64`) and can be passed to FFI
/// exactly like a `u64`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct PointId(NonZeroU64);

impl PointId {
    /// Creates a new `PointId` from a raw `u64` value.
    ///
    /// # Errors
    /// Returns [`MeshError::InvalidPointId`] if `raw == 0`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mesh_linearize::topology::point::PointId;
    /// let p = PointId::new(1)?;
    /// assert_eq!(p.get(), 1);
    /// # Ok::<(), mesh_linearize::mesh_error::MeshError>(())
    /// ```
    #[inline]
    pub fn new(raw: u64) -> Result<Self, MeshError> {
        NonZeroU64::new(raw)
            .map(PointId)
            .ok_or(MeshError::InvalidPointId)
    }

    /// Returns the inner `u64` value of this `PointId`.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Returns `self + offset`, or `None` on overflow.
    #[inline]
    pub fn checked_offset(self, offset: u64) -> Option<Self> {
        self.0.checked_add(offset).map(PointId)
    }
}

/// Custom `Debug` implementation to display as `PointId(raw_value)`.
impl fmt::Debug for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PointId").field(&self.get()).finish()
    }
}

/// Prints only the raw integer.
impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// `PointId` can be sent over MPI as a `u64`.
#[cfg(feature = "mpi-support")]
unsafe impl mpi::datatype::Equivalence for PointId {
    type Out = <u64 as mpi::datatype::Equivalence>::Out;

    fn equivalent_datatype() -> Self::Out {
        u64::equivalent_datatype()
    }
}
