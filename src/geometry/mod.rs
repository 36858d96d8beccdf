//! Geometry utilities for mesh-linearize.
//!
//! This module provides linear (vertex-based) element measures, used to check
//! that derived elements tile their parent.

pub mod measure;

pub use measure::{elem_measure, signed_cell_measure, signed_elem_measure};
