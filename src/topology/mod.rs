//! Identifiers and static element metadata.
//!
//! - [`point::PointId`]: strong id for nodes and elements
//! - [`cell_type`]: element shapes, orders, and node layouts
//! - [`labels`]: subdomain ids and names

pub mod cell_type;
pub mod labels;
pub mod point;

pub use cell_type::{CellType, ElemType, Order};
pub use labels::{SubdomainId, SubdomainNames};
pub use point::PointId;
