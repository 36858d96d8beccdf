//! Mesh containers and the contract transformation stages are written against.
//!
//! - [`mesh_base`]: the [`MeshBase`] trait and global [`PreparedState`]
//! - [`distributed`]: [`DistributedMesh`], an in-memory shard implementing it
//! - [`generation`]: structured grid builders

pub mod distributed;
pub mod elem;
pub mod generation;
pub mod mesh_base;
pub mod neighbors;
pub mod node;

pub use distributed::DistributedMesh;
pub use elem::Elem;
pub use generation::{StructuredGrid, Visibility};
pub use mesh_base::{MeshBase, MeshGenerator, Partitioner, PreparedState};
pub use neighbors::Connectivity;
pub use node::Node;
