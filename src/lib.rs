#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-linearize
//!
//! mesh-linearize converts second-order element blocks of a partitioned
//! finite-element mesh into first-order subdivisions that reuse the existing
//! nodes. It is written as a mesh-pipeline stage: the caller hands in a
//! prepared mesh and gets it back with the selected subdomains split
//! (`QUAD9` into 4 `QUAD4`, `TRI6` into 4 `TRI3`, `TET10` into 8 `TET4`,
//! `HEX27` into 8 `HEX8`, `EDGE3` into 2 `EDGE2`), placed in a new subdomain
//! and with connectivity rebuilt.
//!
//! ## Features
//! - [`linearize::FirstOrderFromSecondOrder`]: the stage itself, with
//!   configurable id strategy and subdomain collision policy
//! - [`mesh::MeshBase`]: the mesh contract the stage is written against
//! - [`mesh::DistributedMesh`]: a reference in-memory shard with collective
//!   `prepare_for_use` over a pluggable [`algs::Communicator`]
//! - Serial, threaded (`RayonComm`) and MPI (`mpi-support`) communicators
//!
//! ## Distributed ids
//! New element ids are derived from the global maximum cached by the last
//! collective `prepare_for_use`, so the stage itself sends no messages. See
//! [`linearize::allocator`] for when ranks are guaranteed to agree.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! mesh-linearize = "0.1"
//! # Optional features:
//! # features = ["mpi-support", "rayon", "check-invariants"]
//! ```

pub mod algs;
pub mod debug_invariants;
pub mod geometry;
pub mod linearize;
pub mod mesh;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{Communicator, NoComm, RayonComm};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::linearize::{
        FirstOrderFromSecondOrder, IdStrategy, LinearizeOptions, LinearizeReport,
        SubdomainCollision,
    };
    pub use crate::mesh::{
        DistributedMesh, Elem, MeshBase, MeshGenerator, Node, Partitioner, PreparedState,
        StructuredGrid,
    };
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::{ElemType, PointId, SubdomainId};
}
