//! MeshError: Unified error type for mesh-linearize public APIs
//!
//! Every fallible operation in the crate returns this type. All variants are
//! fatal for the stage that raised them: the linearization pipeline validates
//! everything before it mutates the mesh, so an error never leaves a
//! half-converted mesh behind.

use crate::topology::cell_type::ElemType;
use crate::topology::labels::SubdomainId;
use crate::topology::point::PointId;
use thiserror::Error;

/// Unified error type for mesh-linearize operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Attempted to construct a PointId with a zero value (invalid).
    #[error("PointId must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidPointId,

    /// The stage requires a prepared mesh so the global maximum id is known
    /// on every rank without communication.
    #[error("mesh is not prepared: call prepare_for_use() before running this stage")]
    MeshNotPrepared,
    /// The locally visible element ids exceed the prepared global maximum.
    #[error(
        "prepared id bookkeeping is stale: local max element id {local_max} exceeds prepared max {prepared_max}"
    )]
    StalePreparedState { local_max: u64, prepared_max: u64 },
    /// Ranks disagree on the prepared bookkeeping.
    #[error("rank {rank} holds prepared state inconsistent with rank 0: {detail}")]
    InconsistentPreparedState { rank: usize, detail: String },

    /// No second-order subdomains were requested.
    #[error("second_order_subdomains must name at least one subdomain")]
    EmptySubdomainList,
    /// A targeted element is not second order.
    #[error("Element: {elem} on block: {subdomain} is not second order (type {elem_type})")]
    NotSecondOrder {
        elem: PointId,
        subdomain: SubdomainId,
        elem_type: ElemType,
    },
    /// A targeted element has no first-order decomposition.
    #[error(
        "Element type: {elem_type} (element {elem}) is not yet supported for first order subdivision; supported: {supported}"
    )]
    UnsupportedElemType {
        elem: PointId,
        elem_type: ElemType,
        supported: String,
    },
    /// Element node list length does not match its type.
    #[error("element {elem}: expected {expected} nodes, found {found}")]
    NodeCountMismatch {
        elem: PointId,
        expected: usize,
        found: usize,
    },
    /// Caller-supplied subdomain id already exists and merging was not requested.
    #[error("subdomain id {0} is already in use")]
    SubdomainIdInUse(SubdomainId),
    /// The largest subdomain id is already the maximum representable value.
    #[error("a subdomain id with the maximum possible value ({0}) was found")]
    SubdomainIdOverflow(SubdomainId),

    /// An element with this id already exists (active or retired).
    #[error("duplicate element id {0}")]
    DuplicateElem(PointId),
    /// A node with this id already exists.
    #[error("duplicate node id {0}")]
    DuplicateNode(PointId),
    /// Element lookup failed.
    #[error("element {0} not found")]
    MissingElem(PointId),
    /// An element references a node the mesh does not hold.
    #[error("element {elem} references missing node {node}")]
    MissingNode { elem: PointId, node: PointId },
    /// Identifier arithmetic overflowed.
    #[error("identifier overflow while allocating {0}")]
    IdOverflow(&'static str),
    /// Geometry could not be evaluated.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    /// A structural invariant does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Message exchange with a peer failed.
    #[error("communication with rank {neighbor} failed: {detail}")]
    CommError { neighbor: usize, detail: String },
}
