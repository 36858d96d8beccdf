//! The mesh contract the linearization stage is written against.
//!
//! A mesh is a shard of a distributed mesh: it holds the elements and nodes
//! this rank owns plus ghost copies of remote entities. Ids are unique
//! mesh-wide. After a collective [`MeshBase::prepare_for_use`], every rank
//! holds the same [`PreparedState`], which is what lets later stages number
//! new entities without talking to other ranks.

use crate::mesh::elem::Elem;
use crate::mesh::node::Node;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::ElemType;
use crate::topology::labels::SubdomainId;
use crate::topology::point::PointId;
use std::collections::{BTreeMap, BTreeSet};

/// Global id bookkeeping, identical on every rank of a prepared mesh.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PreparedState {
    /// Largest element id in use anywhere (active or retired); 0 if none.
    pub max_elem_id: u64,
    /// Largest node id in use anywhere; 0 if none.
    pub max_node_id: u64,
    /// First unique id not yet handed out. Above every node and element
    /// unique id, so it is fresh in both spaces.
    pub next_unique_id: u64,
    /// Every subdomain id carried by some active element on some rank.
    pub subdomain_ids: BTreeSet<SubdomainId>,
    /// Per subdomain, every element type found in it on some rank together
    /// with the smallest active element id of that type.
    ///
    /// Lets a stage reject a subdomain on every rank, including ranks that
    /// do not see the offending element. Empty if the mesh does not track it.
    pub subdomain_elem_types: BTreeMap<SubdomainId, BTreeMap<ElemType, PointId>>,
    pub n_ranks: usize,
}

/// Hook that assigns elements to ranks. The mesh only calls it; policy lives
/// with the implementor.
pub trait Partitioner: Send {
    /// Returns the new owning rank for (a subset of) `elements`.
    fn partition(
        &mut self,
        elements: &BTreeMap<PointId, Elem>,
        n_parts: usize,
    ) -> BTreeMap<PointId, usize>;
}

/// Operations a mesh-transformation stage needs from a mesh.
pub trait MeshBase {
    fn rank(&self) -> usize;
    fn n_ranks(&self) -> usize;

    /// Active (non-retired) elements in ascending id order.
    fn active_elements(&self) -> impl Iterator<Item = &Elem> + '_;
    fn elem(&self, id: PointId) -> Option<&Elem>;
    fn node(&self, id: PointId) -> Option<&Node>;
    /// Resolves `elem.interior_parent`, looking at retired elements too.
    fn interior_parent(&self, elem: &Elem) -> Option<&Elem>;

    /// `Some` only while the mesh is prepared. A prepared mesh holds no
    /// element whose node count disagrees with its type.
    fn prepared_state(&self) -> Option<&PreparedState>;
    /// Largest element id this rank can see (active or retired); 0 if none.
    fn local_max_elem_id(&self) -> u64;

    /// Inserts a new active element. Clears the prepared state.
    fn add_elem(&mut self, elem: Elem) -> Result<(), MeshError>;
    /// Removes an element from the active set, keeping it addressable as an
    /// interior parent. Clears the prepared state.
    fn retire_elem(&mut self, id: PointId) -> Result<(), MeshError>;

    fn subdomain_name(&self, id: SubdomainId) -> Option<&str>;
    /// Binds a name, returning the previous one (last write wins).
    fn set_subdomain_name(&mut self, id: SubdomainId, name: String) -> Option<String>;

    fn skip_partitioning(&self) -> bool;
    fn set_skip_partitioning(&mut self, skip: bool);

    /// Collective rebuild of connectivity and global bookkeeping.
    fn prepare_for_use(&mut self) -> Result<(), MeshError>;

    fn is_prepared(&self) -> bool {
        self.prepared_state().is_some()
    }
}

/// A pipeline stage that consumes a mesh and hands back a transformed one.
pub trait MeshGenerator<M> {
    fn generate(&self, input: M) -> Result<M, MeshError>;
}
