//! In-memory shard of a distributed mesh.
//!
//! Each rank holds a [`DistributedMesh`] with the elements it owns plus any
//! ghosted copies it needs, all keyed by mesh-wide [`PointId`]s. Collective
//! operations ([`MeshBase::prepare_for_use`],
//! [`DistributedMesh::check_global_consistency`]) go through the mesh's
//! [`Communicator`]; with [`NoComm`] the mesh is simply serial.
//!
//! # Lifecycle
//! Any mutation (`add_node`, `add_elem`, `retire_elem`) clears the prepared
//! state. Stages that rely on global bookkeeping must run on a prepared mesh
//! and call `prepare_for_use` once when they are done mutating.

use crate::algs::collective::{all_gather_u64s, all_reduce_max_u64s};
use crate::algs::communicator::{CommTag, Communicator, NoComm};
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::mesh::elem::Elem;
use crate::mesh::mesh_base::{MeshBase, Partitioner, PreparedState};
use crate::mesh::neighbors::{Connectivity, build_connectivity};
use crate::mesh::node::Node;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::ElemType;
use crate::topology::labels::{SubdomainId, SubdomainNames};
use crate::topology::point::PointId;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

const TAG_MAXIMA: CommTag = CommTag::new(0x4c00);
const TAG_SUBDOMAINS: CommTag = TAG_MAXIMA.offset(1);
const TAG_CONSISTENCY: CommTag = TAG_MAXIMA.offset(2);

/// One rank's view of a partitioned mesh.
pub struct DistributedMesh<C: Communicator = NoComm> {
    comm: C,
    nodes: BTreeMap<PointId, Node>,
    elements: BTreeMap<PointId, Elem>,
    retired: BTreeMap<PointId, Elem>,
    subdomain_names: SubdomainNames,
    skip_partitioning: bool,
    partitioner: Option<Box<dyn Partitioner>>,
    prepared: Option<PreparedState>,
    connectivity: Connectivity,
}

impl Default for DistributedMesh<NoComm> {
    fn default() -> Self {
        Self::new(NoComm)
    }
}

impl DistributedMesh<NoComm> {
    /// Serial mesh (one rank, no communication).
    pub fn serial() -> Self {
        Self::default()
    }
}

impl<C: Communicator> fmt::Debug for DistributedMesh<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedMesh")
            .field("rank", &self.comm.rank())
            .field("n_ranks", &self.comm.size())
            .field("n_nodes", &self.nodes.len())
            .field("n_elements", &self.elements.len())
            .field("n_retired", &self.retired.len())
            .field("prepared", &self.prepared.is_some())
            .finish_non_exhaustive()
    }
}

impl<C: Communicator> DistributedMesh<C> {
    pub fn new(comm: C) -> Self {
        Self {
            comm,
            nodes: BTreeMap::new(),
            elements: BTreeMap::new(),
            retired: BTreeMap::new(),
            subdomain_names: SubdomainNames::new(),
            skip_partitioning: false,
            partitioner: None,
            prepared: None,
            connectivity: Connectivity::default(),
        }
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Installs the hook run by `prepare_for_use` unless partitioning is skipped.
    pub fn set_partitioner(&mut self, partitioner: Box<dyn Partitioner>) {
        self.partitioner = Some(partitioner);
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), MeshError> {
        if self.nodes.contains_key(&node.id) {
            return Err(MeshError::DuplicateNode(node.id));
        }
        self.prepared = None;
        self.nodes.insert(node.id, node);
        Ok(())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_active_elements(&self) -> usize {
        self.elements.len()
    }

    /// Elements replaced by a transformation stage, ascending id.
    pub fn retired_elements(&self) -> impl Iterator<Item = &Elem> + '_ {
        self.retired.values()
    }

    pub fn subdomain_names(&self) -> &SubdomainNames {
        &self.subdomain_names
    }

    /// Side neighbors of `elem` as of the last `prepare_for_use`.
    pub fn neighbors(&self, elem: PointId) -> Option<&[Option<PointId>]> {
        self.connectivity.neighbors.get(&elem).map(Vec::as_slice)
    }

    /// Active elements touching `node` as of the last `prepare_for_use`.
    pub fn node_to_elements(&self, node: PointId) -> &[PointId] {
        self.connectivity
            .node_to_elems
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Collective: verify every rank holds the same [`PreparedState`].
    ///
    /// # Errors
    /// [`MeshError::MeshNotPrepared`] if this rank is not prepared, or
    /// [`MeshError::InconsistentPreparedState`] naming the first rank that
    /// disagrees with rank 0.
    pub fn check_global_consistency(&self) -> Result<(), MeshError> {
        let state = self.prepared.as_ref().ok_or(MeshError::MeshNotPrepared)?;
        let mut local = vec![
            state.max_elem_id,
            state.max_node_id,
            state.next_unique_id,
            state.n_ranks as u64,
        ];
        local.extend(state.subdomain_ids.iter().map(|&id| u64::from(id)));
        for (&subdomain, types) in &state.subdomain_elem_types {
            for (&elem_type, &first) in types {
                local.extend([u64::from(subdomain), u64::from(elem_type.code()), first.get()]);
            }
        }

        let gathered = all_gather_u64s(&self.comm, TAG_CONSISTENCY, &local)?;
        let reference = &gathered[0];
        for (rank, other) in gathered.iter().enumerate().skip(1) {
            if other != reference {
                return Err(MeshError::InconsistentPreparedState {
                    rank,
                    detail: format!("{other:?} != {reference:?}"),
                });
            }
        }
        Ok(())
    }

    fn validate_references(&self) -> Result<(), MeshError> {
        for elem in self.elements.values() {
            if elem.nodes.len() != elem.elem_type.n_nodes() {
                return Err(MeshError::NodeCountMismatch {
                    elem: elem.id,
                    expected: elem.elem_type.n_nodes(),
                    found: elem.nodes.len(),
                });
            }
            if let Some(&node) = elem.nodes.iter().find(|n| !self.nodes.contains_key(n)) {
                return Err(MeshError::MissingNode {
                    elem: elem.id,
                    node,
                });
            }
        }
        Ok(())
    }

    /// Drop nodes no active or retired element references.
    fn remove_orphaned_nodes(&mut self) -> usize {
        let referenced: HashSet<PointId> = self
            .elements
            .values()
            .chain(self.retired.values())
            .flat_map(|e| e.nodes.iter().copied())
            .collect();
        let before = self.nodes.len();
        self.nodes.retain(|id, _| referenced.contains(id));
        before - self.nodes.len()
    }

    fn run_partitioner(&mut self) {
        let n_parts = self.comm.size();
        let Some(partitioner) = self.partitioner.as_mut() else {
            return;
        };
        let assignment = partitioner.partition(&self.elements, n_parts);
        for (id, owner) in assignment {
            if let Some(elem) = self.elements.get_mut(&id) {
                elem.processor_id = owner;
            }
        }
        // A node belongs to the lowest rank owning an element that touches it.
        let mut node_owner: BTreeMap<PointId, usize> = BTreeMap::new();
        for elem in self.elements.values() {
            for &n in &elem.nodes {
                node_owner
                    .entry(n)
                    .and_modify(|o| *o = (*o).min(elem.processor_id))
                    .or_insert(elem.processor_id);
            }
        }
        for (id, owner) in node_owner {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.processor_id = owner;
            }
        }
    }

    fn local_maxima(&self) -> [u64; 3] {
        let max_elem = self.local_max_elem_id();
        let max_node = self.nodes.keys().next_back().map_or(0, |p| p.get());
        let max_unique = self
            .elements
            .values()
            .chain(self.retired.values())
            .map(|e| e.unique_id)
            .chain(self.nodes.values().map(|n| n.unique_id))
            .max()
            .unwrap_or(0);
        [max_elem, max_node, max_unique]
    }

    /// `(subdomain, type code, smallest id)` triples of the local active elements.
    fn local_elem_types(&self) -> Vec<u64> {
        let mut first: BTreeMap<(SubdomainId, ElemType), PointId> = BTreeMap::new();
        for elem in self.elements.values() {
            first.entry((elem.subdomain_id, elem.elem_type)).or_insert(elem.id);
        }
        first
            .into_iter()
            .flat_map(|((subdomain, elem_type), id)| {
                [u64::from(subdomain), u64::from(elem_type.code()), id.get()]
            })
            .collect()
    }
}

fn merge_elem_types(
    gathered: Vec<Vec<u64>>,
) -> Result<BTreeMap<SubdomainId, BTreeMap<ElemType, PointId>>, MeshError> {
    let mut merged: BTreeMap<SubdomainId, BTreeMap<ElemType, PointId>> = BTreeMap::new();
    for (rank, triples) in gathered.into_iter().enumerate() {
        let bad = |detail: String| MeshError::CommError {
            neighbor: rank,
            detail,
        };
        if triples.len() % 3 != 0 {
            return Err(bad(format!("{} values do not form triples", triples.len())));
        }
        for t in triples.chunks_exact(3) {
            let subdomain = SubdomainId::try_from(t[0])
                .map_err(|_| bad(format!("subdomain id {} out of range", t[0])))?;
            let elem_type = ElemType::from_code(t[1])
                .ok_or_else(|| bad(format!("unknown element type code {}", t[1])))?;
            let id = PointId::new(t[2])?;
            merged
                .entry(subdomain)
                .or_default()
                .entry(elem_type)
                .and_modify(|first| *first = (*first).min(id))
                .or_insert(id);
        }
    }
    Ok(merged)
}

impl<C: Communicator> MeshBase for DistributedMesh<C> {
    fn rank(&self) -> usize {
        self.comm.rank()
    }

    fn n_ranks(&self) -> usize {
        self.comm.size()
    }

    fn active_elements(&self) -> impl Iterator<Item = &Elem> + '_ {
        self.elements.values()
    }

    fn elem(&self, id: PointId) -> Option<&Elem> {
        self.elements.get(&id)
    }

    fn node(&self, id: PointId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn interior_parent(&self, elem: &Elem) -> Option<&Elem> {
        let parent = elem.interior_parent?;
        self.elements
            .get(&parent)
            .or_else(|| self.retired.get(&parent))
    }

    fn prepared_state(&self) -> Option<&PreparedState> {
        self.prepared.as_ref()
    }

    fn local_max_elem_id(&self) -> u64 {
        let active = self.elements.keys().next_back().map_or(0, |p| p.get());
        let retired = self.retired.keys().next_back().map_or(0, |p| p.get());
        active.max(retired)
    }

    fn add_elem(&mut self, elem: Elem) -> Result<(), MeshError> {
        if self.elements.contains_key(&elem.id) || self.retired.contains_key(&elem.id) {
            return Err(MeshError::DuplicateElem(elem.id));
        }
        self.prepared = None;
        self.elements.insert(elem.id, elem);
        Ok(())
    }

    fn retire_elem(&mut self, id: PointId) -> Result<(), MeshError> {
        let elem = self.elements.remove(&id).ok_or(MeshError::MissingElem(id))?;
        self.prepared = None;
        self.retired.insert(id, elem);
        Ok(())
    }

    fn subdomain_name(&self, id: SubdomainId) -> Option<&str> {
        self.subdomain_names.name(id)
    }

    fn set_subdomain_name(&mut self, id: SubdomainId, name: String) -> Option<String> {
        self.subdomain_names.set_name(id, name)
    }

    fn skip_partitioning(&self) -> bool {
        self.skip_partitioning
    }

    fn set_skip_partitioning(&mut self, skip: bool) {
        self.skip_partitioning = skip;
    }

    fn prepare_for_use(&mut self) -> Result<(), MeshError> {
        self.prepared = None;
        self.validate_references()?;

        let orphans = self.remove_orphaned_nodes();
        if !self.skip_partitioning {
            self.run_partitioner();
        }
        self.connectivity = build_connectivity(self.elements.values());

        let maxima = all_reduce_max_u64s(&self.comm, TAG_MAXIMA, &self.local_maxima())?;
        let gathered = all_gather_u64s(&self.comm, TAG_SUBDOMAINS, &self.local_elem_types())?;
        let subdomain_elem_types = merge_elem_types(gathered)?;
        let subdomain_ids = subdomain_elem_types.keys().copied().collect();

        self.prepared = Some(PreparedState {
            max_elem_id: maxima[0],
            max_node_id: maxima[1],
            next_unique_id: maxima[2].checked_add(1).ok_or(MeshError::IdOverflow("unique id"))?,
            subdomain_ids,
            subdomain_elem_types,
            n_ranks: self.comm.size(),
        });
        log::debug!(
            "rank {}: prepared mesh with {} elements ({} retired), {} nodes, {} orphans removed",
            self.comm.rank(),
            self.elements.len(),
            self.retired.len(),
            self.nodes.len(),
            orphans
        );
        crate::debug_invariants!(self.validate_invariants(), "DistributedMesh::prepare_for_use");
        Ok(())
    }
}

impl<C: Communicator> DebugInvariants for DistributedMesh<C> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "DistributedMesh");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        for id in self.elements.keys() {
            ensure(!self.retired.contains_key(id), || {
                format!("element {id} is both active and retired")
            })?;
        }
        self.validate_references()?;

        let mut unique = HashSet::new();
        for elem in self.elements.values().chain(self.retired.values()) {
            ensure(unique.insert(elem.unique_id), || {
                format!("unique id {} used twice (element {})", elem.unique_id, elem.id)
            })?;
        }

        if let Some(state) = &self.prepared {
            ensure(self.local_max_elem_id() <= state.max_elem_id, || {
                format!(
                    "local max element id {} above prepared max {}",
                    self.local_max_elem_id(),
                    state.max_elem_id
                )
            })?;
            for (&a, slots) in &self.connectivity.neighbors {
                for b in slots.iter().flatten() {
                    let back = self
                        .connectivity
                        .neighbors
                        .get(b)
                        .is_some_and(|s| s.contains(&Some(a)));
                    ensure(back, || format!("neighbor link {a} -> {b} is not symmetric"))?;
                }
            }
        }
        Ok(())
    }
}
