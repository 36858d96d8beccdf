//! Mesh elements.

use crate::mesh_error::MeshError;
use crate::topology::cell_type::ElemType;
use crate::topology::labels::SubdomainId;
use crate::topology::point::PointId;

/// A finite element: a typed, ordered list of node ids plus ownership and
/// subdomain metadata.
///
/// Node order follows the local numbering of [`ElemType`] (vertices first).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Elem {
    pub id: PointId,
    /// Never reused; unique among elements only (see [`Node::unique_id`](crate::mesh::Node)).
    pub unique_id: u64,
    pub elem_type: ElemType,
    pub nodes: Vec<PointId>,
    pub subdomain_id: SubdomainId,
    /// Owning rank.
    pub processor_id: usize,
    /// Element this one was derived from, if any.
    pub interior_parent: Option<PointId>,
}

impl Elem {
    /// Creates an element in subdomain 0, owned by rank 0.
    ///
    /// # Errors
    /// [`MeshError::NodeCountMismatch`] if `nodes` does not match `elem_type`.
    pub fn new(id: PointId, elem_type: ElemType, nodes: Vec<PointId>) -> Result<Self, MeshError> {
        if nodes.len() != elem_type.n_nodes() {
            return Err(MeshError::NodeCountMismatch {
                elem: id,
                expected: elem_type.n_nodes(),
                found: nodes.len(),
            });
        }
        Ok(Self {
            id,
            unique_id: id.get(),
            elem_type,
            nodes,
            subdomain_id: 0,
            processor_id: 0,
            interior_parent: None,
        })
    }

    pub fn with_subdomain(mut self, subdomain_id: SubdomainId) -> Self {
        self.subdomain_id = subdomain_id;
        self
    }

    pub fn with_processor_id(mut self, processor_id: usize) -> Self {
        self.processor_id = processor_id;
        self
    }

    pub fn with_unique_id(mut self, unique_id: u64) -> Self {
        self.unique_id = unique_id;
        self
    }

    /// Vertex (corner) node ids.
    pub fn vertices(&self) -> &[PointId] {
        &self.nodes[..self.elem_type.n_vertices().min(self.nodes.len())]
    }

    /// Vertex ids of side `side`, or `None` if out of range.
    pub fn side_vertices(&self, side: usize) -> Option<Vec<PointId>> {
        let local = self.elem_type.shape().sides().get(side)?;
        local.iter().map(|&i| self.nodes.get(i).copied()).collect()
    }

    pub fn n_sides(&self) -> usize {
        self.elem_type.shape().sides().len()
    }

    /// Returns `true` if this element is not owned by `rank`.
    pub fn is_ghost_on(&self, rank: usize) -> bool {
        self.processor_id != rank
    }
}
