//! Structured grid generators for quadrilateral, triangular and hexahedral
//! meshes of first or second order.
//!
//! Nodes sit on a lattice with spacing `h / order` so that second-order
//! elements share their mid-edge, face and center nodes with neighbors.
//! Element ownership is split into contiguous blocks of element index across
//! the ranks of the communicator.

use crate::algs::communicator::Communicator;
use crate::mesh::distributed::DistributedMesh;
use crate::mesh::elem::Elem;
use crate::mesh::mesh_base::MeshBase;
use crate::mesh::node::Node;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::{CellType, ElemType, Order};
use crate::topology::labels::SubdomainId;
use crate::topology::point::PointId;
use std::collections::BTreeMap;

/// Which elements a rank stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Every rank holds every element (serial-style replicated mesh).
    #[default]
    Replicated,
    /// Each rank holds only the elements it owns and their nodes.
    OwnedOnly,
}

/// Lattice offsets of the Quad9 nodes inside one cell, in units of `h / 2`.
const QUAD9_LATTICE: [[usize; 2]; 9] = [
    [0, 0],
    [2, 0],
    [2, 2],
    [0, 2],
    [1, 0],
    [2, 1],
    [1, 2],
    [0, 1],
    [1, 1],
];

/// Tri6 nodes of the two triangles a cell is cut into along its (0,0)-(2,2)
/// diagonal.
const TRI6_LATTICE: [[[usize; 2]; 6]; 2] = [
    [[0, 0], [2, 0], [2, 2], [1, 0], [2, 1], [1, 1]],
    [[0, 0], [2, 2], [0, 2], [1, 1], [1, 2], [0, 1]],
];

/// Lattice offsets of the Hex27 nodes inside one cell, in units of `h / 2`.
const HEX27_LATTICE: [[usize; 3]; 27] = [
    [0, 0, 0],
    [2, 0, 0],
    [2, 2, 0],
    [0, 2, 0],
    [0, 0, 2],
    [2, 0, 2],
    [2, 2, 2],
    [0, 2, 2],
    [1, 0, 0],
    [2, 1, 0],
    [1, 2, 0],
    [0, 1, 0],
    [0, 0, 1],
    [2, 0, 1],
    [2, 2, 1],
    [0, 2, 1],
    [1, 0, 2],
    [2, 1, 2],
    [1, 2, 2],
    [0, 1, 2],
    [1, 1, 0],
    [1, 0, 1],
    [2, 1, 1],
    [1, 2, 1],
    [0, 1, 1],
    [1, 1, 2],
    [1, 1, 1],
];

/// Builder for a structured block of elements.
///
/// ```
/// use mesh_linearize::algs::NoComm;
/// use mesh_linearize::mesh::generation::StructuredGrid;
/// use mesh_linearize::mesh::MeshBase;
/// use mesh_linearize::topology::ElemType;
///
/// let mesh = StructuredGrid::new(ElemType::Quad9, [2, 3, 0])?
///     .with_extent([2.0, 3.0, 0.0])
///     .build(NoComm)?;
/// assert_eq!(mesh.n_active_elements(), 6);
/// assert_eq!(mesh.n_nodes(), 5 * 7);
/// assert!(mesh.is_prepared());
/// # Ok::<(), mesh_linearize::mesh_error::MeshError>(())
/// ```
#[derive(Clone, Debug)]
pub struct StructuredGrid {
    elem_type: ElemType,
    cells: [usize; 3],
    extent: [f64; 3],
    origin: [f64; 3],
    subdomain_id: SubdomainId,
    first_elem_id: u64,
    first_node_id: u64,
    visibility: Visibility,
}

impl StructuredGrid {
    /// Grid of `cells[0] x cells[1]` (x `cells[2]` for hexes) unit cells.
    ///
    /// # Errors
    /// [`MeshError::InvalidGeometry`] for element types without a structured
    /// layout or for an empty cell count.
    pub fn new(elem_type: ElemType, cells: [usize; 3]) -> Result<Self, MeshError> {
        let dim = match elem_type {
            ElemType::Quad4 | ElemType::Quad9 | ElemType::Tri3 | ElemType::Tri6 => 2,
            ElemType::Hex8 | ElemType::Hex27 => 3,
            other => {
                return Err(MeshError::InvalidGeometry(format!(
                    "no structured layout for {other}"
                )));
            }
        };
        if cells[..dim].contains(&0) {
            return Err(MeshError::InvalidGeometry(format!(
                "cell counts must be non-zero, got {cells:?}"
            )));
        }
        let mut cells = cells;
        let mut extent = [cells[0] as f64, cells[1] as f64, cells[2] as f64];
        if dim == 2 {
            cells[2] = 0;
            extent[2] = 0.0;
        }
        Ok(Self {
            elem_type,
            cells,
            extent,
            origin: [0.0; 3],
            subdomain_id: 0,
            first_elem_id: 1,
            first_node_id: 1,
            visibility: Visibility::Replicated,
        })
    }

    pub fn with_extent(mut self, extent: [f64; 3]) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_subdomain(mut self, subdomain_id: SubdomainId) -> Self {
        self.subdomain_id = subdomain_id;
        self
    }

    pub fn with_first_elem_id(mut self, id: u64) -> Self {
        self.first_elem_id = id;
        self
    }

    pub fn with_first_node_id(mut self, id: u64) -> Self {
        self.first_node_id = id;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    fn step(&self) -> usize {
        match self.elem_type.order() {
            Order::First => 1,
            Order::Second => 2,
        }
    }

    fn lattice_dims(&self) -> [usize; 3] {
        let s = self.step();
        [
            s * self.cells[0] + 1,
            s * self.cells[1] + 1,
            s * self.cells[2] + 1,
        ]
    }

    /// Number of elements the full grid has.
    pub fn n_elements(&self) -> usize {
        let per_cell = if self.elem_type.shape() == CellType::Triangle {
            2
        } else {
            1
        };
        self.cells[0] * self.cells[1] * self.cells[2].max(1) * per_cell
    }

    /// Owning rank of the `index`-th element in a world of `n_ranks`.
    pub fn owner_of(&self, index: usize, n_ranks: usize) -> usize {
        index * n_ranks.max(1) / self.n_elements().max(1)
    }

    fn node_id(&self, lattice: [usize; 3]) -> Result<PointId, MeshError> {
        let [nx, ny, _] = self.lattice_dims();
        let offset = (lattice[2] * ny + lattice[1]) * nx + lattice[0];
        let raw = self
            .first_node_id
            .checked_add(offset as u64)
            .ok_or(MeshError::IdOverflow("node id"))?;
        PointId::new(raw)
    }

    fn coordinates(&self, lattice: [usize; 3]) -> [f64; 3] {
        let s = self.step();
        let mut p = self.origin;
        for d in 0..3 {
            if self.cells[d] > 0 {
                p[d] += self.extent[d] * lattice[d] as f64 / (s * self.cells[d]) as f64;
            }
        }
        p
    }

    /// Second-order cell templates (offsets in units of `h / 2`) for the
    /// elements one cell is split into.
    fn cell_templates(&self) -> Vec<Vec<[usize; 3]>> {
        let lift = |o: &[usize; 2]| [o[0], o[1], 0];
        let n = self.elem_type.n_nodes();
        match self.elem_type.shape() {
            CellType::Quadrilateral => vec![QUAD9_LATTICE[..n].iter().map(lift).collect()],
            CellType::Triangle => TRI6_LATTICE
                .iter()
                .map(|tri| tri[..n].iter().map(lift).collect())
                .collect(),
            CellType::Hexahedron => vec![HEX27_LATTICE[..n].to_vec()],
            _ => Vec::new(),
        }
    }

    /// Lattice coordinates of every element's nodes, in element order.
    fn element_lattices(&self) -> Vec<Vec<[usize; 3]>> {
        let s = self.step();
        // first-order elements only use the even template offsets
        let div = 3 - s;
        let templates = self.cell_templates();
        let mut out = Vec::with_capacity(self.n_elements());
        for k in 0..self.cells[2].max(1) {
            for j in 0..self.cells[1] {
                for i in 0..self.cells[0] {
                    let base = [s * i, s * j, s * k];
                    for template in &templates {
                        out.push(
                            template
                                .iter()
                                .map(|o| {
                                    [base[0] + o[0] / div, base[1] + o[1] / div, base[2] + o[2] / div]
                                })
                                .collect(),
                        );
                    }
                }
            }
        }
        out
    }

    /// Adds this block to `mesh`; nodes that already exist are shared.
    pub fn add_to<C: Communicator>(&self, mesh: &mut DistributedMesh<C>) -> Result<(), MeshError> {
        let rank = mesh.rank();
        let n_ranks = mesh.n_ranks();
        let lattices = self.element_lattices();

        let mut elems = Vec::with_capacity(lattices.len());
        let mut node_owner: BTreeMap<PointId, (usize, [usize; 3])> = BTreeMap::new();
        for (index, lattice) in lattices.iter().enumerate() {
            let owner = self.owner_of(index, n_ranks);
            let id = self
                .first_elem_id
                .checked_add(index as u64)
                .ok_or(MeshError::IdOverflow("element id"))?;
            let nodes = lattice
                .iter()
                .map(|&l| self.node_id(l))
                .collect::<Result<Vec<_>, _>>()?;
            for (&n, &l) in nodes.iter().zip(lattice) {
                node_owner
                    .entry(n)
                    .and_modify(|(o, _)| *o = (*o).min(owner))
                    .or_insert((owner, l));
            }
            elems.push((owner, Elem::new(PointId::new(id)?, self.elem_type, nodes)?));
        }

        for (owner, elem) in elems {
            let elem = elem.with_subdomain(self.subdomain_id).with_processor_id(owner);
            if self.visibility == Visibility::OwnedOnly && elem.is_ghost_on(rank) {
                continue;
            }
            for &n in &elem.nodes {
                if mesh.node(n).is_none() {
                    let (node_rank, lattice) = node_owner[&n];
                    mesh.add_node(Node::new(n, self.coordinates(lattice)).with_processor_id(node_rank))?;
                }
            }
            mesh.add_elem(elem)?;
        }
        Ok(())
    }

    /// Builds a prepared mesh holding just this block.
    pub fn build<C: Communicator>(&self, comm: C) -> Result<DistributedMesh<C>, MeshError> {
        let mut mesh = DistributedMesh::new(comm);
        self.add_to(&mut mesh)?;
        mesh.prepare_for_use()?;
        log::debug!(
            "rank {}: generated {} {} elements ({} visible)",
            mesh.rank(),
            self.n_elements(),
            self.elem_type,
            mesh.n_active_elements()
        );
        Ok(mesh)
    }
}
