//! Cell shape and element type metadata.
//!
//! [`CellType`] is the bare topological shape. [`ElemType`] is a concrete
//! finite element: a shape together with a polynomial [`Order`] and a fixed
//! node count. Node ordering follows the usual libMesh/Exodus convention:
//! vertices first, then mid-edge nodes, then face and interior nodes.

use std::fmt;

/// Common cell shapes for mesh elements.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellType {
    /// 1D segment/edge.
    Segment,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
}

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Segment => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron => 3,
        }
    }

    /// Number of vertices (corner nodes).
    pub fn n_vertices(self) -> usize {
        match self {
            CellType::Segment => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral => 4,
            CellType::Tetrahedron => 4,
            CellType::Hexahedron => 8,
        }
    }

    /// Local vertex indices of each side, in side order.
    pub fn sides(self) -> &'static [&'static [usize]] {
        match self {
            CellType::Segment => &[&[0], &[1]],
            CellType::Triangle => &[&[0, 1], &[1, 2], &[2, 0]],
            CellType::Quadrilateral => &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]],
            CellType::Tetrahedron => &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[2, 0, 3]],
            CellType::Hexahedron => &[
                &[0, 3, 2, 1],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[3, 0, 4, 7],
                &[4, 5, 6, 7],
            ],
        }
    }
}

/// Polynomial order of the geometric mapping.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Order {
    First,
    Second,
}

/// Concrete element types.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum ElemType {
    Edge2,
    Edge3,
    Tri3,
    Tri6,
    Tri7,
    Quad4,
    Quad8,
    Quad9,
    Tet4,
    Tet10,
    Hex8,
    Hex20,
    Hex27,
}

impl ElemType {
    /// All element types, in declaration order.
    pub const ALL: [ElemType; 13] = [
        ElemType::Edge2,
        ElemType::Edge3,
        ElemType::Tri3,
        ElemType::Tri6,
        ElemType::Tri7,
        ElemType::Quad4,
        ElemType::Quad8,
        ElemType::Quad9,
        ElemType::Tet4,
        ElemType::Tet10,
        ElemType::Hex8,
        ElemType::Hex20,
        ElemType::Hex27,
    ];

    pub fn shape(self) -> CellType {
        match self {
            ElemType::Edge2 | ElemType::Edge3 => CellType::Segment,
            ElemType::Tri3 | ElemType::Tri6 | ElemType::Tri7 => CellType::Triangle,
            ElemType::Quad4 | ElemType::Quad8 | ElemType::Quad9 => CellType::Quadrilateral,
            ElemType::Tet4 | ElemType::Tet10 => CellType::Tetrahedron,
            ElemType::Hex8 | ElemType::Hex20 | ElemType::Hex27 => CellType::Hexahedron,
        }
    }

    /// Default (geometric) order of the element.
    pub fn order(self) -> Order {
        match self {
            ElemType::Edge2 | ElemType::Tri3 | ElemType::Quad4 | ElemType::Tet4 | ElemType::Hex8 => {
                Order::First
            }
            _ => Order::Second,
        }
    }

    pub fn n_nodes(self) -> usize {
        match self {
            ElemType::Edge2 => 2,
            ElemType::Edge3 => 3,
            ElemType::Tri3 => 3,
            ElemType::Tri6 => 6,
            ElemType::Tri7 => 7,
            ElemType::Quad4 => 4,
            ElemType::Quad8 => 8,
            ElemType::Quad9 => 9,
            ElemType::Tet4 => 4,
            ElemType::Tet10 => 10,
            ElemType::Hex8 => 8,
            ElemType::Hex20 => 20,
            ElemType::Hex27 => 27,
        }
    }

    pub fn n_vertices(self) -> usize {
        self.shape().n_vertices()
    }

    pub fn dimension(self) -> u8 {
        self.shape().dimension()
    }

    /// Stable wire code: the position of `self` in [`ElemType::ALL`].
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u64) -> Option<ElemType> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Upper-case name as used by mesh file formats (e.g. `QUAD9`).
    pub fn name(self) -> &'static str {
        match self {
            ElemType::Edge2 => "EDGE2",
            ElemType::Edge3 => "EDGE3",
            ElemType::Tri3 => "TRI3",
            ElemType::Tri6 => "TRI6",
            ElemType::Tri7 => "TRI7",
            ElemType::Quad4 => "QUAD4",
            ElemType::Quad8 => "QUAD8",
            ElemType::Quad9 => "QUAD9",
            ElemType::Tet4 => "TET4",
            ElemType::Tet10 => "TET10",
            ElemType::Hex8 => "HEX8",
            ElemType::Hex20 => "HEX20",
            ElemType::Hex27 => "HEX27",
        }
    }
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
