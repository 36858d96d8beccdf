//! Length, area and volume of elements from their vertex coordinates.
//!
//! # Coordinate layout
//! Nodes carry `[x, y, z]`. Surface measures are evaluated in the XY plane;
//! planar meshes embedded elsewhere should be projected first.
//!
//! # Vertex ordering
//! - **Segment**: `[v0, v1]`.
//! - **Triangle**: `[v0, v1, v2]` (counter-clockwise in XY is positive).
//! - **Quadrilateral**: `[v0, v1, v2, v3]` (counter-clockwise in XY is positive).
//! - **Tetrahedron**: `[v0, v1, v2, v3]` with `v3` above the plane of the
//!   counter-clockwise base `[v0, v1, v2]` being positive.
//! - **Hexahedron**: bottom face `[0, 1, 2, 3]`, top face `[4, 5, 6, 7]`.
//!
//! Only vertices are used, so curved second-order geometry is measured as if
//! its mid-edge nodes sat on straight edges.

use crate::mesh::elem::Elem;
use crate::mesh::mesh_base::MeshBase;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;

/// The six tetrahedra a hexahedron is split into, all sharing diagonal 0-6.
const HEX_TETS: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn tet_volume(v0: [f64; 3], v1: [f64; 3], v2: [f64; 3], v3: [f64; 3]) -> f64 {
    dot(cross(sub(v1, v0), sub(v2, v0)), sub(v3, v0)) / 6.0
}

/// Signed measure of a cell: positive for the orientations listed in the
/// module docs, negative when inverted. Segments are always non-negative.
///
/// # Errors
/// [`MeshError::InvalidGeometry`] if the vertex count does not match `shape`.
pub fn signed_cell_measure(shape: CellType, vertices: &[[f64; 3]]) -> Result<f64, MeshError> {
    if vertices.len() != shape.n_vertices() {
        return Err(MeshError::InvalidGeometry(format!(
            "vertex count mismatch for {shape:?}: expected {}, got {}",
            shape.n_vertices(),
            vertices.len()
        )));
    }
    let v = vertices;
    let measure = match shape {
        CellType::Segment => dot(sub(v[1], v[0]), sub(v[1], v[0])).sqrt(),
        CellType::Triangle | CellType::Quadrilateral => {
            // shoelace
            let n = v.len();
            (0..n)
                .map(|i| {
                    let (a, b) = (v[i], v[(i + 1) % n]);
                    a[0] * b[1] - b[0] * a[1]
                })
                .sum::<f64>()
                / 2.0
        }
        CellType::Tetrahedron => tet_volume(v[0], v[1], v[2], v[3]),
        CellType::Hexahedron => HEX_TETS
            .iter()
            .map(|t| tet_volume(v[t[0]], v[t[1]], v[t[2]], v[t[3]]))
            .sum(),
    };
    Ok(measure)
}

fn vertex_coordinates<M: MeshBase>(elem: &Elem, mesh: &M) -> Result<Vec<[f64; 3]>, MeshError> {
    elem.vertices()
        .iter()
        .map(|&id| {
            mesh.node(id)
                .map(|n| n.point)
                .ok_or(MeshError::MissingNode { elem: elem.id, node: id })
        })
        .collect()
}

/// Signed measure of `elem` using the coordinates stored in `mesh`.
pub fn signed_elem_measure<M: MeshBase>(elem: &Elem, mesh: &M) -> Result<f64, MeshError> {
    let coords = vertex_coordinates(elem, mesh)?;
    signed_cell_measure(elem.elem_type.shape(), &coords)
}

/// Absolute measure of `elem` using the coordinates stored in `mesh`.
pub fn elem_measure<M: MeshBase>(elem: &Elem, mesh: &M) -> Result<f64, MeshError> {
    signed_elem_measure(elem, mesh).map(f64::abs)
}
