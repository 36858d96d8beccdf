//! Decomposition templates from second-order elements into first-order
//! children that reuse the parent's nodes.
//!
//! Each template lists, per child, indices into the parent's local node
//! numbering. No template introduces nodes, and every parent node is used by
//! at least one child, so converting an element neither creates nor orphans
//! nodes. Child orientation follows the parent's.

use crate::topology::cell_type::ElemType;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One first-order child of a decomposed element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildTemplate {
    pub elem_type: ElemType,
    /// Indices into the parent's node list.
    pub local_nodes: Vec<usize>,
}

/// Decomposition of one second-order element type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopologyEntry {
    pub parent: ElemType,
    pub children: Vec<ChildTemplate>,
}

impl TopologyEntry {
    fn new(parent: ElemType, child: ElemType, children: &[&[usize]]) -> Self {
        Self {
            parent,
            children: children
                .iter()
                .map(|nodes| ChildTemplate {
                    elem_type: child,
                    local_nodes: nodes.to_vec(),
                })
                .collect(),
        }
    }

    pub fn n_children(&self) -> usize {
        self.children.len()
    }
}

// Quad9: corners 0-3, mid-edges 4=m01 5=m12 6=m23 7=m30, center 8.
const QUAD9_TO_QUAD4: [&[usize]; 4] = [&[0, 4, 8, 7], &[4, 1, 5, 8], &[8, 5, 2, 6], &[7, 8, 6, 3]];

// Tri6: corners 0-2, mid-edges 3=m01 4=m12 5=m20.
const TRI6_TO_TRI3: [&[usize]; 4] = [&[0, 3, 5], &[3, 1, 4], &[5, 4, 2], &[3, 4, 5]];

const EDGE3_TO_EDGE2: [&[usize]; 2] = [&[0, 2], &[2, 1]];

// Tet10: corners 0-3, 4=m01 5=m12 6=m20 7=m03 8=m13 9=m23.
// Four corner tets, then the inner octahedron cut along the 4-9 diagonal.
const TET10_TO_TET4: [&[usize]; 8] = [
    &[0, 4, 6, 7],
    &[1, 5, 4, 8],
    &[2, 6, 5, 9],
    &[3, 8, 7, 9],
    &[4, 8, 5, 9],
    &[4, 7, 8, 9],
    &[4, 6, 7, 9],
    &[4, 5, 6, 9],
];

// Hex27: one sub-hex per corner; bottom layer first, counter-clockwise.
const HEX27_TO_HEX8: [&[usize]; 8] = [
    &[0, 8, 20, 11, 12, 21, 26, 24],
    &[8, 1, 9, 20, 21, 13, 22, 26],
    &[20, 9, 2, 10, 26, 22, 14, 23],
    &[11, 20, 10, 3, 24, 26, 23, 15],
    &[12, 21, 26, 24, 4, 16, 25, 19],
    &[21, 13, 22, 26, 16, 5, 17, 25],
    &[26, 22, 14, 23, 25, 17, 6, 18],
    &[24, 26, 23, 15, 19, 25, 18, 7],
];

/// All supported decompositions, keyed by parent type.
pub static TOPOLOGY_TABLE: Lazy<HashMap<ElemType, TopologyEntry>> = Lazy::new(|| {
    [
        TopologyEntry::new(ElemType::Quad9, ElemType::Quad4, &QUAD9_TO_QUAD4),
        TopologyEntry::new(ElemType::Tri6, ElemType::Tri3, &TRI6_TO_TRI3),
        TopologyEntry::new(ElemType::Edge3, ElemType::Edge2, &EDGE3_TO_EDGE2),
        TopologyEntry::new(ElemType::Tet10, ElemType::Tet4, &TET10_TO_TET4),
        TopologyEntry::new(ElemType::Hex27, ElemType::Hex8, &HEX27_TO_HEX8),
    ]
    .into_iter()
    .map(|e| (e.parent, e))
    .collect()
});

/// Template for `elem_type`, if it has one.
pub fn entry(elem_type: ElemType) -> Option<&'static TopologyEntry> {
    TOPOLOGY_TABLE.get(&elem_type)
}

/// Supported parent types in declaration order of [`ElemType`].
pub fn supported_types() -> Vec<ElemType> {
    ElemType::ALL
        .into_iter()
        .filter(|t| TOPOLOGY_TABLE.contains_key(t))
        .collect()
}

/// Human-readable list of supported types, e.g. `"EDGE3, TRI6, QUAD9"`.
pub fn supported_type_names() -> String {
    supported_types()
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Largest number of children any entry produces.
pub fn max_children() -> usize {
    TOPOLOGY_TABLE
        .values()
        .map(TopologyEntry::n_children)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::measure::signed_cell_measure;
    use crate::topology::cell_type::Order;
    use std::collections::BTreeSet;

    #[test]
    fn mandated_entries() {
        let quad = entry(ElemType::Quad9).unwrap();
        let nodes: Vec<_> = quad.children.iter().map(|c| c.local_nodes.clone()).collect();
        assert_eq!(
            nodes,
            vec![
                vec![0, 4, 8, 7],
                vec![4, 1, 5, 8],
                vec![8, 5, 2, 6],
                vec![7, 8, 6, 3]
            ]
        );
        let tri = entry(ElemType::Tri6).unwrap();
        let nodes: Vec<_> = tri.children.iter().map(|c| c.local_nodes.clone()).collect();
        assert_eq!(
            nodes,
            vec![vec![0, 3, 5], vec![3, 1, 4], vec![5, 4, 2], vec![3, 4, 5]]
        );
    }

    #[test]
    fn templates_are_closed_and_cover_every_node() {
        for (parent, e) in TOPOLOGY_TABLE.iter() {
            assert_eq!(*parent, e.parent);
            assert_eq!(parent.order(), Order::Second);
            let mut used = BTreeSet::new();
            for child in &e.children {
                assert_eq!(child.elem_type.order(), Order::First);
                assert_eq!(child.elem_type.shape(), parent.shape());
                assert_eq!(child.local_nodes.len(), child.elem_type.n_nodes());
                for &i in &child.local_nodes {
                    assert!(i < parent.n_nodes(), "{parent}: index {i} out of range");
                    used.insert(i);
                }
            }
            assert_eq!(used.len(), parent.n_nodes(), "{parent} leaves nodes unused");
        }
    }

    fn reference_nodes(elem_type: ElemType) -> Vec<[f64; 3]> {
        let mid = |a: [f64; 3], b: [f64; 3]| [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0, (a[2] + b[2]) / 2.0];
        match elem_type {
            ElemType::Tet10 => {
                let c = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
                let mut n = c.to_vec();
                for (a, b) in [(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)] {
                    n.push(mid(c[a], c[b]));
                }
                n
            }
            ElemType::Tri6 => {
                let c = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
                let mut n = c.to_vec();
                for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                    n.push(mid(c[a], c[b]));
                }
                n
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn simplex_children_keep_parent_orientation() {
        for elem_type in [ElemType::Tri6, ElemType::Tet10] {
            let nodes = reference_nodes(elem_type);
            let parent_measure =
                signed_cell_measure(elem_type.shape(), &nodes[..elem_type.n_vertices()]).unwrap();
            let mut total = 0.0;
            for child in &entry(elem_type).unwrap().children {
                let verts: Vec<_> = child.local_nodes.iter().map(|&i| nodes[i]).collect();
                let m = signed_cell_measure(child.elem_type.shape(), &verts).unwrap();
                assert!(m > 0.0, "{elem_type} child {:?} inverted", child.local_nodes);
                total += m;
            }
            assert!((total - parent_measure).abs() < 1e-12);
        }
    }

    #[test]
    fn lookup_helpers() {
        assert!(entry(ElemType::Quad8).is_none());
        assert!(entry(ElemType::Quad4).is_none());
        assert_eq!(
            supported_types(),
            vec![
                ElemType::Edge3,
                ElemType::Tri6,
                ElemType::Quad9,
                ElemType::Tet10,
                ElemType::Hex27
            ]
        );
        assert_eq!(supported_type_names(), "EDGE3, TRI6, QUAD9, TET10, HEX27");
        assert_eq!(max_children(), 8);
    }
}
