//! Connectivity tables: node → element incidence and side neighbors.
//
// Two elements are side neighbors when one side of each has the same vertex
// set. Sides are keyed by their *sorted* vertex ids, so orientation does not
// matter. A side seen by exactly one element is a boundary (or the neighbor
// is not visible on this rank); a side seen by more than two elements is
// non-manifold and stays unpaired.
//
// Sides are matched on vertices only: a first-order child side that ends at a
// mid-edge node of an untouched second-order neighbor does not match that
// neighbor's side, and is reported as having no neighbor.

use crate::mesh::elem::Elem;
use crate::topology::point::PointId;
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Rebuilt connectivity for the active elements of a mesh shard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Connectivity {
    /// Node → elements touching it, ascending element id.
    pub node_to_elems: BTreeMap<PointId, Vec<PointId>>,
    /// Element → one neighbor slot per side.
    pub neighbors: BTreeMap<PointId, Vec<Option<PointId>>>,
}

type SideKey = Vec<PointId>;

fn side_keys(elem: &Elem) -> Vec<SideKey> {
    (0..elem.n_sides())
        .filter_map(|s| elem.side_vertices(s))
        .map(|verts| verts.into_iter().sorted_unstable().collect_vec())
        .collect()
}

/// Build connectivity from elements given in ascending id order.
pub fn build_connectivity<'a, I>(elements: I) -> Connectivity
where
    I: IntoIterator<Item = &'a Elem>,
{
    let elems: Vec<&Elem> = elements.into_iter().collect();

    // 0. per-element side keys (order preserved)
    #[cfg(feature = "rayon")]
    let keys: Vec<Vec<SideKey>> = elems.par_iter().map(|e| side_keys(e)).collect();
    #[cfg(not(feature = "rayon"))]
    let keys: Vec<Vec<SideKey>> = elems.iter().map(|e| side_keys(e)).collect();

    // 1. node incidence + side incidence
    let mut node_to_elems: BTreeMap<PointId, Vec<PointId>> = BTreeMap::new();
    let mut incident: HashMap<SideKey, Vec<(PointId, usize)>> = HashMap::new();
    let mut neighbors = BTreeMap::new();
    for (elem, elem_keys) in elems.iter().zip(keys) {
        for &node in elem.nodes.iter().unique() {
            node_to_elems.entry(node).or_default().push(elem.id);
        }
        neighbors.insert(elem.id, vec![None; elem_keys.len()]);
        for (side, key) in elem_keys.into_iter().enumerate() {
            incident.entry(key).or_default().push((elem.id, side));
        }
    }

    // 2. pair sides
    for (key, owners) in incident {
        match owners.as_slice() {
            [(a, sa), (b, sb)] => {
                if let Some(slots) = neighbors.get_mut(a) {
                    slots[*sa] = Some(*b);
                }
                if let Some(slots) = neighbors.get_mut(b) {
                    slots[*sb] = Some(*a);
                }
            }
            [_] => {}
            many => {
                log::warn!(
                    "Non-manifold side detected: vertices={key:?} incident_elems={}",
                    many.len()
                );
            }
        }
    }

    for elems in node_to_elems.values_mut() {
        elems.sort_unstable();
    }

    Connectivity {
        node_to_elems,
        neighbors,
    }
}
