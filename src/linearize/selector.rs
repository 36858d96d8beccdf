//! Picks the elements a linearization pass converts and validates them.

use crate::linearize::topology_table::{self, TopologyEntry};
use crate::mesh::elem::Elem;
use crate::mesh::mesh_base::PreparedState;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::{ElemType, Order};
use crate::topology::labels::SubdomainId;
use crate::topology::point::PointId;

/// An element selected for conversion together with its template.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
    pub elem: &'a Elem,
    pub entry: &'static TopologyEntry,
}

impl Candidate<'_> {
    pub fn n_children(&self) -> usize {
        self.entry.n_children()
    }
}

/// Returns every element whose subdomain is in `targets`, in input order.
///
/// `elements` must be in ascending id order so that every rank that sees an
/// offending element reports the same (first) one.
///
/// # Errors
/// - [`MeshError::NotSecondOrder`] for a first-order target element.
/// - [`MeshError::UnsupportedElemType`] for a second-order type without a
///   decomposition (e.g. `QUAD8`).
/// - [`MeshError::NodeCountMismatch`] for a malformed element.
pub fn select_candidates<'a, I>(
    elements: I,
    targets: &[SubdomainId],
) -> Result<Vec<Candidate<'a>>, MeshError>
where
    I: IntoIterator<Item = &'a Elem>,
{
    let mut out = Vec::new();
    for elem in elements {
        if !targets.contains(&elem.subdomain_id) {
            continue;
        }
        let entry = template_for(elem.id, elem.subdomain_id, elem.elem_type)?;
        if elem.nodes.len() != elem.elem_type.n_nodes() {
            return Err(MeshError::NodeCountMismatch {
                elem: elem.id,
                expected: elem.elem_type.n_nodes(),
                found: elem.nodes.len(),
            });
        }
        out.push(Candidate { elem, entry });
    }
    Ok(out)
}

/// Rejects the pass if a target subdomain holds, anywhere in the mesh, an
/// element type without a first-order decomposition.
///
/// Reads [`PreparedState::subdomain_elem_types`], so ranks that cannot see
/// the offending element fail with the same error as ranks that can. The
/// reported element is the lowest-id offender, which is what
/// [`select_candidates`] finds on a rank that sees every element.
pub fn check_subdomain_types(
    state: &PreparedState,
    targets: &[SubdomainId],
) -> Result<(), MeshError> {
    let offender = targets
        .iter()
        .filter_map(|sd| state.subdomain_elem_types.get(sd).map(|types| (*sd, types)))
        .flat_map(|(sd, types)| types.iter().map(move |(&ty, &first)| (first, sd, ty)))
        .filter(|&(first, sd, ty)| template_for(first, sd, ty).is_err())
        .min();
    match offender {
        Some((first, sd, ty)) => template_for(first, sd, ty).map(|_| ()),
        None => Ok(()),
    }
}

fn template_for(
    elem: PointId,
    subdomain: SubdomainId,
    elem_type: ElemType,
) -> Result<&'static TopologyEntry, MeshError> {
    if elem_type.order() != Order::Second {
        return Err(MeshError::NotSecondOrder {
            elem,
            subdomain,
            elem_type,
        });
    }
    topology_table::entry(elem_type).ok_or_else(|| MeshError::UnsupportedElemType {
        elem,
        elem_type,
        supported: topology_table::supported_type_names(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn pid(u: u64) -> PointId {
        PointId::new(u).unwrap()
    }

    fn elem(id: u64, elem_type: ElemType, subdomain: SubdomainId) -> Elem {
        let nodes = (1..=elem_type.n_nodes() as u64).map(pid).collect();
        Elem::new(pid(id), elem_type, nodes)
            .unwrap()
            .with_subdomain(subdomain)
    }

    #[test]
    fn filters_by_subdomain() {
        let elems = [
            elem(1, ElemType::Quad9, 5),
            elem(2, ElemType::Quad4, 1),
            elem(3, ElemType::Tri6, 2),
            elem(4, ElemType::Quad9, 7),
        ];
        let picked = select_candidates(&elems, &[5, 2]).unwrap();
        let ids: Vec<_> = picked.iter().map(|c| c.elem.id).collect();
        assert_eq!(ids, vec![pid(1), pid(3)]);
        assert_eq!(picked[0].n_children(), 4);
    }

    #[test]
    fn first_order_target_is_rejected() {
        let elems = [elem(1, ElemType::Quad9, 5), elem(8, ElemType::Tri3, 5)];
        let err = select_candidates(&elems, &[5]).unwrap_err();
        assert_eq!(
            err,
            MeshError::NotSecondOrder {
                elem: pid(8),
                subdomain: 5,
                elem_type: ElemType::Tri3
            }
        );
        assert_eq!(
            err.to_string(),
            "Element: 8 on block: 5 is not second order (type TRI3)"
        );
    }

    #[test]
    fn unsupported_second_order_type() {
        let elems = [elem(3, ElemType::Quad8, 1)];
        let err = select_candidates(&elems, &[1]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::UnsupportedElemType {
                elem_type: ElemType::Quad8,
                ..
            }
        ));
        let msg = err.to_string();
        assert!(msg.contains("QUAD8"));
        assert!(msg.contains("QUAD9"));
    }

    #[test]
    fn malformed_node_list() {
        let mut bad = elem(2, ElemType::Tri6, 0);
        bad.nodes.pop();
        let err = select_candidates([&bad], &[0]).unwrap_err();
        assert!(matches!(err, MeshError::NodeCountMismatch { found: 5, .. }));
    }

    fn summary(entries: &[(SubdomainId, ElemType, u64)]) -> PreparedState {
        let mut types: BTreeMap<SubdomainId, BTreeMap<ElemType, PointId>> = BTreeMap::new();
        for &(sd, ty, first) in entries {
            types.entry(sd).or_default().insert(ty, pid(first));
        }
        PreparedState {
            max_elem_id: 100,
            max_node_id: 100,
            next_unique_id: 101,
            subdomain_ids: types.keys().copied().collect::<BTreeSet<_>>(),
            subdomain_elem_types: types,
            n_ranks: 2,
        }
    }

    #[test]
    fn mesh_wide_check_reports_lowest_offender() {
        let state = summary(&[
            (1, ElemType::Quad9, 1),
            (1, ElemType::Quad8, 40),
            (2, ElemType::Tri3, 12),
            (3, ElemType::Edge2, 2),
        ]);
        assert_eq!(
            check_subdomain_types(&state, &[1, 2]),
            Err(MeshError::NotSecondOrder {
                elem: pid(12),
                subdomain: 2,
                elem_type: ElemType::Tri3
            })
        );
        assert!(matches!(
            check_subdomain_types(&state, &[1]),
            Err(MeshError::UnsupportedElemType { elem, .. }) if elem == pid(40)
        ));
    }

    #[test]
    fn mesh_wide_check_ignores_other_subdomains() {
        let state = summary(&[(1, ElemType::Tri6, 5), (3, ElemType::Edge2, 2)]);
        assert_eq!(check_subdomain_types(&state, &[1, 9]), Ok(()));
        assert_eq!(check_subdomain_types(&PreparedState::default(), &[1]), Ok(()));
    }

    #[test]
    fn no_targets_present() {
        let elems = [elem(1, ElemType::Tri3, 0)];
        assert!(select_candidates(&elems, &[9]).unwrap().is_empty());
    }
}
