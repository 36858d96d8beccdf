//! Target subdomain resolution, naming, and the closing collective rebuild.

use crate::mesh::mesh_base::{MeshBase, PreparedState};
use crate::mesh_error::MeshError;
use crate::topology::labels::SubdomainId;

/// What to do when the requested subdomain id is already in use.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SubdomainCollision {
    /// Fail with [`MeshError::SubdomainIdInUse`].
    #[default]
    Reject,
    /// Place the children in the existing subdomain.
    Merge,
}

/// Picks the subdomain id the children go to.
///
/// Without a request the id is one past the largest id in use on any rank,
/// or 0 for a mesh without elements.
///
/// # Errors
/// - [`MeshError::SubdomainIdInUse`] if `requested` exists and `collision`
///   is [`SubdomainCollision::Reject`].
/// - [`MeshError::SubdomainIdOverflow`] if the largest id in use is
///   `SubdomainId::MAX`.
pub fn resolve_subdomain_id(
    state: &PreparedState,
    requested: Option<SubdomainId>,
    collision: SubdomainCollision,
) -> Result<SubdomainId, MeshError> {
    match requested {
        Some(id) => {
            if collision == SubdomainCollision::Reject && state.subdomain_ids.contains(&id) {
                return Err(MeshError::SubdomainIdInUse(id));
            }
            Ok(id)
        }
        None => match state.subdomain_ids.last() {
            None => Ok(0),
            Some(&max) => max
                .checked_add(1)
                .ok_or(MeshError::SubdomainIdOverflow(max)),
        },
    }
}

/// Binds `name` to `id`; the last write wins.
pub fn bind_name<M: MeshBase>(mesh: &mut M, id: SubdomainId, name: &str) {
    if let Some(previous) = mesh.set_subdomain_name(id, name.to_owned()) {
        if previous != name {
            log::warn!("subdomain {id}: renaming {previous:?} to {name:?}");
        }
    }
}

/// Rebuilds the mesh once without repartitioning, restoring the caller's
/// partitioning flag afterwards (also on failure).
pub fn finalize<M: MeshBase>(mesh: &mut M) -> Result<(), MeshError> {
    let skip = mesh.skip_partitioning();
    mesh.set_skip_partitioning(true);
    let result = mesh.prepare_for_use();
    mesh.set_skip_partitioning(skip);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn state(ids: &[SubdomainId]) -> PreparedState {
        PreparedState {
            subdomain_ids: ids.iter().copied().collect::<BTreeSet<_>>(),
            ..Default::default()
        }
    }

    #[test]
    fn default_id_is_one_past_the_maximum() {
        assert_eq!(
            resolve_subdomain_id(&state(&[0, 5, 2]), None, SubdomainCollision::Reject),
            Ok(6)
        );
        assert_eq!(
            resolve_subdomain_id(&state(&[]), None, SubdomainCollision::Reject),
            Ok(0)
        );
    }

    #[test]
    fn maximum_id_overflows() {
        assert_eq!(
            resolve_subdomain_id(&state(&[SubdomainId::MAX]), None, SubdomainCollision::Merge),
            Err(MeshError::SubdomainIdOverflow(SubdomainId::MAX))
        );
        // an explicit id sidesteps the search
        assert_eq!(
            resolve_subdomain_id(&state(&[SubdomainId::MAX]), Some(3), SubdomainCollision::Reject),
            Ok(3)
        );
    }

    #[test]
    fn collision_policy() {
        let s = state(&[1, 4]);
        assert_eq!(
            resolve_subdomain_id(&s, Some(4), SubdomainCollision::Reject),
            Err(MeshError::SubdomainIdInUse(4))
        );
        assert_eq!(
            resolve_subdomain_id(&s, Some(4), SubdomainCollision::Merge),
            Ok(4)
        );
        assert_eq!(
            resolve_subdomain_id(&s, Some(9), SubdomainCollision::Reject),
            Ok(9)
        );
    }
}
