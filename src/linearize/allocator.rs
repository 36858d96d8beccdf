//! Element and unique id assignment for derived elements.
//!
//! Ids are computed from the global bookkeeping in [`PreparedState`] without
//! any messages. Two strategies are offered:
//!
//! - [`IdStrategy::PrefixSum`]: dense ids. Parent *i* (ascending id) with
//!   *k_i* children gets the block starting at `seed + sum(k_0..k_{i-1})`.
//!   Ranks agree only if they all see the same candidate parents, i.e. the
//!   targeted subdomains are replicated (or fully ghosted) on every rank.
//! - [`IdStrategy::ParentStrided`]: child *j* of parent *p* gets
//!   `seed + (p - 1) * stride + j` with `stride = max_children()`. Depends on
//!   nothing but the parent id, so ranks that see different subsets of the
//!   parents still agree. Leaves gaps in the id space. Overflow is checked
//!   against the largest element id in the mesh, not the visible parents, so
//!   it is reported on every rank alike.
//!
//! In both cases `seed = max_elem_id + 1` and unique ids follow the same
//! offsets from `next_unique_id`.

use crate::linearize::selector::Candidate;
use crate::linearize::topology_table;
use crate::mesh::mesh_base::{MeshBase, PreparedState};
use crate::mesh_error::MeshError;
use crate::topology::point::PointId;
use std::collections::HashMap;

/// How new element ids are assigned.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    #[default]
    PrefixSum,
    ParentStrided,
}

/// Ids reserved for the children of one parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdRange {
    pub parent: PointId,
    pub first_id: PointId,
    pub first_unique_id: u64,
    pub count: usize,
}

impl IdRange {
    /// Element id of child `j`.
    pub fn id(&self, j: usize) -> Result<PointId, MeshError> {
        self.first_id
            .checked_offset(j as u64)
            .ok_or(MeshError::IdOverflow("element id"))
    }

    /// Unique id of child `j`.
    pub fn unique_id(&self, j: usize) -> Result<u64, MeshError> {
        self.first_unique_id
            .checked_add(j as u64)
            .ok_or(MeshError::IdOverflow("unique id"))
    }

    /// Last id of the range; errors if it does not fit.
    fn last_id(&self) -> Result<PointId, MeshError> {
        self.id(self.count.saturating_sub(1))
    }
}

/// Id ranges for every candidate parent of one pass.
#[derive(Clone, Debug, Default)]
pub struct IdPlan {
    ranges: Vec<IdRange>,
    by_parent: HashMap<PointId, usize>,
}

impl IdPlan {
    pub fn range(&self, parent: PointId) -> Option<&IdRange> {
        self.by_parent.get(&parent).map(|&i| &self.ranges[i])
    }

    /// Ranges in candidate order.
    pub fn ranges(&self) -> &[IdRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total number of ids handed out.
    pub fn n_new(&self) -> usize {
        self.ranges.iter().map(|r| r.count).sum()
    }

    fn push(&mut self, range: IdRange) {
        self.by_parent.insert(range.parent, self.ranges.len());
        self.ranges.push(range);
    }
}

/// Returns the prepared bookkeeping, checking it is usable on this rank.
///
/// # Errors
/// - [`MeshError::MeshNotPrepared`] if the mesh was mutated since the last
///   `prepare_for_use`.
/// - [`MeshError::StalePreparedState`] if this rank sees an element id above
///   the prepared maximum.
pub fn check_prepared<M: MeshBase>(mesh: &M) -> Result<&PreparedState, MeshError> {
    let state = mesh.prepared_state().ok_or(MeshError::MeshNotPrepared)?;
    let local_max = mesh.local_max_elem_id();
    if local_max > state.max_elem_id {
        return Err(MeshError::StalePreparedState {
            local_max,
            prepared_max: state.max_elem_id,
        });
    }
    Ok(state)
}

/// Assigns id ranges to `candidates` (ascending parent id).
///
/// # Errors
/// [`MeshError::IdOverflow`] if any id would not fit in a `u64`.
pub fn plan_ids(
    state: &PreparedState,
    candidates: &[Candidate<'_>],
    strategy: IdStrategy,
) -> Result<IdPlan, MeshError> {
    let seed = state
        .max_elem_id
        .checked_add(1)
        .ok_or(MeshError::IdOverflow("element id"))?;
    let unique_seed = state.next_unique_id;

    let stride = topology_table::max_children() as u64;
    if strategy == IdStrategy::ParentStrided {
        let span = state
            .max_elem_id
            .checked_mul(stride)
            .ok_or(MeshError::IdOverflow("element id"))?;
        seed.checked_add(span.saturating_sub(1))
            .ok_or(MeshError::IdOverflow("element id"))?;
        unique_seed
            .checked_add(span.saturating_sub(1))
            .ok_or(MeshError::IdOverflow("unique id"))?;
    }

    let mut plan = IdPlan::default();
    let mut offset = 0u64;
    for cand in candidates {
        let count = cand.n_children();
        let local = match strategy {
            IdStrategy::PrefixSum => offset,
            IdStrategy::ParentStrided => (cand.elem.id.get() - 1)
                .checked_mul(stride)
                .ok_or(MeshError::IdOverflow("element id"))?,
        };
        let first_id = seed
            .checked_add(local)
            .ok_or(MeshError::IdOverflow("element id"))?;
        let first_unique_id = unique_seed
            .checked_add(local)
            .ok_or(MeshError::IdOverflow("unique id"))?;
        let range = IdRange {
            parent: cand.elem.id,
            first_id: PointId::new(first_id)?,
            first_unique_id,
            count,
        };
        range.last_id()?;
        range.unique_id(count.saturating_sub(1))?;
        plan.push(range);

        offset = offset
            .checked_add(count as u64)
            .ok_or(MeshError::IdOverflow("element id"))?;
    }

    log::debug!(
        "planned {} new element ids for {} parents ({strategy:?}, seed {seed})",
        plan.n_new(),
        plan.ranges.len()
    );
    Ok(plan)
}
