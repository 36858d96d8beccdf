//! Construction of first-order children and the deferred mesh edit.

use crate::linearize::allocator::IdPlan;
use crate::linearize::selector::Candidate;
use crate::mesh::elem::Elem;
use crate::mesh::mesh_base::MeshBase;
use crate::mesh_error::MeshError;
use crate::topology::labels::SubdomainId;
use crate::topology::point::PointId;

/// Pending changes of one linearization pass.
///
/// Building an edit never touches the mesh; [`MeshEdit::commit`] applies it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshEdit {
    /// New elements, grouped by parent in candidate order.
    pub added: Vec<Elem>,
    /// Parents to retire, ascending id.
    pub retired: Vec<PointId>,
}

impl MeshEdit {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.retired.is_empty()
    }

    /// Inserts every child, then retires every parent.
    pub fn commit<M: MeshBase>(self, mesh: &mut M) -> Result<(), MeshError> {
        for child in self.added {
            mesh.add_elem(child)?;
        }
        for parent in self.retired {
            mesh.retire_elem(parent)?;
        }
        Ok(())
    }
}

/// Builds the children of every candidate.
///
/// Children reuse the parent's node ids, inherit its owning rank, point back
/// to it through `interior_parent`, and land in `subdomain`.
///
/// # Errors
/// [`MeshError::InvariantViolation`] if `plan` lacks a candidate, and
/// [`MeshError::IdOverflow`] from the plan's ranges.
pub fn build_children(
    candidates: &[Candidate<'_>],
    plan: &IdPlan,
    subdomain: SubdomainId,
) -> Result<MeshEdit, MeshError> {
    let mut edit = MeshEdit {
        added: Vec::with_capacity(plan.n_new()),
        retired: Vec::with_capacity(candidates.len()),
    };
    for cand in candidates {
        let parent = cand.elem;
        let range = plan.range(parent.id).ok_or_else(|| {
            MeshError::InvariantViolation(format!("no id range planned for element {}", parent.id))
        })?;
        for (j, template) in cand.entry.children.iter().enumerate() {
            let nodes = template
                .local_nodes
                .iter()
                .map(|&i| parent.nodes[i])
                .collect();
            let mut child = Elem::new(range.id(j)?, template.elem_type, nodes)?
                .with_unique_id(range.unique_id(j)?)
                .with_subdomain(subdomain)
                .with_processor_id(parent.processor_id);
            child.interior_parent = Some(parent.id);
            edit.added.push(child);
        }
        edit.retired.push(parent.id);
    }
    Ok(edit)
}
