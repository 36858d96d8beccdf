//! Conversion of second-order subdomains into first-order subdivisions.
//!
//! [`FirstOrderFromSecondOrder`] is a mesh-pipeline stage: every active
//! element in the requested subdomains is split into first-order children
//! that reuse its nodes (a `QUAD9` becomes four `QUAD4`s, a `TRI6` four
//! `TRI3`s, and so on; see [`topology_table`]). The children go to a new
//! subdomain, the parents are retired but stay reachable as the children's
//! interior parent, and the mesh is re-prepared once without repartitioning.
//!
//! # Pipeline
//! 1. [`allocator::check_prepared`]: the mesh must be prepared and current.
//! 2. [`finalize::resolve_subdomain_id`]: pick (or validate) the target id.
//! 3. [`selector::check_subdomain_types`] against the mesh-wide type summary,
//!    then [`selector::select_candidates`]: collect and validate targets.
//! 4. [`allocator::plan_ids`]: reserve element and unique ids.
//! 5. [`builder::build_children`]: build a [`MeshEdit`].
//! 6. Commit, name the subdomain, and [`finalize::finalize`].
//!
//! Steps 1 to 5 only read the mesh, so a failing pass leaves it untouched.
//! The stage sends no messages of its own; ranks agree on new ids, and on
//! whether to fail, because they share the same
//! [`PreparedState`](crate::mesh::PreparedState).
//!
//! ```
//! use mesh_linearize::algs::NoComm;
//! use mesh_linearize::linearize::{FirstOrderFromSecondOrder, LinearizeOptions};
//! use mesh_linearize::mesh::{MeshBase, StructuredGrid};
//! use mesh_linearize::topology::ElemType;
//!
//! let mut mesh = StructuredGrid::new(ElemType::Quad9, [2, 2, 0])?
//!     .with_subdomain(1)
//!     .build(NoComm)?;
//! let stage = FirstOrderFromSecondOrder::new(
//!     LinearizeOptions::new([1]).with_new_subdomain_name("linear"),
//! )?;
//! let report = stage.apply(&mut mesh)?;
//! assert_eq!(report.new_subdomain_id, 2);
//! assert_eq!(report.children.len(), 16);
//! assert_eq!(mesh.subdomain_name(2), Some("linear"));
//! # Ok::<(), mesh_linearize::mesh_error::MeshError>(())
//! ```

pub mod allocator;
pub mod builder;
pub mod finalize;
pub mod selector;
pub mod topology_table;

pub use allocator::{IdPlan, IdRange, IdStrategy};
pub use builder::MeshEdit;
pub use finalize::SubdomainCollision;
pub use selector::Candidate;
pub use topology_table::{ChildTemplate, TopologyEntry};

use crate::mesh::mesh_base::{MeshBase, MeshGenerator};
use crate::mesh_error::MeshError;
use crate::topology::labels::SubdomainId;
use crate::topology::point::PointId;

/// Options of one linearization pass.
///
/// Loadable from JSON/TOML by a pipeline driver:
/// ```
/// # use mesh_linearize::linearize::{LinearizeOptions, IdStrategy};
/// let opts: LinearizeOptions = serde_json::from_str(
///     r#"{ "second_order_subdomains": [5], "id_strategy": "parent_strided" }"#,
/// ).unwrap();
/// assert_eq!(opts.id_strategy, IdStrategy::ParentStrided);
/// assert_eq!(opts.new_subdomain_id, None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearizeOptions {
    /// Subdomains whose elements are converted.
    pub second_order_subdomains: Vec<SubdomainId>,
    /// Subdomain of the children; one past the largest id in use if unset.
    #[serde(default)]
    pub new_subdomain_id: Option<SubdomainId>,
    #[serde(default)]
    pub new_subdomain_name: Option<String>,
    #[serde(default)]
    pub collision: SubdomainCollision,
    #[serde(default)]
    pub id_strategy: IdStrategy,
}

impl LinearizeOptions {
    pub fn new(second_order_subdomains: impl IntoIterator<Item = SubdomainId>) -> Self {
        Self {
            second_order_subdomains: second_order_subdomains.into_iter().collect(),
            new_subdomain_id: None,
            new_subdomain_name: None,
            collision: SubdomainCollision::default(),
            id_strategy: IdStrategy::default(),
        }
    }

    pub fn with_new_subdomain_id(mut self, id: SubdomainId) -> Self {
        self.new_subdomain_id = Some(id);
        self
    }

    pub fn with_new_subdomain_name(mut self, name: impl Into<String>) -> Self {
        self.new_subdomain_name = Some(name.into());
        self
    }

    pub fn with_collision(mut self, collision: SubdomainCollision) -> Self {
        self.collision = collision;
        self
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// # Errors
    /// [`MeshError::EmptySubdomainList`] if no subdomain is named.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.second_order_subdomains.is_empty() {
            return Err(MeshError::EmptySubdomainList);
        }
        Ok(())
    }
}

/// What a pass changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearizeReport {
    pub new_subdomain_id: SubdomainId,
    /// Retired parents, ascending id.
    pub parents: Vec<PointId>,
    /// New elements, grouped by parent.
    pub children: Vec<PointId>,
}

/// Replaces second-order elements of selected subdomains by first-order
/// children on the same nodes.
#[derive(Clone, Debug)]
pub struct FirstOrderFromSecondOrder {
    options: LinearizeOptions,
}

impl FirstOrderFromSecondOrder {
    /// Validates `options` and deduplicates the target list.
    pub fn new(mut options: LinearizeOptions) -> Result<Self, MeshError> {
        options.validate()?;
        options.second_order_subdomains.sort_unstable();
        options.second_order_subdomains.dedup();
        Ok(Self { options })
    }

    pub fn options(&self) -> &LinearizeOptions {
        &self.options
    }

    /// Runs the pass on a prepared mesh. Collective: every rank must call it
    /// with the same options.
    ///
    /// # Errors
    /// Any precondition or validation failure, reported before the mesh is
    /// touched; see [`MeshError`]. Validation errors are raised on every
    /// rank, also on ranks that do not see the offending element.
    pub fn apply<M: MeshBase>(&self, mesh: &mut M) -> Result<LinearizeReport, MeshError> {
        let opts = &self.options;
        let state = allocator::check_prepared(mesh)?;
        let new_id = finalize::resolve_subdomain_id(state, opts.new_subdomain_id, opts.collision)?;
        selector::check_subdomain_types(state, &opts.second_order_subdomains)?;
        let candidates =
            selector::select_candidates(mesh.active_elements(), &opts.second_order_subdomains)?;
        log::debug!(
            "rank {}: {} candidate elements in subdomains {:?}",
            mesh.rank(),
            candidates.len(),
            opts.second_order_subdomains
        );
        let plan = allocator::plan_ids(state, &candidates, opts.id_strategy)?;
        let edit = builder::build_children(&candidates, &plan, new_id)?;

        let report = LinearizeReport {
            new_subdomain_id: new_id,
            parents: edit.retired.clone(),
            children: edit.added.iter().map(|e| e.id).collect(),
        };
        edit.commit(mesh)?;
        if let Some(name) = &opts.new_subdomain_name {
            finalize::bind_name(mesh, new_id, name);
        }
        finalize::finalize(mesh)?;

        log::info!(
            "rank {}: converted {} elements into {} first-order elements in subdomain {}",
            mesh.rank(),
            report.parents.len(),
            report.children.len(),
            new_id
        );
        Ok(report)
    }
}

impl<M: MeshBase> MeshGenerator<M> for FirstOrderFromSecondOrder {
    fn generate(&self, mut input: M) -> Result<M, MeshError> {
        self.apply(&mut input)?;
        Ok(input)
    }
}
