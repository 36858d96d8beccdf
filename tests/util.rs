#![allow(dead_code)]
use mesh_linearize::geometry::measure::elem_measure;
use mesh_linearize::linearize::LinearizeReport;
use mesh_linearize::mesh::{DistributedMesh, Elem, MeshBase, Node, PreparedState};
use mesh_linearize::mesh_error::MeshError;
use mesh_linearize::topology::{ElemType, PointId, SubdomainId};
use std::collections::BTreeSet;

pub fn pid(u: u64) -> PointId {
    PointId::new(u).unwrap()
}

/// Adds nodes `first_node..` at `coords` and one element on them.
pub fn add_elem_with_nodes(
    mesh: &mut DistributedMesh,
    elem_id: u64,
    elem_type: ElemType,
    first_node: u64,
    coords: &[[f64; 3]],
    subdomain: SubdomainId,
) {
    let mut nodes = Vec::new();
    for (i, &p) in coords.iter().enumerate() {
        let id = pid(first_node + i as u64);
        if mesh.node(id).is_none() {
            mesh.add_node(Node::new(id, p)).unwrap();
        }
        nodes.push(id);
    }
    let elem = Elem::new(pid(elem_id), elem_type, nodes)
        .unwrap()
        .with_subdomain(subdomain);
    mesh.add_elem(elem).unwrap();
}

fn mid(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0, (a[2] + b[2]) / 2.0]
}

/// Reference Tet10 with corners at `origin + {0, e_x, e_y, e_z}`.
pub fn tet10_coords(origin: [f64; 3]) -> Vec<[f64; 3]> {
    let [x, y, z] = origin;
    let c = [
        [x, y, z],
        [x + 1.0, y, z],
        [x, y + 1.0, z],
        [x, y, z + 1.0],
    ];
    let mut out = c.to_vec();
    for (a, b) in [(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)] {
        out.push(mid(c[a], c[b]));
    }
    out
}

/// Quad9/Quad8 on the unit square at `origin` (Quad8 drops the center).
pub fn quad9_coords(origin: [f64; 3]) -> Vec<[f64; 3]> {
    let [x, y, z] = origin;
    vec![
        [x, y, z],
        [x + 1.0, y, z],
        [x + 1.0, y + 1.0, z],
        [x, y + 1.0, z],
        [x + 0.5, y, z],
        [x + 1.0, y + 0.5, z],
        [x + 0.5, y + 1.0, z],
        [x, y + 0.5, z],
        [x + 0.5, y + 0.5, z],
    ]
}

pub fn tri6_coords(origin: [f64; 3]) -> Vec<[f64; 3]> {
    let [x, y, z] = origin;
    vec![
        [x, y, z],
        [x + 1.0, y, z],
        [x, y + 1.0, z],
        [x + 0.5, y, z],
        [x + 0.5, y + 0.5, z],
        [x, y + 0.5, z],
    ]
}

pub fn active_snapshot<M: MeshBase>(mesh: &M) -> Vec<Elem> {
    mesh.active_elements().cloned().collect()
}

pub fn node_ids(mesh: &DistributedMesh) -> BTreeSet<PointId> {
    mesh.nodes().map(|n| n.id).collect()
}

/// Children of every parent in `report` tile the parent within 1e-12.
pub fn assert_children_cover_parents<M: MeshBase>(mesh: &M, report: &LinearizeReport) {
    let children: Vec<&Elem> = report
        .children
        .iter()
        .map(|&id| mesh.elem(id).expect("child is active"))
        .collect();
    for &parent_id in &report.parents {
        let mine: Vec<&&Elem> = children
            .iter()
            .filter(|c| c.interior_parent == Some(parent_id))
            .collect();
        let parent = mesh.interior_parent(mine[0]).expect("parent is archived");
        assert_eq!(parent.id, parent_id);
        let whole = elem_measure(parent, mesh).unwrap();
        let parts: f64 = mine.iter().map(|c| elem_measure(c, mesh).unwrap()).sum();
        assert!(
            (whole - parts).abs() < 1e-12,
            "parent {parent_id}: {whole} vs children {parts}"
        );
    }
}

/// Delegating mesh that records and perturbs `prepare_for_use` calls.
pub struct RecordingMesh<M> {
    pub inner: M,
    pub prepare_calls: usize,
    pub skip_seen_in_prepare: Vec<bool>,
    pub fail_prepare: bool,
    pub stale_local_max: Option<u64>,
}

impl<M: MeshBase> RecordingMesh<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            prepare_calls: 0,
            skip_seen_in_prepare: Vec::new(),
            fail_prepare: false,
            stale_local_max: None,
        }
    }
}

impl<M: MeshBase> MeshBase for RecordingMesh<M> {
    fn rank(&self) -> usize {
        self.inner.rank()
    }
    fn n_ranks(&self) -> usize {
        self.inner.n_ranks()
    }
    fn active_elements(&self) -> impl Iterator<Item = &Elem> + '_ {
        self.inner.active_elements()
    }
    fn elem(&self, id: PointId) -> Option<&Elem> {
        self.inner.elem(id)
    }
    fn node(&self, id: PointId) -> Option<&Node> {
        self.inner.node(id)
    }
    fn interior_parent(&self, elem: &Elem) -> Option<&Elem> {
        self.inner.interior_parent(elem)
    }
    fn prepared_state(&self) -> Option<&PreparedState> {
        self.inner.prepared_state()
    }
    fn local_max_elem_id(&self) -> u64 {
        self.stale_local_max
            .unwrap_or_else(|| self.inner.local_max_elem_id())
    }
    fn add_elem(&mut self, elem: Elem) -> Result<(), MeshError> {
        self.inner.add_elem(elem)
    }
    fn retire_elem(&mut self, id: PointId) -> Result<(), MeshError> {
        self.inner.retire_elem(id)
    }
    fn subdomain_name(&self, id: SubdomainId) -> Option<&str> {
        self.inner.subdomain_name(id)
    }
    fn set_subdomain_name(&mut self, id: SubdomainId, name: String) -> Option<String> {
        self.inner.set_subdomain_name(id, name)
    }
    fn skip_partitioning(&self) -> bool {
        self.inner.skip_partitioning()
    }
    fn set_skip_partitioning(&mut self, skip: bool) {
        self.inner.set_skip_partitioning(skip)
    }
    fn prepare_for_use(&mut self) -> Result<(), MeshError> {
        self.prepare_calls += 1;
        self.skip_seen_in_prepare.push(self.inner.skip_partitioning());
        if self.fail_prepare {
            return Err(MeshError::InvariantViolation("injected failure".into()));
        }
        self.inner.prepare_for_use()
    }
}
