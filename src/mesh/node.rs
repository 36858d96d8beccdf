//! Mesh nodes.

use crate::topology::point::PointId;

/// A geometric point shared by any number of elements.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: PointId,
    /// Id that is never reused, even across renumbering. Node and element
    /// unique ids are separate spaces; node 1 and element 1 may share one.
    pub unique_id: u64,
    pub point: [f64; 3],
    /// Owning rank.
    pub processor_id: usize,
}

impl Node {
    /// Node owned by rank 0 with `unique_id == id`.
    pub fn new(id: PointId, point: [f64; 3]) -> Self {
        Self {
            id,
            unique_id: id.get(),
            point,
            processor_id: 0,
        }
    }

    pub fn with_processor_id(mut self, processor_id: usize) -> Self {
        self.processor_id = processor_id;
        self
    }

    pub fn with_unique_id(mut self, unique_id: u64) -> Self {
        self.unique_id = unique_id;
        self
    }
}
