//! Communication layer used by the mesh's collective rebuild.

pub mod collective;
pub mod communicator;
pub mod wire;

pub use collective::{all_gather_bytes, all_gather_u64s, all_reduce_max_u64s};
pub use communicator::{CommTag, Communicator, NoComm, RayonComm, Wait};
