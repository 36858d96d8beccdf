//! Thin façade over intra-process (in-memory ranks) or inter-process (MPI)
//! message passing.
//!
//! Messages are *contiguous byte slices*. Handles are waitable. Sends may
//! block until the peer receives (as with `MpiComm` above the eager
//! limit); the collectives in [`crate::algs::collective`] order each pairwise
//! exchange by rank, so blocking sends cannot deadlock.

use bytes::Bytes;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Typed message tag so unrelated exchanges never match each other.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CommTag(u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        CommTag(tag)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Tag `offset` slots after `self` (wrapping).
    pub const fn offset(self, offset: u16) -> Self {
        CommTag(self.0.wrapping_add(offset))
    }
}

/// Non-blocking communication interface (minimal by design).
pub trait Communicator: Send + 'static {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// This process's rank in `0..size()`.
    fn rank(&self) -> usize;
    /// Number of ranks taking part in collectives.
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Compile-time no-op comm for serial meshes and unit tests.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16) {}
}

// --- RayonComm: ranks living in one process (threads) ---
type Key = (usize, usize, u16); // (src, dst, tag)
type Mailbox = Arc<DashMap<Key, VecDeque<Bytes>>>;

/// How long an in-process receive waits for its peer before giving up.
const RECV_TIMEOUT: Duration = Duration::from_secs(30);

/// In-process communicator: every rank of a world shares one mailbox.
///
/// Messages between the same `(src, dst, tag)` triple are delivered in send
/// order.
#[derive(Clone, Debug)]
pub struct RayonComm {
    rank: usize,
    size: usize,
    mailbox: Mailbox,
}

impl RayonComm {
    /// Creates `size` connected ranks; hand one to each worker thread.
    pub fn world(size: usize) -> Vec<RayonComm> {
        let mailbox: Mailbox = Arc::new(DashMap::new());
        (0..size)
            .map(|rank| RayonComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }
}

pub struct LocalHandle {
    mailbox: Mailbox,
    key: Key,
}

impl LocalHandle {
    fn try_take(&self) -> Option<Bytes> {
        let mut queue = self.mailbox.get_mut(&self.key)?;
        queue.pop_front()
    }
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let start = Instant::now();
        loop {
            if let Some(bytes) = self.try_take() {
                return Some(bytes.to_vec());
            }
            if start.elapsed() > RECV_TIMEOUT {
                log::warn!(
                    "receive from rank {} (tag {}) timed out on rank {}",
                    self.key.0,
                    self.key.2,
                    self.key.1
                );
                return None;
            }
            std::thread::yield_now();
        }
    }
}

impl Communicator for RayonComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        self.mailbox
            .entry((self.rank, peer, tag))
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16) -> LocalHandle {
        LocalHandle {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, Wait};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{Communicator as _, Destination as _, Source as _};

    /// MPI communicator. The caller keeps the `mpi::environment::Universe`
    /// alive for as long as this handle is used.
    pub struct MpiComm {
        world: SimpleCommunicator,
    }

    impl MpiComm {
        pub fn from_world(world: SimpleCommunicator) -> Self {
            Self { world }
        }
    }

    // `isend` returns once MPI owns the buffer; large messages wait for the
    // matching receive.
    impl Communicator for MpiComm {
        type SendHandle = ();
        type RecvHandle = OwnedRecv;

        fn rank(&self) -> usize {
            self.world.rank() as usize
        }

        fn size(&self) -> usize {
            self.world.size() as usize
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
            self.world
                .process_at_rank(peer as i32)
                .send_with_tag(buf, i32::from(tag));
        }

        /// Blocks until the message arrives; callers post their sends first.
        fn irecv(&self, peer: usize, tag: u16) -> OwnedRecv {
            let (data, _status) = self
                .world
                .process_at_rank(peer as i32)
                .receive_vec_with_tag::<u8>(i32::from(tag));
            OwnedRecv { data: Some(data) }
        }
    }

    /// Already-completed receive.
    pub struct OwnedRecv {
        data: Option<Vec<u8>>,
    }

    impl Wait for OwnedRecv {
        fn wait(self) -> Option<Vec<u8>> {
            self.data
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_comm_is_a_single_rank() {
        let comm = NoComm;
        assert_eq!((comm.rank(), comm.size()), (0, 1));
        comm.isend(0, 1, &[1, 2, 3]);
        assert_eq!(comm.irecv(0, 1).wait(), None);
    }

    #[test]
    fn rayon_roundtrip_two_ranks() {
        let mut world = RayonComm::world(2);
        let comm1 = world.pop().unwrap();
        let comm0 = world.pop().unwrap();

        let recv_handle = comm1.irecv(0, 7);
        comm0.isend(1, 7, &[1, 2, 3, 4]).wait();

        let data = recv_handle
            .wait()
            .expect("Expected to receive data from rank 0");
        assert_eq!(data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn rayon_messages_keep_send_order() {
        let world = RayonComm::world(2);
        world[0].isend(1, 3, &[1]);
        world[0].isend(1, 3, &[2]);
        assert_eq!(world[1].irecv(0, 3).wait(), Some(vec![1]));
        assert_eq!(world[1].irecv(0, 3).wait(), Some(vec![2]));
    }

    #[test]
    fn separate_worlds_do_not_share_mailboxes() {
        let a = RayonComm::world(2);
        let b = RayonComm::world(2);
        a[0].isend(1, 5, &[9]);
        b[0].isend(1, 5, &[8]);
        assert_eq!(b[1].irecv(0, 5).wait(), Some(vec![8]));
        assert_eq!(a[1].irecv(0, 5).wait(), Some(vec![9]));
    }

    #[test]
    fn comm_tag_offsets_wrap() {
        let base = CommTag::new(u16::MAX);
        assert_eq!(base.offset(1).as_u16(), 0);
    }
}
