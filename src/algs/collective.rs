//! Small collectives built on point-to-point [`Communicator`] messages.
//!
//! Every rank must call the same collective with the same tag in the same
//! order. Peers are visited in rank order and each pair exchanges with the
//! lower rank sending first, so the collectives also complete over blocking
//! sends. Every peer is visited even after an error occurred.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{decode_u64s, encode_u64s, expect_exact_len};
use crate::mesh_error::MeshError;

/// Gather one byte payload from every rank. Entry `r` of the result is the
/// payload of rank `r` (including this rank's own `local`).
pub fn all_gather_bytes<C>(comm: &C, tag: CommTag, local: &[u8]) -> Result<Vec<Vec<u8>>, MeshError>
where
    C: Communicator,
{
    let me = comm.rank();
    let size = comm.size();
    let tag_raw = tag.as_u16();

    let mut gathered = Vec::with_capacity(size);
    let mut maybe_err = None;
    for peer in 0..size {
        if peer == me {
            gathered.push(local.to_vec());
            continue;
        }
        let received = if me < peer {
            let _ = comm.isend(peer, tag_raw, local).wait();
            comm.irecv(peer, tag_raw).wait()
        } else {
            let data = comm.irecv(peer, tag_raw).wait();
            let _ = comm.isend(peer, tag_raw, local).wait();
            data
        };
        match received {
            Some(data) => gathered.push(data),
            None => {
                gathered.push(Vec::new());
                if maybe_err.is_none() {
                    maybe_err = Some(MeshError::CommError {
                        neighbor: peer,
                        detail: format!("no payload received for tag {tag_raw}"),
                    });
                }
            }
        }
    }

    match maybe_err {
        Some(err) => Err(err),
        None => Ok(gathered),
    }
}

/// Gather a `u64` vector from every rank.
pub fn all_gather_u64s<C>(comm: &C, tag: CommTag, local: &[u64]) -> Result<Vec<Vec<u64>>, MeshError>
where
    C: Communicator,
{
    let raw = all_gather_bytes(comm, tag, &encode_u64s(local))?;
    raw.iter()
        .enumerate()
        .map(|(rank, bytes)| {
            decode_u64s(bytes).map_err(|detail| MeshError::CommError {
                neighbor: rank,
                detail,
            })
        })
        .collect()
}

/// Element-wise maximum of a fixed-length `u64` vector over all ranks.
pub fn all_reduce_max_u64s<C>(comm: &C, tag: CommTag, local: &[u64]) -> Result<Vec<u64>, MeshError>
where
    C: Communicator,
{
    let gathered = all_gather_u64s(comm, tag, local)?;
    let mut out = local.to_vec();
    for (rank, values) in gathered.iter().enumerate() {
        expect_exact_len(values.len() * 8, local.len() * 8)
            .map_err(|detail| MeshError::CommError { neighbor: rank, detail })?;
        for (acc, &v) in out.iter_mut().zip(values) {
            *acc = (*acc).max(v);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, RayonComm};
    use dashmap::DashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    type Slots = Arc<DashMap<(usize, usize, u16), Vec<u8>>>;

    const PATIENCE: Duration = Duration::from_secs(5);

    /// Sends block until the receiver has taken the message.
    struct Rendezvous {
        rank: usize,
        size: usize,
        slots: Slots,
        stalled: Arc<AtomicBool>,
    }

    struct PendingRecv {
        slots: Slots,
        key: (usize, usize, u16),
    }

    impl Wait for PendingRecv {
        fn wait(self) -> Option<Vec<u8>> {
            let start = Instant::now();
            while start.elapsed() < PATIENCE {
                if let Some((_, data)) = self.slots.remove(&self.key) {
                    return Some(data);
                }
                thread::yield_now();
            }
            None
        }
    }

    impl Communicator for Rendezvous {
        type SendHandle = ();
        type RecvHandle = PendingRecv;

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
            let key = (self.rank, peer, tag);
            self.slots.insert(key, buf.to_vec());
            let start = Instant::now();
            while self.slots.contains_key(&key) {
                if start.elapsed() > PATIENCE {
                    self.stalled.store(true, Ordering::SeqCst);
                    return;
                }
                thread::yield_now();
            }
        }

        fn irecv(&self, peer: usize, tag: u16) -> PendingRecv {
            PendingRecv {
                slots: Arc::clone(&self.slots),
                key: (peer, self.rank, tag),
            }
        }
    }

    #[test]
    fn gather_completes_over_blocking_sends() {
        let slots: Slots = Arc::new(DashMap::new());
        let stalled = Arc::new(AtomicBool::new(false));
        let handles: Vec<_> = (0..3)
            .map(|rank| {
                let comm = Rendezvous {
                    rank,
                    size: 3,
                    slots: Arc::clone(&slots),
                    stalled: Arc::clone(&stalled),
                };
                thread::spawn(move || {
                    all_gather_u64s(&comm, CommTag::new(13), &[rank as u64 + 1]).unwrap()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), vec![vec![1], vec![2], vec![3]]);
        }
        assert!(!stalled.load(Ordering::SeqCst));
    }

    #[test]
    fn serial_gather_is_local_payload() {
        let out = all_gather_bytes(&NoComm, CommTag::new(1), &[4, 5]).unwrap();
        assert_eq!(out, vec![vec![4, 5]]);
        let max = all_reduce_max_u64s(&NoComm, CommTag::new(2), &[3, 9]).unwrap();
        assert_eq!(max, vec![3, 9]);
    }

    #[test]
    fn three_rank_max_reduction() {
        let world = RayonComm::world(3);
        let handles: Vec<_> = world
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    let r = comm.rank() as u64;
                    all_reduce_max_u64s(&comm, CommTag::new(10), &[r * 10, 100 - r]).unwrap()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), vec![20, 100]);
        }
    }

    #[test]
    fn variable_length_gather() {
        let world = RayonComm::world(2);
        let handles: Vec<_> = world
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    let local: Vec<u64> = (0..=comm.rank() as u64).collect();
                    all_gather_u64s(&comm, CommTag::new(11), &local).unwrap()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), vec![vec![0], vec![0, 1]]);
        }
    }

    #[test]
    fn mismatched_lengths_are_reported() {
        let world = RayonComm::world(2);
        let handles: Vec<_> = world
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    let local = vec![1u64; comm.rank() + 1];
                    all_reduce_max_u64s(&comm, CommTag::new(12), &local)
                })
            })
            .collect();
        for h in handles {
            assert!(matches!(
                h.join().unwrap(),
                Err(MeshError::CommError { .. })
            ));
        }
    }
}
