//! Fixed, little-endian wire records for collective exchanges.

use bytemuck::{Pod, Zeroable};

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// A `u64` carried on the wire, stored pre-LE.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireU64 {
    pub v_le: u64,
}

impl WireU64 {
    pub fn new(v: u64) -> Self {
        Self { v_le: v.to_le() }
    }
    pub fn get(&self) -> u64 {
        u64::from_le(self.v_le)
    }
}

/// Encode values as a contiguous run of [`WireU64`] records.
pub fn encode_u64s(values: &[u64]) -> Vec<u8> {
    let wire: Vec<WireU64> = values.iter().copied().map(WireU64::new).collect();
    cast_slice(&wire).to_vec()
}

/// Decode a run of [`WireU64`] records.
///
/// The input need not be aligned; records are read unaligned.
pub fn decode_u64s(bytes: &[u8]) -> Result<Vec<u64>, String> {
    let width = std::mem::size_of::<WireU64>();
    if bytes.len() % width != 0 {
        return Err(format!(
            "payload of {} bytes is not a multiple of {width}",
            bytes.len()
        ));
    }
    Ok(bytes
        .chunks_exact(width)
        .map(|chunk| bytemuck::pod_read_unaligned::<WireU64>(chunk).get())
        .collect())
}
