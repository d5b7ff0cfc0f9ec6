use crate::datatype::TypeId;
use crate::vector::Vector;
use ahash::RandomState;
use furrow_error::{FurrowError, Result};

/// State used for all hashing operations during physical execution.
pub const HASH_RANDOM_STATE: RandomState = RandomState::with_seeds(0, 0, 0, 0);

/// Combine two hashes into a single value.
///
/// Implementation taken from boost:
/// <https://github.com/boostorg/container_hash/blob/b8179488b20eb1373bdbf5c7fcca963f072512df/include/boost/container_hash/detail/hash_mix.hpp#L67>
const fn combine_hashes(v1: u64, v2: u64) -> u64 {
    const fn mix(mut x: u64) -> u64 {
        const M: u64 = 0xE9846AF9B1A615D;
        x ^= x.wrapping_shr(32);
        x = x.wrapping_mul(M);
        x ^= x.wrapping_shr(32);
        x = x.wrapping_mul(M);
        x ^= x.wrapping_shr(28);
        x
    }

    mix(v1.wrapping_add(0x9E3779B9).wrapping_add(v2))
}

#[inline]
fn hash_row(col: &Vector, idx: usize) -> u64 {
    // Values are hashed through their little-endian encoding, which is
    // canonical per type and sidesteps float hashing.
    HASH_RANDOM_STATE.hash_one(col.raw_value(idx))
}

/// Hash every row of `col` into a 32-bit hash, written to an `Integer`
/// vector.
pub fn hash(col: &Vector, out: &mut Vector) -> Result<()> {
    if out.type_id() != TypeId::Integer {
        return Err(FurrowError::new(format!(
            "Hash output must be Integer, got {:?}",
            out.type_id()
        )));
    }

    for idx in 0..col.count() {
        out.set(idx, hash_row(col, idx) as u32 as i32);
    }
    out.set_count(col.count());

    Ok(())
}

/// Fold a column's hashes into running 32-bit hashes, in place.
///
/// Deterministic: folding the same columns in the same order always yields
/// the same hashes.
pub fn combine_hash(hashes: &mut Vector, col: &Vector) -> Result<()> {
    if hashes.type_id() != TypeId::Integer {
        return Err(FurrowError::new(format!(
            "Hash vector must be Integer, got {:?}",
            hashes.type_id()
        )));
    }
    if hashes.count() != col.count() {
        return Err(FurrowError::new(format!(
            "Hash count {} does not match column count {}",
            hashes.count(),
            col.count()
        )));
    }

    for idx in 0..col.count() {
        let current = hashes.get::<i32>(idx) as u32 as u64;
        let combined = combine_hashes(current, hash_row(col, idx));
        hashes.set(idx, combined as u32 as i32);
    }

    Ok(())
}
