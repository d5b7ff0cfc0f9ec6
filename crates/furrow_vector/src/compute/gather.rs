use crate::datatype::{NativeType, TypeId};
use crate::vector::Vector;
use furrow_error::{FurrowError, Result};

fn validate_addresses(addresses: &Vector) -> Result<()> {
    if addresses.type_id() != TypeId::Pointer {
        return Err(FurrowError::new(format!(
            "Gather addresses must be Pointer, got {:?}",
            addresses.type_id()
        )));
    }
    Ok(())
}

#[inline]
fn checked_offset(heap_len: usize, addr: u64, width: usize) -> Result<usize> {
    let offset = addr as usize;
    if offset + width > heap_len {
        return Err(FurrowError::new(format!(
            "Gather address {offset} out of bounds for heap of {heap_len} bytes"
        )));
    }
    Ok(offset)
}

/// Read one value per address into `out`, typed by `out`.
pub fn set(heap: &[u8], addresses: &Vector, out: &mut Vector) -> Result<()> {
    validate_addresses(addresses)?;

    let width = out.type_id().size();
    for idx in 0..addresses.count() {
        let offset = checked_offset(heap.len(), addresses.get::<u64>(idx), width)?;
        out.set_raw(idx, &heap[offset..offset + width]);
    }
    out.set_count(addresses.count());

    Ok(())
}

/// Read a running sum at each address and the row count stored
/// `distance_to_count` bytes further, emitting `sum / count` per row.
///
/// Division truncates for integer types and follows IEEE-754 for `Decimal`.
/// A zero count means the slot was never routed a row and the table is
/// corrupt.
pub fn average(
    heap: &[u8],
    addresses: &Vector,
    distance_to_count: usize,
    out: &mut Vector,
) -> Result<()> {
    validate_addresses(addresses)?;

    macro_rules! average_dispatch {
        ($($type_id:pat => $native:ty),+ $(,)?) => {
            match out.type_id() {
                $($type_id => average_loop::<$native>(heap, addresses, distance_to_count, out),)+
            }
        };
    }

    average_dispatch!(
        TypeId::TinyInt => i8,
        TypeId::SmallInt => i16,
        TypeId::Integer | TypeId::Date => i32,
        TypeId::BigInt => i64,
        TypeId::Decimal => f64,
        TypeId::Pointer => u64,
    )
}

fn average_loop<T: NativeType>(
    heap: &[u8],
    addresses: &Vector,
    distance_to_count: usize,
    out: &mut Vector,
) -> Result<()> {
    for idx in 0..addresses.count() {
        let addr = addresses.get::<u64>(idx);
        let sum_offset = checked_offset(heap.len(), addr, T::SIZE)?;
        let count_offset = checked_offset(heap.len(), addr + distance_to_count as u64, 8)?;

        let sum = T::decode(&heap[sum_offset..]);
        let count = u64::decode(&heap[count_offset..]);
        if count == 0 {
            return Err(FurrowError::invariant(
                "Zero row count under a stored running sum",
            ));
        }

        out.set(idx, sum.div_count(count));
    }
    out.set_count(addresses.count());

    Ok(())
}
