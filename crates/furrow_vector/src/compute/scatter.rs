use crate::datatype::{NativeType, TypeId};
use crate::selection::{self, SelectionVector};
use crate::vector::Vector;
use furrow_error::{FurrowError, Result};

/// Scatter kernels write per-row values to byte offsets into a heap buffer.
///
/// Addresses are carried in a `Pointer` vector and are offsets relative to
/// the start of `heap`, not raw pointers. Every write is bounds checked.
fn validate_addresses(addresses: &Vector) -> Result<()> {
    if addresses.type_id() != TypeId::Pointer {
        return Err(FurrowError::new(format!(
            "Scatter addresses must be Pointer, got {:?}",
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
            "Scatter address {offset} out of bounds for heap of {heap_len} bytes"
        )));
    }
    Ok(offset)
}

macro_rules! native_dispatch {
    ($type_id:expr, $fn:ident ( $($args:expr),* )) => {
        match $type_id {
            TypeId::TinyInt => $fn::<i8>($($args),*),
            TypeId::SmallInt => $fn::<i16>($($args),*),
            TypeId::Integer | TypeId::Date => $fn::<i32>($($args),*),
            TypeId::BigInt => $fn::<i64>($($args),*),
            TypeId::Decimal => $fn::<f64>($($args),*),
            TypeId::Pointer => $fn::<u64>($($args),*),
        }
    };
}

/// Write each selected row's value at its address.
pub fn set(
    src: &Vector,
    heap: &mut [u8],
    addresses: &Vector,
    sel: Option<&SelectionVector>,
) -> Result<()> {
    validate_addresses(addresses)?;

    let width = src.type_id().size();
    let rows = selection::num_rows(sel, addresses.count());
    for idx in 0..rows {
        let loc = selection::get_unchecked(sel, idx);
        let offset = checked_offset(heap.len(), addresses.get::<u64>(loc), width)?;
        heap[offset..offset + width].copy_from_slice(src.raw_value(loc));
    }

    Ok(())
}

/// Initialize each selected row's accumulator to a count of one.
pub fn set_count(
    type_id: TypeId,
    heap: &mut [u8],
    addresses: &Vector,
    sel: Option<&SelectionVector>,
) -> Result<()> {
    validate_addresses(addresses)?;
    native_dispatch!(type_id, set_count_loop(heap, addresses, sel))
}

fn set_count_loop<T: NativeType>(
    heap: &mut [u8],
    addresses: &Vector,
    sel: Option<&SelectionVector>,
) -> Result<()> {
    let rows = selection::num_rows(sel, addresses.count());
    for idx in 0..rows {
        let loc = selection::get_unchecked(sel, idx);
        let offset = checked_offset(heap.len(), addresses.get::<u64>(loc), T::SIZE)?;
        T::ONE.encode(&mut heap[offset..]);
    }

    Ok(())
}

/// Add one to each selected row's accumulator.
pub fn add_one(
    type_id: TypeId,
    heap: &mut [u8],
    addresses: &Vector,
    sel: Option<&SelectionVector>,
) -> Result<()> {
    validate_addresses(addresses)?;
    native_dispatch!(type_id, add_one_loop(heap, addresses, sel))
}

fn add_one_loop<T: NativeType>(
    heap: &mut [u8],
    addresses: &Vector,
    sel: Option<&SelectionVector>,
) -> Result<()> {
    let rows = selection::num_rows(sel, addresses.count());
    for idx in 0..rows {
        let loc = selection::get_unchecked(sel, idx);
        let offset = checked_offset(heap.len(), addresses.get::<u64>(loc), T::SIZE)?;
        let acc = T::decode(&heap[offset..]);
        acc.add_wrapping(T::ONE).encode(&mut heap[offset..]);
    }

    Ok(())
}

/// Add each selected row's value to its accumulator.
pub fn add(
    src: &Vector,
    heap: &mut [u8],
    addresses: &Vector,
    sel: Option<&SelectionVector>,
) -> Result<()> {
    validate_addresses(addresses)?;
    native_dispatch!(
        src.type_id(),
        rmw_loop(src, heap, addresses, sel, |acc, value| acc.add_wrapping(value))
    )
}

/// Keep the smaller of accumulator and each selected row's value.
pub fn min(
    src: &Vector,
    heap: &mut [u8],
    addresses: &Vector,
    sel: Option<&SelectionVector>,
) -> Result<()> {
    validate_addresses(addresses)?;
    native_dispatch!(
        src.type_id(),
        rmw_loop(src, heap, addresses, sel, |acc, value| if value < acc {
            value
        } else {
            acc
        })
    )
}

/// Keep the larger of accumulator and each selected row's value.
pub fn max(
    src: &Vector,
    heap: &mut [u8],
    addresses: &Vector,
    sel: Option<&SelectionVector>,
) -> Result<()> {
    validate_addresses(addresses)?;
    native_dispatch!(
        src.type_id(),
        rmw_loop(src, heap, addresses, sel, |acc, value| if value > acc {
            value
        } else {
            acc
        })
    )
}

fn rmw_loop<T: NativeType>(
    src: &Vector,
    heap: &mut [u8],
    addresses: &Vector,
    sel: Option<&SelectionVector>,
    op: impl Fn(T, T) -> T,
) -> Result<()> {
    let rows = selection::num_rows(sel, addresses.count());
    for idx in 0..rows {
        let loc = selection::get_unchecked(sel, idx);
        let offset = checked_offset(heap.len(), addresses.get::<u64>(loc), T::SIZE)?;
        let acc = T::decode(&heap[offset..]);
        op(acc, src.get::<T>(loc)).encode(&mut heap[offset..]);
    }

    Ok(())
}
