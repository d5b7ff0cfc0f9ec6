use crate::datatype::{NativeType, TypeId};
use furrow_error::{FurrowError, Result};

/// A single column of fixed-width values.
///
/// Values live in an untyped little-endian byte buffer; typed access goes
/// through [`NativeType`]. A vector is allocated with a fixed capacity and
/// carries a separate logical `count`, so kernels can fill physical slots
/// first and publish the row count afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    type_id: TypeId,
    data: Vec<u8>,
    count: usize,
}

impl Vector {
    /// Create a zeroed vector able to hold `capacity` values.
    pub fn with_capacity(type_id: TypeId, capacity: usize) -> Self {
        Vector {
            type_id,
            data: vec![0; capacity * type_id.size()],
            count: 0,
        }
    }

    /// Create a vector from native values, typed by the native's canonical
    /// type id.
    pub fn from_slice<T: NativeType>(values: &[T]) -> Self {
        // Widths always agree for the canonical type id.
        Self::from_slice_with_type(T::TYPE_ID, values).expect("canonical type id")
    }

    /// Create a vector from native values with an explicit type id, for types
    /// sharing a native representation (e.g. `Date` stored as `i32`).
    pub fn from_slice_with_type<T: NativeType>(type_id: TypeId, values: &[T]) -> Result<Self> {
        if type_id.size() != T::SIZE {
            return Err(FurrowError::new(format!(
                "Native width {} does not match {type_id:?} width {}",
                T::SIZE,
                type_id.size()
            )));
        }

        let mut vector = Self::with_capacity(type_id, values.len());
        for (idx, value) in values.iter().enumerate() {
            vector.set(idx, *value);
        }
        vector.count = values.len();

        Ok(vector)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Logical number of rows.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of values the underlying buffer can hold.
    pub fn capacity(&self) -> usize {
        self.data.len() / self.type_id.size()
    }

    /// Publish the logical row count.
    ///
    /// Panics if `count` exceeds capacity.
    pub fn set_count(&mut self, count: usize) {
        assert!(count <= self.capacity());
        self.count = count;
    }

    /// Read the value at `idx`.
    ///
    /// The native width must match the vector's type width; panics on
    /// out-of-bounds physical access.
    #[inline]
    pub fn get<T: NativeType>(&self, idx: usize) -> T {
        debug_assert_eq!(T::SIZE, self.type_id.size());
        T::decode(&self.data[idx * T::SIZE..])
    }

    /// Write the value at `idx`. Does not adjust the logical count.
    #[inline]
    pub fn set<T: NativeType>(&mut self, idx: usize, value: T) {
        debug_assert_eq!(T::SIZE, self.type_id.size());
        value.encode(&mut self.data[idx * T::SIZE..]);
    }

    /// Write the raw little-endian bytes of a single value at `idx`.
    #[inline]
    pub fn set_raw(&mut self, idx: usize, value: &[u8]) {
        let width = self.type_id.size();
        debug_assert_eq!(width, value.len());
        self.data[idx * width..(idx + 1) * width].copy_from_slice(value);
    }

    /// Raw little-endian bytes of the value at `idx`.
    #[inline]
    pub fn raw_value(&self, idx: usize) -> &[u8] {
        let width = self.type_id.size();
        &self.data[idx * width..(idx + 1) * width]
    }

    /// Decode the logical rows into native values.
    pub fn to_vec<T: NativeType>(&self) -> Vec<T> {
        (0..self.count).map(|idx| self.get(idx)).collect()
    }
}
