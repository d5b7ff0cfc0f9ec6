use crate::datatype::TypeId;
use crate::vector::Vector;
use furrow_error::{FurrowError, Result};

/// A batch of same-length vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChunk {
    /// Columns that make up this chunk.
    columns: Vec<Vector>,

    /// Number of rows in this chunk. Needed to allow for a chunk that has no
    /// columns but a non-zero number of rows.
    count: usize,

    /// Maximum number of rows writable into this chunk.
    capacity: usize,
}

impl DataChunk {
    pub fn empty() -> Self {
        DataChunk {
            columns: Vec::new(),
            count: 0,
            capacity: 0,
        }
    }

    /// A chunk with rows but no columns (e.g. the payload for a lone
    /// `COUNT(*)`).
    pub fn empty_with_count(count: usize) -> Self {
        DataChunk {
            columns: Vec::new(),
            count,
            capacity: count,
        }
    }

    /// Create a new chunk from some number of vectors.
    ///
    /// All vectors must have the same logical count.
    pub fn try_new(columns: impl IntoIterator<Item = Vector>) -> Result<Self> {
        let columns: Vec<_> = columns.into_iter().collect();
        let count = match columns.first() {
            Some(col) => col.count(),
            None => return Ok(Self::empty()),
        };

        for col in &columns {
            if col.count() != count {
                return Err(FurrowError::new(format!(
                    "Expected column count to be {count}, got {}",
                    col.count()
                )));
            }
        }

        Ok(DataChunk {
            columns,
            count,
            capacity: count,
        })
    }

    /// Preallocate a write target holding up to `capacity` rows per column.
    pub fn with_capacity(types: &[TypeId], capacity: usize) -> Self {
        let columns = types
            .iter()
            .map(|&type_id| Vector::with_capacity(type_id, capacity))
            .collect();

        DataChunk {
            columns,
            count: 0,
            capacity,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn column(&self, idx: usize) -> Option<&Vector> {
        self.columns.get(idx)
    }

    pub fn column_mut(&mut self, idx: usize) -> Option<&mut Vector> {
        self.columns.get_mut(idx)
    }

    pub fn columns(&self) -> &[Vector] {
        &self.columns
    }

    /// Publish the chunk row count after columns have been written.
    ///
    /// Panics if `count` exceeds the chunk capacity.
    pub fn set_count(&mut self, count: usize) {
        assert!(count <= self.capacity);
        debug_assert!(self.columns.iter().all(|col| col.count() == count));
        self.count = count;
    }

    /// Reset counts for reuse as a write target.
    pub fn reset(&mut self) {
        self.count = 0;
        for col in &mut self.columns {
            col.set_count(0);
        }
    }
}
