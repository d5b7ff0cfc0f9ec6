use furrow_error::{not_implemented, FurrowError, Result};
use furrow_vector::chunk::DataChunk;
use furrow_vector::compute::{arith, cast, gather, hash, scatter};
use furrow_vector::datatype::{NativeType, TypeId};
use furrow_vector::selection::SelectionVector;
use furrow_vector::vector::Vector;
use tracing::trace;

use super::kind::AggregateKind;
use super::slot::{self, SlotLayout};

/// An aggregate hash table storing group keys alongside per-group aggregate
/// state in fixed-width byte-packed slots.
///
/// The table is open-addressed with linear probing and wrap-around. Each
/// distinct grouping key claims exactly one slot for the lifetime of the
/// table; slots are never freed and the table never resizes once it holds
/// entries. Callers size the capacity above the expected distinct-group
/// cardinality; a probe pass that wraps the whole table without finding an
/// empty or matching slot fails with `CapacityExhausted`.
///
/// Ingest alternates between batch mode and a tight per-row loop: hashing
/// and slot address computation are vectorized, probing is row-at-a-time
/// (its control flow depends on slot contents), and aggregate updates are
/// vectorized again through scatter kernels restricted by selection
/// vectors.
pub struct AggregateHashTable {
    layout: SlotLayout,

    /// Slot buffer of `capacity * tuple_size` bytes, exclusively owned.
    data: Vec<u8>,

    /// Number of slots.
    capacity: usize,

    /// Number of occupied slots.
    entries: usize,

    /// Longest probe chain observed during ingest.
    max_chain: usize,

    /// Aggregates in declaration order, matching the caller's payload
    /// columns and the scan output.
    aggregate_kinds: Vec<AggregateKind>,

    parallel: bool,
}

impl AggregateHashTable {
    /// Create a table with a fixed slot capacity.
    ///
    /// `group_width` and `payload_width` are the total byte widths of the
    /// concatenated grouping keys and of all stored accumulators (excluding
    /// the trailing row counter). `parallel` is accepted for planning
    /// symmetry but parallel ingest is not implemented.
    pub fn try_new(
        initial_capacity: usize,
        group_width: usize,
        payload_width: usize,
        aggregate_kinds: Vec<AggregateKind>,
        parallel: bool,
    ) -> Result<Self> {
        if initial_capacity == 0 {
            return Err(FurrowError::new(
                "Hash table capacity must be non-zero",
            ));
        }

        let mut table = AggregateHashTable {
            layout: SlotLayout::new(group_width, payload_width),
            data: Vec::new(),
            capacity: 0,
            entries: 0,
            max_chain: 0,
            aggregate_kinds,
            parallel,
        };
        table.resize(initial_capacity)?;

        Ok(table)
    }

    /// Grow the slot buffer to `capacity` slots.
    ///
    /// Only an empty table can be resized; rehashing a populated table is an
    /// extension seam.
    fn resize(&mut self, capacity: usize) -> Result<()> {
        if capacity <= self.capacity {
            not_implemented!("Downsizing a hash table");
        }
        if self.entries > 0 {
            not_implemented!("Resizing a non-empty hash table");
        }

        // Zeroed buffer doubles as all-empty flags.
        self.data = vec![0; capacity * self.layout.tuple_size()];
        self.capacity = capacity;

        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Longest probe chain any ingested row has walked.
    pub fn max_chain(&self) -> usize {
        self.max_chain
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    /// Ingest one aligned pair of grouping and payload batches.
    ///
    /// `payload` carries one column per payload-carrying aggregate, in
    /// declaration order; each column's type must match the aggregate's
    /// accumulator type.
    pub fn add_chunk(&mut self, groups: &DataChunk, payload: &DataChunk) -> Result<()> {
        if groups.count() == 0 {
            return Ok(());
        }
        if self.parallel {
            not_implemented!("Parallel hash table ingest");
        }
        self.validate_chunks(groups, payload)?;

        let count = groups.count();

        // Hash the first grouping column, then fold the rest in.
        let mut hashes = Vector::with_capacity(TypeId::Integer, count);
        hash::hash(first_column(groups)?, &mut hashes)?;
        for col in groups.columns().iter().skip(1) {
            hash::combine_hash(&mut hashes, col)?;
        }

        // Reduce each hash to its slot's base byte offset. Addresses stay
        // relative to the slot buffer; memory is only touched inside the
        // scatter kernels.
        let mut addresses = Vector::with_capacity(TypeId::Pointer, count);
        cast::cast(&hashes, &mut addresses)?;
        arith::modulo_scalar(&mut addresses, self.capacity as u64, None)?;
        arith::multiply_scalar(&mut addresses, self.layout.tuple_size() as u64, None)?;

        let (new_entries, updated_entries) = self.probe(groups, &mut addresses)?;

        trace!(
            rows = count,
            new = new_entries.num_rows(),
            updated = updated_entries.num_rows(),
            entries = self.entries,
            "ingested batch"
        );

        self.update_aggregates(payload, &mut addresses, &new_entries, &updated_entries)
    }

    fn validate_chunks(&self, groups: &DataChunk, payload: &DataChunk) -> Result<()> {
        if payload.count() != groups.count() {
            return Err(FurrowError::new(format!(
                "Payload count {} does not match group count {}",
                payload.count(),
                groups.count()
            )));
        }

        let group_width: usize = groups.columns().iter().map(|c| c.type_id().size()).sum();
        if group_width != self.layout.group_width() {
            return Err(FurrowError::new(format!(
                "Grouping columns are {group_width} bytes wide, table expects {}",
                self.layout.group_width()
            )));
        }

        let payload_columns = self
            .aggregate_kinds
            .iter()
            .filter(|kind| kind.has_payload())
            .count();
        if payload.column_count() != payload_columns {
            return Err(FurrowError::new(format!(
                "Expected {payload_columns} payload columns, got {}",
                payload.column_count()
            )));
        }

        let payload_width: usize = payload.columns().iter().map(|c| c.type_id().size()).sum();
        if payload_width != self.layout.payload_width() {
            return Err(FurrowError::new(format!(
                "Payload columns are {payload_width} bytes wide, table expects {}",
                self.layout.payload_width()
            )));
        }

        Ok(())
    }

    /// Find or claim a slot for every row.
    ///
    /// On return each address points at its slot's payload base, and every
    /// row index has been appended to exactly one of the returned selection
    /// vectors: `new_entries` for rows that claimed an empty slot,
    /// `updated_entries` for rows that matched an existing group.
    fn probe(
        &mut self,
        groups: &DataChunk,
        addresses: &mut Vector,
    ) -> Result<(SelectionVector, SelectionVector)> {
        let count = groups.count();
        let mut new_entries = SelectionVector::with_capacity(count);
        let mut updated_entries = SelectionVector::with_capacity(count);

        let mut group_data = vec![0; self.layout.group_width()];

        for row in 0..count {
            // Stage the row's concatenated grouping keys for claim and
            // compare.
            let mut pos = 0;
            for col in groups.columns() {
                let value = col.raw_value(row);
                group_data[pos..pos + value.len()].copy_from_slice(value);
                pos += value.len();
            }
            debug_assert_eq!(self.layout.group_width(), pos);

            let mut offset = addresses.get::<u64>(row) as usize;
            let mut chain = 0;
            loop {
                match self.data[offset] {
                    slot::EMPTY => {
                        // Claim it: an empty slot is never key-compared.
                        self.data[offset] = slot::FULL;
                        self.data[self.layout.keys_range(offset)].copy_from_slice(&group_data);
                        self.data[self.layout.payload_offset(offset)..self.layout.slot_end(offset)]
                            .fill(0);
                        self.entries += 1;
                        new_entries.push_location(row);
                        break;
                    }
                    slot::FULL => {
                        if &self.data[self.layout.keys_range(offset)] == group_data.as_slice() {
                            updated_entries.push_location(row);
                            break;
                        }
                    }
                    other => {
                        return Err(FurrowError::invariant(format!(
                            "Corrupt slot flag: {other}"
                        )))
                    }
                }

                // Collision: move to the next slot, wrapping at the end.
                chain += 1;
                if chain == self.capacity {
                    return Err(FurrowError::CapacityExhausted {
                        capacity: self.capacity,
                    });
                }
                offset += self.layout.tuple_size();
                if offset >= self.data.len() {
                    offset = 0;
                }
            }

            self.max_chain = self.max_chain.max(chain);

            // Reposition the cursor at the payload base; the aggregate pass
            // advances it field by field.
            addresses.set::<u64>(row, self.layout.payload_offset(offset) as u64);
        }

        Ok((new_entries, updated_entries))
    }

    /// Apply per-aggregate initial-set and update actions, then advance the
    /// trailing row counters.
    fn update_aggregates(
        &mut self,
        payload: &DataChunk,
        addresses: &mut Vector,
        new_entries: &SelectionVector,
        updated_entries: &SelectionVector,
    ) -> Result<()> {
        let mut payload_idx = 0;
        for agg_idx in 0..self.aggregate_kinds.len() {
            let kind = self.aggregate_kinds[agg_idx];
            if !kind.has_payload() {
                continue;
            }
            let col = payload
                .column(payload_idx)
                .ok_or_else(|| FurrowError::new("Missing payload column"))?;

            if new_entries.num_rows() > 0 {
                // Rows that claimed a fresh slot initialize their
                // accumulator.
                match kind {
                    AggregateKind::Count => scatter::set_count(
                        col.type_id(),
                        &mut self.data,
                        addresses,
                        Some(new_entries),
                    )?,
                    AggregateKind::Sum
                    | AggregateKind::Avg
                    | AggregateKind::Min
                    | AggregateKind::Max => {
                        scatter::set(col, &mut self.data, addresses, Some(new_entries))?
                    }
                    AggregateKind::CountStar => unreachable!("no payload field"),
                }
            }

            if updated_entries.num_rows() > 0 {
                match kind {
                    AggregateKind::Count => scatter::add_one(
                        col.type_id(),
                        &mut self.data,
                        addresses,
                        Some(updated_entries),
                    )?,
                    AggregateKind::Sum | AggregateKind::Avg => {
                        scatter::add(col, &mut self.data, addresses, Some(updated_entries))?
                    }
                    AggregateKind::Min => {
                        scatter::min(col, &mut self.data, addresses, Some(updated_entries))?
                    }
                    AggregateKind::Max => {
                        scatter::max(col, &mut self.data, addresses, Some(updated_entries))?
                    }
                    AggregateKind::CountStar => unreachable!("no payload field"),
                }
            }

            // Move every cursor past this aggregate's accumulator so the
            // next aggregate targets its own slice.
            arith::add_scalar(addresses, col.type_id().size() as u64, None)?;
            payload_idx += 1;
        }

        // Every cursor now points at the trailing counter; one increment per
        // input row serves both COUNT(*) and the AVG divisor.
        scatter::add_one(TypeId::Pointer, &mut self.data, addresses, None)
    }

    /// Emit up to one output batch of groups and aggregate results.
    ///
    /// `position` is a slot index owned by the caller; it starts at zero and
    /// is advanced to one past the last slot visited. Output counts of zero
    /// indicate the end of the table. Scanning does not mutate table
    /// contents.
    pub fn scan(
        &self,
        position: &mut usize,
        groups_out: &mut DataChunk,
        result_out: &mut DataChunk,
    ) -> Result<()> {
        groups_out.reset();
        result_out.reset();

        debug_assert_eq!(self.aggregate_kinds.len(), result_out.column_count());

        let max_rows = usize::min(groups_out.capacity(), result_out.capacity());
        let tuple_size = self.layout.tuple_size();

        // Collect full-slot cursors, positioned past the flag byte.
        let mut addresses = Vector::with_capacity(TypeId::Pointer, max_rows);
        let mut found = 0;
        let mut slot_idx = *position;
        while slot_idx < self.capacity && found < max_rows {
            let base = slot_idx * tuple_size;
            match self.data[base] {
                slot::EMPTY => {}
                slot::FULL => {
                    let count = u64::decode(&self.data[self.layout.count_offset(base)..]);
                    if count == 0 {
                        return Err(FurrowError::invariant("Full slot with zero row count"));
                    }
                    addresses.set::<u64>(found, (base + slot::FLAG_SIZE) as u64);
                    found += 1;
                }
                other => {
                    return Err(FurrowError::invariant(format!(
                        "Corrupt slot flag: {other}"
                    )))
                }
            }
            slot_idx += 1;
        }
        *position = slot_idx;

        if found == 0 {
            return Ok(());
        }
        addresses.set_count(found);

        // Gather the grouping key columns, walking the cursors across the
        // key bytes.
        for idx in 0..groups_out.column_count() {
            let col = groups_out
                .column_mut(idx)
                .ok_or_else(|| FurrowError::new("Missing group output column"))?;
            gather::set(&self.data, &addresses, col)?;
            let width = col.type_id().size();
            arith::add_scalar(&mut addresses, width as u64, None)?;
        }

        // Payload pass. AVG divides the stored running sum by the trailing
        // counter in a single gather; COUNT(*) is deferred until the cursors
        // reach the counter.
        let mut consumed = 0;
        for (idx, kind) in self.aggregate_kinds.iter().enumerate() {
            if !kind.has_payload() {
                continue;
            }
            let col = result_out
                .column_mut(idx)
                .ok_or_else(|| FurrowError::new("Missing result output column"))?;

            match kind {
                AggregateKind::Avg => {
                    let distance_to_count = self.layout.payload_width() - consumed;
                    gather::average(&self.data, &addresses, distance_to_count, col)?;
                }
                _ => gather::set(&self.data, &addresses, col)?,
            }

            let width = col.type_id().size();
            arith::add_scalar(&mut addresses, width as u64, None)?;
            consumed += width;
        }
        debug_assert_eq!(self.layout.payload_width(), consumed);

        // Second pass over the aggregates: the cursors sit on the trailing
        // counters now.
        for (idx, kind) in self.aggregate_kinds.iter().enumerate() {
            if kind.has_payload() {
                continue;
            }
            let col = result_out
                .column_mut(idx)
                .ok_or_else(|| FurrowError::new("Missing result output column"))?;
            debug_assert_eq!(8, col.type_id().size());
            gather::set(&self.data, &addresses, col)?;
        }

        groups_out.set_count(found);
        result_out.set_count(found);

        trace!(rows = found, position = *position, "scanned batch");

        Ok(())
    }
}

fn first_column(chunk: &DataChunk) -> Result<&Vector> {
    chunk
        .column(0)
        .ok_or_else(|| FurrowError::new("Grouping batch must have at least one column"))
}

impl std::fmt::Debug for AggregateHashTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateHashTable")
            .field("layout", &self.layout)
            .field("capacity", &self.capacity)
            .field("entries", &self.entries)
            .field("max_chain", &self.max_chain)
            .field("aggregate_kinds", &self.aggregate_kinds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Table over a single BigInt grouping key with 8-byte accumulators.
    fn bigint_table(capacity: usize, kinds: &[AggregateKind]) -> AggregateHashTable {
        let payload_width = kinds.iter().filter(|kind| kind.has_payload()).count() * 8;
        AggregateHashTable::try_new(capacity, 8, payload_width, kinds.to_vec(), false).unwrap()
    }

    fn groups_chunk(keys: &[i64]) -> DataChunk {
        DataChunk::try_new([Vector::from_slice(keys)]).unwrap()
    }

    /// Payload chunk repeating the same value column once per
    /// payload-carrying aggregate.
    fn payload_chunk(columns: usize, values: &[i64]) -> DataChunk {
        DataChunk::try_new((0..columns).map(|_| Vector::from_slice(values))).unwrap()
    }

    /// Drain the whole table, returning rows keyed by the BigInt group.
    fn collect_rows(
        table: &AggregateHashTable,
        result_types: &[TypeId],
        batch_size: usize,
    ) -> BTreeMap<i64, Vec<i64>> {
        let mut groups_out = DataChunk::with_capacity(&[TypeId::BigInt], batch_size);
        let mut result_out = DataChunk::with_capacity(result_types, batch_size);
        let mut position = 0;

        let mut rows = BTreeMap::new();
        loop {
            table
                .scan(&mut position, &mut groups_out, &mut result_out)
                .unwrap();
            if groups_out.count() == 0 {
                break;
            }

            let keys = groups_out.column(0).unwrap().to_vec::<i64>();
            for (row_idx, key) in keys.into_iter().enumerate() {
                let values = (0..result_types.len())
                    .map(|col_idx| result_out.column(col_idx).unwrap().get::<i64>(row_idx))
                    .collect();
                let prev = rows.insert(key, values);
                assert!(prev.is_none(), "group {key} emitted twice");
            }
        }

        rows
    }

    /// Replicates the ingest address pipeline up to the modulo reduction.
    fn home_slot(key: i64, capacity: usize) -> usize {
        let col = Vector::from_slice(&[key]);
        let mut hashes = Vector::with_capacity(TypeId::Integer, 1);
        hash::hash(&col, &mut hashes).unwrap();
        let mut ptrs = Vector::with_capacity(TypeId::Pointer, 1);
        cast::cast(&hashes, &mut ptrs).unwrap();
        (ptrs.get::<u64>(0) % capacity as u64) as usize
    }

    fn find_key_with_home(capacity: usize, want: usize, start: i64) -> i64 {
        (start..start + 10_000)
            .find(|&key| home_slot(key, capacity) == want)
            .expect("searched range contains a key for every slot")
    }

    #[test]
    fn single_group_single_sum() {
        let mut table = bigint_table(16, &[AggregateKind::Sum]);

        table
            .add_chunk(&groups_chunk(&[7, 7, 7]), &payload_chunk(1, &[10, 20, 30]))
            .unwrap();

        assert_eq!(1, table.entries());

        let rows = collect_rows(&table, &[TypeId::BigInt], 16);
        assert_eq!(BTreeMap::from([(7, vec![60])]), rows);
    }

    #[test]
    fn multi_aggregate_across_batches() {
        let kinds = [
            AggregateKind::Count,
            AggregateKind::Sum,
            AggregateKind::Min,
            AggregateKind::Max,
            AggregateKind::Avg,
            AggregateKind::CountStar,
        ];
        let mut table = bigint_table(16, &kinds);

        table
            .add_chunk(&groups_chunk(&[1, 2, 1]), &payload_chunk(5, &[5, 9, 7]))
            .unwrap();
        table
            .add_chunk(&groups_chunk(&[2, 2, 1]), &payload_chunk(5, &[3, 4, 6]))
            .unwrap();

        assert_eq!(2, table.entries());

        let rows = collect_rows(&table, &[TypeId::BigInt; 6], 16);
        // Group 1 saw {5, 7, 6}; group 2 saw {9, 3, 4}. AVG truncates.
        assert_eq!(
            BTreeMap::from([
                (1, vec![3, 18, 5, 7, 6, 3]),
                (2, vec![3, 16, 3, 9, 5, 3]),
            ]),
            rows
        );
    }

    #[test]
    fn aggregation_is_batch_partition_independent() {
        let kinds = [AggregateKind::Sum, AggregateKind::Avg, AggregateKind::Min];
        let keys = [4_i64, 9, 4, 9, 9, 4];
        let values = [10_i64, -3, 7, 8, 1, 2];

        let mut one_batch = bigint_table(32, &kinds);
        one_batch
            .add_chunk(&groups_chunk(&keys), &payload_chunk(3, &values))
            .unwrap();

        let mut row_at_a_time = bigint_table(32, &kinds);
        for (key, value) in keys.iter().zip(values) {
            row_at_a_time
                .add_chunk(&groups_chunk(&[*key]), &payload_chunk(3, &[value]))
                .unwrap();
        }

        let types = [TypeId::BigInt; 3];
        assert_eq!(
            collect_rows(&one_batch, &types, 8),
            collect_rows(&row_at_a_time, &types, 8)
        );
    }

    #[test]
    fn collision_probes_to_next_slot() {
        let capacity = 4;
        let key_a = find_key_with_home(capacity, 1, 0);
        let key_b = find_key_with_home(capacity, 1, key_a + 1);

        let mut table = bigint_table(capacity, &[AggregateKind::CountStar]);
        let keys = [key_a, key_b, key_a, key_b, key_a];
        table
            .add_chunk(&groups_chunk(&keys), &DataChunk::empty_with_count(keys.len()))
            .unwrap();

        assert_eq!(2, table.entries());
        assert!(table.max_chain() >= 1);

        let rows = collect_rows(&table, &[TypeId::BigInt], 8);
        assert_eq!(BTreeMap::from([(key_a, vec![3]), (key_b, vec![2])]), rows);
    }

    #[test]
    fn probe_wraps_around_to_slot_zero() {
        let capacity = 4;
        let key_a = find_key_with_home(capacity, 3, 0);
        let key_b = find_key_with_home(capacity, 3, key_a + 1);

        let mut table = bigint_table(capacity, &[AggregateKind::CountStar]);

        table
            .add_chunk(&groups_chunk(&[key_a]), &DataChunk::empty_with_count(1))
            .unwrap();
        // The home slot was free: no probing happened.
        assert_eq!(0, table.max_chain());

        table
            .add_chunk(&groups_chunk(&[key_b]), &DataChunk::empty_with_count(1))
            .unwrap();

        // The collision at slot 3 wrapped to slot 0.
        let tuple_size = table.layout().tuple_size();
        assert_eq!(slot::FULL, table.data[3 * tuple_size]);
        assert_eq!(slot::FULL, table.data[0]);
        assert_eq!(slot::EMPTY, table.data[tuple_size]);
        assert_eq!(slot::EMPTY, table.data[2 * tuple_size]);
        assert_eq!(1, table.max_chain());
    }

    #[test]
    fn count_star_only() {
        let mut table = bigint_table(32, &[AggregateKind::CountStar]);

        // 100 rows, 10 groups, 10 rows each, spread over several batches.
        for batch in 0..5 {
            let keys: Vec<i64> = (0..20).map(|row| (batch * 20 + row) % 10).collect();
            table
                .add_chunk(&groups_chunk(&keys), &DataChunk::empty_with_count(keys.len()))
                .unwrap();
        }

        assert_eq!(10, table.entries());

        let rows = collect_rows(&table, &[TypeId::BigInt], 8);
        assert_eq!(10, rows.len());
        assert!(rows.values().all(|values| values == &vec![10]));
        assert_eq!(100_i64, rows.values().map(|values| values[0]).sum());
    }

    #[test]
    fn empty_ingest_changes_nothing() {
        let mut table = bigint_table(8, &[AggregateKind::Sum]);
        let data_before = table.data.clone();

        table
            .add_chunk(&groups_chunk(&[]), &payload_chunk(1, &[]))
            .unwrap();

        assert_eq!(0, table.entries());
        assert_eq!(0, table.max_chain());
        assert_eq!(data_before, table.data);

        let rows = collect_rows(&table, &[TypeId::BigInt], 8);
        assert!(rows.is_empty());
    }

    #[test]
    fn multi_column_grouping_keys() {
        // BigInt + Integer keys: 12 bytes of concatenated key data.
        let mut table = AggregateHashTable::try_new(
            16,
            12,
            8,
            vec![AggregateKind::Sum],
            false,
        )
        .unwrap();

        let groups = DataChunk::try_new([
            Vector::from_slice(&[1_i64, 1, 2]),
            Vector::from_slice(&[10_i32, 20, 10]),
        ])
        .unwrap();
        table
            .add_chunk(&groups, &payload_chunk(1, &[100, 200, 300]))
            .unwrap();

        // (1, 10), (1, 20) and (2, 10) are three distinct groups.
        assert_eq!(3, table.entries());

        let mut groups_out = DataChunk::with_capacity(&[TypeId::BigInt, TypeId::Integer], 8);
        let mut result_out = DataChunk::with_capacity(&[TypeId::BigInt], 8);
        let mut position = 0;
        table
            .scan(&mut position, &mut groups_out, &mut result_out)
            .unwrap();

        let mut rows: Vec<(i64, i32, i64)> = (0..groups_out.count())
            .map(|row| {
                (
                    groups_out.column(0).unwrap().get::<i64>(row),
                    groups_out.column(1).unwrap().get::<i32>(row),
                    result_out.column(0).unwrap().get::<i64>(row),
                )
            })
            .collect();
        rows.sort_unstable();

        assert_eq!(vec![(1, 10, 100), (1, 20, 200), (2, 10, 300)], rows);
    }

    #[test]
    fn decimal_average_divides_exactly() {
        let mut table =
            AggregateHashTable::try_new(8, 8, 8, vec![AggregateKind::Avg], false).unwrap();

        let payload =
            DataChunk::try_new([Vector::from_slice(&[1.0_f64, 2.0, 4.0])]).unwrap();
        table.add_chunk(&groups_chunk(&[3, 3, 3]), &payload).unwrap();

        let mut groups_out = DataChunk::with_capacity(&[TypeId::BigInt], 4);
        let mut result_out = DataChunk::with_capacity(&[TypeId::Decimal], 4);
        let mut position = 0;
        table
            .scan(&mut position, &mut groups_out, &mut result_out)
            .unwrap();

        assert_eq!(1, result_out.count());
        assert_eq!(
            vec![7.0 / 3.0],
            result_out.column(0).unwrap().to_vec::<f64>()
        );
    }

    #[test]
    fn scan_pages_through_in_slot_order() {
        let mut table = bigint_table(64, &[AggregateKind::Sum]);
        let keys: Vec<i64> = (0..10).collect();
        let values: Vec<i64> = (0..10).map(|v| v * 2).collect();
        table
            .add_chunk(&groups_chunk(&keys), &payload_chunk(1, &values))
            .unwrap();

        // Page through with a small output batch.
        let first = collect_rows(&table, &[TypeId::BigInt], 3);
        assert_eq!(10, first.len());
        for key in keys {
            assert_eq!(vec![key * 2], first[&key]);
        }

        // Scanning is non-destructive: a fresh cursor sees the same rows.
        let second = collect_rows(&table, &[TypeId::BigInt], 3);
        assert_eq!(first, second);

        // A cursor past the end keeps yielding empty batches.
        let mut position = table.capacity();
        let mut groups_out = DataChunk::with_capacity(&[TypeId::BigInt], 3);
        let mut result_out = DataChunk::with_capacity(&[TypeId::BigInt], 3);
        table
            .scan(&mut position, &mut groups_out, &mut result_out)
            .unwrap();
        assert_eq!(0, groups_out.count());
        assert_eq!(0, result_out.count());
    }

    #[test]
    fn parallel_ingest_unimplemented() {
        let mut table =
            AggregateHashTable::try_new(8, 8, 8, vec![AggregateKind::Sum], true).unwrap();

        let err = table
            .add_chunk(&groups_chunk(&[1]), &payload_chunk(1, &[1]))
            .unwrap_err();
        assert!(matches!(err, FurrowError::Unimplemented(_)));
    }

    #[test]
    fn zero_capacity_rejected() {
        AggregateHashTable::try_new(0, 8, 8, vec![AggregateKind::Sum], false).unwrap_err();
    }

    #[test]
    fn full_table_fails_instead_of_looping() {
        let mut table = bigint_table(2, &[AggregateKind::CountStar]);

        let err = table
            .add_chunk(
                &groups_chunk(&[1, 2, 3]),
                &DataChunk::empty_with_count(3),
            )
            .unwrap_err();
        assert!(matches!(err, FurrowError::CapacityExhausted { capacity: 2 }));
    }

    #[test]
    fn mismatched_payload_rejected() {
        let mut table = bigint_table(8, &[AggregateKind::Sum]);

        // Wrong number of payload columns.
        table
            .add_chunk(&groups_chunk(&[1]), &payload_chunk(2, &[1]))
            .unwrap_err();

        // Wrong payload width.
        let narrow = DataChunk::try_new([Vector::from_slice(&[1_i32])]).unwrap();
        table.add_chunk(&groups_chunk(&[1]), &narrow).unwrap_err();
    }

    #[test]
    fn min_max_are_order_independent() {
        let kinds = [AggregateKind::Min, AggregateKind::Max];
        let values = [3_i64, -5, 11, 0];

        let mut forward = bigint_table(8, &kinds);
        forward
            .add_chunk(&groups_chunk(&[1; 4]), &payload_chunk(2, &values))
            .unwrap();

        let reversed: Vec<i64> = values.iter().rev().copied().collect();
        let mut backward = bigint_table(8, &kinds);
        backward
            .add_chunk(&groups_chunk(&[1; 4]), &payload_chunk(2, &reversed))
            .unwrap();

        let types = [TypeId::BigInt; 2];
        let rows = collect_rows(&forward, &types, 8);
        assert_eq!(BTreeMap::from([(1, vec![-5, 11])]), rows);
        assert_eq!(rows, collect_rows(&backward, &types, 8));
    }
}
