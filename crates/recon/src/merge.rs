//! Key-based reconciliation of venue record sets.
//!
//! `merge` is a union: every base record survives in its original position,
//! and supplement records are appended only for keys the base does not have.

use std::collections::{HashMap, HashSet};

use crate::keyer::{key_of, RecordKey};
use crate::model::{GeocodeResult, VenueRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub records: Vec<VenueRecord>,
    /// Supplement records appended because their key was missing from base.
    pub added: usize,
    /// Base records whose missing coordinates were taken from the supplement.
    pub backfilled: usize,
}

/// Union `base` with `supplement` by [`RecordKey`].
///
/// Base records come first in their original order, followed by supplement
/// records whose key is new, in supplement order. Duplicate keys inside the
/// supplement are appended once (first occurrence). When a key is already
/// present, the existing record is kept; if it has no coordinates and the
/// incoming copy does, the coordinates are carried over.
pub fn merge(base: Vec<VenueRecord>, supplement: &[VenueRecord]) -> MergeOutcome {
    let mut records = base;
    let mut positions: HashMap<RecordKey, usize> = HashMap::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        positions.entry(key_of(record)).or_insert(idx);
    }
    let mut added = 0;
    let mut backfilled = 0;

    for incoming in supplement {
        let key = key_of(incoming);
        match positions.get(&key) {
            Some(&idx) => {
                let existing = &mut records[idx];
                if !existing.has_coordinates() {
                    if let Some(coords) = incoming.coordinates() {
                        existing.set_coordinates(coords);
                        backfilled += 1;
                    }
                }
            }
            None => {
                positions.insert(key, records.len());
                records.push(incoming.clone());
                added += 1;
            }
        }
    }

    MergeOutcome {
        records,
        added,
        backfilled,
    }
}

/// Stable sort by order number. Only applied when every record carries a
/// parseable order; returns whether the sort happened.
pub fn sort_by_order(records: &mut [VenueRecord]) -> bool {
    let keys: Vec<RecordKey> = records.iter().map(key_of).collect();
    if !keys.iter().all(RecordKey::is_order) {
        return false;
    }

    let mut indexed: Vec<(RecordKey, VenueRecord)> =
        keys.into_iter().zip(records.iter().cloned()).collect();
    indexed.sort_by(|a, b| a.0.cmp(&b.0));
    for (slot, (_, record)) in records.iter_mut().zip(indexed) {
        *slot = record;
    }
    true
}

/// Write resolved coordinates back by key. Records that already hold valid
/// coordinates are never touched, so re-running is a no-op. Returns the
/// number of records updated.
pub fn apply_coordinates(
    records: &mut [VenueRecord],
    resolved: &HashMap<RecordKey, GeocodeResult>,
) -> usize {
    let mut applied = 0;

    for record in records.iter_mut() {
        if record.has_coordinates() {
            continue;
        }
        if let Some(hit) = resolved.get(&key_of(record)) {
            record.set_coordinates(hit.coordinates());
            applied += 1;
        }
    }

    applied
}

/// Records of `original` whose key does not occur in `current`, in
/// `original` order.
pub fn missing_keys<'a>(original: &'a [VenueRecord], current: &[VenueRecord]) -> Vec<&'a VenueRecord> {
    let present: HashSet<RecordKey> = current.iter().map(key_of).collect();
    let mut seen = HashSet::new();

    original
        .iter()
        .filter(|r| {
            let key = key_of(r);
            !present.contains(&key) && seen.insert(key)
        })
        .collect()
}
