//! MemoryStore - an in-memory record source.
//!
//! Holds records keyed by id with a position index on the side, so scans walk
//! records in sync order without sorting. Used by tests and benches, and as
//! the reference behaviour for database-backed sources.

use crate::filter::StructuralFilter;
use crate::source::{RecordSource, ScanQuery};
use crate::{Position, RecordId, Syncable};
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::future::{ready, Future};
use std::ops::Bound;

/// Records plus an index from position to id.
#[derive(Debug, Clone)]
pub struct MemoryStore<R> {
    records: HashMap<RecordId, R>,
    index: BTreeMap<Position, RecordId>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<R: Syncable> MemoryStore<R> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record with the same id.
    ///
    /// A replaced record moves to its new position.
    pub fn upsert(&mut self, record: R) {
        let id = record.id().to_owned();
        if let Some(previous) = self.records.get(&id) {
            self.index.remove(&previous.position());
        }
        self.index.insert(record.position(), id.clone());
        self.records.insert(id, record);
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.get(id)
    }

    /// All records in position order, voided included.
    pub fn ordered(&self) -> impl Iterator<Item = &R> {
        self.index.values().filter_map(|id| self.records.get(id))
    }

    /// Count of records, voided included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn run<F>(&self, query: &ScanQuery<'_, F>) -> Vec<&R>
    where
        F: StructuralFilter<R>,
    {
        let lower = query
            .selection
            .after
            .map_or(Bound::Unbounded, Bound::Excluded);

        self.index
            .range::<Position, _>((lower, Bound::Unbounded))
            .filter_map(|(_, id)| self.records.get(id))
            .filter(|record| query.selection.matches(*record))
            .filter(|record| query.emits_voided(record.is_voided()))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

impl<R: Syncable> FromIterator<R> for MemoryStore<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.upsert(record);
        }
        store
    }
}

impl<R, F> RecordSource<F> for MemoryStore<R>
where
    R: Syncable + Clone + Send,
    F: StructuralFilter<R>,
{
    type Record = R;
    type Error = Infallible;

    fn scan(
        &self,
        query: &ScanQuery<'_, F>,
    ) -> impl Future<Output = Result<Vec<R>, Infallible>> + Send {
        let rows = self.run(query).into_iter().cloned().collect();
        ready(Ok(rows))
    }
}
