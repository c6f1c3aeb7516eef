//! Revision chains.
//!
//! Some entities (orders) never change in place: each edit is a new record
//! pointing at the revision it replaces. Every revision syncs on its own, but
//! clients identify the entity by the id of the root revision, found by
//! following `previous_revision_id` links back to a record without one. The
//! data they see comes from the other end of the chain, the latest revision.

use crate::{error::Result, Error, Record, RecordId};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Append-only map from revision id to the revision it replaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionIndex {
    previous: HashMap<RecordId, Option<RecordId>>,
    // Inverse of `previous`; a revision replaced twice keeps its first successor.
    next: HashMap<RecordId, RecordId>,
}

impl RevisionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from the `previous_revision_id` links of `records`.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        records
            .into_iter()
            .map(|r| (r.id.clone(), r.previous_revision_id.clone()))
            .collect()
    }

    /// Register a revision. A link already present is kept.
    pub fn insert(&mut self, id: impl Into<RecordId>, previous: Option<RecordId>) {
        let id = id.into();
        if let Entry::Vacant(slot) = self.previous.entry(id.clone()) {
            if let Some(previous) = &previous {
                self.next.entry(previous.clone()).or_insert(id);
            }
            slot.insert(previous);
        }
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    /// Ids from the root revision down to `id`.
    ///
    /// The walk stops at a revision with no predecessor, or at one the index
    /// has never seen, which is taken to be the root.
    pub fn chain_of(&self, id: &str) -> Result<Vec<RecordId>> {
        let mut chain = vec![id.to_owned()];
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut current = id;

        while let Some(Some(previous)) = self.previous.get(current) {
            if !seen.insert(previous.as_str()) {
                return Err(Error::BrokenRevisionChain(id.to_owned()));
            }
            chain.push(previous.clone());
            current = previous.as_str();
        }

        chain.reverse();
        Ok(chain)
    }

    /// The id clients know this revision's entity by.
    pub fn root_of(&self, id: &str) -> Result<RecordId> {
        let mut chain = self.chain_of(id)?;
        Ok(chain.swap_remove(0))
    }

    /// The newest revision reachable forwards from `id`.
    pub fn latest_of(&self, id: &str) -> Result<RecordId> {
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut current = id;

        while let Some(next) = self.next.get(current) {
            if !seen.insert(next.as_str()) {
                return Err(Error::BrokenRevisionChain(id.to_owned()));
            }
            current = next.as_str();
        }
        Ok(current.to_owned())
    }
}

impl FromIterator<(RecordId, Option<RecordId>)> for RevisionIndex {
    fn from_iter<I: IntoIterator<Item = (RecordId, Option<RecordId>)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (id, previous) in iter {
            index.insert(id, previous);
        }
        index
    }
}
