//! Client-side replica fed by sync responses.
//!
//! Delivery is at-least-once: a clamped bookmark can re-deliver records the
//! client already holds, and an entity with a revision chain shows up once per
//! revision. The replica merges by root id and keeps the revision with the
//! latest position, so replaying a response is a no-op.

use crate::{decode_bookmark, error::Result, Position, RecordId, SyncResponse, Syncable};
use std::collections::HashMap;

/// Outcome of applying one response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Results that inserted or replaced an entity
    pub changed: usize,
    /// Results already held, or older than what is held
    pub unchanged: usize,
}

/// Latest known revision of every entity, keyed by root id.
#[derive(Debug, Clone)]
pub struct Replica<R> {
    entities: HashMap<RecordId, R>,
    bookmark: Option<Position>,
}

impl<R> Default for Replica<R> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            bookmark: None,
        }
    }
}

impl<R: Syncable + PartialEq> Replica<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor to send with the next request; `None` before the first sync.
    pub fn bookmark(&self) -> Option<&Position> {
        self.bookmark.as_ref()
    }

    /// Merge a response. `root_of` maps a result to the id of its entity.
    ///
    /// The bookmark is decoded first, so a bad response leaves the replica
    /// untouched.
    pub fn apply<F>(&mut self, response: SyncResponse<R>, mut root_of: F) -> Result<ApplySummary>
    where
        F: FnMut(&R) -> Result<RecordId>,
    {
        let bookmark = decode_bookmark(&response.bookmark)?;
        let keyed = response
            .results
            .into_iter()
            .map(|record| Ok((root_of(&record)?, record)))
            .collect::<Result<Vec<_>>>()?;

        let mut summary = ApplySummary::default();
        for (root, record) in keyed {
            if self.merge(root, record) {
                summary.changed += 1;
            } else {
                summary.unchanged += 1;
            }
        }
        self.bookmark = Some(bookmark);
        Ok(summary)
    }

    fn merge(&mut self, root: RecordId, record: R) -> bool {
        match self.entities.get(&root) {
            Some(held) if *held == record => false,
            Some(held) if held.position() > record.position() => false,
            _ => {
                self.entities.insert(root, record);
                true
            }
        }
    }

    /// Latest revision of an entity.
    pub fn get(&self, root: &str) -> Option<&R> {
        self.entities.get(root)
    }

    /// Entities whose latest revision is not voided.
    pub fn live(&self) -> impl Iterator<Item = (&RecordId, &R)> {
        self.entities.iter().filter(|(_, r)| !r.is_voided())
    }

    /// Count of entities held, voided included.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
