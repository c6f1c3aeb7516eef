//! Record types and the accessor every synchronizable entity implements.

use crate::{error::Result, Error, Position, RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the engine needs to know about a record in order to page over it.
///
/// Implemented once per entity kind by the persistence layer.
pub trait Syncable {
    /// Stable identifier, immutable once assigned.
    fn id(&self) -> &str;

    /// Latest of creation and last-change time.
    fn modified_at(&self) -> Timestamp;

    /// Whether the record is logically deleted.
    fn is_voided(&self) -> bool;

    /// The record's place in the sync order.
    fn position(&self) -> Position {
        Position::new(self.modified_at(), self.id())
    }
}

/// The kinds of entity a client can sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Patients,
    Observations,
    Orders,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Patients,
        EntityKind::Observations,
        EntityKind::Orders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Patients => "patients",
            EntityKind::Observations => "observations",
            EntityKind::Orders => "orders",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown entity kind: {s}")))
    }
}

/// How an order revision relates to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    New,
    Revise,
    Discontinue,
    Renew,
}

impl OrderAction {
    pub const ALL: [OrderAction; 4] = [
        OrderAction::New,
        OrderAction::Revise,
        OrderAction::Discontinue,
        OrderAction::Renew,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::New => "new",
            OrderAction::Revise => "revise",
            OrderAction::Discontinue => "discontinue",
            OrderAction::Renew => "renew",
        }
    }
}

impl FromStr for OrderAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        OrderAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown order action: {s}")))
    }
}

/// Timestamps kept by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// When the record was first created (milliseconds since epoch)
    pub created_at: Timestamp,
    /// When the record was last changed, if ever. Many stores only set this
    /// on update.
    pub changed_at: Option<Timestamp>,
}

impl Metadata {
    /// Metadata for a record that has never been changed.
    pub fn created(timestamp: Timestamp) -> Self {
        Self {
            created_at: timestamp,
            changed_at: None,
        }
    }

    /// Record a change.
    pub fn change(&mut self, timestamp: Timestamp) {
        self.changed_at = Some(timestamp);
    }

    /// The modification instant used for ordering. Falls back to creation
    /// time and never goes backwards past it.
    pub fn modified_at(&self) -> Timestamp {
        self.changed_at
            .map_or(self.created_at, |changed| changed.max(self.created_at))
    }
}

/// A synchronizable record as the server stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier (a UUID in practice)
    pub id: RecordId,
    /// Which entity kind this record belongs to
    pub kind: EntityKind,
    /// Creation and change timestamps
    pub metadata: Metadata,
    /// Soft delete flag
    pub voided: bool,
    /// Order action, for order revisions only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<OrderAction>,
    /// The revision this one replaces, for order revisions only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_revision_id: Option<RecordId>,
    /// Entity fields, opaque to the engine
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Record {
    /// Create a new, unchanged, non-voided record with an empty payload.
    pub fn new(id: impl Into<RecordId>, kind: EntityKind, created_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            kind,
            metadata: Metadata::created(created_at),
            voided: false,
            action: None,
            previous_revision_id: None,
            payload: serde_json::Value::Null,
        }
    }

    /// Create an order revision.
    pub fn order(id: impl Into<RecordId>, action: OrderAction, created_at: Timestamp) -> Self {
        Self {
            action: Some(action),
            ..Self::new(id, EntityKind::Orders, created_at)
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn changed_at(mut self, timestamp: Timestamp) -> Self {
        self.metadata.change(timestamp);
        self
    }

    /// Link this revision to the one it replaces.
    pub fn revising(mut self, previous: impl Into<RecordId>) -> Self {
        self.previous_revision_id = Some(previous.into());
        self
    }

    /// Void the record at the given time. Voiding counts as a change.
    pub fn voided_at(mut self, timestamp: Timestamp) -> Self {
        self.voided = true;
        self.metadata.change(timestamp);
        self
    }
}

impl Syncable for Record {
    fn id(&self) -> &str {
        &self.id
    }

    fn modified_at(&self) -> Timestamp {
        self.metadata.modified_at()
    }

    fn is_voided(&self) -> bool {
        self.voided
    }
}
