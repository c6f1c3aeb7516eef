//! Positions: the unit of total ordering over synchronizable records.
//!
//! A position is `(instant, id)`. Positions compare by instant first and by
//! id second, so records that share a modification time (common when the
//! store truncates to whole seconds) still have a single, reproducible order.

use crate::codec::{format_instant, parse_instant};
use crate::{error::Result, Error, RecordId, Timestamp};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A point in the sync order.
///
/// Ordering rules:
/// 1. Earlier instant sorts first
/// 2. If instants are equal, a missing id sorts before any id
/// 3. Otherwise ids compare as strings
///
/// A position without an id is "open": everything at exactly `instant` sorts
/// after it, so resuming from it re-admits the whole instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    /// Modification instant (milliseconds since epoch)
    pub instant: Timestamp,
    /// Record id used as the tie-break, if any
    pub id: Option<RecordId>,
}

impl Position {
    /// The position of a record with the given instant and id.
    pub fn new(instant: Timestamp, id: impl Into<RecordId>) -> Self {
        Self {
            instant,
            id: Some(id.into()),
        }
    }

    /// A position just before every record at `instant`.
    pub fn open(instant: Timestamp) -> Self {
        Self { instant, id: None }
    }

    /// Whether this position leaves the tie-break open.
    pub fn is_open(&self) -> bool {
        self.id.is_none()
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.instant.cmp(&other.instant) {
            Ordering::Equal => self.id.cmp(&other.id),
            other => other,
        }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compact form: `2015-11-25T11:25:28.000Z/i-am-a-uuid`, or the bare
/// timestamp when the id is open.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instant = format_instant(self.instant).map_err(|_| fmt::Error)?;
        match &self.id {
            Some(id) => write!(f, "{instant}/{id}"),
            None => f.write_str(&instant),
        }
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (instant, id) = match s.split_once('/') {
            Some((instant, id)) => (instant, Some(id)),
            None => (s, None),
        };
        if instant.is_empty() {
            return Err(Error::MalformedBookmark(format!(
                "missing timestamp in bookmark \"{s}\""
            )));
        }
        Ok(Self {
            instant: parse_instant(instant)?,
            id: id.filter(|id| !id.is_empty()).map(str::to_owned),
        })
    }
}
