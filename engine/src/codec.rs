//! Bookmark wire format.
//!
//! Bookmarks cross the REST boundary as a small JSON object:
//!
//! ```json
//! {"t":"2015-11-25T11:25:28.000Z","u":"i-am-a-uuid"}
//! ```
//!
//! `t` is an ISO-8601 UTC timestamp with millisecond precision and is
//! required. `u` is the id tie-break; absent, `null` and `""` all mean an open
//! tie-break.

use crate::{error::Result, Error, Position, Timestamp};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct WireOut<'a> {
    t: String,
    u: Option<&'a str>,
}

#[derive(Deserialize)]
struct WireIn {
    #[serde(default)]
    t: Option<String>,
    #[serde(default)]
    u: Option<String>,
}

/// Encode a bookmark as its JSON wire form.
pub fn encode_bookmark(bookmark: &Position) -> Result<String> {
    let wire = WireOut {
        t: format_instant(bookmark.instant)?,
        u: bookmark.id.as_deref(),
    };
    serde_json::to_string(&wire).map_err(|e| Error::InvalidArgument(e.to_string()))
}

/// Decode a bookmark from its JSON wire form.
pub fn decode_bookmark(text: &str) -> Result<Position> {
    let wire: WireIn = serde_json::from_str(text)
        .map_err(|e| Error::MalformedBookmark(format!("not a bookmark object: {e}")))?;
    let t = wire.t.ok_or_else(|| {
        Error::MalformedBookmark("didn't find a valid timestamp field 't'".to_string())
    })?;
    Ok(Position {
        instant: parse_instant(&t)?,
        id: wire.u.filter(|u| !u.is_empty()),
    })
}

/// Parse a client-supplied `since` value in either the JSON or the compact
/// `timestamp/id` form.
pub fn parse_since(text: &str) -> Result<Position> {
    if text.trim_start().starts_with('{') {
        decode_bookmark(text)
    } else {
        text.parse()
    }
}

/// Format milliseconds since the epoch as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub(crate) fn format_instant(instant: Timestamp) -> Result<String> {
    i64::try_from(instant)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| Error::InvalidArgument(format!("timestamp {instant} is out of range")))
}

/// Parse an RFC 3339 timestamp in any offset into milliseconds since the
/// epoch. Sub-millisecond digits are truncated.
pub(crate) fn parse_instant(text: &str) -> Result<Timestamp> {
    let parsed = DateTime::parse_from_rfc3339(text)
        .map_err(|e| Error::MalformedBookmark(format!("invalid timestamp \"{text}\": {e}")))?;
    Timestamp::try_from(parsed.with_timezone(&Utc).timestamp_millis()).map_err(|_| {
        Error::MalformedBookmark(format!("timestamp \"{text}\" is before the epoch"))
    })
}
