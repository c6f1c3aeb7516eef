//! Buffered-time clamp for bookmarks handed back to clients.
//!
//! A writer stamps `modified_at` when it builds a record, but readers only see
//! the row once the transaction commits. A reader whose cursor runs up to
//! "now" can step past a row that was stamped earlier but committed later,
//! and never see it. Any bookmark newer than `request_time - BUFFER_WINDOW_MS`
//! is therefore rewound to that threshold with an open tie-break. Some records
//! get delivered twice as a result; clients treat re-delivery as a no-op.

use crate::{error::Result, Error, Position, Timestamp};

/// Safety margin subtracted from the request time, in milliseconds. Must
/// exceed realistic commit latency.
pub const BUFFER_WINDOW_MS: Timestamp = 2000;

/// The newest instant a client bookmark may point at for a request made at
/// `request_time`.
pub fn buffered_threshold(request_time: Timestamp) -> Result<Timestamp> {
    request_time.checked_sub(BUFFER_WINDOW_MS).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "request time {request_time} is earlier than the buffer window allows"
        ))
    })
}

/// Clamp a page bookmark to the buffered request time.
///
/// Never returns "no bookmark": a page that made no progress still gets a
/// usable cursor at the threshold.
pub fn clamp_bookmark(bookmark: Option<&Position>, request_time: Timestamp) -> Result<Position> {
    let threshold = buffered_threshold(request_time)?;
    match bookmark {
        Some(bookmark) if bookmark.instant <= threshold => Ok(bookmark.clone()),
        _ => {
            tracing::debug!(
                from = ?bookmark,
                threshold,
                "rewound bookmark to buffered request time"
            );
            Ok(Position::open(threshold))
        }
    }
}
