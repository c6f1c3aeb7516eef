//! Sync response assembly: fetch, clamp, encode.

use crate::filter::StructuralFilter;
use crate::source::RecordSource;
use crate::{
    buffered_threshold, clamp_bookmark, encode_bookmark, fetch_page, Position, SyncError,
    Syncable, Timestamp,
};
use serde::Serialize;

/// Inputs to one sync request.
#[derive(Debug)]
pub struct SyncRequest<'a, F> {
    /// Cursor from the client's previous response, if any
    pub bookmark: Option<&'a Position>,
    pub include_voided: bool,
    /// `0` means unbounded
    pub max_results: usize,
    pub filter: &'a F,
    /// When the request arrived (milliseconds since epoch)
    pub request_time: Timestamp,
}

/// What the REST layer embeds in its response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResponse<R> {
    pub results: Vec<R>,
    /// Encoded, clamped cursor for the next request
    pub bookmark: String,
    pub more: bool,
}

impl<R> SyncResponse<R> {
    /// Convert the results, keeping cursor and flag.
    pub fn map<T>(self, f: impl FnMut(R) -> T) -> SyncResponse<T> {
        SyncResponse {
            results: self.results.into_iter().map(f).collect(),
            bookmark: self.bookmark,
            more: self.more,
        }
    }
}

/// Serve one sync request.
///
/// `request_time` is validated before any scan runs.
pub async fn assemble<S, F>(
    source: &S,
    request: SyncRequest<'_, F>,
) -> Result<SyncResponse<S::Record>, SyncError<S::Error>>
where
    S: RecordSource<F>,
    S::Record: Syncable,
    F: StructuralFilter<S::Record>,
{
    buffered_threshold(request.request_time)?;

    let page = fetch_page(
        source,
        request.bookmark,
        request.include_voided,
        request.max_results,
        request.filter,
    )
    .await?;

    let bookmark = clamp_bookmark(page.bookmark.as_ref(), request.request_time)?;
    Ok(SyncResponse {
        bookmark: encode_bookmark(&bookmark)?,
        results: page.results,
        more: page.more,
    })
}
