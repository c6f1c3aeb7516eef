//! The query capability the engine pages over.

use crate::filter::Selection;
use std::future::Future;

/// One bounded, ordered scan.
#[derive(Debug)]
pub struct ScanQuery<'a, F> {
    /// Which records the scan may visit.
    pub selection: Selection<'a, F>,
    /// Whether voided records are emitted.
    pub include_voided: bool,
    /// Maximum number of records to emit; `None` means unbounded. The limit
    /// counts emitted records, after the voided filter.
    pub limit: Option<usize>,
}

impl<'a, F> ScanQuery<'a, F> {
    /// Whether a record with this voided status is emitted.
    pub fn emits_voided(&self, voided: bool) -> bool {
        self.include_voided || !voided
    }
}

/// A store that can run a [`ScanQuery`].
///
/// Implementations must return records matching `query.selection` (and the
/// voided rule) in ascending position order, at most `query.limit` of them.
/// Read consistency within one scan is the implementation's concern.
pub trait RecordSource<F> {
    type Record;
    type Error;

    fn scan(
        &self,
        query: &ScanQuery<'_, F>,
    ) -> impl Future<Output = Result<Vec<Self::Record>, Self::Error>> + Send;
}
