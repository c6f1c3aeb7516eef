//! Selection of the records a scan may visit.
//!
//! A scan visits records that are strictly after the bookmark and admitted by
//! the structural filter. Voided status is deliberately not part of the
//! selection: positions are defined over every structurally admitted record,
//! so a bookmark keeps its meaning when `include_voided` changes between
//! calls.

use crate::{EntityKind, OrderAction, Position, Record, Syncable};

/// A fixed predicate narrowing the base record set for a whole sync session.
pub trait StructuralFilter<R>: Send + Sync {
    fn admits(&self, record: &R) -> bool;
}

/// Admits every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllRecords;

impl<R> StructuralFilter<R> for AllRecords {
    fn admits(&self, _record: &R) -> bool {
        true
    }
}

/// Structural filter over stored [`Record`]s: one entity kind, optionally
/// restricted to a set of order actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub kind: EntityKind,
    /// When set, only order revisions with one of these actions are admitted.
    pub actions: Option<Vec<OrderAction>>,
}

impl RecordFilter {
    /// Every record of the given kind.
    pub fn of(kind: EntityKind) -> Self {
        Self {
            kind,
            actions: None,
        }
    }

    /// Orders whose action is one of `actions`.
    pub fn orders(actions: impl IntoIterator<Item = OrderAction>) -> Self {
        Self {
            kind: EntityKind::Orders,
            actions: Some(actions.into_iter().collect()),
        }
    }

    /// Orders the field client can represent: every action except
    /// discontinuation.
    pub fn client_orders() -> Self {
        Self::orders(
            OrderAction::ALL
                .into_iter()
                .filter(|action| *action != OrderAction::Discontinue),
        )
    }

    /// The filter used when a client syncs `kind`.
    pub fn for_client(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Orders => Self::client_orders(),
            other => Self::of(other),
        }
    }
}

impl StructuralFilter<Record> for RecordFilter {
    fn admits(&self, record: &Record) -> bool {
        if record.kind != self.kind {
            return false;
        }
        match &self.actions {
            Some(allowed) => record.action.is_some_and(|action| allowed.contains(&action)),
            None => true,
        }
    }
}

/// "Strictly after the bookmark and structurally admitted."
#[derive(Debug)]
pub struct Selection<'a, F> {
    /// Exclusive lower bound; `None` selects from the start of the set.
    pub after: Option<&'a Position>,
    pub filter: &'a F,
}

impl<'a, F> Clone for Selection<'a, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, F> Copy for Selection<'a, F> {}

impl<'a, F> Selection<'a, F> {
    pub fn new(after: Option<&'a Position>, filter: &'a F) -> Self {
        Self { after, filter }
    }

    /// Whether a record at `position` lies past the bookmark.
    pub fn is_after(&self, position: &Position) -> bool {
        self.after.map_or(true, |after| position > after)
    }

    pub fn matches<R>(&self, record: &R) -> bool
    where
        R: Syncable,
        F: StructuralFilter<R>,
    {
        self.filter.admits(record) && self.is_after(&record.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_records_admits_everything() {
        let record = Record::new("p-1", EntityKind::Patients, 1000).voided_at(2000);
        assert!(AllRecords.admits(&record));
    }

    #[test]
    fn record_filter_checks_kind() {
        let filter = RecordFilter::of(EntityKind::Patients);
        assert!(filter.admits(&Record::new("p-1", EntityKind::Patients, 1000)));
        assert!(!filter.admits(&Record::new("o-1", EntityKind::Observations, 1000)));
    }

    #[test]
    fn client_orders_exclude_discontinue() {
        let filter = RecordFilter::client_orders();
        assert!(filter.admits(&Record::order("o-1", OrderAction::New, 1000)));
        assert!(filter.admits(&Record::order("o-2", OrderAction::Revise, 1000)));
        assert!(filter.admits(&Record::order("o-3", OrderAction::Renew, 1000)));
        assert!(!filter.admits(&Record::order("o-4", OrderAction::Discontinue, 1000)));
    }

    #[test]
    fn action_filter_rejects_orders_without_action() {
        let filter = RecordFilter::client_orders();
        assert!(!filter.admits(&Record::new("o-1", EntityKind::Orders, 1000)));
    }

    #[test]
    fn for_client_restricts_orders_only() {
        assert_eq!(
            RecordFilter::for_client(EntityKind::Patients),
            RecordFilter::of(EntityKind::Patients)
        );
        assert_eq!(
            RecordFilter::for_client(EntityKind::Orders),
            RecordFilter::client_orders()
        );
    }

    #[test]
    fn selection_without_bookmark_matches_admitted_records() {
        let filter = RecordFilter::of(EntityKind::Patients);
        let selection = Selection::new(None, &filter);
        assert!(selection.matches(&Record::new("p-1", EntityKind::Patients, 0)));
        assert!(!selection.matches(&Record::new("o-1", EntityKind::Observations, 0)));
    }

    #[test]
    fn selection_is_strictly_after_bookmark() {
        let bookmark = Position::new(2000, "bbbbb");
        let selection = Selection::new(Some(&bookmark), &AllRecords);

        assert!(!selection.matches(&Record::new("aaaaa", EntityKind::Patients, 2000)));
        assert!(!selection.matches(&Record::new("bbbbb", EntityKind::Patients, 2000)));
        assert!(selection.matches(&Record::new("ccccc", EntityKind::Patients, 2000)));
        assert!(selection.matches(&Record::new("aaaaa", EntityKind::Patients, 2001)));
        assert!(!selection.matches(&Record::new("zzzzz", EntityKind::Patients, 1999)));
    }

    #[test]
    fn open_bookmark_admits_whole_instant() {
        let bookmark = Position::open(2000);
        let selection = Selection::new(Some(&bookmark), &AllRecords);
        assert!(selection.matches(&Record::new("aaaaa", EntityKind::Patients, 2000)));
        assert!(!selection.matches(&Record::new("aaaaa", EntityKind::Patients, 1999)));
    }

    #[test]
    fn selection_ignores_voided_status() {
        let selection = Selection::new(None, &AllRecords);
        let voided = Record::new("p-1", EntityKind::Patients, 1000).voided_at(2000);
        assert!(selection.matches(&voided));
    }
}
