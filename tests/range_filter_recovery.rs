mod common;

use snaps::filter::{FilterStep, RangeFilter, RangeFilterSession, RecoveryAction};
use snaps::observations::Attribute;
use snaps::table::Column;
use snaps::{ObjectNumber, RunState, SnapsError};

use common::elong_table;

const SIGMAS: [f64; 10] = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];

fn elong(low: f64, high: f64) -> RangeFilter {
    RangeFilter::new(Column::Sigma(Attribute::Elong), low, high).unwrap()
}

#[test]
fn test_empty_interactive_filter_then_reset_all() {
    let mut session = RangeFilterSession::new(elong_table(&SIGMAS));

    let step = session.apply_interactive(elong(100.0, 200.0)).unwrap();
    assert!(matches!(step, FilterStep::Empty { .. }));
    assert_eq!(session.state(), RunState::AwaitingRecovery);
    assert!(session.pending().is_some());

    // Nothing else is accepted until the user picks a recovery action.
    assert!(matches!(
        session.apply_interactive(elong(0.0, 10.0)),
        Err(SnapsError::InvalidState(_))
    ));

    let table = session.recover(RecoveryAction::ResetAll).unwrap();
    assert_eq!(table.len(), 10);
    assert_eq!(session.state(), RunState::Ranked);
    assert!(session.applied_filters().is_empty());
}

#[test]
fn test_reset_last_keeps_earlier_filters() {
    let mut session = RangeFilterSession::new(elong_table(&SIGMAS));

    let step = session.apply_interactive(elong(1.0, 4.0)).unwrap();
    assert_eq!(step, FilterStep::Applied { remaining: 5 });

    let step = session.apply_interactive(elong(100.0, 200.0)).unwrap();
    assert!(matches!(step, FilterStep::Empty { .. }));

    let table = session.recover(RecoveryAction::ResetLast).unwrap();
    assert_eq!(table.len(), 5);
    assert_eq!(session.applied_filters().len(), 1);

    let ids: Vec<_> = session.current().object_ids().cloned().collect();
    assert_eq!(ids.first(), Some(&ObjectNumber::Int(3)));
    assert_eq!(ids.last(), Some(&ObjectNumber::Int(7)));
}

#[test]
fn test_continue_ends_with_empty_table() {
    let mut session = RangeFilterSession::new(elong_table(&SIGMAS));
    session.apply_interactive(elong(100.0, 200.0)).unwrap();

    let table = session.recover(RecoveryAction::Continue).unwrap();
    assert!(table.is_empty());
    assert_eq!(session.state(), RunState::Done);
    assert!(session.recover(RecoveryAction::ResetAll).is_err());
    assert!(session.into_table().is_empty());
}

#[test]
fn test_recover_without_pending_filter_is_rejected() {
    let mut session = RangeFilterSession::new(elong_table(&SIGMAS));
    assert!(matches!(
        session.recover(RecoveryAction::ResetLast),
        Err(SnapsError::InvalidState(_))
    ));
}

#[test]
fn test_batch_filter_is_inclusive_and_rolls_back() {
    let mut session = RangeFilterSession::new(elong_table(&SIGMAS));

    assert_eq!(session.apply_batch(elong(1.0, 4.0)).unwrap(), 7);

    let err = session.apply_batch(elong(100.0, 200.0)).unwrap_err();
    assert!(matches!(err, SnapsError::EmptyFilterResult { .. }));
    assert_eq!(session.state(), RunState::Ranked);
    assert_eq!(session.current().len(), 7);

    assert_eq!(session.apply_batch(elong(4.0, 4.0)).unwrap(), 1);
    assert_eq!(session.undo().unwrap(), Some(elong(4.0, 4.0)));
    session.reset().unwrap();
    assert_eq!(session.finish().unwrap().len(), 10);
}

#[test]
fn test_rows_without_rating_never_match() {
    let mut session = RangeFilterSession::new(elong_table(&SIGMAS));
    let rating = RangeFilter::new(Column::Rating, f64::NEG_INFINITY, f64::INFINITY).unwrap();
    let err = session.apply_batch(rating).unwrap_err();
    assert!(matches!(err, SnapsError::EmptyFilterResult { .. }));
}

#[test]
fn test_filter_rejects_inverted_bounds() {
    assert!(RangeFilter::new(Column::RowSum, 2.0, 1.0).is_err());
    assert!(RangeFilter::new(Column::RowSum, f64::NAN, 1.0).is_err());
    assert!("ZTF-ELONG".parse::<Column>().is_err());
}
