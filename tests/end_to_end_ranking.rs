mod common;

use approx::assert_relative_eq;
use snaps::engine::{inspect_object, run_batch};
use snaps::filter::FilterPolicy;
use snaps::observations::Attribute;
use snaps::scoring::rating::{Polarity, RatedAttribute};
use snaps::scoring::ScoringParams;
use snaps::table::{Column, TableCell};
use snaps::{ObjectNumber, SeriesScoring, SeriesSet, SnapsError};

use common::{default_series, elong_series};

fn elong_only(filter: FilterPolicy) -> ScoringParams {
    ScoringParams::builder()
        .attributes([Attribute::Elong])
        .rated_attributes([RatedAttribute::new(
            Attribute::Elong,
            Polarity::HigherIsMoreAnomalous,
        )])
        .filter(filter)
        .build()
        .unwrap()
}

#[test]
fn test_single_spike_is_stored_as_positive_sigma() {
    let mut set = SeriesSet::default();
    set.insert(ObjectNumber::String("A".into()), elong_series(&[1.0, 1.2, 1.1, 1.3, 9.0]));

    let report = set.score_all(&elong_only(FilterPolicy::None)).unwrap();
    let row = report.table.get(&ObjectNumber::String("A".into())).unwrap();

    let mean = 2.72;
    let sd = (49.348_f64 / 4.0).sqrt();
    let expected = (9.0 - mean) / sd;

    let cell = row.cell(&Attribute::Elong).unwrap();
    assert_relative_eq!(cell.sigma, expected, epsilon = 1e-9);
    assert_relative_eq!(cell.sigma, 1.788, epsilon = 1e-3);
    assert_eq!(cell.source_id(), Some("cand4"));
    assert_relative_eq!(row.row_sum(), expected, epsilon = 1e-9);
    assert_relative_eq!(row.abs_row_sum(), expected, epsilon = 1e-9);
    assert_eq!(row.rating(), None);

    let header = report.table.header();
    assert_eq!(
        header,
        vec!["Name", "elong", "ZTF-ELONG", "Row Sum", "Abs Row Sum", "Rating"]
    );
    let records = report.table.records();
    assert_eq!(records[0][0], TableCell::Text("A".into()));
    assert_eq!(records[0][2], TableCell::Text("cand4".into()));
    assert_eq!(records[0][5], TableCell::Missing);
}

#[test]
fn test_low_tail_gives_negative_sigma() {
    let mut set = SeriesSet::default();
    set.insert(ObjectNumber::Int(1), elong_series(&[5.0, 5.1, 4.9, 5.0, 0.5]));
    let report = set.score_all(&elong_only(FilterPolicy::None)).unwrap();
    let row = &report.table.rows()[0];
    assert!(row.sigma(&Attribute::Elong).unwrap() < 0.0);
    assert_relative_eq!(row.abs_row_sum(), -row.row_sum());
}

#[test]
fn test_occurrence_count_zeroes_unshared_triggers() {
    let mut set = SeriesSet::default();
    set.insert(ObjectNumber::Int(1465), default_series(10, 3));

    let params = ScoringParams::builder()
        .filter(FilterPolicy::OccurrenceCount { threshold: 3 })
        .build()
        .unwrap();
    let report = set.score_all(&params).unwrap();
    let row = report.table.get(&ObjectNumber::Int(1465)).unwrap();

    assert!(row.sigma(&Attribute::Elong).unwrap() > 0.0);
    assert!(row.sigma(&Attribute::RealBogus).unwrap() < 0.0);
    assert!(row.sigma(&Attribute::Mag18oMag8).unwrap() > 0.0);
    assert_eq!(row.sigma(&Attribute::AbsMagnitude), Some(0.0));
    assert_eq!(
        row.cell(&Attribute::Elong).unwrap().source_id(),
        Some("cand3")
    );
    // The zeroed cell keeps its trigger.
    assert!(row.cell(&Attribute::AbsMagnitude).unwrap().trigger.is_some());
}

#[test]
fn test_rating_threshold_and_summaries() {
    let mut set = SeriesSet::default();
    set.insert(ObjectNumber::Int(1), default_series(10, 3));
    set.insert(ObjectNumber::Int(2), default_series(6, 5));

    let params = ScoringParams::builder()
        .filter(FilterPolicy::RatingThreshold { threshold: 90.0 })
        .build()
        .unwrap();
    let report = set.score_all(&params).unwrap();

    assert_eq!(report.table.len(), 2);
    for row in report.table.rows() {
        assert_relative_eq!(row.rating().unwrap(), 100.0);
    }

    let summaries = report.table.attribute_summaries();
    assert_eq!(summaries.len(), 4);
    let (attr, elong) = &summaries[0];
    assert_eq!(attr, &Attribute::Elong);
    assert_eq!(elong.count, 2);
    let sum: f64 = report.table.column_values(&Column::Sigma(Attribute::Elong)).iter().sum();
    assert_relative_eq!(elong.sum, sum);
    assert_relative_eq!(elong.mean().unwrap(), sum / 2.0);
}

#[test]
fn test_failures_do_not_abort_the_run() {
    let mut set = SeriesSet::default();
    set.insert(ObjectNumber::Int(1), elong_series(&[1.0, 2.0, 3.0]));
    set.insert(ObjectNumber::Int(2), elong_series(&[1.0, f64::NAN, 3.0]));
    set.insert(ObjectNumber::Int(3), elong_series(&[2.0, 2.0, 2.0]));

    let ids = [
        ObjectNumber::Int(1),
        ObjectNumber::Int(2),
        ObjectNumber::Int(3),
        ObjectNumber::Int(4),
    ];
    let report = run_batch(&set, &ids, &elong_only(FilterPolicy::None)).unwrap();

    assert_eq!(report.processed, 4);
    // Object 3 is neutralised, not dropped.
    assert_eq!(report.table.len(), 2);
    assert_eq!(report.table.get(&ObjectNumber::Int(3)).unwrap().abs_row_sum(), 0.0);
    assert_eq!(report.warnings.len(), 1);

    assert_eq!(report.failures.len(), 2);
    assert!(matches!(
        report.failures[0].error,
        SnapsError::NonFiniteValue { .. }
    ));
    assert_eq!(report.failures[1].object, ObjectNumber::Int(4));
    assert!(matches!(
        report.failures[1].error,
        SnapsError::LoadFailure { .. }
    ));
}

#[test]
fn test_ranked_order_and_rendering() {
    let mut set = SeriesSet::default();
    set.insert(ObjectNumber::Int(1), elong_series(&[1.0, 1.1, 1.2, 1.3]));
    set.insert(ObjectNumber::Int(2), elong_series(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 30.0]));

    let report = set.score_all(&elong_only(FilterPolicy::None)).unwrap();
    let ranked = report.table.ranked();
    assert_eq!(ranked.rows()[0].object(), &ObjectNumber::Int(2));

    let text = format!("{:#}", report);
    assert!(text.contains("processed   : 2"));
    assert!(text.contains("Ranked table (rows=2)"));
    assert!(text.contains("Abs Row Sum"));
    assert!(text.contains("Mean"));
}

#[test]
fn test_inspection_matches_run_row() {
    let series = default_series(8, 6);
    let params = ScoringParams::default();
    let insp = inspect_object(&ObjectNumber::Int(9), &series, &params).unwrap();

    let mut set = SeriesSet::default();
    set.insert(ObjectNumber::Int(9), series);
    let report = set.score_all(&params).unwrap();

    assert_eq!(&insp.row, report.table.get(&ObjectNumber::Int(9)).unwrap());
    assert_eq!(insp.rating.as_ref().unwrap().peak_source_id, "cand6");
    assert!(insp.to_string().contains("Kept        : yes"));
}
