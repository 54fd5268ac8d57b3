use std::io::Write;

use approx::assert_relative_eq;
use camino::Utf8Path;
use tempfile::NamedTempFile;

use snaps::observations::Attribute;
use snaps::scoring::ScoringParams;
use snaps::{ObjectNumber, SeriesFile, SeriesScoring, SeriesSet, SnapsError};

const HEADER: &str = "ssnamenr,jd,night,id,fid,elong,rb,H,mag18omag8";

fn write_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn utf8(file: &NamedTempFile) -> &Utf8Path {
    Utf8Path::from_path(file.path()).unwrap()
}

#[test]
fn test_csv_file_scores_end_to_end() {
    // Rows are deliberately out of epoch order.
    let file = write_csv(&[
        "1465,2460003.5,3,c3,1,1.3,0.92,15.1,0.52",
        "1465,2460000.5,0,c0,1,1.0,0.90,15.0,0.50",
        "1465,2460004.5,4,c4,2,9.0,0.30,15.2,1.90",
        "1465,2460001.5,1,c1,2,1.2,0.91,15.3,0.51",
        "1465,2460002.5,2,c2,1,1.1,0.93,15.1,0.49",
        "2015AB,2460000.5,0,d0,1,1.1,0.7,16.0,0.4",
        "2015AB,2460001.5,1.0,d1,1,,0.8,16.1,0.5",
    ]);

    let set = SeriesSet::new_from_csv(utf8(&file), &Attribute::defaults()).unwrap();
    assert_eq!(set.number_of_objects(), 2);
    assert_eq!(set.total_observations(), 7);

    let series = &set[&ObjectNumber::Int(1465)];
    let ids: Vec<_> = series.iter().map(|o| o.source_id.as_str()).collect();
    assert_eq!(ids, ["c0", "c1", "c2", "c3", "c4"]);

    let report = set.score_all(&ScoringParams::default()).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.table.len(), 2);
    assert!(report.failures.is_empty());

    let row = report.table.get(&ObjectNumber::Int(1465)).unwrap();
    let cell = row.cell(&Attribute::Elong).unwrap();
    assert_relative_eq!(cell.sigma, (9.0 - 2.72) / (49.348_f64 / 4.0).sqrt(), epsilon = 1e-9);
    assert_eq!(cell.source_id(), Some("c4"));
    assert!(row.sigma(&Attribute::RealBogus).unwrap() < 0.0);

    // One elongation value left for the second object: only that cell is neutralised.
    let named = report.table.get(&ObjectNumber::String("2015AB".into())).unwrap();
    assert_eq!(named.sigma(&Attribute::Elong), Some(0.0));
    assert_ne!(named.sigma(&Attribute::RealBogus), Some(0.0));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].object, ObjectNumber::String("2015AB".into()));
    assert!(matches!(
        report.warnings[0].error,
        SnapsError::InsufficientData { count: 1, .. }
    ));
}

#[test]
fn test_sparse_magnitude_column_keeps_the_object() {
    // H was only measured on one of five detections.
    let file = write_csv(&[
        "1465,2460000.5,0,c0,1,1.0,0.90,,0.50",
        "1465,2460001.5,1,c1,2,1.2,0.91,15.3,0.51",
        "1465,2460002.5,2,c2,1,1.1,0.93,,0.49",
        "1465,2460003.5,3,c3,1,1.3,0.92,,0.52",
        "1465,2460004.5,4,c4,2,9.0,0.30,,1.90",
    ]);
    let set = SeriesSet::new_from_csv(utf8(&file), &Attribute::defaults()).unwrap();
    let report = set.score_all(&ScoringParams::default()).unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.table.len(), 1);
    let row = report.table.get(&ObjectNumber::Int(1465)).unwrap();
    assert_eq!(row.sigma(&Attribute::AbsMagnitude), Some(0.0));
    assert_eq!(row.cell(&Attribute::Elong).unwrap().source_id(), Some("c4"));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].attribute, Attribute::AbsMagnitude);
}

#[test]
fn test_add_from_csv_appends_to_existing_series() {
    let first = write_csv(&["7,2460000.5,0,a,1,1.0,0.9,15.0,0.5"]);
    let second = write_csv(&[
        "7,2460002.5,2,c,1,1.2,0.9,15.0,0.5",
        "7,2460001.5,1,b,1,1.1,0.9,15.0,0.5",
    ]);

    let mut set = SeriesSet::new_from_csv(utf8(&first), &Attribute::defaults()).unwrap();
    let added = set.add_from_csv(utf8(&second), &Attribute::defaults()).unwrap();
    assert_eq!(added, 2);

    let ids: Vec<_> = set[&ObjectNumber::Int(7)]
        .iter()
        .map(|o| o.source_id.clone())
        .collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[test]
fn test_header_without_attribute_column_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ssnamenr,jd,night,id,fid,elong").unwrap();
    writeln!(file, "1,2460000.5,0,a,1,1.0").unwrap();
    file.flush().unwrap();

    let err = SeriesSet::new_from_csv(utf8(&file), &Attribute::defaults()).unwrap_err();
    assert!(matches!(err, SnapsError::SchemaError(_)));
}
