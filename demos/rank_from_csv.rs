//! Rank the objects of a survey CSV export and optionally narrow the table.
//!
//! ```text
//! cargo run --example rank_from_csv -- obs.csv [min-rating=90 | occurrence=2] [column=low..high ...]
//! ```
//!
//! Set `RUST_LOG=snaps=debug` to see per-object warnings as they happen.
use std::process::ExitCode;

use camino::Utf8PathBuf;
use tracing_subscriber::EnvFilter;

use snaps::observations::Attribute;
use snaps::scoring::ScoringParams;
use snaps::table::Column;
use snaps::{FilterPolicy, RangeFilter, SeriesFile, SeriesScoring, SeriesSet, SnapsError};

fn parse_policy(arg: &str) -> Option<Result<FilterPolicy, SnapsError>> {
    let (name, value) = arg.split_once('=')?;
    let bad = || SnapsError::InvalidParameter(format!("cannot parse policy '{arg}'"));
    let policy = match name {
        "min-rating" => value
            .parse()
            .map(|threshold| FilterPolicy::RatingThreshold { threshold })
            .map_err(|_| bad()),
        "occurrence" => value
            .parse()
            .map(|threshold| FilterPolicy::OccurrenceCount { threshold })
            .map_err(|_| bad()),
        _ => return None,
    };
    Some(policy)
}

fn parse_range(arg: &str) -> Result<RangeFilter, SnapsError> {
    let bad = || SnapsError::InvalidParameter(format!("cannot parse range '{arg}'"));
    let (column, bounds) = arg.split_once('=').ok_or_else(bad)?;
    let (low, high) = bounds.split_once("..").ok_or_else(bad)?;
    let bound = |s: &str, default: f64| {
        if s.is_empty() {
            Ok(default)
        } else {
            s.parse::<f64>().map_err(|_| bad())
        }
    };
    RangeFilter::new(
        column.parse::<Column>()?,
        bound(low, f64::NEG_INFINITY)?,
        bound(high, f64::INFINITY)?,
    )
}

fn run() -> Result<(), SnapsError> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .map(Utf8PathBuf::from)
        .ok_or_else(|| SnapsError::InvalidParameter("usage: rank_from_csv <file.csv> ...".into()))?;

    let mut builder = ScoringParams::builder();
    let mut ranges = Vec::new();
    for arg in args {
        match parse_policy(&arg) {
            Some(policy) => builder = builder.filter(policy?),
            None => ranges.push(parse_range(&arg)?),
        }
    }
    let params = builder.build()?;
    println!("{params:#}");

    let set = SeriesSet::new_from_csv(&path, &Attribute::defaults())?;
    println!("{:#}", set.coverage(&params));

    let report = set.score_all(&params)?;
    println!("{report:#}");

    let mut session = report.into_session();
    for range in ranges {
        match session.apply_batch(range) {
            Ok(remaining) => println!("{} rows after filter", remaining),
            Err(e @ SnapsError::EmptyFilterResult { .. }) => eprintln!("{e}, filter skipped"),
            Err(e) => return Err(e),
        }
    }
    println!("{}", session.finish()?.ranked());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
