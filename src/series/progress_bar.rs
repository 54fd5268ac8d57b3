//! Progress bar and iteration timing for batch scoring (feature `progress`).
//!
//! * [`new_bar`] – bar with the crate's template and a steady tick.
//! * [`IterTimer`] – per-iteration durations smoothed by an exponential moving average,
//!   `ema ← α·dt + (1 − α)·ema`, seeded with the first sample.
//! * [`fmt_dur`] – short human-readable durations (`"253µs"`, `"42ms"`, `"3.14s"`).
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | {per_sec} | ETA {eta_precise} | {msg}";

pub(crate) fn new_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new((total as u64).max(1));
    let style = ProgressStyle::with_template(TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}

pub(crate) struct IterTimer {
    last: Instant,
    ema_ns: f64,
    alpha: f64,
    samples: u64,
}

impl IterTimer {
    pub(crate) fn new(alpha: f64) -> Self {
        IterTimer {
            last: Instant::now(),
            ema_ns: 0.0,
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            samples: 0,
        }
    }

    /// Close the current iteration and return its duration.
    pub(crate) fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        self.samples += 1;

        let dt_ns = dt.as_nanos() as f64;
        self.ema_ns = if self.samples == 1 {
            dt_ns
        } else {
            self.alpha * dt_ns + (1.0 - self.alpha) * self.ema_ns
        };
        dt
    }

    pub(crate) fn avg(&self) -> Duration {
        Duration::from_nanos(self.ema_ns as u64)
    }
}

pub(crate) fn fmt_dur(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}µs"),
        us if us < 1_000_000 => format!("{}ms", us / 1_000),
        _ => format!("{:.2}s", d.as_secs_f32()),
    }
}
