//! CSV bar loading.
//!
//! Expected header: `time,open,high,low,close[,volume]`. `time` may be RFC 3339,
//! `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` or unix seconds; naive times are UTC.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use harmonix_core::bars::BarSeries;
use harmonix_core::domain::{Bar, Timeframe};

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

pub fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc());
        }
    }
    if let Ok(secs) = s.parse::<i64>() {
        if let Some(t) = DateTime::from_timestamp(secs, 0) {
            return Ok(t);
        }
    }
    bail!("unrecognized timestamp '{s}'")
}

/// Load `path` into a validated series. Void rows (a NaN price) are skipped.
pub fn load_bars(path: &Path, timeframe: Timeframe) -> Result<BarSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut series = BarSeries::new(timeframe);
    let mut skipped = 0usize;
    for (row_no, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.with_context(|| format!("{}: bad row {}", path.display(), row_no + 1))?;
        let bar = Bar {
            open_time: parse_time(&row.time)
                .with_context(|| format!("{}: row {}", path.display(), row_no + 1))?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        };
        if bar.is_void() {
            skipped += 1;
            continue;
        }
        series
            .push(bar)
            .with_context(|| format!("{}: row {}", path.display(), row_no + 1))?;
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "void bars skipped");
    }
    debug!(path = %path.display(), bars = series.len(), "bars loaded");
    Ok(series)
}
