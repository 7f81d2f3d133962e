//! Purpose: Descriptive statistics over result tables, bucketed by query size.
//! Exports: `QueryInterval`, `IntervalAxis`, `IntervalPoint`, `Aggregate`, `Measure`,
//! `MeasureSummary`, `DurationImprovement`, `query_size_intervals`, `aggregate_on_intervals`,
//! `memory_footprint`, `duration_improvement`, `summarize`.
//! Role: Produces the numbers the benchmark charts are drawn from; rendering stays external.
//! Invariants: Intervals are half-open `[lo, hi)` over `query_num_token`.
//! Invariants: An empty bucket aggregates to `None`, never to zero.
//! Invariants: Standard deviation is the population form (divide by n).
use std::collections::HashMap;

use serde::Serialize;

use crate::core::error::{Error, ErrorKind};
use crate::results::layout::AlgorithmFamily;
use crate::results::load::ResultTable;
use crate::results::record::ExperimentResult;

const FIRST_INTERVAL_LO: u64 = 10;
const BYTES_PER_SLOT: f64 = 4.0;
/// Upper bound on the interval count.
pub const MAX_INTERVALS: u64 = 10_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct QueryInterval {
    pub lo: u64,
    pub hi: u64,
}

impl QueryInterval {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.lo as f64 && x < self.hi as f64
    }

    pub fn midpoint(&self) -> f64 {
        (self.lo + self.hi) as f64 / 2.0
    }
}

/// `count` buckets of width `max_query_size / count`; the first starts at 10 tokens.
pub fn query_size_intervals(max_query_size: u64, count: u64) -> Result<Vec<QueryInterval>, Error> {
    if count == 0 {
        return Err(Error::new(ErrorKind::Usage).with_message("interval count must be positive"));
    }
    if count > MAX_INTERVALS {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("interval count {count} exceeds {MAX_INTERVALS}"))
            .with_hint("Lower --intervals."));
    }
    let width = max_query_size / count;
    if width == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!(
                "max query size {max_query_size} is too small for {count} intervals"
            ))
            .with_hint("Lower --intervals or raise --max-query-size."));
    }
    let intervals = (0..count)
        .map(|i| QueryInterval {
            lo: if i == 0 { FIRST_INTERVAL_LO } else { width * i },
            hi: width * (i + 1),
        })
        .collect();
    Ok(intervals)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntervalAxis {
    pub midpoints: Vec<f64>,
    pub ticks: Vec<u64>,
}

impl IntervalAxis {
    pub fn new(intervals: &[QueryInterval]) -> Self {
        let midpoints = intervals.iter().map(QueryInterval::midpoint).collect();
        let ticks = intervals
            .first()
            .map(|first| first.lo)
            .into_iter()
            .chain(intervals.iter().map(|interval| interval.hi))
            .collect();
        Self { midpoints, ticks }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Mean,
    Std,
}

impl Aggregate {
    pub fn name(self) -> &'static str {
        match self {
            Aggregate::Mean => "mean",
            Aggregate::Std => "std",
        }
    }

    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        match self {
            Aggregate::Mean => Some(mean),
            Aggregate::Std => {
                let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                Some(variance.sqrt())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntervalPoint {
    pub lo: u64,
    pub hi: u64,
    pub midpoint: f64,
    pub count: usize,
    pub value: Option<f64>,
}

pub fn aggregate_on_intervals(
    xs: &[f64],
    ys: &[f64],
    intervals: &[QueryInterval],
    aggregate: Aggregate,
) -> Result<Vec<IntervalPoint>, Error> {
    if xs.len() != ys.len() {
        return Err(Error::new(ErrorKind::Internal).with_message(format!(
            "x/y length mismatch ({} vs {})",
            xs.len(),
            ys.len()
        )));
    }
    let points = intervals
        .iter()
        .map(|interval| {
            let bucket: Vec<f64> = xs
                .iter()
                .zip(ys)
                .filter(|(x, _)| interval.contains(**x))
                .map(|(_, y)| *y)
                .collect();
            IntervalPoint {
                lo: interval.lo,
                hi: interval.hi,
                midpoint: interval.midpoint(),
                count: bucket.len(),
                value: aggregate.apply(&bucket),
            }
        })
        .collect();
    Ok(points)
}

/// Per-query quantities that can be summarized over query-size intervals.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Seconds.
    Duration,
    NumSetRead,
    NumListRead,
    MaxCounterSize,
    MaxSetSizeRead,
    MaxListSizeRead,
    MaxIgnoreSize,
    /// Kilobytes, see [`memory_footprint`].
    MemoryFootprint,
    LshPrecision,
}

impl Measure {
    pub fn name(self) -> &'static str {
        match self {
            Measure::Duration => "duration",
            Measure::NumSetRead => "num_set_read",
            Measure::NumListRead => "num_list_read",
            Measure::MaxCounterSize => "max_counter_size",
            Measure::MaxSetSizeRead => "max_set_size_read",
            Measure::MaxListSizeRead => "max_list_size_read",
            Measure::MaxIgnoreSize => "max_ignore_size",
            Measure::MemoryFootprint => "memory_footprint",
            Measure::LshPrecision => "lsh_precision",
        }
    }

    pub fn values(self, rows: &[ExperimentResult], family: AlgorithmFamily) -> Vec<f64> {
        let column = |f: fn(&ExperimentResult) -> f64| -> Vec<f64> { rows.iter().map(f).collect() };
        match self {
            Measure::Duration => column(|row| row.duration as f64 / 1000.0),
            Measure::NumSetRead => column(|row| row.num_set_read as f64),
            Measure::NumListRead => column(|row| row.num_list_read as f64),
            Measure::MaxCounterSize => column(|row| row.max_counter_size as f64),
            Measure::MaxSetSizeRead => column(|row| row.max_set_size_read as f64),
            Measure::MaxListSizeRead => column(|row| row.max_list_size_read as f64),
            Measure::MaxIgnoreSize => column(|row| row.max_ignore_size as f64),
            Measure::MemoryFootprint => memory_footprint(rows, family),
            Measure::LshPrecision => column(|row| row.lsh_precision),
        }
    }
}

/// Peak working memory per query in KB, counting 4-byte slots per structure.
///
/// LSH result files never recorded ignore sizes; when the whole column is zero
/// the number of sets read stands in for it.
pub fn memory_footprint(rows: &[ExperimentResult], family: AlgorithmFamily) -> Vec<f64> {
    let ignores_missing = family == AlgorithmFamily::Lsh
        && rows.iter().all(|row| row.max_ignore_size == 0);
    rows.iter()
        .map(|row| {
            let ignores = if ignores_missing {
                row.num_set_read
            } else {
                row.max_ignore_size
            };
            let lists = row.max_list_size_read as f64;
            let counters = row.max_counter_size as f64;
            let mut slots = row.max_set_size_read as f64 + ignores as f64;
            slots += match family {
                AlgorithmFamily::MergeList => lists + counters * 2.0,
                AlgorithmFamily::ProbeSet => lists * 3.0,
                AlgorithmFamily::Josie => lists * 3.0 + counters * 5.0,
                AlgorithmFamily::Lsh | AlgorithmFamily::Other => 0.0,
            };
            slots * BYTES_PER_SLOT / 1024.0
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeasureSummary {
    pub label: String,
    pub family: AlgorithmFamily,
    pub measure: Measure,
    pub aggregate: Aggregate,
    pub queries: usize,
    pub points: Vec<IntervalPoint>,
}

pub fn summarize(
    table: &ResultTable,
    measure: Measure,
    aggregate: Aggregate,
    intervals: &[QueryInterval],
) -> Result<MeasureSummary, Error> {
    let family = table.family();
    let xs: Vec<f64> = table
        .rows
        .iter()
        .map(|row| row.query_num_token as f64)
        .collect();
    let ys = measure.values(&table.rows, family);
    Ok(MeasureSummary {
        label: table.label.clone(),
        family,
        measure,
        aggregate,
        queries: table.len(),
        points: aggregate_on_intervals(&xs, &ys, intervals, aggregate)?,
    })
}

/// Per-query duration change of `variant` relative to `baseline`, in percent plus one.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DurationImprovement {
    pub query_ids: Vec<u64>,
    pub query_sizes: Vec<f64>,
    pub improvements: Vec<f64>,
}

impl DurationImprovement {
    pub fn on_intervals(&self, intervals: &[QueryInterval]) -> Result<Vec<IntervalPoint>, Error> {
        aggregate_on_intervals(
            &self.query_sizes,
            &self.improvements,
            intervals,
            Aggregate::Mean,
        )
    }
}

/// Inner join on query id; queries with a zero baseline duration are left out.
pub fn duration_improvement(baseline: &ResultTable, variant: &ResultTable) -> DurationImprovement {
    let variant_durations: HashMap<u64, u64> = variant
        .rows
        .iter()
        .map(|row| (row.query_id, row.duration))
        .collect();
    let mut out = DurationImprovement::default();
    for row in &baseline.rows {
        let Some(&other) = variant_durations.get(&row.query_id) else {
            continue;
        };
        if row.duration == 0 {
            continue;
        }
        let base = row.duration as f64;
        out.query_ids.push(row.query_id);
        out.query_sizes.push(row.query_num_token as f64);
        out.improvements
            .push((base - other as f64) / base * 100.0 + 1.0);
    }
    out
}
