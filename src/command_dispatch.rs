//! Purpose: Hold top-level CLI command dispatch for `setsim-results`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command emits exactly one JSON document on stdout on success.
//! Invariants: Library modules hold the business logic; this file only wires and shapes output.
use std::collections::HashMap;

use setsim_results::core::actions::decode_actions;
use setsim_results::core::benefit_cost::decode_benefit_cost;
use setsim_results::core::cost::CostModel;
use setsim_results::core::hits::{SearchHit, decode_search_hits, precision};
use setsim_results::notice::skipped_row_notice;
use setsim_results::results::layout::ResultLayout;
use setsim_results::results::load::{
    ErrorPolicy, LabeledPath, LoadOptions, RowFailure, decode_column, read_multi_results,
    read_result,
};
use setsim_results::results::record::Column;
use setsim_results::results::stats::{
    IntervalAxis, QueryInterval, duration_improvement, query_size_intervals, summarize,
};

use super::*;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "setsim-results", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_json(json!({
                "name": "setsim-results",
                "version": env!("CARGO_PKG_VERSION"),
            }));
            Ok(RunOutcome::ok())
        }
        Command::Decode { target } => {
            let value = match target {
                DecodeTarget::Actions { encoded } => to_json(&decode_actions(&encoded)?)?,
                DecodeTarget::BenefitCost { encoded } => {
                    to_json(&decode_benefit_cost(&encoded)?)?
                }
                DecodeTarget::Hits { encoded } => to_json(&decode_search_hits(&encoded)?)?,
            };
            emit_json(value);
            Ok(RunOutcome::ok())
        }
        Command::Cost { encoded } => {
            let log = decode_actions(&encoded)?;
            let cost = CostModel::default().estimate(&log);
            let mut value = to_json(&cost)?;
            value["total_cost"] = json!(cost.total());
            emit_json(value);
            Ok(RunOutcome::ok())
        }
        Command::Summarize {
            inputs,
            measure,
            aggregate,
            intervals,
        } => {
            let intervals = intervals.build()?;
            let mut summaries = Vec::with_capacity(inputs.len());
            for input in &inputs {
                let input = LabeledPath::parse(input)?;
                let table = read_result(&input.path, &input.label)?;
                let summary = summarize(&table, measure.into(), aggregate.into(), &intervals)?;
                summaries.push(to_json(&summary)?);
            }
            emit_json(json!({
                "axis": to_json(&IntervalAxis::new(&intervals))?,
                "summaries": summaries,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Actions {
            inputs,
            errors,
            quiet_skips,
        } => {
            let inputs = inputs
                .iter()
                .map(|input| LabeledPath::parse(input))
                .collect::<Result<Vec<_>, _>>()?;
            let options = LoadOptions {
                decode_actions: true,
                errors: errors.into(),
            };
            let time = notice_time_now().unwrap_or_default();
            let multi = read_multi_results(&inputs, &options, |failure| {
                if !quiet_skips {
                    emit_notice(&skipped_row_notice("actions", time.clone(), &failure));
                }
            })?;

            let model = CostModel::default();
            let mut tables = Vec::with_capacity(multi.tables.len());
            for (table, decoded) in multi.tables.iter().zip(&multi.actions) {
                let mut list_reads = 0u64;
                let mut set_reads = 0u64;
                let mut estimated_cost = 0.0f64;
                for row in &decoded.rows {
                    list_reads += row.value.lists_read.len() as u64;
                    set_reads += row.value.sets_read.len() as u64;
                    estimated_cost += model.estimate(&row.value).total();
                }
                let decoded_rows = decoded.rows.len();
                let mean = |total: f64| {
                    if decoded_rows == 0 {
                        Value::Null
                    } else {
                        json!(total / decoded_rows as f64)
                    }
                };
                tables.push(json!({
                    "label": table.label,
                    "path": table.path.display().to_string(),
                    "queries": table.len(),
                    "decoded": decoded_rows,
                    "failed": decoded.failed,
                    "list_reads": list_reads,
                    "set_reads": set_reads,
                    "mean_list_reads": mean(list_reads as f64),
                    "mean_set_reads": mean(set_reads as f64),
                    "mean_estimated_cost_ns": mean(estimated_cost),
                }));
            }
            emit_json(json!({
                "tables": tables,
                "common_queries": multi.common_query_ids.len(),
            }));
            Ok(RunOutcome::ok())
        }
        Command::Improvement {
            baseline,
            variant,
            intervals,
        } => {
            let intervals = intervals.build()?;
            let baseline = LabeledPath::parse(&baseline)?;
            let variant = LabeledPath::parse(&variant)?;
            let baseline = read_result(&baseline.path, &baseline.label)?;
            let variant = read_result(&variant.path, &variant.label)?;
            let improvement = duration_improvement(&baseline, &variant);
            emit_json(json!({
                "baseline": baseline.label,
                "variant": variant.label,
                "joined_queries": improvement.query_ids.len(),
                "points": to_json(&improvement.on_intervals(&intervals)?)?,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Precision {
            results,
            ground_truth,
            errors,
        } => {
            let policy: ErrorPolicy = errors.into();
            let results = LabeledPath::parse(&results)?;
            let truth = LabeledPath::parse(&ground_truth)?;
            let results = read_result(&results.path, &results.label)?;
            let truth = read_result(&truth.path, &truth.label)?;
            let time = notice_time_now().unwrap_or_default();
            let mut on_failure = |failure: RowFailure| {
                emit_notice(&skipped_row_notice("precision", time.clone(), &failure));
            };
            let found = decode_column(
                &results,
                Column::Results,
                decode_search_hits,
                policy,
                &mut on_failure,
            )?;
            let expected = decode_column(
                &truth,
                Column::Results,
                decode_search_hits,
                policy,
                &mut on_failure,
            )?;
            let expected: HashMap<u64, Vec<SearchHit>> = expected
                .rows
                .into_iter()
                .map(|row| (row.query_id, row.value))
                .collect();

            let mut per_query = Vec::new();
            let mut sum = 0.0f64;
            for row in &found.rows {
                let Some(truth_hits) = expected.get(&row.query_id) else {
                    continue;
                };
                let p = precision(&row.value, truth_hits);
                sum += p;
                per_query.push(json!({ "query_id": row.query_id, "precision": p }));
            }
            let mean = if per_query.is_empty() {
                Value::Null
            } else {
                json!(sum / per_query.len() as f64)
            };
            emit_json(json!({
                "label": results.label,
                "ground_truth": truth.label,
                "queries": per_query.len(),
                "mean_precision": mean,
                "per_query": per_query,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Locate {
            result_dir,
            benchmark,
            scale,
            algorithm,
            query_scale,
            k,
        } => {
            let layout = ResultLayout {
                result_dir,
                benchmark,
                scale,
            };
            let path = layout.path(&algorithm, &query_scale, k)?;
            emit_json(json!({
                "algorithm": algorithm,
                "path": path.display().to_string(),
                "exists": path.exists(),
            }));
            Ok(RunOutcome::ok())
        }
    }
}

impl IntervalArgs {
    fn build(self) -> Result<Vec<QueryInterval>, Error> {
        query_size_intervals(self.max_query_size, self.count)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output")
            .with_source(err)
    })
}
