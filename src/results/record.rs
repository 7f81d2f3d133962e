// One CSV row of a benchmark result file: per-query counters plus the encoded columns.
use serde::Deserialize;

use crate::core::actions::{ActionLog, decode_actions};
use crate::core::benefit_cost::{BenefitCosts, decode_benefit_cost};
use crate::core::hits::{SearchHit, decode_search_hits};
use crate::core::scan::MalformedRecordError;

/// Durations are milliseconds. Columns only some algorithms fill default to zero or empty.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ExperimentResult {
    pub query_id: u64,
    pub query_size: u64,
    pub query_num_token: u64,
    pub num_result: u64,
    pub duration: u64,
    #[serde(default)]
    pub preproc_duration: u64,
    pub num_set_read: u64,
    pub num_list_read: u64,
    #[serde(default)]
    pub num_byte_read: u64,
    pub max_set_size_read: u64,
    pub max_list_size_read: u64,
    pub max_counter_size: u64,
    pub max_ignore_size: u64,
    #[serde(default)]
    pub actions: String,
    #[serde(default)]
    pub results: String,
    #[serde(default)]
    pub benefit_cost: String,
    #[serde(default)]
    pub lsh_duration: u64,
    #[serde(default)]
    pub lsh_precision: f64,
}

impl ExperimentResult {
    pub fn decode_actions(&self) -> Result<ActionLog, MalformedRecordError> {
        decode_actions(&self.actions)
    }

    pub fn decode_results(&self) -> Result<Vec<SearchHit>, MalformedRecordError> {
        decode_search_hits(&self.results)
    }

    pub fn decode_benefit_cost(&self) -> Result<BenefitCosts, MalformedRecordError> {
        decode_benefit_cost(&self.benefit_cost)
    }
}

/// The encoded columns a table can be decoded by.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Column {
    Actions,
    Results,
    BenefitCost,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::Actions => "actions",
            Column::Results => "results",
            Column::BenefitCost => "benefit_cost",
        }
    }

    pub fn text(self, row: &ExperimentResult) -> &str {
        match self {
            Column::Actions => &row.actions,
            Column::Results => &row.results,
            Column::BenefitCost => &row.benefit_cost,
        }
    }
}
