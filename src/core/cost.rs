//! Purpose: Evaluate the benchmark harness's linear read-cost functions.
//! Exports: `CostModel`, `ActionCost`.
//! Role: Attach an estimated I/O cost (nanoseconds) to a decoded action log.
//! Invariants: Every read costs at least `min_cost`; parameters are inputs, never fitted here.
use serde::Serialize;

use crate::core::actions::{Action, ActionLog};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostModel {
    pub list_slope: f64,
    pub list_intercept: f64,
    pub set_slope: f64,
    pub set_intercept: f64,
    pub min_cost: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            list_slope: 1661.93366983753,
            list_intercept: 1007857.48225696,
            set_slope: 1253.19054300781,
            set_intercept: -9423326.99507381,
            min_cost: 1_000_000.0,
        }
    }
}

impl CostModel {
    pub fn read_list_cost(&self, length: u64) -> f64 {
        (self.list_slope * length as f64 + self.list_intercept).max(self.min_cost)
    }

    pub fn read_set_cost(&self, size: u64) -> f64 {
        (self.set_slope * size as f64 + self.set_intercept).max(self.min_cost)
    }

    /// Cost saved by reading only `size - truncation` tokens of a set.
    pub fn read_set_cost_reduction(&self, size: u64, truncation: u64) -> f64 {
        self.read_set_cost(size) - self.read_set_cost(size.saturating_sub(truncation))
    }

    pub fn estimate(&self, log: &ActionLog) -> ActionCost {
        let mut cost = ActionCost::default();
        for action in &log.actions {
            match action {
                Action::ListRead { frequency, .. } => {
                    cost.list_reads += 1;
                    cost.list_cost += self.read_list_cost(*frequency);
                }
                Action::SetRead { size, .. } => {
                    cost.set_reads += 1;
                    cost.set_cost += self.read_set_cost(*size);
                }
            }
        }
        cost
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ActionCost {
    pub list_reads: u64,
    pub set_reads: u64,
    pub list_cost: f64,
    pub set_cost: f64,
}

impl ActionCost {
    pub fn total(&self) -> f64 {
        self.list_cost + self.set_cost
    }
}
