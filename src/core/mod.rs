// Core modules: compact column decoders, the read cost model and error modeling.
pub mod actions;
pub mod benefit_cost;
pub mod cost;
pub mod error;
pub mod hits;
pub mod scan;
