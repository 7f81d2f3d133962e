// Benefit/cost column: four tagged integers per step of the cost-model search.
use serde::Serialize;

use crate::core::scan::{Encoding, FieldCursor, MalformedRecordError};

/// Decoded `benefit_cost` column, one index per recorded step.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BenefitCosts {
    pub list_benefits: Vec<u64>,
    pub list_costs: Vec<u64>,
    pub set_benefits: Vec<u64>,
    pub set_costs: Vec<u64>,
}

/// One repetition unit of the encoding.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BenefitCostGroup {
    pub list_benefit: u64,
    pub list_cost: u64,
    pub set_benefit: u64,
    pub set_cost: u64,
}

impl BenefitCosts {
    pub fn len(&self) -> usize {
        self.list_benefits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list_benefits.is_empty()
    }

    pub fn push(&mut self, group: BenefitCostGroup) {
        self.list_benefits.push(group.list_benefit);
        self.list_costs.push(group.list_cost);
        self.set_benefits.push(group.set_benefit);
        self.set_costs.push(group.set_cost);
    }

    pub fn groups(&self) -> impl Iterator<Item = BenefitCostGroup> + '_ {
        (0..self.len()).map(|idx| BenefitCostGroup {
            list_benefit: self.list_benefits[idx],
            list_cost: self.list_costs[idx],
            set_benefit: self.set_benefits[idx],
            set_cost: self.set_costs[idx],
        })
    }
}

/// Decode a `benefit_cost` string.
///
/// Tag bytes are positional and their values are not checked: the harness
/// writes `l<b>c<c>s<b>c<c>`, but `b1c2b3c4` decodes the same way.
pub fn decode_benefit_cost(input: &str) -> Result<BenefitCosts, MalformedRecordError> {
    let mut cursor = FieldCursor::new(input, Encoding::BenefitCost);
    let mut decoded = BenefitCosts::default();
    while !cursor.is_exhausted() {
        let group = BenefitCostGroup {
            list_benefit: cursor.read_group_field()?,
            list_cost: cursor.read_group_field()?,
            set_benefit: cursor.read_group_field()?,
            set_cost: cursor.read_group_field()?,
        };
        decoded.push(group);
    }
    Ok(decoded)
}

pub fn encode_benefit_cost(groups: &[BenefitCostGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str(&format!(
            "l{}c{}s{}c{}",
            group.list_benefit, group.list_cost, group.set_benefit, group.set_cost
        ));
    }
    out
}
