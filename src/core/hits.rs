// Top-k search hits stored in the `results` column as `s<set_id>o<overlap>` pairs.
use serde::Serialize;

use crate::core::scan::{Encoding, FieldCursor, MalformedRecordError};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct SearchHit {
    pub set_id: u64,
    pub overlap: u64,
}

pub fn decode_search_hits(input: &str) -> Result<Vec<SearchHit>, MalformedRecordError> {
    let mut cursor = FieldCursor::new(input, Encoding::SearchHits);
    let mut hits = Vec::new();
    while !cursor.is_exhausted() {
        let set_id = cursor.read_group_field()?;
        let overlap = cursor.read_group_field()?;
        hits.push(SearchHit { set_id, overlap });
    }
    Ok(hits)
}

pub fn encode_search_hits(hits: &[SearchHit]) -> String {
    let mut out = String::new();
    for hit in hits {
        out.push_str(&format!("s{}o{}", hit.set_id, hit.overlap));
    }
    out
}

/// Fraction of `results` whose overlap also appears in `ground_truth`.
///
/// Both lists must be ordered by overlap, largest first. Matching is by overlap
/// value only, so ties between different sets count as correct.
pub fn precision(results: &[SearchHit], ground_truth: &[SearchHit]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let mut correct = 0usize;
    let (mut i, mut j) = (0usize, 0usize);
    while i < results.len() && j < ground_truth.len() {
        let found = results[i].overlap;
        let expected = ground_truth[j].overlap;
        if found == expected {
            correct += 1;
            i += 1;
            j += 1;
        } else if found < expected {
            j += 1;
        } else {
            i += 1;
        }
    }
    correct as f64 / results.len() as f64
}
