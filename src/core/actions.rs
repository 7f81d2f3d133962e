//! Purpose: Decode and encode the per-query `actions` column.
//! Exports: `Action`, `ActionLog`, `decode_actions`, `encode_actions`.
//! Role: Turns the harness's compact list/set read log into typed records.
//! Invariants: `l<freq>` optionally followed by `o<overlap>`; `s<size>` always followed by a
//! one-byte separator and `<overlap>`.
//! Invariants: `overlaps` only collects set-read overlaps; list-read overlaps stay on the record.
use serde::Serialize;

use crate::core::scan::{Encoding, FieldCursor, MalformedReason, MalformedRecordError};

const LIST_TAG: u8 = b'l';
const SET_TAG: u8 = b's';
const OVERLAP_TAG: u8 = b'o';

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// A posting list of `frequency` entries was read.
    ListRead { frequency: u64, overlap: Option<u64> },
    /// A candidate set of `size` tokens was read and its overlap computed.
    SetRead { size: u64, overlap: u64 },
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ActionLog {
    pub actions: Vec<Action>,
    pub lists_read: Vec<u64>,
    pub sets_read: Vec<u64>,
    pub overlaps: Vec<u64>,
}

impl ActionLog {
    pub fn push(&mut self, action: Action) {
        match action {
            Action::ListRead { frequency, .. } => self.lists_read.push(frequency),
            Action::SetRead { size, overlap } => {
                self.sets_read.push(size);
                self.overlaps.push(overlap);
            }
        }
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

pub fn decode_actions(input: &str) -> Result<ActionLog, MalformedRecordError> {
    let mut cursor = FieldCursor::new(input, Encoding::Actions);
    let mut log = ActionLog::default();
    while let Some(tag) = cursor.peek() {
        let start = cursor.position();
        let action = match tag {
            LIST_TAG => {
                let frequency = cursor.read_field()?.value;
                let overlap = if cursor.peek() == Some(OVERLAP_TAG) {
                    Some(cursor.read_field()?.value)
                } else {
                    None
                };
                Action::ListRead { frequency, overlap }
            }
            SET_TAG => {
                let size = cursor.read_field()?.value;
                // The separator is consumed as a tag whatever its value.
                let overlap = cursor.read_group_field()?;
                Action::SetRead { size, overlap }
            }
            other => {
                let tag = cursor.peek_char().unwrap_or(char::from(other));
                return Err(cursor.error_at(start, MalformedReason::UnknownTag(tag)));
            }
        };
        log.push(action);
    }
    Ok(log)
}

pub fn encode_actions(actions: &[Action]) -> String {
    let mut out = String::new();
    for action in actions {
        match action {
            Action::ListRead {
                frequency,
                overlap: Some(overlap),
            } => out.push_str(&format!("l{frequency}o{overlap}")),
            Action::ListRead {
                frequency,
                overlap: None,
            } => out.push_str(&format!("l{frequency}")),
            Action::SetRead { size, overlap } => out.push_str(&format!("s{size}o{overlap}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{Action, decode_actions, encode_actions};
    use crate::core::scan::MalformedReason;

    #[test]
    fn empty_input_yields_empty_log() {
        let log = decode_actions("").unwrap();
        assert!(log.actions.is_empty());
        assert!(log.lists_read.is_empty());
        assert!(log.sets_read.is_empty());
        assert!(log.overlaps.is_empty());
    }

    #[test]
    fn list_read_with_overlap() {
        let log = decode_actions("l5o2").unwrap();
        assert_eq!(
            log.actions,
            vec![Action::ListRead {
                frequency: 5,
                overlap: Some(2)
            }]
        );
        assert_eq!(log.lists_read, vec![5]);
        assert!(log.sets_read.is_empty());
        assert!(log.overlaps.is_empty());
    }

    #[test]
    fn list_read_without_overlap() {
        let log = decode_actions("l5").unwrap();
        assert_eq!(
            log.actions,
            vec![Action::ListRead {
                frequency: 5,
                overlap: None
            }]
        );
        assert_eq!(log.lists_read, vec![5]);
    }

    #[test]
    fn set_read_reads_size_then_overlap() {
        let log = decode_actions("s10o20").unwrap();
        assert_eq!(
            log.actions,
            vec![Action::SetRead {
                size: 10,
                overlap: 20
            }]
        );
        assert_eq!(log.sets_read, vec![10]);
        assert_eq!(log.overlaps, vec![20]);
    }

    #[test]
    fn set_read_without_separator_cannot_split_digits() {
        // Digit runs are greedy: the size takes all of "1020" and no overlap remains.
        let err = decode_actions("s1020").unwrap_err();
        assert_eq!(err.reason(), MalformedReason::TruncatedGroup);
        assert_eq!(err.offset(), 5);
    }

    #[test]
    fn empty_overlap_after_list_is_malformed() {
        let err = decode_actions("l3os7").unwrap_err();
        assert_eq!(err.reason(), MalformedReason::MissingValue);
        assert_eq!(err.offset(), 3);
        assert_eq!(err.input(), "l3os7");
    }

    #[test]
    fn unknown_leading_tag_is_malformed() {
        let err = decode_actions("l1x4").unwrap_err();
        assert_eq!(err.reason(), MalformedReason::UnknownTag('x'));
        assert_eq!(err.offset(), 2);

        let err = decode_actions("7").unwrap_err();
        assert_eq!(err.reason(), MalformedReason::UnknownTag('7'));
    }

    #[test]
    fn unknown_tag_names_the_whole_character() {
        let err = decode_actions("é5").unwrap_err();
        assert_eq!(err.reason(), MalformedReason::UnknownTag('é'));
        assert_eq!(err.offset(), 0);

        let err = decode_actions("l1→2").unwrap_err();
        assert_eq!(err.reason(), MalformedReason::UnknownTag('→'));
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn mixed_log_keeps_order_and_overlap_asymmetry() {
        let log = decode_actions("l4s100o3l9o2s50o1l1").unwrap();
        assert_eq!(log.len(), 5);
        assert_eq!(log.lists_read, vec![4, 9, 1]);
        assert_eq!(log.sets_read, vec![100, 50]);
        assert_eq!(log.overlaps, vec![3, 1]);
    }

    #[test]
    fn encoded_actions_decode_back() {
        let actions = vec![
            Action::ListRead {
                frequency: 17,
                overlap: None,
            },
            Action::SetRead {
                size: 2048,
                overlap: 0,
            },
            Action::ListRead {
                frequency: 3,
                overlap: Some(12),
            },
        ];
        let log = decode_actions(&encode_actions(&actions)).unwrap();
        assert_eq!(log.actions, actions);
    }

    /// Deterministic 64-bit LCG (Knuth's MMIX constants).
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0
        }

        fn value(&mut self) -> u64 {
            match self.next() % 4 {
                0 => 0,
                1 => u64::MAX,
                2 => self.next() % 1000,
                _ => self.next(),
            }
        }

        fn action(&mut self) -> Action {
            match self.next() % 3 {
                0 => Action::ListRead {
                    frequency: self.value(),
                    overlap: None,
                },
                1 => Action::ListRead {
                    frequency: self.value(),
                    overlap: Some(self.value()),
                },
                _ => Action::SetRead {
                    size: self.value(),
                    overlap: self.value(),
                },
            }
        }
    }

    #[test]
    fn generated_action_logs_decode_back() {
        let mut rng = Lcg(0x5e75_1a11);
        for _ in 0..500 {
            let len = (rng.next() % 12) as usize;
            let actions: Vec<Action> = (0..len).map(|_| rng.action()).collect();
            let encoded = encode_actions(&actions);
            let log = decode_actions(&encoded).unwrap();
            assert_eq!(log.actions, actions, "encoded: {encoded}");

            let sets: Vec<u64> = actions
                .iter()
                .filter_map(|action| match action {
                    Action::SetRead { size, .. } => Some(*size),
                    Action::ListRead { .. } => None,
                })
                .collect();
            assert_eq!(log.sets_read, sets);
            assert_eq!(log.overlaps.len(), sets.len());
            assert_eq!(log.lists_read.len(), actions.len() - sets.len());
        }
    }

    #[test]
    fn runs_of_same_kind_decode_back() {
        let actions = vec![
            Action::SetRead {
                size: u64::MAX,
                overlap: 0,
            },
            Action::SetRead {
                size: 0,
                overlap: u64::MAX,
            },
            Action::ListRead {
                frequency: u64::MAX,
                overlap: Some(u64::MAX),
            },
            Action::ListRead {
                frequency: 0,
                overlap: Some(0),
            },
        ];
        let encoded = encode_actions(&actions);
        assert_eq!(
            encoded,
            format!("s{m}o0s0o{m}l{m}o{m}l0o0", m = u64::MAX)
        );
        assert_eq!(decode_actions(&encoded).unwrap().actions, actions);
    }

    #[test]
    fn set_read_serializes_with_kind() {
        let value = serde_json::to_value(Action::SetRead {
            size: 1,
            overlap: 2,
        })
        .unwrap();
        assert_eq!(value["kind"], "set_read");
        assert_eq!(value["size"], 1);
    }
}
