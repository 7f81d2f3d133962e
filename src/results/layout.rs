//! Purpose: Name the benchmarked algorithms and locate their result files.
//! Exports: `Algorithm`, `AlgorithmFamily`, `KNOWN_ALGORITHMS`, `find_algorithm`, `ResultLayout`.
//! Role: Shared mapping between display labels, result directories and footprint families.
//! Invariants: Paths follow `<dir>/<benchmark>/<scale>/<algorithm dir>/<query_scale>_<k>.csv`.
//! Invariants: MergeList variants are only run at k = 10.
use std::path::PathBuf;

use serde::Serialize;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Algorithm {
    pub label: &'static str,
    pub dir_name: &'static str,
}

pub const KNOWN_ALGORITHMS: &[Algorithm] = &[
    Algorithm {
        label: "MergeList-D",
        dir_name: "merge_distinct_list",
    },
    Algorithm {
        label: "ProbeSet-D",
        dir_name: "probe_set_optimized",
    },
    Algorithm {
        label: "MergeList",
        dir_name: "merge_list",
    },
    Algorithm {
        label: "ProbeSet",
        dir_name: "probe_set_suffix",
    },
    Algorithm {
        label: "JOSIE-D",
        dir_name: "merge_probe_cost_model_greedy",
    },
    Algorithm {
        label: "LSHEnsemble-60",
        dir_name: "lsh_ensemble_precision_60",
    },
    Algorithm {
        label: "LSHEnsemble-90",
        dir_name: "lsh_ensemble_precision_90",
    },
    Algorithm {
        label: "MinHashLSH",
        dir_name: "lsh_ensemble_partition_1",
    },
    Algorithm {
        label: "LSHEnsemble (4)",
        dir_name: "lsh_ensemble_partition_4",
    },
    Algorithm {
        label: "LSHEnsemble (8)",
        dir_name: "lsh_ensemble_partition_8",
    },
    Algorithm {
        label: "LSHEnsemble (16)",
        dir_name: "lsh_ensemble_partition_16",
    },
    Algorithm {
        label: "LSHEnsemble (32)",
        dir_name: "lsh_ensemble_partition_32",
    },
];

/// Look up by display label or by result directory name.
pub fn find_algorithm(name: &str) -> Option<&'static Algorithm> {
    KNOWN_ALGORITHMS
        .iter()
        .find(|algorithm| algorithm.label == name || algorithm.dir_name == name)
}

impl Algorithm {
    pub fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::from_label(self.label)
    }
}

/// Groups algorithms by the in-memory structures they allocate per query.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmFamily {
    MergeList,
    ProbeSet,
    Josie,
    Lsh,
    Other,
}

impl AlgorithmFamily {
    /// Prefix match on the display label, so `MinHashLSH` is `Other`.
    pub fn from_label(label: &str) -> Self {
        if label.starts_with("MergeList") {
            AlgorithmFamily::MergeList
        } else if label.starts_with("ProbeSet") {
            AlgorithmFamily::ProbeSet
        } else if label.starts_with("JOSIE") {
            AlgorithmFamily::Josie
        } else if label.starts_with("LSH") {
            AlgorithmFamily::Lsh
        } else {
            AlgorithmFamily::Other
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResultLayout {
    pub result_dir: PathBuf,
    pub benchmark: String,
    pub scale: u32,
}

impl Default for ResultLayout {
    fn default() -> Self {
        Self {
            result_dir: PathBuf::from("results"),
            benchmark: "canada_us_uk".to_string(),
            scale: 100,
        }
    }
}

impl ResultLayout {
    pub fn path(&self, algorithm: &str, query_scale: &str, k: u32) -> Result<PathBuf, Error> {
        let algorithm = find_algorithm(algorithm).ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("unknown algorithm {algorithm:?}"))
                .with_hint(format!(
                    "Known algorithms: {}",
                    KNOWN_ALGORITHMS
                        .iter()
                        .map(|algorithm| algorithm.label)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
        })?;
        let k = if algorithm.family() == AlgorithmFamily::MergeList {
            10
        } else {
            k
        };
        Ok(self
            .result_dir
            .join(&self.benchmark)
            .join(self.scale.to_string())
            .join(algorithm.dir_name)
            .join(format!("{query_scale}_{k}.csv")))
    }
}

#[cfg(test)]
mod tests {
    use super::{AlgorithmFamily, ResultLayout, find_algorithm};
    use crate::core::error::ErrorKind;
    use std::path::PathBuf;

    #[test]
    fn lookup_by_label_or_dir() {
        let josie = find_algorithm("JOSIE-D").unwrap();
        assert_eq!(josie.dir_name, "merge_probe_cost_model_greedy");
        assert_eq!(find_algorithm("merge_probe_cost_model_greedy"), Some(josie));
        assert!(find_algorithm("Exhaustive").is_none());
    }

    #[test]
    fn families_follow_label_prefix() {
        assert_eq!(AlgorithmFamily::from_label("MergeList-D"), AlgorithmFamily::MergeList);
        assert_eq!(AlgorithmFamily::from_label("ProbeSet"), AlgorithmFamily::ProbeSet);
        assert_eq!(AlgorithmFamily::from_label("JOSIE-D"), AlgorithmFamily::Josie);
        assert_eq!(AlgorithmFamily::from_label("LSHEnsemble (8)"), AlgorithmFamily::Lsh);
        assert_eq!(AlgorithmFamily::from_label("MinHashLSH"), AlgorithmFamily::Other);
    }

    #[test]
    fn path_uses_directory_convention() {
        let layout = ResultLayout {
            result_dir: PathBuf::from("/data/results"),
            benchmark: "webtable".to_string(),
            scale: 100,
        };
        let path = layout.path("ProbeSet-D", "1k", 20).unwrap();
        assert_eq!(
            path,
            PathBuf::from("/data/results/webtable/100/probe_set_optimized/1k_20.csv")
        );
    }

    #[test]
    fn merge_list_is_pinned_to_k_10() {
        let path = ResultLayout::default().path("MergeList-D", "10k", 5).unwrap();
        assert!(path.ends_with("merge_distinct_list/10k_10.csv"));
    }

    #[test]
    fn unknown_algorithm_is_usage_error() {
        let err = ResultLayout::default().path("Nope", "1k", 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().unwrap().contains("JOSIE-D"));
    }
}
