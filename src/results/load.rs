//! Purpose: Load benchmark result CSV files and decode their encoded columns row by row.
//! Exports: `ResultTable`, `LabeledPath`, `ErrorPolicy`, `LoadOptions`, `RowFailure`,
//! `DecodedRow`, `DecodedColumn`, `MultiResults`, `read_result`, `read_result_from_reader`,
//! `read_multi_results`, `decode_column`, `decode_actions_column`.
//! Role: Table-level glue between files on disk and the pure decoders in `core`.
//! Invariants: Queries with `num_result == 0` are dropped at load time.
//! Invariants: Decoding fans out across rows but results and failures keep row order.
//! Invariants: Skip mode isolates a malformed row; Stop mode reports the first one by row order.
use std::collections::BTreeSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::actions::{ActionLog, decode_actions};
use crate::core::error::{Error, ErrorKind};
use crate::core::scan::MalformedRecordError;
use crate::results::layout::AlgorithmFamily;
use crate::results::record::{Column, ExperimentResult};

#[derive(Clone, Debug)]
pub struct ResultTable {
    pub label: String,
    pub path: PathBuf,
    pub rows: Vec<ExperimentResult>,
}

impl ResultTable {
    pub fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::from_label(&self.label)
    }

    pub fn query_ids(&self) -> Vec<u64> {
        self.rows.iter().map(|row| row.query_id).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A result file named on the command line as `path[:label]`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LabeledPath {
    pub path: PathBuf,
    pub label: String,
}

impl LabeledPath {
    pub fn parse(input: &str) -> Result<Self, Error> {
        let (path, label) = match input.rsplit_once(':') {
            Some((path, label)) if !label.contains(['/', '\\']) => (path, Some(label)),
            _ => (input, None),
        };
        if path.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("missing path in {input:?}"))
                .with_hint("Use <path>[:<label>], e.g. results/1k_10.csv:JOSIE-D."));
        }
        let path = PathBuf::from(path);
        let label = match label.filter(|label| !label.is_empty()) {
            Some(label) => label.to_string(),
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        };
        Ok(Self { path, label })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorPolicy {
    Stop,
    Skip,
}

#[derive(Copy, Clone, Debug)]
pub struct LoadOptions {
    pub decode_actions: bool,
    pub errors: ErrorPolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            decode_actions: false,
            errors: ErrorPolicy::Stop,
        }
    }
}

/// A row dropped under `ErrorPolicy::Skip`.
#[derive(Clone, Debug)]
pub struct RowFailure {
    pub path: PathBuf,
    pub query_id: u64,
    pub column: Column,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedRow<T> {
    pub query_id: u64,
    pub value: T,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedColumn<T> {
    pub column: Column,
    pub rows: Vec<DecodedRow<T>>,
    pub failed: u64,
}

pub fn read_result(path: &Path, label: &str) -> Result<ResultTable, Error> {
    let file = std::fs::File::open(path).map_err(|err| open_error(err, path))?;
    read_result_from_reader(file, path, label)
}

pub fn read_result_from_reader<R: Read>(
    reader: R,
    path: &Path,
    label: &str,
) -> Result<ResultTable, Error> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    let mut total = 0usize;
    for record in reader.deserialize::<ExperimentResult>() {
        let row = record.map_err(|err| csv_error(err, path))?;
        total += 1;
        if row.num_result > 0 {
            rows.push(row);
        }
    }
    debug!(path = %path.display(), total, "read result rows");
    info!(
        "Number of queries with non-empty results in {label} : {}",
        rows.len()
    );
    Ok(ResultTable {
        label: label.to_string(),
        path: path.to_path_buf(),
        rows,
    })
}

fn open_error(err: io::Error, path: &Path) -> Error {
    let kind = if err.kind() == io::ErrorKind::NotFound {
        ErrorKind::NotFound
    } else {
        ErrorKind::Io
    };
    Error::new(kind)
        .with_message("failed to open result file")
        .with_path(path)
        .with_source(err)
}

fn csv_error(err: csv::Error, path: &Path) -> Error {
    let line = err.position().map(|position| position.line());
    let mut out = if err.is_io_error() {
        Error::new(ErrorKind::Io).with_message("failed to read result file")
    } else {
        Error::new(ErrorKind::Malformed)
            .with_message("invalid result row")
            .with_hint("Result files need a header row with the benchmark's column names.")
    };
    if let Some(line) = line {
        out = out.with_offset(line);
    }
    out.with_path(path).with_source(err)
}

/// Decode one encoded column across every row of `table`.
pub fn decode_column<T, D, N>(
    table: &ResultTable,
    column: Column,
    decode: D,
    policy: ErrorPolicy,
    mut on_failure: N,
) -> Result<DecodedColumn<T>, Error>
where
    T: Send,
    D: Fn(&str) -> Result<T, MalformedRecordError> + Sync,
    N: FnMut(RowFailure),
{
    debug!(path = %table.path.display(), column = column.name(), rows = table.len(), "decoding column");
    let decoded: Vec<Result<T, MalformedRecordError>> = table
        .rows
        .par_iter()
        .map(|row| decode(column.text(row)))
        .collect();

    let mut rows = Vec::with_capacity(decoded.len());
    let mut failed = 0u64;
    for (row, result) in table.rows.iter().zip(decoded) {
        match result {
            Ok(value) => rows.push(DecodedRow {
                query_id: row.query_id,
                value,
            }),
            Err(err) => match policy {
                ErrorPolicy::Stop => {
                    return Err(Error::from(err)
                        .with_path(&table.path)
                        .with_row(row.query_id)
                        .with_hint("Use --errors skip to drop malformed rows and continue."));
                }
                ErrorPolicy::Skip => {
                    debug!(
                        path = %table.path.display(),
                        query_id = row.query_id,
                        column = column.name(),
                        "skipping malformed row: {err}"
                    );
                    failed += 1;
                    on_failure(RowFailure {
                        path: table.path.clone(),
                        query_id: row.query_id,
                        column,
                        message: err.to_string(),
                    });
                }
            },
        }
    }
    Ok(DecodedColumn {
        column,
        rows,
        failed,
    })
}

pub fn decode_actions_column<N>(
    table: &ResultTable,
    policy: ErrorPolicy,
    on_failure: N,
) -> Result<DecodedColumn<ActionLog>, Error>
where
    N: FnMut(RowFailure),
{
    decode_column(table, Column::Actions, decode_actions, policy, on_failure)
}

#[derive(Clone, Debug)]
pub struct MultiResults {
    pub tables: Vec<ResultTable>,
    /// Sorted query ids present in every table.
    pub common_query_ids: Vec<u64>,
    /// One entry per table when `LoadOptions::decode_actions` is set, else empty.
    pub actions: Vec<DecodedColumn<ActionLog>>,
}

pub fn read_multi_results<N>(
    inputs: &[LabeledPath],
    options: &LoadOptions,
    mut on_failure: N,
) -> Result<MultiResults, Error>
where
    N: FnMut(RowFailure),
{
    let mut tables = Vec::with_capacity(inputs.len());
    let mut actions = Vec::new();
    let mut common: Option<BTreeSet<u64>> = None;
    for input in inputs {
        let table = read_result(&input.path, &input.label)?;
        if options.decode_actions {
            actions.push(decode_actions_column(
                &table,
                options.errors,
                &mut on_failure,
            )?);
        }
        let ids: BTreeSet<u64> = table.query_ids().into_iter().collect();
        common = Some(match common {
            None => ids,
            Some(prev) => prev.intersection(&ids).copied().collect(),
        });
        tables.push(table);
    }
    let common_query_ids: Vec<u64> = common.unwrap_or_default().into_iter().collect();
    info!("Number of common queries: {}", common_query_ids.len());
    Ok(MultiResults {
        tables,
        common_query_ids,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        ErrorPolicy, LabeledPath, LoadOptions, decode_actions_column, decode_column,
        read_multi_results, read_result, read_result_from_reader,
    };
    use crate::core::error::ErrorKind;
    use crate::core::hits::decode_search_hits;
    use crate::results::layout::AlgorithmFamily;
    use crate::results::record::Column;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    const HEADER: &str = "query_id,query_size,query_num_token,num_result,duration,num_set_read,num_list_read,max_set_size_read,max_list_size_read,max_counter_size,max_ignore_size,actions,results";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        out.push('\n');
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    fn write_csv(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(csv_with(rows).as_bytes()).unwrap();
        path
    }

    #[test]
    fn labeled_path_splits_on_last_colon() {
        let parsed = LabeledPath::parse("out/1k_10.csv:JOSIE-D").unwrap();
        assert_eq!(parsed.path, PathBuf::from("out/1k_10.csv"));
        assert_eq!(parsed.label, "JOSIE-D");

        let bare = LabeledPath::parse("out/1k_10.csv").unwrap();
        assert_eq!(bare.label, "1k_10");

        let empty_label = LabeledPath::parse("a.csv:").unwrap();
        assert_eq!(empty_label.path, PathBuf::from("a.csv"));
        assert_eq!(empty_label.label, "a");

        assert_eq!(
            LabeledPath::parse(":x").unwrap_err().kind(),
            ErrorKind::Usage
        );
    }

    #[test]
    fn drops_queries_without_results() {
        let data = csv_with(&[
            "1,10,10,3,100,0,4,0,9,4,0,l4l5,s1o3",
            "2,12,12,0,80,0,4,0,9,4,0,l4,",
            "3,15,14,1,90,1,2,7,9,4,1,l2s7o1,s8o1",
        ]);
        let table =
            read_result_from_reader(data.as_bytes(), Path::new("mem.csv"), "ProbeSet-D").unwrap();
        assert_eq!(table.query_ids(), vec![1, 3]);
        assert_eq!(table.family(), AlgorithmFamily::ProbeSet);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = read_result(Path::new("/nonexistent/results.csv"), "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.path().is_some());
    }

    #[test]
    fn bad_row_is_malformed_with_line() {
        let data = csv_with(&["1,10,10,x,100,0,4,0,9,4,0,,"]);
        let err = read_result_from_reader(data.as_bytes(), Path::new("bad.csv"), "bad")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(err.offset(), Some(2));
    }

    #[test]
    fn stop_policy_reports_first_bad_row() {
        let data = csv_with(&[
            "1,10,10,1,100,0,1,0,9,4,0,l4,",
            "7,10,10,1,100,0,1,0,9,4,0,l3os7,",
            "9,10,10,1,100,0,1,0,9,4,0,q1,",
        ]);
        let table = read_result_from_reader(data.as_bytes(), Path::new("m.csv"), "m").unwrap();
        let err = decode_actions_column(&table, ErrorPolicy::Stop, |_| {}).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(err.row(), Some(7));
        assert_eq!(err.offset(), Some(3));
        assert_eq!(err.path(), Some(Path::new("m.csv")));
    }

    #[test]
    fn skip_policy_isolates_bad_rows() {
        let data = csv_with(&[
            "1,10,10,1,100,0,1,0,9,4,0,l4,",
            "7,10,10,1,100,0,1,0,9,4,0,l3os7,",
            "8,10,10,1,100,0,1,0,9,4,0,s5o2l1,",
        ]);
        let table = read_result_from_reader(data.as_bytes(), Path::new("m.csv"), "m").unwrap();
        let mut failures = Vec::new();
        let decoded =
            decode_actions_column(&table, ErrorPolicy::Skip, |failure| failures.push(failure))
                .unwrap();
        assert_eq!(decoded.failed, 1);
        assert_eq!(
            decoded.rows.iter().map(|row| row.query_id).collect::<Vec<_>>(),
            vec![1, 8]
        );
        assert_eq!(decoded.rows[1].value.sets_read, vec![5]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].query_id, 7);
        assert_eq!(failures[0].column, Column::Actions);
        assert!(failures[0].message.contains("l3os7"));
    }

    #[test]
    fn decode_column_accepts_any_decoder() {
        let data = csv_with(&["1,10,10,2,100,0,1,0,9,4,0,,s4o9s2o3"]);
        let table = read_result_from_reader(data.as_bytes(), Path::new("m.csv"), "m").unwrap();
        let decoded = decode_column(
            &table,
            Column::Results,
            decode_search_hits,
            ErrorPolicy::Stop,
            |_| {},
        )
        .unwrap();
        assert_eq!(decoded.rows[0].value.len(), 2);
    }

    #[test]
    fn multi_results_intersect_query_ids() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_csv(
            dir.path(),
            "a.csv",
            &[
                "3,10,10,1,100,0,1,0,9,4,0,l1,",
                "1,10,10,1,100,0,1,0,9,4,0,l2,",
                "2,10,10,1,100,0,1,0,9,4,0,l3,",
            ],
        );
        let b = write_csv(
            dir.path(),
            "b.csv",
            &[
                "2,10,10,1,100,0,1,0,9,4,0,l1,",
                "3,10,10,1,100,0,1,0,9,4,0,l1,",
                "4,10,10,1,100,0,1,0,9,4,0,l1,",
            ],
        );
        let inputs = vec![
            LabeledPath::parse(&format!("{}:JOSIE-D", a.display())).unwrap(),
            LabeledPath::parse(&format!("{}:ProbeSet-D", b.display())).unwrap(),
        ];
        let options = LoadOptions {
            decode_actions: true,
            ..LoadOptions::default()
        };
        let multi = read_multi_results(&inputs, &options, |_| {}).unwrap();
        assert_eq!(multi.tables.len(), 2);
        assert_eq!(multi.common_query_ids, vec![2, 3]);
        assert_eq!(multi.actions.len(), 2);
        assert_eq!(multi.actions[0].rows[0].value.lists_read, vec![1]);
    }
}
