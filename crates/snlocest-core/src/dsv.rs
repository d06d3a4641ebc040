//! Delimiter-separated value I/O
//!
//! Readers for the edge list (`src<TAB>dst`) and label list
//! (`node<TAB>area_id`), and the writer/reader pair for prediction results
//! (`node<TAB>area[<TAB>diagnostics...]`). Files have no header. Node ids
//! are kept as the raw string field so edge-list and label-list keys agree.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::areadata::AreaId;
use crate::graph::{IndexedGraph, NodeIdx};
use crate::methods::Estimate;

/// Default column delimiter
pub const DEFAULT_DELIMITER: char = '\t';

/// Errors while reading or writing DSV files
#[derive(Debug, Error)]
pub enum DsvError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read '{path}' at line {line}: {source}")]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: expected at least {expected} columns, found {found}")]
    MissingColumns {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{path}:{line}: invalid area id '{value}'")]
    InvalidArea {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Graph(#[from] crate::graph::GraphError),

    #[error("result length mismatch: {nodes} nodes but {estimates} estimates")]
    LengthMismatch { nodes: usize, estimates: usize },
}

impl DsvError {
    pub(crate) fn invalid_area(path: &Path, line: usize, value: &str) -> Self {
        Self::InvalidArea {
            path: path.to_path_buf(),
            line,
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DsvError>;

/// One parsed row with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Streaming row reader that checks a minimum column count.
///
/// Blank lines are skipped.
pub struct RowReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    delimiter: char,
    min_columns: usize,
    line: usize,
}

impl Iterator for RowReader {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = self.lines.next()?;
            self.line += 1;
            let raw = match raw {
                Ok(raw) => raw,
                Err(source) => {
                    return Some(Err(DsvError::Read {
                        path: self.path.clone(),
                        line: self.line,
                        source,
                    }))
                }
            };
            let raw = raw.trim_end_matches('\r');
            if raw.is_empty() {
                continue;
            }
            let fields: Vec<String> = raw.split(self.delimiter).map(str::to_string).collect();
            if fields.len() < self.min_columns {
                return Some(Err(DsvError::MissingColumns {
                    path: self.path.clone(),
                    line: self.line,
                    expected: self.min_columns,
                    found: fields.len(),
                }));
            }
            return Some(Ok(Row {
                line: self.line,
                fields,
            }));
        }
    }
}

/// Open a delimited file for row-by-row reading
pub fn read_rows(path: &Path, delimiter: char, min_columns: usize) -> Result<RowReader> {
    let file = File::open(path).map_err(|source| DsvError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(RowReader {
        path: path.to_path_buf(),
        lines: BufReader::new(file).lines(),
        delimiter,
        min_columns,
        line: 0,
    })
}

/// Stream `(src, dst)` pairs from an edge list
pub fn read_edgelist(
    path: &Path,
    delimiter: char,
) -> Result<impl Iterator<Item = Result<(String, String)>>> {
    let rows = read_rows(path, delimiter, 2)?;
    Ok(rows.map(|row| {
        row.map(|row| {
            let mut fields = row.fields.into_iter();
            // Two columns are guaranteed by the reader
            let src = fields.next().unwrap_or_default();
            let dst = fields.next().unwrap_or_default();
            (src, dst)
        })
    }))
}

/// Read a label list into parallel node/area vectors.
///
/// Only the first two columns are used; anything after is ignored.
pub fn read_labellist(path: &Path, delimiter: char) -> Result<(Vec<String>, Vec<AreaId>)> {
    let mut nodes = Vec::new();
    let mut labels = Vec::new();
    for row in read_rows(path, delimiter, 2)? {
        let row = row?;
        let area: AreaId = row.fields[1]
            .parse()
            .map_err(|_| DsvError::invalid_area(path, row.line, &row.fields[1]))?;
        let mut fields = row.fields.into_iter();
        nodes.push(fields.next().unwrap_or_default());
        labels.push(area);
    }
    Ok((nodes, labels))
}

/// Write predictions, translating node indices back to node ids.
///
/// With `extra`, the method's diagnostic fields follow the predicted area.
pub fn write_result<W, G>(
    out: &mut W,
    graph: &G,
    nodes: &[NodeIdx],
    estimates: &[Estimate],
    extra: bool,
) -> Result<()>
where
    W: Write,
    G: IndexedGraph + ?Sized,
{
    if nodes.len() != estimates.len() {
        return Err(DsvError::LengthMismatch {
            nodes: nodes.len(),
            estimates: estimates.len(),
        });
    }
    for (&node, estimate) in nodes.iter().zip(estimates) {
        let name = graph.name_of(node)?;
        write!(out, "{}{}{}", name, DEFAULT_DELIMITER, estimate.area)?;
        if extra {
            for field in estimate.diagnostic_fields() {
                write!(out, "{}{}", DEFAULT_DELIMITER, field)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Read a result file back as `(nodes, predicted areas)`
pub fn read_result(path: &Path) -> Result<(Vec<String>, Vec<AreaId>)> {
    read_labellist(path, DEFAULT_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_edgelist() {
        let file = write_file("a\tb\nb\tc\n\nc\ta\r\n");
        let edges: Vec<(String, String)> = read_edgelist(file.path(), '\t')
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            edges,
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string()),
                ("c".to_string(), "a".to_string()),
            ]
        );
    }

    #[test]
    fn test_read_labellist_ignores_extra_columns() {
        let file = write_file("007\t13101\tx\ty\n42\t27128\n");
        let (nodes, labels) = read_labellist(file.path(), '\t').unwrap();
        // Numeric-looking ids stay strings, leading zeros included
        assert_eq!(nodes, vec!["007".to_string(), "42".to_string()]);
        assert_eq!(labels, vec![AreaId(13101), AreaId(27128)]);
    }

    #[test]
    fn test_missing_column_reports_line() {
        let file = write_file("a\tb\nlonely\n");
        let result: Result<Vec<_>> = read_edgelist(file.path(), '\t').unwrap().collect();
        match result {
            Err(DsvError::MissingColumns { line, found, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_area() {
        let file = write_file("u1\tTokyo\n");
        let err = read_labellist(file.path(), '\t').unwrap_err();
        assert!(err.to_string().contains("Tokyo"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_labellist(Path::new("/nonexistent/labels.tsv"), '\t').unwrap_err();
        assert!(matches!(err, DsvError::Open { .. }));
    }
}
