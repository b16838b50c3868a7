//! Column-addressed numeric tables read from CSV.
//!
//! Every column is parsed as `f64`. Empty cells and the tokens `NA`, `NaN`,
//! `nan`, `null` are missing values and become NaN. A column holding any other
//! unparsable or infinite cell is kept as non-numeric: it can sit in the file
//! (dates, ids with letters) but selecting it is a configuration error.

use crate::preprocessing::error::ConfigurationError;
use csv::{ReaderBuilder, Trim};
use ndarray::Array2;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MISSING_TOKENS: [&str; 5] = ["", "NA", "NaN", "nan", "null"];

/// Errors raised while reading or assembling a [`FeatureTable`].
#[derive(Error, Debug)]
pub enum TableError {
    #[error("failed to open '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("table has no columns")]
    NoColumns,
    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),
    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Clone, Debug)]
enum ColumnValues {
    Numeric(Vec<f64>),
    /// First offending cell; `row` is 1-based over data rows.
    NonNumeric { row: usize, value: String },
}

#[derive(Clone, Debug)]
struct TableColumn {
    name: String,
    values: ColumnValues,
}

/// A table of rows (houses) with named numeric columns.
#[derive(Clone, Debug)]
pub struct FeatureTable {
    columns: Vec<TableColumn>,
    n_rows: usize,
}

fn parse_cell(cell: &str) -> Option<f64> {
    if MISSING_TOKENS.contains(&cell) {
        return Some(f64::NAN);
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl FeatureTable {
    /// Reads a CSV file with a header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Reads CSV data with a header row from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

        let names: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if names.is_empty() || names.iter().all(|n| n.is_empty()) {
            return Err(TableError::NoColumns);
        }
        check_unique(&names)?;

        let mut values: Vec<ColumnValues> = names
            .iter()
            .map(|_| ColumnValues::Numeric(Vec::new()))
            .collect();
        let mut n_rows = 0;

        for record in rdr.records() {
            let record = record?;
            n_rows += 1;
            for (column, cell) in values.iter_mut().zip(record.iter()) {
                if let ColumnValues::Numeric(parsed) = column {
                    match parse_cell(cell) {
                        Some(v) => parsed.push(v),
                        None => {
                            *column = ColumnValues::NonNumeric {
                                row: n_rows,
                                value: cell.to_string(),
                            }
                        }
                    }
                }
            }
        }

        let columns = names
            .into_iter()
            .zip(values)
            .map(|(name, values)| TableColumn { name, values })
            .collect();
        Ok(Self { columns, n_rows })
    }

    /// Builds a table from named numeric columns of equal length.
    pub fn from_columns<S, I>(columns: I) -> Result<Self, TableError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f64>)>,
    {
        let columns: Vec<TableColumn> = columns
            .into_iter()
            .map(|(name, values)| TableColumn {
                name: name.into(),
                values: ColumnValues::Numeric(values),
            })
            .collect();
        let first = columns.first().ok_or(TableError::NoColumns)?;
        let n_rows = match &first.values {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::NonNumeric { .. } => 0,
        };

        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        check_unique(&names)?;
        for column in &columns {
            if let ColumnValues::Numeric(v) = &column.values {
                if v.len() != n_rows {
                    return Err(TableError::LengthMismatch {
                        column: column.name.clone(),
                        expected: n_rows,
                        found: v.len(),
                    });
                }
            }
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Returns the values of a numeric column.
    pub fn column(&self, name: &str) -> Result<&[f64], ConfigurationError> {
        let column = self
            .columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ConfigurationError::MissingColumn {
                column: name.to_string(),
            })?;
        match &column.values {
            ColumnValues::Numeric(values) => Ok(values),
            ColumnValues::NonNumeric { row, value } => Err(ConfigurationError::NonNumericColumn {
                column: name.to_string(),
                row: *row,
                value: value.clone(),
            }),
        }
    }

    /// Gathers the named columns, in the given order, into a row-major matrix.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Array2<f64>, ConfigurationError> {
        let columns = names
            .iter()
            .map(|name| self.column(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Array2::from_shape_fn((self.n_rows, columns.len()), |(row, col)| {
            columns[col][row]
        }))
    }
}

fn check_unique(names: &[String]) -> Result<(), TableError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(TableError::DuplicateColumn(name.clone()));
        }
    }
    Ok(())
}
