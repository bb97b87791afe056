//! Cell-by-cell averaging of `;`-delimited result tables.

use super::format::{mean, render_cell};
use crate::error::{AggregateError, Result};
use crate::models::{BenchmarkGroup, BenchmarkKey, FileKind};
use crate::output::{read_text, write_atomic};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A parsed result table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Banner line (with its line break) echoed on output.
    pub banner: Option<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse `text`; `kind` decides whether the first line is a banner.
    pub fn parse(text: &str, kind: FileKind, path: &Path) -> Result<Self> {
        let (banner, body) = if kind.has_banner() {
            match text.split_once('\n') {
                Some((first, rest)) => (Some(format!("{}\n", first)), rest),
                None => (Some(format!("{}\n", text)), ""),
            }
        } else {
            (None, text)
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(body.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| AggregateError::Table {
                path: path.to_path_buf(),
                source,
            })?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(Self { banner, rows })
    }

    pub fn read(path: &Path, kind: FileKind) -> Result<Self> {
        let text = read_text(path)?;
        Self::parse(&text, kind, path)
    }
}

/// Numeric value of a cell, if it has one.
fn numeric(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    /// Running sum over the repeats seen so far, with the template text.
    Sum { sum: f64, original: String },
    /// Template text, passed through unchanged.
    Verbatim(String),
}

/// Running per-cell sums of one tabular benchmark.
#[derive(Debug, Clone)]
pub struct TableAccumulator {
    key: BenchmarkKey,
    banner: Option<String>,
    cells: Vec<Vec<Cell>>,
    observed: usize,
}

impl TableAccumulator {
    /// Seed from repeat #1; it fixes the table shape and the banner.
    pub fn seed(key: BenchmarkKey, template: Table) -> Self {
        let cells = template
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match numeric(&cell) {
                        Some(sum) => Cell::Sum {
                            sum,
                            original: cell,
                        },
                        None => Cell::Verbatim(cell),
                    })
                    .collect()
            })
            .collect();

        Self {
            key,
            banner: template.banner,
            cells,
            observed: 1,
        }
    }

    /// Add one repeat cell by cell.
    ///
    /// A position where either side is non-numeric keeps the template text.
    pub fn add(&mut self, repeat: usize, table: &Table) -> Result<()> {
        self.check_shape(repeat, table)?;

        for (acc_row, row) in self.cells.iter_mut().zip(&table.rows) {
            for (acc, cell) in acc_row.iter_mut().zip(row) {
                let Cell::Sum { sum, original } = acc else {
                    continue;
                };
                match numeric(cell) {
                    Some(v) => *sum += v,
                    None => {
                        debug!(
                            "{}: non-numeric {:?} in repeat {}, keeping template value",
                            self.key, cell, repeat
                        );
                        *acc = Cell::Verbatim(std::mem::take(original));
                    }
                }
            }
        }

        self.observed += 1;
        Ok(())
    }

    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Render the averaged table.
    pub fn finish(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        let table_error = |source: csv::Error| AggregateError::Table {
            path: PathBuf::from(&self.key.benchmark),
            source,
        };

        for row in &self.cells {
            let fields: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    Cell::Sum { sum, .. } => render_cell(mean(*sum, self.observed)),
                    Cell::Verbatim(text) => text.clone(),
                })
                .collect();
            writer.write_record(&fields).map_err(table_error)?;
        }

        let body = writer
            .into_inner()
            .map_err(|e| table_error(csv::Error::from(e.into_error())))?;
        let body = String::from_utf8_lossy(&body);

        let mut out = self.banner.clone().unwrap_or_default();
        out.push_str(&body);
        Ok(out)
    }

    fn check_shape(&self, repeat: usize, table: &Table) -> Result<()> {
        let mismatch = |expected: usize, found: usize, unit: &'static str| {
            AggregateError::StructuralMismatch {
                key: self.key.clone(),
                repeat,
                expected,
                found,
                unit,
            }
        };

        if table.rows.len() != self.cells.len() {
            return Err(mismatch(self.cells.len(), table.rows.len(), "rows"));
        }
        for (acc_row, row) in self.cells.iter().zip(&table.rows) {
            if acc_row.len() != row.len() {
                return Err(mismatch(acc_row.len(), row.len(), "cells in a row"));
            }
        }
        Ok(())
    }
}

/// Merge one tabular or startup benchmark into its suffix-less file.
pub fn aggregate(group: &BenchmarkGroup, expected_repeats: usize) -> Result<PathBuf> {
    let template = group.template().ok_or_else(|| AggregateError::MissingTemplate {
        key: group.key.clone(),
    })?;

    let mut acc = TableAccumulator::seed(group.key.clone(), Table::read(&template.path, group.kind)?);
    for repeat in group.repeats.iter().filter(|r| r.repeat != 1) {
        let table = Table::read(&repeat.path, group.kind)?;
        acc.add(repeat.repeat, &table)?;
    }

    if acc.observed() < expected_repeats {
        warn!(
            "{}: only {} of {} repeats found, averaging over {}",
            group.key,
            acc.observed(),
            expected_repeats,
            acc.observed()
        );
    }

    let merged = group.merged_path();
    write_atomic(&merged, &acc.finish()?, Some(&template.path))?;
    Ok(merged)
}
