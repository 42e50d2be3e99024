//! Table storage

use serde_json::{Map, Value};
use std::collections::HashMap;
use crate::config::EntitySpec;
use super::rowset::RowSet;

static NULL: Value = Value::Null;

/// Rows of one entity, stored row-major with a column index
#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            name: name.into(),
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Build a table from literal rows (cells in column order)
    pub fn from_rows(name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(name, columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Build a table from JSON records, applying the entity's field mapping.
    ///
    /// With declared fields, each column `target` takes the record key
    /// `source`. Without declared fields the columns are every record key in
    /// first-seen order. Missing cells are null.
    pub fn from_records(spec: &EntitySpec, records: &[Map<String, Value>]) -> Self {
        let mapping: Vec<(String, String)> = if spec.fields.is_empty() {
            let mut seen: Vec<String> = Vec::new();
            for record in records {
                for key in record.keys() {
                    if !seen.iter().any(|k| k == key) {
                        seen.push(key.clone());
                    }
                }
            }
            seen.into_iter().map(|k| (k.clone(), k)).collect()
        } else {
            spec.fields
                .iter()
                .map(|f| (f.target.clone(), f.source.clone()))
                .collect()
        };

        let mut table = Self::new(
            spec.name.clone(),
            mapping.iter().map(|(target, _)| target.clone()).collect(),
        );
        for record in records {
            let row = mapping
                .iter()
                .map(|(_, source)| record.get(source).cloned().unwrap_or(Value::Null))
                .collect();
            table.rows.push(row);
        }
        table
    }

    /// Append a row; short rows are padded with nulls, extra cells dropped
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell by row and column position; out-of-range positions read as null
    pub fn value(&self, row: usize, column: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    /// Cell by row position and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        Some(self.value(row, col))
    }

    /// A view over every row, in load order
    pub fn all_rows(&self) -> RowSet<'_> {
        RowSet::owned(self, (0..self.rows.len()).collect())
    }
}
