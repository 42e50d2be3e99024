//! Borrowed views over table rows

use serde_json::Value;
use std::borrow::Cow;
use super::table::Table;

/// A set of rows of one table, in a fixed order.
///
/// Relations hand out row-sets that borrow their own indexes when the rows are
/// contiguous (nested set, direct lookup) and own a freshly computed index
/// list otherwise (adjacency closure).
#[derive(Debug, Clone)]
pub struct RowSet<'a> {
    table: &'a Table,
    rows: Cow<'a, [usize]>,
}

impl<'a> RowSet<'a> {
    pub fn borrowed(table: &'a Table, rows: &'a [usize]) -> Self {
        Self {
            table,
            rows: Cow::Borrowed(rows),
        }
    }

    pub fn owned(table: &'a Table, rows: Vec<usize>) -> Self {
        Self {
            table,
            rows: Cow::Owned(rows),
        }
    }

    pub fn empty(table: &'a Table) -> Self {
        Self::borrowed(table, &[])
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order; `None` when the column is absent
    pub fn column(&self, field: &str) -> Option<impl Iterator<Item = &'a Value> + '_> {
        let col = self.table.column_index(field)?;
        let table = self.table;
        Some(self.rows.iter().map(move |&r| table.value(r, col)))
    }

    /// Iterate the rows
    pub fn iter(&self) -> impl Iterator<Item = RowRef<'a>> + '_ {
        let table = self.table;
        self.rows.iter().map(move |&index| RowRef { table, index })
    }

    /// First row, if any
    pub fn first(&self) -> Option<RowRef<'a>> {
        self.rows.first().map(|&index| RowRef {
            table: self.table,
            index,
        })
    }
}

/// One row of a table
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub fn new(table: &'a Table, index: usize) -> Self {
        Self { table, index }
    }

    /// Row position in its table
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell by column name; `None` when the column is absent
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.table.get(self.index, field)
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }
}
