use crate::{AsValue, Error, Result, Value};
use std::{any, sync::Arc};

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(names: RowNames, values: Row) -> Self {
        Self {
            labels: names,
            values,
        }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v.eq_ignore_ascii_case(name))
            .map(|i| &self.values()[i])
    }
    /// Decodes the column `name`, falling back to the type default when the row lacks it.
    pub fn decode<T: AsValue>(&self, name: &str) -> Result<T> {
        match self.get_column(name) {
            Some(v) => T::try_from_value(v.clone())
                .map_err(|e| e.context(format!("While decoding column `{name}`"))),
            None => T::default_value().ok_or_else(|| {
                Error::msg(format!(
                    "Column `{name}` of type {} is missing from the row",
                    any::type_name::<T>()
                ))
            }),
        }
    }
    /// Like [`RowLabeled::decode`] but a missing column yields `T::default()`.
    pub fn decode_or_default<T: AsValue + Default>(&self, name: &str) -> Result<T> {
        match self.get_column(name) {
            Some(..) => self.decode(name),
            None => Ok(T::default()),
        }
    }
    /// First value of the row.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }
}

impl From<RowLabeled> for Row {
    fn from(value: RowLabeled) -> Self {
        value.values
    }
}
