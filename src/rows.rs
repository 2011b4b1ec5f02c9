use crate::protocol::value::EdbValue;
use crate::{EdbError, EdbResult};

/// The output abstraction into which decoded result rows are appended.
///
/// The flow engine pushes one [`EdbValue`] per data row; a sink may reject
/// a value, which surfaces to the caller as a recoverable error after the
/// flow has drained.
pub trait RowSink: std::fmt::Debug {
    /// Appends one decoded row.
    fn push_row(&mut self, row: EdbValue) -> EdbResult<()>;
}

/// The standard sink: collects all rows in order.
#[derive(Debug, Default)]
pub struct Rows {
    rows: Vec<EdbValue>,
}

impl Rows {
    pub fn new() -> Rows {
        Rows::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EdbValue> {
        self.rows.iter()
    }

    /// The collected rows.
    pub fn into_vec(self) -> Vec<EdbValue> {
        self.rows
    }

    /// Consumes the collector, expecting exactly one row.
    pub fn into_single(mut self) -> EdbResult<EdbValue> {
        match self.rows.len() {
            1 => Ok(self.rows.remove(0)),
            n => Err(EdbError::UsageDetailed(format!(
                "expected exactly one row, got {n}"
            ))),
        }
    }
}

impl RowSink for Rows {
    fn push_row(&mut self, row: EdbValue) -> EdbResult<()> {
        self.rows.push(row);
        Ok(())
    }
}

impl IntoIterator for Rows {
    type Item = EdbValue;
    type IntoIter = std::vec::IntoIter<EdbValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a EdbValue;
    type IntoIter = std::slice::Iter<'a, EdbValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
