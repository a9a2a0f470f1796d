//! Output row materialization.
//!
//! `next()` on the operator hands the consumer one row at a time even
//! though the work underneath is vectorized; this is the row shape that
//! crosses that boundary. Materialization only happens at the very end,
//! once a row has survived every qualifier.

use crate::scalar::ScalarValue;

/// One materialized output row, cells in output-column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<ScalarValue>,
}

impl Row {
    pub fn new(cells: Vec<ScalarValue>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[ScalarValue] {
        &self.cells
    }

    pub fn get(&self, output_position: usize) -> Option<&ScalarValue> {
        self.cells.get(output_position)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
