use async_trait::async_trait;

use crate::utils::{
    error::{CursorError, MirageResult},
    types::{CellValue, ColumnDef, OrderTerm, ScanConstraint, ScanPlan},
};

/// Entry point the host engine calls to bind a named table.
///
/// The lifecycle ordering of the host protocol (schema before open, open
/// before scan) is enforced by staging: `open` only exists on the handle a
/// successful `resolve` returns, and scanning only on the cursor a
/// successful `open` returns.
#[async_trait]
pub trait Resolvable: Send + Sync {
    type Handle: Openable;

    /// Resolve a table's schema and bind a handle for it
    async fn resolve(&self, table_name: &str, table_description: &str)
        -> MirageResult<Self::Handle>;
}

/// A bound table whose schema is already known to the host engine
#[async_trait]
pub trait Openable: Send + Sync {
    type Cursor: Scannable;

    /// Materialize (or reuse) the table's rows and hand out a cursor
    async fn open(&self) -> MirageResult<Self::Cursor>;

    /// BestIndex-equivalent: report which of the offered pushdown
    /// constraints the table will honor during the scan
    fn plan_scan(&self, constraints: &[ScanConstraint], ordering: &[OrderTerm]) -> ScanPlan;

    /// The resolved columns, in declaration order
    fn columns(&self) -> &[ColumnDef];

    /// The DDL shape declared to the host engine
    fn declaration(&self) -> String;

    /// Release the handle; it holds no external resources
    fn disconnect(self)
    where
        Self: Sized,
    {
    }

    /// Drop the table binding entirely; cached artifacts stay untouched
    fn destroy(self)
    where
        Self: Sized,
    {
    }
}

/// Sequential, position-based scan over materialized rows
pub trait Scannable: Send {
    /// Restart the scan from the first row. Pushdown arguments are advisory
    /// only and ignored; filtering correctness stays with the host engine.
    fn filter(&mut self, constraint_args: &[CellValue]);

    /// Move to the next row; never fails
    fn advance(&mut self);

    /// True once the position has passed the last row
    fn at_end(&self) -> bool;

    /// The current position as the row's identity, stable only within this
    /// cursor's lifetime
    fn row_identity(&self) -> i64;

    /// Read one cell of the current row, coerced to the column's declared
    /// type
    fn read_column(&self, index: usize) -> Result<CellValue, CursorError>;

    /// Terminal no-op, idempotent
    fn close(&mut self) {}
}
