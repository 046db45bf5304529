use crate::domain::PostResult;
use crate::table::Table;

/// A derivation that appends one computed column to a persisted table.
///
/// Implementations inspect the table's header themselves so that a missing
/// source column fails before any output is written.
pub trait ColumnDerivation {
    /// Name of the column this derivation writes.
    fn column_name(&self) -> &'static str;

    /// One value per row, computed from the existing columns.
    fn derive(&self, table: &Table) -> PostResult<Vec<f64>>;
}
