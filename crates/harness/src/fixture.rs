//! Shared table setup

use tracing::debug;

use isoprobe_core::{Connection, Result, Statement, TableName};

/// Drop `table` if present and create it empty
///
/// Idempotent, and tolerates the table not existing yet. Failures are
/// returned as-is; the caller treats them as fatal.
pub fn reset_table<C: Connection + ?Sized>(conn: &mut C, table: &TableName) -> Result<()> {
    conn.execute(&Statement::drop_table_if_exists(table))?;
    conn.execute(&Statement::create_table(table))?;
    debug!(target: "isoprobe::fixture", %table, "Table reset");
    Ok(())
}

/// Rows of `table` carrying the probe value
pub fn count_probe_rows<C: Connection + ?Sized>(conn: &mut C, table: &TableName) -> Result<i64> {
    conn.query_scalar(&Statement::count_probe(table))
}
