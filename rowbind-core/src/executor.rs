use crate::{GenericSqlWriter, Query, Result, RowLabeled, RowsAffected, SqlWriter, stream::Stream};
use std::future::Future;

static GENERIC_SQL_WRITER: GenericSqlWriter = GenericSqlWriter::new();

/// Query execution transport: a connection, a pool or an open transaction.
///
/// The mapper never manages connections, it only issues queries through this trait.
/// Errors are passed back to the caller unchanged.
pub trait Executor: Send {
    /// Dialect used to print generated statements.
    fn sql_writer(&self) -> &dyn SqlWriter {
        GENERIC_SQL_WRITER.as_dyn()
    }

    /// Execute the query and returns the rows.
    fn fetch(&mut self, query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send;

    /// Execute the query and return the total number of rows affected.
    fn execute(&mut self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send;
}
