use crate::{Connection, SqlWriter, Transaction};

/// Entry point of a database backend.
pub trait Driver: Send + Sync {
    type Connection: Connection;
    type SqlWriter: SqlWriter;
    type Transaction<'c>: Transaction<'c>;

    /// Scheme of the connection urls accepted by the driver.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}
