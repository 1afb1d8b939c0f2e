use crate::{PostgresConnection, PostgresSqlWriter, PostgresTransaction};
use keel_core::Driver;

#[derive(Default, Debug, Clone)]
pub struct PostgresDriver {
    /// See [`PostgresSqlWriter::sequence_function`].
    pub sequence_function: Option<String>,
}

impl PostgresDriver {
    pub const fn new() -> Self {
        Self {
            sequence_function: None,
        }
    }
}

impl Driver for PostgresDriver {
    type Connection = PostgresConnection;
    type SqlWriter = PostgresSqlWriter;
    type Transaction<'c> = PostgresTransaction<'c>;

    const NAME: &'static str = "postgres";

    fn sql_writer(&self) -> PostgresSqlWriter {
        PostgresSqlWriter {
            sequence_function: self.sequence_function.clone(),
        }
    }
}
