use crate::{
    Driver, Error, Record, Result, RowLabeled, RowsAffected, SqlWriter, Statement,
    TableDescriptor, Value,
    stream::{Stream, StreamExt},
};
use std::{future::Future, pin::pin};

/// Runs statements. Implemented by connections and transactions.
pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Execute the statement and return the rows.
    fn fetch(&mut self, statement: Statement) -> impl Stream<Item = Result<RowLabeled>> + Send;

    /// Execute the statement and return the total number of rows affected.
    fn execute(&mut self, statement: Statement)
    -> impl Future<Output = Result<RowsAffected>> + Send;

    /// First column of the first row, `Value::Null` when there is none.
    fn fetch_scalar(&mut self, statement: Statement) -> impl Future<Output = Result<Value>> + Send {
        let stream = self.fetch(statement);
        async move {
            let mut stream = pin!(stream);
            let row = stream.next().await.transpose()?;
            Ok(row
                .and_then(|v| v.values.into_vec().into_iter().next())
                .unwrap_or_default())
        }
    }

    /// Write many records of one table at once. Defaults to a multi-row insert,
    /// drivers with a native bulk path override it.
    fn bulk_load(
        &mut self,
        table: &TableDescriptor,
        records: &[&dyn Record],
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        let statement = self
            .driver()
            .sql_writer()
            .bulk_insert_statement(table, records);
        async move {
            let statement = statement?;
            if statement.sql.is_empty() {
                return Ok(RowsAffected::default());
            }
            self.execute(statement).await
        }
    }

    /// Reserves `count` consecutive values of `sequence` in one round trip and
    /// returns the first one. Nothing is reserved when `count` is zero.
    fn allocate_range(
        &mut self,
        sequence: &str,
        count: u64,
    ) -> impl Future<Output = Result<i64>> + Send {
        let statement = self
            .driver()
            .sql_writer()
            .sequence_range_statement(sequence, count);
        let sequence = sequence.to_string();
        async move {
            if count == 0 {
                return Ok(0);
            }
            let value = self.fetch_scalar(statement).await?;
            value.as_i64().ok_or_else(|| {
                let error = Error::msg(format!(
                    "Sequence `{sequence}` returned {value} instead of the first key of a range"
                ));
                log::error!("{:#}", error);
                error
            })
        }
    }
}
