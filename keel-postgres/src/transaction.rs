use crate::{
    PostgresConnection, PostgresDriver,
    util::{copy_in, execute_statement, fetch_rows},
};
use keel_core::{
    Driver, Error, Executor, Record, Result, RowLabeled, RowsAffected, Statement,
    TableDescriptor, Transaction, future::TryFutureExt, stream::Stream,
};
use std::future::Future;
use tokio_postgres::GenericClient;

pub struct PostgresTransaction<'c> {
    pub(crate) transaction: tokio_postgres::Transaction<'c>,
    pub(crate) driver: &'c PostgresDriver,
}

impl<'c> PostgresTransaction<'c> {
    pub async fn new(connection: &'c mut PostgresConnection) -> Result<Self> {
        let PostgresConnection { client, driver } = connection;
        let transaction = client.transaction().await.map_err(|e| {
            let e = Error::new(e).context("While starting a transaction");
            log::error!("{:#}", e);
            e
        })?;
        Ok(Self {
            transaction,
            driver,
        })
    }
}

impl<'c> Executor for PostgresTransaction<'c> {
    type Driver = PostgresDriver;

    fn driver(&self) -> &Self::Driver {
        self.driver
    }

    fn fetch(&mut self, statement: Statement) -> impl Stream<Item = Result<RowLabeled>> + Send {
        fetch_rows(self.transaction.client(), statement)
    }

    fn execute(
        &mut self,
        statement: Statement,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        execute_statement(self.transaction.client(), statement)
    }

    fn bulk_load(
        &mut self,
        table: &TableDescriptor,
        records: &[&dyn Record],
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        let writer = self.driver.sql_writer();
        async move { copy_in(self.transaction.client(), &writer, table, records).await }
    }
}

impl<'c> Transaction<'c> for PostgresTransaction<'c> {
    fn commit(self) -> impl Future<Output = Result<()>> + Send {
        self.transaction.commit().map_err(Into::into)
    }

    fn rollback(self) -> impl Future<Output = Result<()>> + Send {
        self.transaction.rollback().map_err(Into::into)
    }
}
