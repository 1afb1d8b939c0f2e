use crate::{
    PostgresDriver, PostgresTransaction,
    util::{copy_in, execute_statement, fetch_rows},
};
use keel_core::{
    Connection, Context, Driver, Error, Executor, Record, Result, RetryPolicy, RowLabeled,
    RowsAffected, Statement, TableDescriptor, stream::Stream,
};
use std::{future::Future, time::Duration};
use tokio::spawn;
use tokio_postgres::NoTls;
use url::Url;
use urlencoding::decode;

/// Url parameters consumed by keel, never forwarded to the server.
pub const CONNECT_RETRIES: &str = "connect_retries";
pub const CONNECT_RETRY_STEP_MS: &str = "connect_retry_step_ms";
pub const SEQUENCE_FUNCTION: &str = "sequence_function";

pub struct PostgresConnection {
    pub(crate) client: tokio_postgres::Client,
    pub(crate) driver: PostgresDriver,
}

/// Connection settings read from a `postgres://` url.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Url handed to `tokio-postgres`, keel parameters removed.
    pub url: Url,
    pub retry: RetryPolicy,
    pub sequence_function: Option<String>,
}

impl PostgresConfig {
    pub fn parse(url: &str) -> Result<Self> {
        let context = || format!("While parsing the connection url `{}`", url);
        let decoded = decode(url).with_context(context)?;
        let prefix = format!("{}://", PostgresDriver::NAME);
        if !decoded.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Postgres connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let mut url = Url::parse(&decoded).with_context(context)?;
        let mut take_url_param = |key: &str| {
            let mut pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| (k.into(), v.into()))
                .collect();
            let value = pairs
                .iter()
                .position(|(k, _)| k == key)
                .map(|pos| pairs.remove(pos).1);
            if pairs.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
            value
        };
        let mut retry = RetryPolicy::default();
        if let Some(v) = take_url_param(CONNECT_RETRIES) {
            retry.attempts = v
                .parse()
                .with_context(|| format!("Invalid `{CONNECT_RETRIES}` value `{v}`"))?;
        }
        if let Some(v) = take_url_param(CONNECT_RETRY_STEP_MS) {
            retry.step = Duration::from_millis(
                v.parse()
                    .with_context(|| format!("Invalid `{CONNECT_RETRY_STEP_MS}` value `{v}`"))?,
            );
        }
        let sequence_function = take_url_param(SEQUENCE_FUNCTION).filter(|v| !v.is_empty());
        Ok(Self {
            url,
            retry,
            sequence_function,
        })
    }
}

impl PostgresConnection {
    /// Connects with an explicit configuration.
    pub async fn connect_with(config: PostgresConfig) -> Result<Self> {
        let url = config.url.to_string();
        let url = url.as_str();
        let client = config
            .retry
            .run("Connecting to Postgres", || async move {
                let (client, connection) = tokio_postgres::connect(url, NoTls)
                    .await
                    .map_err(Error::new)?;
                spawn(async move {
                    if let Err(e) = connection.await
                        && !e.is_closed()
                    {
                        log::error!("Postgres connection error: {:#}", e);
                    }
                });
                Ok(client)
            })
            .await?;
        Ok(Self {
            client,
            driver: PostgresDriver {
                sequence_function: config.sequence_function,
            },
        })
    }
}

impl Executor for PostgresConnection {
    type Driver = PostgresDriver;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    fn fetch(&mut self, statement: Statement) -> impl Stream<Item = Result<RowLabeled>> + Send {
        fetch_rows(&self.client, statement)
    }

    fn execute(
        &mut self,
        statement: Statement,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        execute_statement(&self.client, statement)
    }

    fn bulk_load(
        &mut self,
        table: &TableDescriptor,
        records: &[&dyn Record],
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        let writer = self.driver.sql_writer();
        async move { copy_in(&self.client, &writer, table, records).await }
    }
}

impl Connection for PostgresConnection {
    fn connect(url: &str) -> impl Future<Output = Result<Self>> + Send {
        let config = PostgresConfig::parse(url);
        async move { Self::connect_with(config?).await }
    }

    fn begin(&mut self) -> impl Future<Output = Result<PostgresTransaction<'_>>> + Send {
        PostgresTransaction::new(self)
    }
}
