use crate::{PostgresSqlWriter, ValueHolder, value_holder::value_to_postgres_type};
use async_stream::try_stream;
use keel_core::{
    Error, Record, Result, Row, RowLabeled, RowNames, RowsAffected, SqlWriter, Statement,
    TableDescriptor,
    stream::{Stream, StreamExt},
    truncate_long,
    writer::Context,
};
use std::pin::pin;
use tokio_postgres::{Client, binary_copy::BinaryCopyInWriter};

pub(crate) fn row_to_keel_row(row: tokio_postgres::Row) -> Result<Row> {
    (0..row.len())
        .map(|i| match row.try_get::<_, ValueHolder>(i) {
            Ok(v) => Ok(v.0),
            Err(e) => {
                let col = &row.columns()[i];
                Err(Error::new(e).context(format!(
                    "Could not decode column {} `{}` of type {}",
                    i,
                    col.name(),
                    col.type_()
                )))
            }
        })
        .collect::<Result<Row>>()
}

fn query_error(error: tokio_postgres::Error, sql: &str) -> Error {
    let error = Error::new(error).context(format!(
        "While running the query:\n{}",
        truncate_long!(sql)
    ));
    log::error!("{:#}", error);
    error
}

fn split(statement: Statement) -> (String, Vec<ValueHolder>) {
    let params = statement
        .parameters
        .into_iter()
        .map(|(_, v)| ValueHolder(v))
        .collect();
    (statement.sql, params)
}

/// Runs `statement` and yields its rows labeled with the column names.
pub(crate) fn fetch_rows(
    client: &Client,
    statement: Statement,
) -> impl Stream<Item = Result<RowLabeled>> + Send + '_ {
    try_stream! {
        log::debug!("{}", statement);
        let (sql, params) = split(statement);
        let stream = client
            .query_raw(sql.as_str(), params)
            .await
            .map_err(|e| query_error(e, &sql))?;
        let mut stream = pin!(stream);
        let mut labels: Option<RowNames> = None;
        while let Some(row) = stream.next().await {
            let row = row.map_err(|e| query_error(e, &sql))?;
            let labels = labels.get_or_insert_with(|| {
                row.columns().iter().map(|c| c.name().to_string()).collect()
            });
            yield RowLabeled::new(labels.clone(), row_to_keel_row(row)?);
        }
    }
}

pub(crate) async fn execute_statement(client: &Client, statement: Statement) -> Result<RowsAffected> {
    log::debug!("{}", statement);
    let (sql, params) = split(statement);
    let rows_affected = client
        .execute_raw(sql.as_str(), params)
        .await
        .map_err(|e| query_error(e, &sql))?;
    Ok(RowsAffected { rows_affected })
}

/// Streams `records` through `COPY .. FROM STDIN BINARY`.
///
/// Column types follow the property types: an `i32` property needs an
/// `INTEGER` column, an `i64` one a `BIGINT` column and so on.
pub(crate) async fn copy_in(
    client: &Client,
    writer: &PostgresSqlWriter,
    table: &TableDescriptor,
    records: &[&dyn Record],
) -> Result<RowsAffected> {
    if records.is_empty() {
        return Ok(RowsAffected::default());
    }
    let columns = table.insertable().collect::<Vec<_>>();
    let mut context = Context::default();
    let mut sql = String::with_capacity(128);
    sql.push_str("COPY ");
    writer.write_table_name(&mut context, &mut sql, table);
    sql.push_str(" (");
    keel_core::separated_by(
        &mut sql,
        columns.iter(),
        |out, c| writer.write_identifier_quoted(&mut context, out, &c.name),
        ", ",
    );
    sql.push_str(") FROM STDIN BINARY");
    log::debug!("{} ({} rows)", sql, records.len());
    let types = columns
        .iter()
        .map(|c| value_to_postgres_type(&c.value))
        .collect::<Vec<_>>();
    let sink = client.copy_in(sql.as_str()).await.map_err(|e| query_error(e, &sql))?;
    let copy = BinaryCopyInWriter::new(sink, &types);
    let mut copy = pin!(copy);
    for record in records {
        let mut row = Vec::with_capacity(columns.len());
        for column in &columns {
            let Some(value) = record.get_value(column.property) else {
                let error = Error::msg(format!(
                    "Record {} does not expose the property `{}` of `{}`",
                    record.entity_name(),
                    column.property,
                    table.name
                ));
                log::error!("{:#}", error);
                return Err(error);
            };
            row.push(ValueHolder(value));
        }
        copy.as_mut()
            .write_raw(row)
            .await
            .map_err(|e| query_error(e, &sql))?;
    }
    let rows_affected = copy
        .as_mut()
        .finish()
        .await
        .map_err(|e| query_error(e, &sql))?;
    Ok(RowsAffected { rows_affected })
}
