use crate::{
    ChangeKind, ColumnDescriptor, Connection, Driver, Error, Executor, KeyRange, KeyStrategy,
    Payload, PendingChange, Record, Result, SqlWriter, TableDescriptor, Transaction, Value,
    key_value,
};
use std::collections::{BTreeMap, btree_map};

/// Table name reporting errors that happened outside any table: opening or
/// committing the transaction.
pub const NO_TABLE: &str = "<no table>";

/// Outcome of a save for one table.
#[derive(Debug, Default)]
pub struct SaveResult {
    pub table: String,
    /// Rows updated, stored procedure calls included.
    pub updated: u64,
    pub deleted: u64,
    /// Keys of the inserted rows, in insertion order.
    pub inserted: Vec<Value>,
    pub error: Option<Error>,
}

impl SaveResult {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn merge(&mut self, other: SaveResult) {
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.inserted.extend(other.inserted);
        if self.error.is_none() {
            self.error = other.error;
        }
    }
}

/// Results of a save grouped by table name.
#[derive(Debug, Default)]
pub struct SaveResponse {
    results: BTreeMap<String, SaveResult>,
}

impl SaveResponse {
    pub fn get(&self, table: &str) -> Option<&SaveResult> {
        self.results.get(table)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, SaveResult> {
        self.results.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.results.values().all(SaveResult::is_success)
    }

    /// First error reported.
    pub fn error(&self) -> Option<&Error> {
        self.results.values().find_map(|v| v.error.as_ref())
    }

    pub fn total_updated(&self) -> u64 {
        self.results.values().map(|v| v.updated).sum()
    }

    pub fn total_deleted(&self) -> u64 {
        self.results.values().map(|v| v.deleted).sum()
    }

    pub fn total_inserted(&self) -> usize {
        self.results.values().map(|v| v.inserted.len()).sum()
    }

    fn add(&mut self, result: SaveResult) {
        match self.results.entry(result.table.clone()) {
            btree_map::Entry::Occupied(mut entry) => entry.get_mut().merge(result),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(result);
            }
        }
    }

    /// Every table of the batch with zero counts, `table` carrying `error`.
    fn failed<'a>(tables: impl IntoIterator<Item = &'a str>, table: &str, error: Error) -> Self {
        log::error!("{:#}", error);
        let mut result = Self::default();
        for name in tables {
            result.add(SaveResult::new(name));
        }
        let mut failed = SaveResult::new(table);
        failed.error = Some(error);
        result.add(failed);
        result
    }
}

impl<'a> IntoIterator for &'a SaveResponse {
    type Item = &'a SaveResult;
    type IntoIter = btree_map::Values<'a, String, SaveResult>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Applies every change in one transaction.
///
/// Changes run ordered by table priority then table name, the order they were
/// staged in is kept otherwise. Nothing is returned as an error: a failure rolls
/// the transaction back and is reported in the response, with every table of the
/// batch showing zero counts.
pub async fn save<C: Connection>(
    connection: &mut C,
    mut changes: Vec<PendingChange>,
) -> SaveResponse {
    if changes.is_empty() {
        return SaveResponse::default();
    }
    changes.sort_by(|a, b| {
        (a.table.priority, &a.table.name).cmp(&(b.table.priority, &b.table.name))
    });
    let names = changes
        .iter()
        .map(|v| v.table.name.clone())
        .collect::<Vec<_>>();
    let tables = || names.iter().map(String::as_str);
    let mut transaction = match connection.begin().await {
        Ok(v) => v,
        Err(e) => {
            return SaveResponse::failed(
                tables(),
                NO_TABLE,
                e.context("While starting the save transaction"),
            );
        }
    };
    let mut response = SaveResponse::default();
    for change in &mut changes {
        match apply(&mut transaction, change).await {
            Ok(v) => response.add(v),
            Err(e) => {
                let table = change.table.name.clone();
                if let Err(e) = transaction.rollback().await {
                    log::error!("{:#}", e.context("While rolling back the save transaction"));
                }
                return SaveResponse::failed(tables(), &table, e);
            }
        }
    }
    if let Err(e) = transaction.commit().await {
        return SaveResponse::failed(
            tables(),
            NO_TABLE,
            e.context("While committing the save transaction"),
        );
    }
    response
}

async fn apply<E: Executor>(executor: &mut E, change: &mut PendingChange) -> Result<SaveResult> {
    let table = change.table.clone();
    let writer = executor.driver().sql_writer();
    let mut result = SaveResult::new(&table.name);
    match (change.kind, &mut change.payload) {
        (ChangeKind::Insert, Payload::Single(record)) => {
            if let (Some(sequence), Some(pk)) = (table.sequence(), table.primary_key())
                && is_unset(record.as_ref(), pk)
            {
                let key = executor.allocate_range(sequence, 1).await?;
                record.set_value(pk.property, key_value(&pk.value, key)?)?;
            }
            let key = insert_one(executor, &writer, &table, record.as_mut()).await?;
            result.inserted.push(key);
        }
        (ChangeKind::Insert, Payload::Collection(records)) => {
            if table.key_strategy == KeyStrategy::Identity {
                for record in records.iter_mut() {
                    let key = insert_one(executor, &writer, &table, record.as_mut()).await?;
                    result.inserted.push(key);
                }
            } else {
                if let (Some(sequence), Some(pk)) = (table.sequence(), table.primary_key()) {
                    let unset = records
                        .iter()
                        .filter(|v| is_unset(v.as_ref(), pk))
                        .count() as u64;
                    let mut keys = KeyRange::allocate(executor, sequence, unset).await?;
                    for record in records.iter_mut() {
                        if !is_unset(record.as_ref(), pk) {
                            continue;
                        }
                        let Some(key) = keys.next() else {
                            break;
                        };
                        record.set_value(pk.property, key_value(&pk.value, key)?)?;
                    }
                }
                let rows = records.iter().map(|v| v.as_ref()).collect::<Vec<_>>();
                executor.bulk_load(&table, &rows).await?;
                if let Some(pk) = table.primary_key() {
                    result.inserted.extend(
                        rows.iter()
                            .map(|v| v.get_value(pk.property).unwrap_or_default()),
                    );
                }
            }
        }
        (kind, payload) => {
            let changed = change.changed.as_deref();
            for record in payload.records() {
                let statement = writer.write_statement(&table, kind, record, changed)?;
                let affected = executor.execute(statement).await?.rows_affected;
                match kind {
                    ChangeKind::Delete => result.deleted += affected,
                    _ => result.updated += affected,
                }
            }
        }
    }
    Ok(result)
}

/// Inserts one record and returns its key, reading it back for identity tables.
async fn insert_one<E: Executor, W: SqlWriter>(
    executor: &mut E,
    writer: &W,
    table: &TableDescriptor,
    record: &mut dyn Record,
) -> Result<Value> {
    let statement = writer.write_statement(table, ChangeKind::Insert, record, None)?;
    let Some(pk) = table.primary_key() else {
        executor.execute(statement).await?;
        return Ok(Value::Null);
    };
    if table.key_strategy == KeyStrategy::Identity {
        let key = executor.fetch_scalar(statement).await?;
        let key = match key.as_i64() {
            Some(v) => key_value(&pk.value, v)?,
            None => key,
        };
        record.set_value(pk.property, key.clone())?;
        Ok(key)
    } else {
        executor.execute(statement).await?;
        Ok(record.get_value(pk.property).unwrap_or_default())
    }
}

fn is_unset(record: &dyn Record, pk: &ColumnDescriptor) -> bool {
    record
        .get_value(pk.property)
        .is_none_or(|v| v.is_unset_key())
}
