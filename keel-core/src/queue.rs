use crate::{
    ChangeKind, Connection, Entity, Error, PendingChange, Registry, Result, SaveResponse, Value,
    save,
};
use std::{collections::HashMap, mem, sync::Arc};

/// Unit of work: stages writes and applies them in one transaction.
///
/// A single-record change replaces an earlier staged one for the same table
/// and primary key, keeping the earlier position. Collections are never
/// collapsed.
///
/// An unset key (null, or zero for integer keys) is not a key value: two
/// records with unset keys never replace each other, even on the same table.
/// Each one becomes its own row with a generated key.
///
/// # Examples
/// ```rust,ignore
/// let mut queue = ChangeQueue::new(registry.clone());
/// queue.insert(Customer { id: 0, name: "Ada".into(), ..Default::default() })?;
/// queue.add_collection(ChangeKind::Insert, orders)?;
/// let response = queue.save(&mut connection).await;
/// assert!(response.is_success());
/// ```
pub struct ChangeQueue {
    registry: Arc<Registry>,
    changes: Vec<PendingChange>,
    index: HashMap<(String, Value), usize>,
}

impl ChangeQueue {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            changes: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Stages one record.
    pub fn add<E: Entity>(&mut self, kind: ChangeKind, entity: E) -> Result<&mut Self> {
        let table = self.registry.descriptor::<E>()?;
        let change = PendingChange::single(kind, table, Box::new(entity));
        self.stage(change)
    }

    /// Stages many records of the same type as one change.
    pub fn add_collection<E: Entity>(
        &mut self,
        kind: ChangeKind,
        entities: impl IntoIterator<Item = E>,
    ) -> Result<&mut Self> {
        let table = self.registry.descriptor::<E>()?;
        let records = entities
            .into_iter()
            .map(|v| Box::new(v) as Box<dyn crate::Record>)
            .collect::<Vec<_>>();
        if records.is_empty() {
            return Ok(self);
        }
        self.stage(PendingChange::collection(kind, table, records))
    }

    /// Stages an update restricted to `properties`.
    pub fn update_partial<E: Entity, S: Into<String>>(
        &mut self,
        entity: E,
        properties: impl IntoIterator<Item = S>,
    ) -> Result<&mut Self> {
        let properties = properties
            .into_iter()
            .map(Into::into)
            .collect::<Vec<String>>();
        if let Some(unknown) = properties
            .iter()
            .find(|p| !E::properties().contains(&p.as_str()))
        {
            let error = Error::msg(format!(
                "Cannot update `{}`, it is not a property of {}",
                unknown,
                E::table_def().entity
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        let table = self.registry.descriptor::<E>()?;
        let change =
            PendingChange::single(ChangeKind::Update, table, Box::new(entity)).changed(properties);
        self.stage(change)
    }

    pub fn insert<E: Entity>(&mut self, entity: E) -> Result<&mut Self> {
        self.add(ChangeKind::Insert, entity)
    }

    pub fn update<E: Entity>(&mut self, entity: E) -> Result<&mut Self> {
        self.add(ChangeKind::Update, entity)
    }

    pub fn delete<E: Entity>(&mut self, entity: E) -> Result<&mut Self> {
        self.add(ChangeKind::Delete, entity)
    }

    fn stage(&mut self, change: PendingChange) -> Result<&mut Self> {
        change.table.ensure_writable()?;
        if change.kind == ChangeKind::StoredProcedure && change.table.templates.procedure.is_none()
        {
            let error = Error::msg(format!(
                "Table `{}` has no stored procedure template",
                change.table.name
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        match change.key() {
            Some(key) => match self.index.get(&key) {
                Some(i) => self.changes[*i] = change,
                None => {
                    self.index.insert(key, self.changes.len());
                    self.changes.push(change);
                }
            },
            None => self.changes.push(change),
        }
        Ok(self)
    }

    /// Number of staged changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[PendingChange] {
        &self.changes
    }

    /// Drops every staged change.
    pub fn reset(&mut self) {
        self.changes.clear();
        self.index.clear();
    }

    /// Applies every staged change in one transaction. The queue is empty
    /// afterwards whatever the outcome.
    pub async fn save<C: Connection>(&mut self, connection: &mut C) -> SaveResponse {
        let changes = mem::take(&mut self.changes);
        self.index.clear();
        save(connection, changes).await
    }
}
