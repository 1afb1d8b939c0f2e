use crate::{Record, TableDescriptor, Value};
use std::{
    fmt::{self, Debug},
    sync::Arc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Runs the table's stored procedure template once per record.
    StoredProcedure,
}

/// Records carried by a change.
pub enum Payload {
    Single(Box<dyn Record>),
    Collection(Vec<Box<dyn Record>>),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::Single(..) => 1,
            Payload::Collection(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> impl Iterator<Item = &dyn Record> {
        let (single, collection) = match self {
            Payload::Single(v) => (Some(v.as_ref()), &[][..]),
            Payload::Collection(v) => (None, v.as_slice()),
        };
        single.into_iter().chain(collection.iter().map(|v| v.as_ref()))
    }
}

/// One staged write.
pub struct PendingChange {
    pub kind: ChangeKind,
    pub payload: Payload,
    pub table: Arc<TableDescriptor>,
    /// Properties an update is restricted to.
    pub changed: Option<Vec<String>>,
}

impl PendingChange {
    pub fn single(kind: ChangeKind, table: Arc<TableDescriptor>, record: Box<dyn Record>) -> Self {
        Self {
            kind,
            payload: Payload::Single(record),
            table,
            changed: None,
        }
    }

    pub fn collection(
        kind: ChangeKind,
        table: Arc<TableDescriptor>,
        records: Vec<Box<dyn Record>>,
    ) -> Self {
        Self {
            kind,
            payload: Payload::Collection(records),
            table,
            changed: None,
        }
    }

    pub fn changed(mut self, properties: Vec<String>) -> Self {
        self.changed = Some(properties);
        self
    }

    /// Identity used to collapse repeated single changes: table name and key.
    ///
    /// Collections and records without a key have none.
    pub fn key(&self) -> Option<(String, Value)> {
        let Payload::Single(record) = &self.payload else {
            return None;
        };
        let pk = self.table.primary_key()?;
        let value = record.get_value(pk.property)?;
        if value.is_unset_key() {
            return None;
        }
        Some((self.table.name.clone(), value))
    }
}

impl Debug for PendingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingChange")
            .field("kind", &self.kind)
            .field("table", &self.table.name)
            .field("records", &self.payload.len())
            .field("changed", &self.changed)
            .finish()
    }
}
