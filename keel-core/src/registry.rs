use crate::{Entity, Result, TableDescriptor};
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// Cache of resolved table descriptors, one per entity type.
///
/// A descriptor is built the first time it is requested. Concurrent first
/// requests can build it more than once, but only the first stored instance is
/// kept and every caller receives that one.
#[derive(Default, Debug)]
pub struct Registry {
    tables: RwLock<HashMap<TypeId, Arc<TableDescriptor>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descriptor<E: Entity>(&self) -> Result<Arc<TableDescriptor>> {
        let id = TypeId::of::<E>();
        if let Some(table) = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(table.clone());
        }
        let table = Arc::new(TableDescriptor::build(&E::table_def())?);
        Ok(self
            .tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert(table)
            .clone())
    }

    /// Resolve the mapping of `E` now, to surface mapping errors at startup.
    pub fn register<E: Entity>(&self) -> Result<&Self> {
        self.descriptor::<E>()?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
