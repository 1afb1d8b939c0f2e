use crate::{ColumnDef, ColumnDescriptor, Error, Result};
use convert_case::{Case, Casing};
use std::{borrow::Cow, collections::HashSet};

/// Priority of a table that does not declare one. Lower values are saved first.
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Property that turns deletes into `UPDATE .. SET is_deleted = true`.
pub const SOFT_DELETE_PROPERTY: &str = "is_deleted";

/// Custom SQL replacing the generated statements.
///
/// Templates are taken verbatim and receive every property of the record as a
/// named parameter. The select and count templates replace the `SELECT .. FROM ..`
/// part only, the filter and paging are still appended.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SqlTemplates {
    pub select: Option<Cow<'static, str>>,
    pub count: Option<Cow<'static, str>>,
    pub insert: Option<Cow<'static, str>>,
    pub update: Option<Cow<'static, str>>,
    pub delete: Option<Cow<'static, str>>,
    pub procedure: Option<Cow<'static, str>>,
}

/// Declared mapping of an entity type.
#[derive(Debug, Clone)]
pub struct TableDef {
    /// Rust type name of the entity.
    pub entity: &'static str,
    /// Table name override (empty => `snake_case` of the entity name).
    pub name: Cow<'static, str>,
    /// Property holding the primary key (empty => flagged column or `id`).
    pub primary_key: &'static str,
    /// Key generated by the database on insert.
    pub identity: bool,
    /// Sequence override for integer keys.
    pub sequence: Option<Cow<'static, str>>,
    pub priority: Option<i32>,
    pub templates: SqlTemplates,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            name: Cow::Borrowed(""),
            primary_key: "",
            identity: false,
            sequence: None,
            priority: None,
            templates: Default::default(),
            columns: Vec::new(),
        }
    }
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
    pub fn primary_key(mut self, property: &'static str) -> Self {
        self.primary_key = property;
        self
    }
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }
    pub fn sequence(mut self, sequence: impl Into<Cow<'static, str>>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
    pub fn templates(mut self, templates: SqlTemplates) -> Self {
        self.templates = templates;
        self
    }
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }
    pub fn table_name(&self) -> String {
        if self.name.is_empty() {
            self.entity.to_case(Case::Snake)
        } else {
            self.name.to_string()
        }
    }
}

/// How the primary key of a new row is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Generated by the database during the insert and read back.
    Identity,
    /// Reserved in ranges from the named sequence before the insert.
    Sequence(String),
    /// Supplied by the caller.
    None,
}

/// Immutable, resolved mapping of an entity type to its table.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pub entity: &'static str,
    pub name: String,
    pub key_strategy: KeyStrategy,
    pub priority: i32,
    pub columns: Vec<ColumnDescriptor>,
    pub templates: SqlTemplates,
    primary_key: Option<usize>,
    soft_delete: Option<usize>,
}

impl TableDescriptor {
    /// Resolve a declared mapping, rejecting the inconsistent ones.
    pub fn build(def: &TableDef) -> Result<Self> {
        let name = def.table_name();
        let error = |message: String| {
            let error = Error::msg(format!("Invalid mapping of `{}`: {}", def.entity, message));
            log::error!("{:#}", error);
            error
        };
        if def.columns.is_empty() {
            return Err(error("the entity has no columns".into()));
        }
        let mut properties = HashSet::new();
        let mut names = HashSet::new();
        for column in &def.columns {
            if !properties.insert(column.property) {
                return Err(error(format!(
                    "property `{}` is mapped more than once",
                    column.property
                )));
            }
            if !names.insert(column.column_name().to_lowercase()) {
                return Err(error(format!(
                    "column `{}` is mapped more than once",
                    column.column_name()
                )));
            }
        }
        let flagged = def
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary_key)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        if flagged.len() > 1 {
            return Err(error("more than one primary key is declared".into()));
        }
        let primary_key = if !def.primary_key.is_empty() {
            let Some(i) = def
                .columns
                .iter()
                .position(|c| c.property == def.primary_key)
            else {
                return Err(error(format!(
                    "primary key `{}` is not a property of the entity",
                    def.primary_key
                )));
            };
            if flagged.first().is_some_and(|v| *v != i) {
                return Err(error("more than one primary key is declared".into()));
            }
            Some(i)
        } else if let Some(i) = flagged.first() {
            Some(*i)
        } else {
            def.columns
                .iter()
                .position(|c| c.property.eq_ignore_ascii_case("id"))
        };
        if def.identity && def.sequence.is_some() {
            return Err(error(
                "a key cannot be both identity and sequence generated".into(),
            ));
        }
        let key_column = primary_key.map(|i| &def.columns[i]);
        let integer_key = key_column.is_some_and(|c| c.value.is_integer());
        if (def.identity || def.sequence.is_some()) && !integer_key {
            return Err(error(
                "identity and sequence keys require an integer primary key".into(),
            ));
        }
        let key_strategy = if key_column.is_none() {
            KeyStrategy::None
        } else if def.identity {
            KeyStrategy::Identity
        } else if let Some(sequence) = &def.sequence {
            KeyStrategy::Sequence(sequence.to_string())
        } else if integer_key {
            KeyStrategy::Sequence(format!("{name}_id_seq"))
        } else {
            KeyStrategy::None
        };
        let columns = def
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut column = ColumnDescriptor::from(c);
                column.primary_key = Some(i) == primary_key;
                if column.primary_key {
                    column.skip = false;
                }
                column
            })
            .collect::<Vec<_>>();
        let soft_delete = columns.iter().position(|c| {
            c.property == SOFT_DELETE_PROPERTY && matches!(c.value, crate::Value::Boolean(..))
        });
        Ok(Self {
            entity: def.entity,
            name,
            key_strategy,
            priority: def.priority.unwrap_or(DEFAULT_PRIORITY),
            columns,
            templates: def.templates.clone(),
            primary_key,
            soft_delete,
        })
    }

    pub fn primary_key(&self) -> Option<&ColumnDescriptor> {
        self.primary_key.map(|i| &self.columns[i])
    }

    /// Tables without a primary key accept no writes.
    pub fn is_read_only(&self) -> bool {
        self.primary_key.is_none()
    }

    pub fn soft_delete(&self) -> Option<&ColumnDescriptor> {
        self.soft_delete.map(|i| &self.columns[i])
    }

    pub fn is_soft_delete(&self) -> bool {
        self.soft_delete.is_some()
    }

    pub fn sequence(&self) -> Option<&str> {
        match &self.key_strategy {
            KeyStrategy::Sequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn column(&self, property: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.property == property)
    }

    /// Columns of the default projection, in declaration order.
    pub fn projected(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| !c.skip)
    }

    /// Columns written by an insert, key included.
    pub fn insertable(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| c.primary_key || c.writable)
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.is_read_only() {
            let error = Error::msg(format!(
                "Table `{}` has no primary key and is read only",
                self.name
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }
}
