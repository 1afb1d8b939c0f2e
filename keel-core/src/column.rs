use crate::Value;
use std::borrow::Cow;

/// Declared mapping of one entity property to a table column.
///
/// Produced by `#[derive(Entity)]` or written by hand through the builder
/// methods. It is resolved into a [`ColumnDescriptor`] when the table is built.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Name of the bound property.
    pub property: &'static str,
    /// Column name override (empty => same as the property).
    pub name: Cow<'static, str>,
    /// Typed null of the property type.
    pub value: Value,
    /// Property type is optional.
    pub nullable: bool,
    /// Column can be written by inserts and updates.
    pub writable: bool,
    /// Column is left out of the default projection.
    pub skip: bool,
    /// Column is flagged as the primary key.
    pub primary_key: bool,
}

impl ColumnDef {
    pub fn new(property: &'static str, value: Value) -> Self {
        Self {
            property,
            name: Cow::Borrowed(""),
            value,
            nullable: false,
            writable: true,
            skip: false,
            primary_key: false,
        }
    }
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
    pub fn column_name(&self) -> &str {
        if self.name.is_empty() {
            self.property
        } else {
            &self.name
        }
    }
}

/// Resolved column of a [`crate::TableDescriptor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub property: &'static str,
    pub value: Value,
    pub nullable: bool,
    pub writable: bool,
    pub skip: bool,
    pub primary_key: bool,
}

impl ColumnDescriptor {
    /// Column is projected with an alias because its name differs from the property.
    pub fn is_aliased(&self) -> bool {
        self.name != self.property
    }
}

impl From<&ColumnDef> for ColumnDescriptor {
    fn from(value: &ColumnDef) -> Self {
        Self {
            name: value.column_name().to_string(),
            property: value.property,
            value: value.value.as_type(),
            nullable: value.nullable,
            writable: value.writable,
            skip: value.skip,
            primary_key: value.primary_key,
        }
    }
}
