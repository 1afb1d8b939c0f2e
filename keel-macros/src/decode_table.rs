use crate::decode_column::{ColumnMetadata, decode_column};
use quote::ToTokens;
use syn::{Fields, ItemStruct, LitInt, LitStr, parse::ParseBuffer};

#[derive(Default)]
pub(crate) struct TemplatesMetadata {
    pub(crate) select: Option<String>,
    pub(crate) count: Option<String>,
    pub(crate) insert: Option<String>,
    pub(crate) update: Option<String>,
    pub(crate) delete: Option<String>,
    pub(crate) procedure: Option<String>,
}

impl TemplatesMetadata {
    pub(crate) fn is_empty(&self) -> bool {
        self.select.is_none()
            && self.count.is_none()
            && self.insert.is_none()
            && self.update.is_none()
            && self.delete.is_none()
            && self.procedure.is_none()
    }
}

pub(crate) struct TableMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) columns: Vec<ColumnMetadata>,
    /// Table name override, empty when derived from the type name.
    pub(crate) name: String,
    pub(crate) primary_key: String,
    pub(crate) identity: bool,
    pub(crate) sequence: Option<String>,
    pub(crate) priority: Option<i32>,
    pub(crate) templates: TemplatesMetadata,
}

fn parse_string(arg: &syn::meta::ParseNestedMeta, attribute: &str) -> String {
    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
        panic!(
            "Error while parsing `{}`, use it like: `#[keel({} = \"...\")]`",
            attribute, attribute
        );
    };
    value.value()
}

pub fn decode_table(item: ItemStruct) -> TableMetadata {
    let Fields::Named(fields) = &item.fields else {
        panic!("Entity can be derived only for structs with named fields");
    };
    let columns: Vec<_> = fields.named.iter().map(decode_column).collect();
    let mut table = TableMetadata {
        item: item.clone(),
        columns,
        name: String::new(),
        primary_key: String::new(),
        identity: false,
        sequence: None,
        priority: None,
        templates: Default::default(),
    };
    for attr in &item.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("keel") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `keel`, use it like: `#[keel(attribute = value, ..)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    table.name = parse_string(&arg, "name");
                } else if arg.path.is_ident("primary_key") {
                    let property = parse_string(&arg, "primary_key");
                    if !table.columns.iter().any(|c| c.property == property) {
                        panic!("Primary key `{}` is not a field of the entity", property);
                    }
                    table.primary_key = property;
                } else if arg.path.is_ident("identity") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `identity`, use it like: `#[keel(identity)]`");
                    };
                    table.identity = true;
                } else if arg.path.is_ident("sequence") {
                    table.sequence = Some(parse_string(&arg, "sequence"));
                } else if arg.path.is_ident("priority") {
                    let Ok(value) = arg
                        .value()
                        .and_then(ParseBuffer::parse::<LitInt>)
                        .and_then(|v| v.base10_parse::<i32>())
                    else {
                        panic!("Error while parsing `priority`, use it like: `#[keel(priority = 10)]`");
                    };
                    table.priority = Some(value);
                } else if arg.path.is_ident("select") {
                    table.templates.select = Some(parse_string(&arg, "select"));
                } else if arg.path.is_ident("count") {
                    table.templates.count = Some(parse_string(&arg, "count"));
                } else if arg.path.is_ident("insert") {
                    table.templates.insert = Some(parse_string(&arg, "insert"));
                } else if arg.path.is_ident("update") {
                    table.templates.update = Some(parse_string(&arg, "update"));
                } else if arg.path.is_ident("delete") {
                    table.templates.delete = Some(parse_string(&arg, "delete"));
                } else if arg.path.is_ident("procedure") {
                    table.templates.procedure = Some(parse_string(&arg, "procedure"));
                } else {
                    panic!(
                        "Unknown attribute `{}` inside keel macro",
                        arg.path.to_token_stream()
                    );
                }
                Ok(())
            });
        }
    }
    table
}
