use crate::{decode_table::TableMetadata, encode_column_def::encode_column_def};
use proc_macro2::TokenStream;
use quote::quote;

fn template(value: &Option<String>) -> TokenStream {
    match value {
        Some(v) => quote!(Some(::std::borrow::Cow::Borrowed(#v))),
        None => quote!(None),
    }
}

pub fn encode_table_def(table: &TableMetadata) -> TokenStream {
    let entity = table.item.ident.to_string();
    let mut result = quote!(::keel::TableDef::new(#entity));
    if !table.name.is_empty() {
        let name = &table.name;
        result = quote!(#result.name(#name));
    }
    if !table.primary_key.is_empty() {
        let primary_key = &table.primary_key;
        result = quote!(#result.primary_key(#primary_key));
    }
    if table.identity {
        result = quote!(#result.identity());
    }
    if let Some(sequence) = &table.sequence {
        result = quote!(#result.sequence(#sequence));
    }
    if let Some(priority) = table.priority {
        result = quote!(#result.priority(#priority));
    }
    if !table.templates.is_empty() {
        let select = template(&table.templates.select);
        let count = template(&table.templates.count);
        let insert = template(&table.templates.insert);
        let update = template(&table.templates.update);
        let delete = template(&table.templates.delete);
        let procedure = template(&table.templates.procedure);
        result = quote! {
            #result.templates(::keel::SqlTemplates {
                select: #select,
                count: #count,
                insert: #insert,
                update: #update,
                delete: #delete,
                procedure: #procedure,
            })
        };
    }
    let columns = table.columns.iter().map(encode_column_def);
    quote!(#result #(.column(#columns))*)
}
