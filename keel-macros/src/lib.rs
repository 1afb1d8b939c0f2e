mod decode_column;
mod decode_table;
mod encode_column_def;
mod encode_table_def;

use decode_table::decode_table;
use encode_table_def::encode_table_def;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Maps a struct with named fields to a table.
///
/// Struct attributes: `name`, `primary_key = "field"`, `identity`,
/// `sequence`, `priority`, and the SQL templates `select`, `count`, `insert`,
/// `update`, `delete`, `procedure`.
/// Field attributes: `name`, `primary_key`, `skip`, `read_only` (or
/// `writable = false`).
///
/// Every field type must implement `AsValue + Clone`, the `skip` ones also
/// `Default` so rows that leave them out still decode.
#[proc_macro_derive(Entity, attributes(keel))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let table = decode_table(item);
    let item = &table.item;
    let name = &item.ident;
    let entity = name.to_string();
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let table_def = encode_table_def(&table);
    let properties = table.columns.iter().map(|c| &c.property).collect::<Vec<_>>();
    let idents = table.columns.iter().map(|c| &c.ident).collect::<Vec<_>>();
    let types = table.columns.iter().map(|c| &c.ty).collect::<Vec<_>>();
    let decode = table.columns.iter().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let property = &c.property;
        if c.skip {
            quote!(#ident: row.decode_or_default::<#ty>(#property)?)
        } else {
            quote!(#ident: row.decode::<#ty>(#property)?)
        }
    });
    quote! {
        impl #impl_generics ::keel::Record for #name #ty_generics #where_clause {
            fn entity_name(&self) -> &'static str {
                #entity
            }

            fn get_value(&self, property: &str) -> Option<::keel::Value> {
                match property {
                    #(#properties => Some(::keel::AsValue::as_value(
                        ::std::clone::Clone::clone(&self.#idents)
                    )),)*
                    _ => None,
                }
            }

            fn set_value(&mut self, property: &str, value: ::keel::Value) -> ::keel::Result<()> {
                match property {
                    #(#properties => {
                        self.#idents = <#types as ::keel::AsValue>::try_from_value(value).map_err(|e| {
                            e.context(format!("While assigning `{}` of {}", property, #entity))
                        })?;
                    })*
                    _ => {
                        return Err(::keel::Error::msg(format!(
                            "`{}` is not a property of {}",
                            property, #entity
                        )));
                    }
                }
                Ok(())
            }

            fn row(&self) -> Vec<(&'static str, ::keel::Value)> {
                vec![#((
                    #properties,
                    ::keel::AsValue::as_value(::std::clone::Clone::clone(&self.#idents)),
                )),*]
            }
        }

        impl #impl_generics ::keel::Entity for #name #ty_generics #where_clause {
            fn table_def() -> ::keel::TableDef {
                #table_def
            }

            fn properties() -> &'static [&'static str] {
                &[#(#properties),*]
            }

            fn from_row(row: ::keel::RowLabeled) -> ::keel::Result<Self> {
                Ok(Self {
                    #(#decode,)*
                })
            }
        }
    }
    .into()
}
