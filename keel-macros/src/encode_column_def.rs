use crate::decode_column::ColumnMetadata;
use proc_macro2::TokenStream;
use quote::quote;

pub fn encode_column_def(metadata: &ColumnMetadata) -> TokenStream {
    let property = &metadata.property;
    let ty = &metadata.ty;
    let mut result = quote! {
        ::keel::ColumnDef::new(#property, <#ty as ::keel::AsValue>::as_empty_value())
    };
    if !metadata.name.is_empty() {
        let name = &metadata.name;
        result = quote!(#result.name(#name));
    }
    if metadata.nullable {
        result = quote!(#result.nullable());
    }
    if !metadata.writable {
        result = quote!(#result.read_only());
    }
    if metadata.skip {
        result = quote!(#result.skip());
    }
    if metadata.primary_key {
        result = quote!(#result.primary_key());
    }
    result
}
