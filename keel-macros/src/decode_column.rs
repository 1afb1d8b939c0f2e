use quote::ToTokens;
use syn::{
    Field, GenericArgument, Ident, LitBool, LitStr, PathArguments, Type, ext::IdentExt,
    parse::ParseBuffer,
};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Property name, the field name without the raw prefix.
    pub(crate) property: String,
    /// Column name override, empty when the column is named after the property.
    pub(crate) name: String,
    pub(crate) nullable: bool,
    pub(crate) writable: bool,
    pub(crate) skip: bool,
    pub(crate) primary_key: bool,
}

/// `Option<T>` (also spelled with its full path) maps to a nullable column.
fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    let Some(last) = path.path.segments.last() else {
        return false;
    };
    last.ident == "Option"
        && matches!(
            &last.arguments,
            PathArguments::AngleBracketed(args)
                if matches!(args.args.first(), Some(GenericArgument::Type(..)))
        )
}

pub fn decode_column(field: &Field) -> ColumnMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Entity fields are expected to have a name");
    let mut metadata = ColumnMetadata {
        property: ident.unraw().to_string(),
        ident,
        ty: field.ty.clone(),
        name: String::new(),
        nullable: is_option(&field.ty),
        writable: true,
        skip: false,
        primary_key: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("keel") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `keel`, use it like: `#[keel(attribute = value, ...)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `name`, use it like: `#[keel(name = \"my_column\")]`");
                    };
                    metadata.name = v.value();
                } else if arg.path.is_ident("skip") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `skip`, use it like: `#[keel(skip)]`");
                    };
                    metadata.skip = true;
                } else if arg.path.is_ident("writable") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitBool>) else {
                        panic!("Error while parsing `writable`, use it like: `#[keel(writable = false)]`");
                    };
                    metadata.writable = v.value();
                } else if arg.path.is_ident("read_only") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `read_only`, use it like: `#[keel(read_only)]`");
                    };
                    metadata.writable = false;
                } else if arg.path.is_ident("primary_key") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `primary_key`, use it like: `#[keel(primary_key)]`");
                    };
                    metadata.primary_key = true;
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
    metadata
}
