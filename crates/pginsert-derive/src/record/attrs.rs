//! Attribute parsing for the Record derive macro.
//!
//! Handles struct-level `#[orm(table = "...", alias = "...")]` and field-level
//! `#[orm(pk, not_null, column = "...", embed, override, skip)]`.

use syn::ext::IdentExt;
use syn::{DeriveInput, Result};

/// Struct-level attributes.
#[derive(Debug, Default, PartialEq)]
pub(super) struct StructAttr {
    pub table: Option<String>,
    pub alias: Option<String>,
}

/// Field-level attributes.
#[derive(Debug, Default, PartialEq)]
pub(super) struct FieldAttr {
    pub pk: bool,
    pub not_null: bool,
    pub column: Option<String>,
    pub embed: bool,
    pub override_table: bool,
    pub skip: bool,
}

impl syn::parse::Parse for StructAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = StructAttr::default();
        while !input.is_empty() {
            let ident = syn::Ident::parse_any(input)?;
            let _: syn::Token![=] = input.parse()?;
            let value: syn::LitStr = input.parse()?;
            match ident.to_string().as_str() {
                "table" => attr.table = Some(value.value()),
                "alias" => attr.alias = Some(value.value()),
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown struct attribute `{other}`"),
                    ));
                }
            }
            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(attr)
    }
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();
        while !input.is_empty() {
            // `override` is a reserved word, so accept any identifier.
            let ident = syn::Ident::parse_any(input)?;
            match ident.to_string().as_str() {
                "pk" => attr.pk = true,
                "not_null" | "notnull" => attr.not_null = true,
                "embed" => attr.embed = true,
                "override" => attr.override_table = true,
                "skip" => attr.skip = true,
                "column" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: syn::LitStr = input.parse()?;
                    attr.column = Some(value.value());
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown field attribute `{other}`"),
                    ));
                }
            }
            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(attr)
    }
}

/// Collect all struct-level `#[orm(...)]` attributes.
pub(super) fn get_struct_attr(input: &DeriveInput) -> Result<StructAttr> {
    let mut merged = StructAttr::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: StructAttr = attr.parse_args()?;
        merged.table = parsed.table.or(merged.table);
        merged.alias = parsed.alias.or(merged.alias);
    }
    Ok(merged)
}

/// Collect all `#[orm(...)]` attributes of a field.
pub(super) fn get_field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: FieldAttr = attr.parse_args()?;
        merged.pk |= parsed.pk;
        merged.not_null |= parsed.not_null;
        merged.embed |= parsed.embed;
        merged.override_table |= parsed.override_table;
        merged.skip |= parsed.skip;
        merged.column = parsed.column.or(merged.column);
    }

    if merged.override_table && !merged.embed {
        return Err(syn::Error::new_spanned(
            field,
            "`override` is only valid together with `embed`",
        ));
    }
    if merged.embed && (merged.pk || merged.not_null || merged.column.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "an `embed` field takes its column flags from the embedded record",
        ));
    }
    Ok(merged)
}
