//! Record derive macro implementation

mod attrs;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

use attrs::{get_field_attr, get_struct_attr};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let struct_attr = get_struct_attr(&input)?;
    let type_name = name.to_string();
    let table_call = struct_attr.table.map(|t| quote! { .table(#t) });
    let alias_call = struct_attr.alias.map(|a| quote! { .alias(#a) });

    let mut describe_calls = Vec::new();
    let mut value_pushes = Vec::new();
    for field in fields {
        let attr = get_field_attr(field)?;
        if attr.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;

        if attr.embed {
            let override_table = attr.override_table;
            describe_calls.push(quote! {
                .embed(<#ty as pginsert::Record>::describe(), #override_table)
            });
            value_pushes.push(quote! {
                pginsert::Record::field_values(&self.#ident, out);
            });
            continue;
        }

        let field_name = ident.to_string();
        let pk_call = attr.pk.then(|| quote! { .pk() });
        let not_null_call = attr.not_null.then(|| quote! { .not_null() });
        let column_call = attr.column.map(|c| quote! { .column(#c) });
        describe_calls.push(quote! {
            .column(
                pginsert::ColumnDescriptor::new(#field_name)
                    #pk_call #not_null_call #column_call
            )
        });
        value_pushes.push(quote! {
            out.push(pginsert::FieldValue::of(&self.#ident));
        });
    }

    Ok(quote! {
        impl #impl_generics pginsert::Record for #name #ty_generics #where_clause {
            fn describe() -> pginsert::RecordDescriptor {
                pginsert::RecordDescriptor::new(#type_name)
                    #table_call
                    #alias_call
                    #(#describe_calls)*
            }

            fn field_values(&self, out: &mut ::std::vec::Vec<pginsert::FieldValue>) {
                #(#value_pushes)*
            }
        }
    })
}
