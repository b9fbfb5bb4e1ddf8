//! Derive macros for pginsert
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record;

/// Derive the `Record` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use pginsert::Record;
///
/// #[derive(Record)]
/// struct EmbeddingTest {
///     id: i64,
///     field: i32,
/// }
///
/// #[derive(Record)]
/// #[orm(table = "my_schema.items", alias = "item")]
/// struct Item {
///     #[orm(embed)]
///     base: EmbeddingTest,
///     #[orm(pk, column = "item_sku")]
///     sku: String,
///     #[orm(not_null)]
///     count: i32,
/// }
/// ```
///
/// # Attributes
///
/// Struct:
/// - `#[orm(table = "name")]` - Explicit table name, emitted verbatim
/// - `#[orm(alias = "name")]` - Explicit alias (default: snake-cased type name)
///
/// Field:
/// - `#[orm(pk)]` - Primary key column; a zero value is sent as a literal
/// - `#[orm(not_null)]` - NOT NULL column; a zero value is sent as a literal
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(embed)]` - Flatten another `Record`'s columns at this position
/// - `#[orm(embed, override)]` - Also take the embedded record's table name and alias
/// - `#[orm(skip)]` - Not a column
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
