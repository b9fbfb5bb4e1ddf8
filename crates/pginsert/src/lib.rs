//! # pginsert
//!
//! Compiles in-memory records into PostgreSQL `INSERT` statements.
//!
//! ## Features
//!
//! - **Schema from types**: `#[derive(Record)]` describes table name, alias and columns once;
//!   models are cached per type
//! - **Server defaults**: zero-valued fields render as `DEFAULT` and come back via `RETURNING`
//! - **Multi-row batches**: one `VALUES` tuple per row, aligned on the model's columns
//! - **Upserts**: `ON CONFLICT ... DO UPDATE SET ... WHERE ...` with trusted SQL fragments
//! - **CTE inserts**: `WITH "src" AS (SELECT ...) INSERT INTO ... SELECT * FROM ...`
//! - **Pluggable literals**: register formatters for custom value kinds (geometry, vectors)
//!
//! ## Example
//!
//! ```ignore
//! use pginsert::{InsertQuery, Record};
//!
//! #[derive(Record)]
//! struct InsertTest {
//!     id: i32,
//!     value: String,
//! }
//!
//! let rows = [
//!     InsertTest { id: 1, value: "hello".into() },
//!     InsertTest { id: 2, value: String::new() },
//! ];
//! let sql = InsertQuery::insert_many(&rows).to_sql()?;
//! assert_eq!(
//!     sql,
//!     r#"INSERT INTO "insert_tests" ("id", "value") VALUES (1, 'hello'), (2, DEFAULT) RETURNING "value""#
//! );
//! ```

pub mod config;
pub mod dynamic;
pub mod error;
pub mod format;
pub mod ident;
pub mod insert;
pub mod prelude;
pub mod query;
pub mod record;
pub mod schema;
pub mod value;

#[cfg(feature = "postgres")]
pub mod client;

pub use config::CompilerConfig;
pub use dynamic::{DynamicRecord, dynamic_model, json_to_value};
pub use error::{OrmError, OrmResult};
pub use format::{DEFAULT_KEYWORD, Formatted, Formatter, LiteralFormat, VectorLiteral};
pub use ident::quote_ident;
pub use insert::{Compiler, compile_insert};
pub use query::InsertQuery;
pub use record::{ExtractedColumn, FieldValue, Instance, Record, extract};
pub use schema::{
    Column, ColumnDescriptor, FieldDescriptor, ModelKey, RecordDescriptor, SchemaRegistry,
    TableModel, TableName, default_table_name,
};
pub use value::{Fragment, ToValue, Value};

#[cfg(feature = "postgres")]
pub use client::GenericClient;

#[cfg(feature = "derive")]
pub use pginsert_derive::Record;
