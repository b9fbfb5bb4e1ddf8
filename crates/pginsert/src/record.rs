//! Record types and the record introspector.
//!
//! [`Record`] is the compile-time schema capability implemented by `#[derive(Record)]`.
//! [`Instance`] is its object-safe counterpart used by queries, so one query can hold rows
//! behind `&dyn Instance` (and so runtime-described rows can take part too).

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::{OrmError, OrmResult};
use crate::format::{Formatted, Formatter};
use crate::schema::{Column, ModelKey, RecordDescriptor, SchemaRegistry, TableModel};
use crate::value::{ToValue, Value};

/// A field value as extracted from a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub value: Value,
    /// The field holds its type's zero value.
    pub zero: bool,
}

impl FieldValue {
    pub fn new(value: Value, zero: bool) -> Self {
        Self { value, zero }
    }

    /// Extract a field through [`ToValue`].
    pub fn of<T: ToValue + ?Sized>(field: &T) -> Self {
        Self {
            value: field.to_value(),
            zero: field.is_zero(),
        }
    }
}

/// A Rust type mapped to a relation.
///
/// Usually derived:
///
/// ```ignore
/// use pginsert::Record;
///
/// #[derive(Record)]
/// #[orm(table = "users")]
/// struct User {
///     #[orm(pk)]
///     id: i64,
///     name: String,
/// }
/// ```
///
/// `field_values` must push exactly one value per column of `describe()`, in the same
/// (flattened) order.
pub trait Record: Sync + 'static {
    /// Schema description of this type.
    fn describe() -> RecordDescriptor
    where
        Self: Sized;

    /// Append this instance's field values in column order.
    fn field_values(&self, out: &mut Vec<FieldValue>);
}

/// Object-safe view of a row to insert.
///
/// `Sync` so that queries borrowing rows can be held across `.await` in `Send` futures.
pub trait Instance: Sync {
    /// Identity of the row's record type.
    fn model_key(&self) -> ModelKey;

    /// Name of the row's record type, for error messages.
    fn type_name(&self) -> Cow<'_, str>;

    /// The table model of the row's record type.
    fn table_model(&self, registry: &SchemaRegistry) -> OrmResult<Arc<TableModel>>;

    /// Append the row's field values in column order.
    fn append_fields(&self, out: &mut Vec<FieldValue>);
}

impl<T: Record> Instance for T {
    fn model_key(&self) -> ModelKey {
        ModelKey::of::<T>()
    }

    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<T>())
    }

    fn table_model(&self, registry: &SchemaRegistry) -> OrmResult<Arc<TableModel>> {
        registry.model_for::<T>()
    }

    fn append_fields(&self, out: &mut Vec<FieldValue>) {
        Record::field_values(self, out);
    }
}

/// One rendered column of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedColumn<'m> {
    pub column: &'m Column,
    pub value: Formatted,
}

/// Render every column of `row` against `model`, in column order.
///
/// Fails with `TypeMismatch` if the row belongs to another record type or does not yield
/// one value per column, and with `UnsupportedValue` if a value cannot be rendered.
pub fn extract<'m>(
    row: &dyn Instance,
    model: &'m TableModel,
    formatter: &Formatter,
) -> OrmResult<Vec<ExtractedColumn<'m>>> {
    if row.model_key() != model.key {
        return Err(OrmError::type_mismatch(&model.type_name, row.type_name()));
    }

    let mut fields = Vec::with_capacity(model.columns.len());
    row.append_fields(&mut fields);
    if fields.len() != model.columns.len() {
        return Err(OrmError::type_mismatch(
            format!("{} ({} columns)", model.type_name, model.columns.len()),
            format!("{} values", fields.len()),
        ));
    }

    model
        .columns
        .iter()
        .zip(&fields)
        .map(|(column, field)| {
            Ok(ExtractedColumn {
                column,
                value: formatter.format(field, column)?,
            })
        })
        .collect()
}
