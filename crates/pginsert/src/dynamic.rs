//! Runtime-described records.
//!
//! [`DynamicRecord`] pairs a table model built from a [`RecordDescriptor`] at runtime with
//! one value per column. It takes part in queries like any derived record; its model is
//! identified by the descriptor's type name.

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::{OrmError, OrmResult};
use crate::record::{FieldValue, Instance};
use crate::schema::{ModelKey, RecordDescriptor, SchemaRegistry, TableModel};
use crate::value::Value;

/// Build the table model of a runtime descriptor.
pub fn dynamic_model(desc: &RecordDescriptor) -> OrmResult<Arc<TableModel>> {
    let key = ModelKey::Named(desc.type_name.to_string());
    Ok(Arc::new(TableModel::from_descriptor(key, desc)?))
}

/// A row of a runtime-described record type.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRecord {
    model: Arc<TableModel>,
    fields: Vec<FieldValue>,
}

impl DynamicRecord {
    /// Create a row from values in column order.
    ///
    /// Each value is zero per [`Value::is_zero`]. A value count that differs from the column
    /// count is reported when the row is compiled.
    pub fn new(model: Arc<TableModel>, values: Vec<Value>) -> Self {
        let fields = values
            .into_iter()
            .map(|value| {
                let zero = value.is_zero();
                FieldValue::new(value, zero)
            })
            .collect();
        Self { model, fields }
    }

    /// Create a row from a JSON object keyed by field or column name.
    ///
    /// Missing keys become `NULL` (zero). Unknown keys are rejected.
    pub fn from_json(
        model: Arc<TableModel>,
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> OrmResult<Self> {
        for key in object.keys() {
            let known = model
                .columns
                .iter()
                .any(|c| c.name == *key || c.field == *key);
            if !known {
                return Err(OrmError::unsupported_value(
                    key.as_str(),
                    format!("{} has no such field", model.type_name),
                ));
            }
        }

        let values = model
            .columns
            .iter()
            .map(|c| {
                object
                    .get(&c.field)
                    .or_else(|| object.get(&c.name))
                    .map_or(Value::Null, json_to_value)
            })
            .collect();
        Ok(Self::new(model, values))
    }

    /// The row's table model.
    pub fn model(&self) -> &Arc<TableModel> {
        &self.model
    }

    /// The row's field values in column order.
    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }
}

/// Map a JSON value to a field value.
///
/// Objects stay JSON documents; arrays become array values.
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(v) => Value::Bool(*v),
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::Int(v)
            } else if let Some(v) = n.as_u64() {
                Value::UInt(v)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(v) => Value::Text(v.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(_) => Value::Json(json.clone()),
    }
}

impl Instance for DynamicRecord {
    fn model_key(&self) -> ModelKey {
        self.model.key.clone()
    }

    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.model.type_name)
    }

    fn table_model(&self, _registry: &SchemaRegistry) -> OrmResult<Arc<TableModel>> {
        Ok(Arc::clone(&self.model))
    }

    fn append_fields(&self, out: &mut Vec<FieldValue>) {
        out.extend(self.fields.iter().cloned());
    }
}
