//! Table models and the schema registry.
//!
//! A record type describes itself with a [`RecordDescriptor`]: a tree of columns and
//! embedded (composed) records. [`TableModel::from_descriptor`] flattens that tree once;
//! [`SchemaRegistry`] caches the result per Rust type for the life of the process.
//!
//! # Naming
//!
//! - Default table name: snake-cased, pluralized type name, rendered quoted
//!   (`InsertTest` → `"insert_tests"`).
//! - Explicit table annotation: rendered raw, verbatim (`my_schema.items`).
//! - Default alias: snake-cased type name (`"insert_test"`).
//! - An embed marked `override` replaces the outer name and alias with the embedded
//!   record's; the last such embed wins. Other embeds only contribute columns.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use heck::ToSnakeCase;

use crate::error::{OrmError, OrmResult};
use crate::ident::append_ident;
use crate::record::Record;

/// Schema description of one column-bearing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Field name as declared on the record.
    pub field: Cow<'static, str>,
    /// Explicit column name; defaults to the snake-cased field name.
    pub column: Option<Cow<'static, str>>,
    pub pk: bool,
    pub not_null: bool,
}

impl ColumnDescriptor {
    pub fn new(field: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field: field.into(),
            column: None,
            pk: false,
            not_null: false,
        }
    }

    /// Map the field to an explicit column name.
    pub fn column(mut self, column: impl Into<Cow<'static, str>>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Mark the column as (part of) the primary key.
    pub fn pk(mut self) -> Self {
        self.pk = true;
        self
    }

    /// Mark the column as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// One entry of a record's field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDescriptor {
    Column(ColumnDescriptor),
    /// A composed record whose columns are flattened at this position.
    Embed {
        record: RecordDescriptor,
        override_table: bool,
    },
}

/// Schema description of a record type, as registered by `#[derive(Record)]` or built at
/// runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    pub type_name: Cow<'static, str>,
    /// Explicit table annotation (raw SQL text).
    pub table: Option<Cow<'static, str>>,
    /// Explicit alias; defaults to the snake-cased type name.
    pub alias: Option<Cow<'static, str>>,
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    pub fn new(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            table: None,
            alias: None,
            fields: Vec::new(),
        }
    }

    /// Set an explicit table name, rendered verbatim.
    pub fn table(mut self, table: impl Into<Cow<'static, str>>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set an explicit alias.
    pub fn alias(mut self, alias: impl Into<Cow<'static, str>>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Append a column.
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.fields.push(FieldDescriptor::Column(column));
        self
    }

    /// Append an embedded record; `override_table` makes its naming win.
    pub fn embed(mut self, record: RecordDescriptor, override_table: bool) -> Self {
        self.fields.push(FieldDescriptor::Embed {
            record,
            override_table,
        });
        self
    }
}

/// The relation name of a table model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableName {
    /// Derived name, rendered as a quoted identifier.
    Quoted(String),
    /// Caller-supplied SQL text, rendered verbatim.
    Raw(String),
}

impl TableName {
    pub fn as_str(&self) -> &str {
        match self {
            TableName::Quoted(s) | TableName::Raw(s) => s,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, TableName::Raw(_))
    }

    pub(crate) fn append_to(&self, out: &mut String) {
        match self {
            TableName::Quoted(s) => append_ident(out, s),
            TableName::Raw(s) => out.push_str(s),
        }
    }

    /// Render the name as it appears in SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.append_to(&mut out);
        out
    }
}

/// A flattened column of a table model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: String,
    pub name: String,
    pub pk: bool,
    pub not_null: bool,
    /// A zero field may be rendered as `DEFAULT` (neither `pk` nor `not_null`).
    pub skippable_default: bool,
}

impl Column {
    pub fn new(field: impl Into<String>, name: impl Into<String>, pk: bool, not_null: bool) -> Self {
        Self {
            field: field.into(),
            name: name.into(),
            pk,
            not_null,
            skippable_default: !pk && !not_null,
        }
    }
}

/// Identity of a table model, used to reject rows of another record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelKey {
    /// A Rust record type.
    Type(TypeId),
    /// A runtime-described record type, by type name.
    Named(String),
}

impl ModelKey {
    pub fn of<T: 'static>() -> Self {
        ModelKey::Type(TypeId::of::<T>())
    }
}

/// Cached schema description of a record type's relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    pub key: ModelKey,
    pub type_name: String,
    pub name: TableName,
    pub alias: String,
    pub columns: Vec<Column>,
}

impl TableModel {
    /// Flatten a descriptor into a table model.
    ///
    /// Fails on records without columns and on duplicate column names.
    pub fn from_descriptor(key: ModelKey, desc: &RecordDescriptor) -> OrmResult<Self> {
        let mut columns = Vec::new();
        flatten_columns(desc, &mut columns);

        if columns.is_empty() {
            return Err(OrmError::invalid_schema(format!(
                "{} has no columns",
                desc.type_name
            )));
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(OrmError::invalid_schema(format!(
                    "{} maps column '{}' more than once",
                    desc.type_name, col.name
                )));
            }
        }

        let (name, alias) = resolve_naming(desc);
        Ok(Self {
            key,
            type_name: desc.type_name.to_string(),
            name,
            alias,
            columns,
        })
    }

    /// Find a column by its SQL name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

fn flatten_columns(desc: &RecordDescriptor, out: &mut Vec<Column>) {
    for field in &desc.fields {
        match field {
            FieldDescriptor::Column(col) => {
                let name = match &col.column {
                    Some(explicit) => explicit.to_string(),
                    None => col.field.to_snake_case(),
                };
                out.push(Column::new(col.field.to_string(), name, col.pk, col.not_null));
            }
            FieldDescriptor::Embed { record, .. } => flatten_columns(record, out),
        }
    }
}

fn resolve_naming(desc: &RecordDescriptor) -> (TableName, String) {
    let mut name = match &desc.table {
        Some(table) => TableName::Raw(table.to_string()),
        None => TableName::Quoted(default_table_name(&desc.type_name)),
    };
    let mut alias = match &desc.alias {
        Some(alias) => alias.to_string(),
        None => desc.type_name.to_snake_case(),
    };

    for field in &desc.fields {
        if let FieldDescriptor::Embed {
            record,
            override_table: true,
        } = field
        {
            (name, alias) = resolve_naming(record);
        }
    }

    (name, alias)
}

/// Default relation name for a type name: snake case, pluralized.
pub fn default_table_name(type_name: &str) -> String {
    pluralizer::pluralize(&type_name.to_snake_case(), 2, false)
}

/// Process-wide cache of table models keyed by Rust type.
///
/// Safe to populate from several threads: a model is built outside the lock and the first
/// insert wins, so concurrent builds of the same type are harmless.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    models: RwLock<HashMap<TypeId, Arc<TableModel>>>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-global registry.
    pub fn global() -> &'static SchemaRegistry {
        static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();
        GLOBAL.get_or_init(SchemaRegistry::new)
    }

    /// Get (building and caching on first use) the table model of `T`.
    pub fn model_for<T: Record>(&self) -> OrmResult<Arc<TableModel>> {
        let type_id = TypeId::of::<T>();
        if let Some(model) = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
        {
            return Ok(Arc::clone(model));
        }

        let desc = T::describe();
        let model = Arc::new(TableModel::from_descriptor(ModelKey::Type(type_id), &desc)?);
        tracing::trace!(
            target: "pginsert.schema",
            type_name = %model.type_name,
            table = %model.name.as_str(),
            columns = model.columns.len(),
            "built table model"
        );

        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(models.entry(type_id).or_insert(model)))
    }

    /// Check if the model of `T` is already cached.
    pub fn contains<T: Record>(&self) -> bool {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// Get the number of cached models.
    pub fn len(&self) -> usize {
        self.models.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
