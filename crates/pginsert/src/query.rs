//! The INSERT query model.
//!
//! An [`InsertQuery`] names the target record type, borrows the rows to insert and collects
//! clause overrides. Overrides are appended in call order and only interpreted by the
//! compiler; the builder never validates them against each other.
//!
//! # Example
//! ```ignore
//! use pginsert::{InsertQuery, Record};
//!
//! #[derive(Record)]
//! struct InsertTest {
//!     id: i32,
//!     value: String,
//! }
//!
//! let row = InsertTest { id: 0, value: String::new() };
//! let sql = InsertQuery::insert(&row)
//!     .on_conflict("(unq1) DO UPDATE")
//!     .set_expr("count1 = count1 + 1")
//!     .where_expr("2 = 2")
//!     .to_sql()?;
//! ```

use std::sync::Arc;

use crate::error::{OrmError, OrmResult};
use crate::record::{Instance, Record};
use crate::schema::{SchemaRegistry, TableModel};
use crate::value::Fragment;

/// How the query's table model is obtained.
#[derive(Clone)]
pub(crate) enum Target {
    /// A Rust record type, resolved through the schema registry.
    Record(fn(&SchemaRegistry) -> OrmResult<Arc<TableModel>>),
    /// An already-built model (runtime-described records).
    Model(Arc<TableModel>),
    /// The model of the first row.
    FirstRow,
}

/// An INSERT statement under construction.
#[derive(Clone)]
pub struct InsertQuery<'a> {
    pub(crate) target: Target,
    pub(crate) rows: Vec<&'a dyn Instance>,
    pub(crate) table_exprs: Vec<Fragment>,
    pub(crate) column_expr: Option<Fragment>,
    pub(crate) wrap_with: Option<String>,
    pub(crate) on_conflict: Option<Fragment>,
    pub(crate) set: Vec<Fragment>,
    pub(crate) wheres: Vec<Fragment>,
    pub(crate) returning: Vec<Fragment>,
}

impl std::fmt::Debug for InsertQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match &self.target {
            Target::Record(_) => "record".to_string(),
            Target::Model(model) => model.type_name.clone(),
            Target::FirstRow => "first row".to_string(),
        };
        f.debug_struct("InsertQuery")
            .field("target", &target)
            .field("rows", &self.rows.len())
            .field("table_exprs", &self.table_exprs)
            .field("column_expr", &self.column_expr)
            .field("wrap_with", &self.wrap_with)
            .field("on_conflict", &self.on_conflict)
            .field("set", &self.set)
            .field("wheres", &self.wheres)
            .field("returning", &self.returning)
            .finish()
    }
}

impl<'a> InsertQuery<'a> {
    fn with_target(target: Target) -> Self {
        Self {
            target,
            rows: Vec::new(),
            table_exprs: Vec::new(),
            column_expr: None,
            wrap_with: None,
            on_conflict: None,
            set: Vec::new(),
            wheres: Vec::new(),
            returning: Vec::new(),
        }
    }

    /// Create an empty query targeting record type `T`.
    pub fn new<T: Record>() -> Self {
        Self::with_target(Target::Record(SchemaRegistry::model_for::<T>))
    }

    /// Insert a single row.
    pub fn insert<T: Record>(row: &'a T) -> Self {
        Self::new::<T>().push(row)
    }

    /// Insert several rows of the same type (multi-row `VALUES`).
    pub fn insert_many<T: Record>(rows: &'a [T]) -> Self {
        let mut query = Self::new::<T>();
        query.rows.extend(rows.iter().map(|row| row as &dyn Instance));
        query
    }

    /// Create an empty query targeting a prebuilt table model.
    pub fn for_model(model: Arc<TableModel>) -> Self {
        Self::with_target(Target::Model(model))
    }

    /// Create a query whose target is the type of its first row.
    pub fn from_rows(rows: impl IntoIterator<Item = &'a dyn Instance>) -> Self {
        let mut query = Self::with_target(Target::FirstRow);
        query.rows.extend(rows);
        query
    }

    /// Append a row.
    pub fn push(mut self, row: &'a dyn Instance) -> Self {
        self.rows.push(row);
        self
    }

    /// Push a table expression.
    ///
    /// The first replaces the INSERT target; with [`wrap_with`](Self::wrap_with) the second
    /// replaces the source of `SELECT * FROM`.
    pub fn table_expr(mut self, expr: impl Into<Fragment>) -> Self {
        self.table_exprs.push(expr.into());
        self
    }

    /// Replace the column list with caller-supplied text.
    ///
    /// Only the list text changes. `VALUES` tuples are still rendered from every model column
    /// and, without an explicit [`returning`](Self::returning), the computed `RETURNING` still
    /// names model columns left to `DEFAULT`. Keeping the list aligned with both is up to the
    /// caller; pass an explicit `returning` when the names differ.
    pub fn column_expr(mut self, expr: impl Into<Fragment>) -> Self {
        self.column_expr = Some(expr.into());
        self
    }

    /// Insert from a CTE named `name` that selects the model's columns.
    pub fn wrap_with(mut self, name: impl Into<String>) -> Self {
        self.wrap_with = Some(name.into());
        self
    }

    /// Set the `ON CONFLICT` target and action text.
    pub fn on_conflict(mut self, expr: impl Into<Fragment>) -> Self {
        self.on_conflict = Some(expr.into());
        self
    }

    /// Append a `SET` fragment (joined with `, `).
    pub fn set_expr(mut self, expr: impl Into<Fragment>) -> Self {
        self.set.push(expr.into());
        self
    }

    /// Append a `WHERE` fragment (each parenthesized, joined with `AND`).
    pub fn where_expr(mut self, expr: impl Into<Fragment>) -> Self {
        self.wheres.push(expr.into());
        self
    }

    /// Append an explicit `RETURNING` fragment, replacing the computed list.
    pub fn returning(mut self, expr: impl Into<Fragment>) -> Self {
        self.returning.push(expr.into());
        self
    }

    /// Get the rows to insert.
    pub fn rows(&self) -> &[&'a dyn Instance] {
        &self.rows
    }

    /// Check if the query inserts from a CTE.
    pub fn is_wrapped(&self) -> bool {
        self.wrap_with.is_some()
    }

    /// Resolve the target table model.
    pub(crate) fn target_model(&self, registry: &SchemaRegistry) -> OrmResult<Arc<TableModel>> {
        match &self.target {
            Target::Record(resolve) => resolve(registry),
            Target::Model(model) => Ok(Arc::clone(model)),
            Target::FirstRow => match self.rows.first() {
                Some(row) => row.table_model(registry),
                None => Err(OrmError::invalid_override(
                    "cannot infer the target type of a query without rows",
                )),
            },
        }
    }

    /// Compile with the default compiler.
    pub fn to_sql(&self) -> OrmResult<String> {
        crate::insert::compile_insert(self)
    }
}
