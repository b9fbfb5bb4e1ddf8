//! The INSERT compiler.
//!
//! Statement shape, in fixed clause order:
//!
//! ```text
//! [WITH "<wrap>" AS (SELECT ...)] INSERT INTO <target> [AS "<alias>"] (<columns>)
//!     VALUES (...), ... | SELECT * FROM <source>
//!     [ON CONFLICT <text>] [SET <text>] [WHERE (<text>) AND ...] [RETURNING ...]
//! ```
//!
//! - The alias is emitted iff an `ON CONFLICT` clause is present.
//! - `SET` and `WHERE` are dropped when the conflict action is not `DO UPDATE`.
//! - Without an explicit `RETURNING`, a `VALUES` insert returns every column that at least
//!   one row left to its server default; a CTE insert returns nothing.

use std::sync::{Arc, OnceLock};

use tracing::Level;

use crate::config::CompilerConfig;
use crate::error::{OrmError, OrmResult};
use crate::format::Formatter;
use crate::ident::{append_ident, append_qualified};
use crate::query::InsertQuery;
use crate::record::extract;
use crate::schema::{SchemaRegistry, TableModel};
use crate::value::Fragment;

/// Compile with the default compiler (global registry, built-in formatters).
pub fn compile_insert(query: &InsertQuery<'_>) -> OrmResult<String> {
    static DEFAULT: OnceLock<Compiler> = OnceLock::new();
    DEFAULT.get_or_init(Compiler::new).compile(query)
}

/// Compiles [`InsertQuery`] values into SQL text.
///
/// Compilation is pure: the same query always yields the same text, and a failure yields no
/// partial output.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
    formatter: Formatter,
    registry: Option<Arc<SchemaRegistry>>,
}

impl Compiler {
    /// Create a compiler with default configuration and the global schema registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with the given configuration.
    pub fn with_config(config: CompilerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the value formatter (e.g. to register custom literal kinds).
    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Use a private schema registry instead of the global one.
    pub fn registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Get the value formatter.
    pub fn value_formatter(&self) -> &Formatter {
        &self.formatter
    }

    fn schema_registry(&self) -> &SchemaRegistry {
        match self.registry.as_deref() {
            Some(registry) => registry,
            None => SchemaRegistry::global(),
        }
    }

    /// Compile `query` into a single INSERT statement.
    pub fn compile(&self, query: &InsertQuery<'_>) -> OrmResult<String> {
        let model = query.target_model(self.schema_registry())?;
        if query.rows.is_empty() {
            return Err(OrmError::invalid_override(format!(
                "insert into {} requires at least one row",
                model.type_name
            )));
        }

        let mut sql = String::with_capacity(64 + 16 * model.columns.len() * query.rows.len());
        match &query.wrap_with {
            Some(name) => self.write_wrapped(&mut sql, query, &model, name)?,
            None => self.write_values(&mut sql, query, &model)?,
        }

        if self.config.logging_enabled {
            self.log_statement(&model, query.rows.len(), &sql);
        }
        Ok(sql)
    }

    fn write_values(&self, sql: &mut String, query: &InsertQuery<'_>, model: &TableModel) -> OrmResult<()> {
        let rows = query
            .rows
            .iter()
            .map(|row| extract(*row, model, &self.formatter))
            .collect::<OrmResult<Vec<_>>>()?;

        self.write_head(sql, query, model)?;
        sql.push_str(" VALUES ");
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (j, col) in row.iter().enumerate() {
                if j > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&col.value.sql);
            }
            sql.push(')');
        }

        self.write_trailers(sql, query)?;

        if !query.returning.is_empty() {
            self.write_explicit_returning(sql, query)?;
        } else {
            let defaulted: Vec<&str> = model
                .columns
                .iter()
                .enumerate()
                .filter(|(j, _)| rows.iter().any(|row| !row[*j].value.explicit))
                .map(|(_, c)| c.name.as_str())
                .collect();
            if !defaulted.is_empty() {
                sql.push_str(" RETURNING ");
                append_ident_list(sql, defaulted);
            }
        }
        Ok(())
    }

    fn write_wrapped(
        &self,
        sql: &mut String,
        query: &InsertQuery<'_>,
        model: &TableModel,
        name: &str,
    ) -> OrmResult<()> {
        for row in &query.rows {
            if row.model_key() != model.key {
                return Err(OrmError::type_mismatch(&model.type_name, row.type_name()));
            }
        }

        sql.push_str("WITH ");
        append_ident(sql, name);
        sql.push_str(" AS (SELECT ");
        for (i, col) in model.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            append_qualified(sql, &model.alias, &col.name);
        }
        sql.push_str(" FROM ");
        model.name.append_to(sql);
        sql.push_str(" AS ");
        append_ident(sql, &model.alias);
        sql.push_str(") ");

        self.write_head(sql, query, model)?;
        sql.push_str(" SELECT * FROM ");
        match query.table_exprs.get(1) {
            Some(source) => self.formatter.append_fragment(sql, source, "table_expr")?,
            None => append_ident(sql, name),
        }

        self.write_trailers(sql, query)?;
        if !query.returning.is_empty() {
            self.write_explicit_returning(sql, query)?;
        }
        Ok(())
    }

    /// `INSERT INTO <target> [AS "<alias>"] (<columns>)`
    fn write_head(&self, sql: &mut String, query: &InsertQuery<'_>, model: &TableModel) -> OrmResult<()> {
        sql.push_str("INSERT INTO ");
        match query.table_exprs.first() {
            Some(target) => self.formatter.append_fragment(sql, target, "table_expr")?,
            None => model.name.append_to(sql),
        }
        if query.on_conflict.is_some() {
            sql.push_str(" AS ");
            append_ident(sql, &model.alias);
        }

        sql.push_str(" (");
        match &query.column_expr {
            Some(columns) => self.formatter.append_fragment(sql, columns, "column_expr")?,
            None => append_ident_list(sql, model.column_names()),
        }
        sql.push(')');
        Ok(())
    }

    /// `[ON CONFLICT ...] [SET ...] [WHERE ...]`
    fn write_trailers(&self, sql: &mut String, query: &InsertQuery<'_>) -> OrmResult<()> {
        let mut do_update = true;
        if let Some(conflict) = &query.on_conflict {
            let start = sql.len() + " ON CONFLICT ".len();
            sql.push_str(" ON CONFLICT ");
            self.formatter.append_fragment(sql, conflict, "ON CONFLICT")?;
            do_update = ends_with_do_update(&sql[start..]);
        }
        if !do_update {
            return Ok(());
        }

        if !query.set.is_empty() {
            sql.push_str(" SET ");
            self.append_joined(sql, &query.set, ", ", "SET")?;
        }
        if !query.wheres.is_empty() {
            sql.push_str(" WHERE ");
            for (i, cond) in query.wheres.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" AND ");
                }
                sql.push('(');
                self.formatter.append_fragment(sql, cond, "WHERE")?;
                sql.push(')');
            }
        }
        Ok(())
    }

    fn write_explicit_returning(&self, sql: &mut String, query: &InsertQuery<'_>) -> OrmResult<()> {
        sql.push_str(" RETURNING ");
        self.append_joined(sql, &query.returning, ", ", "RETURNING")
    }

    fn append_joined(&self, sql: &mut String, fragments: &[Fragment], sep: &str, clause: &str) -> OrmResult<()> {
        for (i, fragment) in fragments.iter().enumerate() {
            if i > 0 {
                sql.push_str(sep);
            }
            self.formatter.append_fragment(sql, fragment, clause)?;
        }
        Ok(())
    }

    fn log_statement(&self, model: &TableModel, rows: usize, sql: &str) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.config.truncate_sql(sql);
        emit_at_level!(
            self.config.log_level,
            target: "pginsert.sql",
            table = %model.name.as_str(),
            rows,
            sql = %sql,
            "compiled insert"
        );
    }
}

fn append_ident_list<'n>(sql: &mut String, names: impl IntoIterator<Item = &'n str>) {
    for (i, name) in names.into_iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        append_ident(sql, name);
    }
}

/// Whether a conflict clause ends with the `DO UPDATE` action.
fn ends_with_do_update(conflict: &str) -> bool {
    let mut words = conflict.split_whitespace().rev();
    matches!(
        (words.next(), words.next()),
        (Some(last), Some(prev))
            if last.eq_ignore_ascii_case("UPDATE") && prev.eq_ignore_ascii_case("DO")
    )
}

#[cfg(test)]
mod tests;
