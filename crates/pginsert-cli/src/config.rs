use pginsert::{ColumnDescriptor, OrmError, RecordDescriptor, TableModel, dynamic_model};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// A table catalogue (`pginsert.toml`).
#[derive(Debug, Clone, Deserialize)]
pub struct Catalogue {
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub type_name: String,
    pub table: Option<String>,
    pub alias: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnEntry>,
}

/// A column, or an embedded catalogue type when `embed` is set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnEntry {
    pub field: Option<String>,
    pub column: Option<String>,
    #[serde(default)]
    pub pk: bool,
    #[serde(default)]
    pub not_null: bool,
    pub embed: Option<String>,
    #[serde(default, rename = "override")]
    pub override_table: bool,
}

impl Catalogue {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
        Self::from_toml(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e:#}", path.display()))
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let catalogue: Catalogue = toml::from_str(raw)?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.type_name.as_str()) {
                anyhow::bail!("duplicate table type_name: {}", table.type_name);
            }
            for (i, entry) in table.columns.iter().enumerate() {
                match (&entry.field, &entry.embed) {
                    (Some(_), None) if entry.override_table => anyhow::bail!(
                        "{}: column #{} sets override without embed",
                        table.type_name,
                        i + 1
                    ),
                    (Some(_), None) | (None, Some(_)) => {}
                    _ => anyhow::bail!(
                        "{}: column #{} must set exactly one of field or embed",
                        table.type_name,
                        i + 1
                    ),
                }
            }
        }
        Ok(())
    }

    pub fn table(&self, type_name: &str) -> Option<&TableConfig> {
        self.tables.iter().find(|t| t.type_name == type_name)
    }

    /// Build the record descriptor of `type_name`, resolving embeds.
    pub fn descriptor(&self, type_name: &str) -> Result<RecordDescriptor, OrmError> {
        let mut stack = Vec::new();
        self.descriptor_inner(type_name, &mut stack)
    }

    fn descriptor_inner<'c>(
        &'c self,
        type_name: &str,
        stack: &mut Vec<&'c str>,
    ) -> Result<RecordDescriptor, OrmError> {
        let Some(table) = self.table(type_name) else {
            return Err(OrmError::invalid_schema(format!("unknown table type: {type_name}")));
        };
        if stack.contains(&table.type_name.as_str()) {
            return Err(OrmError::invalid_schema(format!(
                "embed cycle: {} -> {}",
                stack.join(" -> "),
                table.type_name
            )));
        }
        stack.push(&table.type_name);

        let mut desc = RecordDescriptor::new(table.type_name.clone());
        if let Some(name) = &table.table {
            desc = desc.table(name.clone());
        }
        if let Some(alias) = &table.alias {
            desc = desc.alias(alias.clone());
        }
        for entry in &table.columns {
            desc = match (&entry.field, &entry.embed) {
                (_, Some(embed)) => {
                    let inner = self.descriptor_inner(embed, stack)?;
                    desc.embed(inner, entry.override_table)
                }
                (Some(field), None) => {
                    let mut col = ColumnDescriptor::new(field.clone());
                    if let Some(column) = &entry.column {
                        col = col.column(column.clone());
                    }
                    if entry.pk {
                        col = col.pk();
                    }
                    if entry.not_null {
                        col = col.not_null();
                    }
                    desc.column(col)
                }
                (None, None) => desc,
            };
        }

        stack.pop();
        Ok(desc)
    }

    /// Build the table model of `type_name`.
    pub fn model(&self, type_name: &str) -> Result<Arc<TableModel>, OrmError> {
        dynamic_model(&self.descriptor(type_name)?)
    }
}
