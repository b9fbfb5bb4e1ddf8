use crate::cli::TablesArgs;
use crate::config::Catalogue;
use std::fmt::Write as _;

pub fn run(args: TablesArgs) -> anyhow::Result<()> {
    let catalogue = Catalogue::load(&args.config)?;
    print!("{}", render(&catalogue)?);
    Ok(())
}

/// One line per table, then one indented line per flattened column.
pub fn render(catalogue: &Catalogue) -> anyhow::Result<String> {
    let mut out = String::new();
    for table in &catalogue.tables {
        let model = catalogue.model(&table.type_name)?;
        let _ = writeln!(
            out,
            "{} -> {} AS \"{}\"",
            model.type_name,
            model.name.to_sql(),
            model.alias
        );
        for col in &model.columns {
            let mut flags = Vec::new();
            if col.pk {
                flags.push("pk");
            }
            if col.not_null {
                flags.push("not null");
            }
            if flags.is_empty() {
                let _ = writeln!(out, "  {}", col.name);
            } else {
                let _ = writeln!(out, "  {} [{}]", col.name, flags.join(", "));
            }
        }
    }
    Ok(out)
}
