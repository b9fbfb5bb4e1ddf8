use crate::cli::CompileArgs;
use crate::config::Catalogue;
use pginsert::{Compiler, CompilerConfig, DynamicRecord, Instance, InsertQuery};
use std::io::Read as _;

pub fn run(args: CompileArgs) -> anyhow::Result<()> {
    let catalogue = Catalogue::load(&args.config)?;
    let rows = match args.rows.as_deref() {
        None => "[{}]".to_string(),
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| anyhow::anyhow!("failed to read rows from stdin: {e}"))?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read rows file {path}: {e}"))?,
    };

    println!("{}", render(&catalogue, &args, &rows)?);
    Ok(())
}

/// Compile the statement for `args` over JSON `rows`.
pub fn render(catalogue: &Catalogue, args: &CompileArgs, rows: &str) -> anyhow::Result<String> {
    let model = catalogue.model(&args.type_name)?;

    let json: serde_json::Value =
        serde_json::from_str(rows).map_err(|e| anyhow::anyhow!("invalid rows JSON: {e}"))?;
    let Some(items) = json.as_array() else {
        anyhow::bail!("rows must be a JSON array of objects");
    };
    let records = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let Some(object) = item.as_object() else {
                anyhow::bail!("row #{} is not a JSON object", i + 1);
            };
            DynamicRecord::from_json(model.clone(), object)
                .map_err(|e| anyhow::anyhow!("row #{}: {e}", i + 1))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut query = InsertQuery::for_model(model);
    for record in &records {
        query = query.push(record as &dyn Instance);
    }
    for expr in &args.table_exprs {
        query = query.table_expr(expr);
    }
    if let Some(expr) = &args.column_expr {
        query = query.column_expr(expr);
    }
    if let Some(name) = &args.wrap_with {
        query = query.wrap_with(name.clone());
    }
    if let Some(expr) = &args.on_conflict {
        query = query.on_conflict(expr);
    }
    for expr in &args.set {
        query = query.set_expr(expr);
    }
    for expr in &args.wheres {
        query = query.where_expr(expr);
    }
    for expr in &args.returning {
        query = query.returning(expr);
    }

    let compiler = Compiler::with_config(CompilerConfig::new().no_logging());
    Ok(compiler.compile(&query)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const CATALOGUE: &str = r#"
[[tables]]
type_name = "InsertTest"
[[tables.columns]]
field = "Id"
[[tables.columns]]
field = "Value"
"#;

    fn args(type_name: &str) -> CompileArgs {
        CompileArgs {
            config: PathBuf::from("pginsert.toml"),
            type_name: type_name.to_string(),
            rows: None,
            on_conflict: None,
            set: Vec::new(),
            wheres: Vec::new(),
            returning: Vec::new(),
            table_exprs: Vec::new(),
            column_expr: None,
            wrap_with: None,
        }
    }

    fn catalogue() -> Catalogue {
        Catalogue::from_toml(CATALOGUE).unwrap()
    }

    #[test]
    fn compiles_multi_row_insert() {
        let sql = render(
            &catalogue(),
            &args("InsertTest"),
            r#"[{"Id": 1, "Value": "hello"}, {"id": 2}]"#,
        )
        .unwrap();
        assert_eq!(
            sql,
            r#"INSERT INTO "insert_tests" ("id", "value") VALUES (1, 'hello'), (2, DEFAULT) RETURNING "value""#
        );
    }

    #[test]
    fn compiles_upsert() {
        let mut a = args("InsertTest");
        a.on_conflict = Some("(unq1) DO UPDATE".into());
        a.set = vec!["count1 = count1 + 1".into()];
        a.wheres = vec!["2 = 2".into()];
        let sql = render(&catalogue(), &a, "[{}]").unwrap();
        assert_eq!(
            sql,
            r#"INSERT INTO "insert_tests" AS "insert_test" ("id", "value") VALUES (DEFAULT, DEFAULT) ON CONFLICT (unq1) DO UPDATE SET count1 = count1 + 1 WHERE (2 = 2) RETURNING "id", "value""#
        );
    }

    #[test]
    fn compiles_cte_insert() {
        let mut a = args("InsertTest");
        a.wrap_with = Some("data".into());
        a.table_exprs = vec!["dst".into(), "data".into()];
        a.column_expr = Some("dst_col1, dst_col2".into());
        let sql = render(&catalogue(), &a, "[{}]").unwrap();
        assert_eq!(
            sql,
            r#"WITH "data" AS (SELECT "insert_test"."id", "insert_test"."value" FROM "insert_tests" AS "insert_test") INSERT INTO dst (dst_col1, dst_col2) SELECT * FROM data"#
        );
    }

    #[test]
    fn reports_bad_rows() {
        let c = catalogue();
        let a = args("InsertTest");
        assert!(render(&c, &a, "{}").is_err());
        assert!(render(&c, &a, "[1]").is_err());
        let err = render(&c, &a, r#"[{"nope": 1}]"#).unwrap_err();
        assert!(format!("{err:#}").contains("row #1"));
        assert!(render(&c, &a, "[]").is_err());
    }

    #[test]
    fn reports_unknown_type() {
        assert!(render(&catalogue(), &args("Missing"), "[{}]").is_err());
    }
}
