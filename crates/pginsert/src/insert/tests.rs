use std::fmt::Write as _;
use std::sync::Arc;

use super::*;
use crate::dynamic::{DynamicRecord, dynamic_model};
use crate::record::{FieldValue, Instance, Record};
use crate::schema::{ColumnDescriptor, RecordDescriptor};
use crate::value::{Fragment, Value};

#[derive(Default)]
struct InsertTest {
    id: i32,
    value: String,
}

impl Record for InsertTest {
    fn describe() -> RecordDescriptor {
        RecordDescriptor::new("InsertTest")
            .column(ColumnDescriptor::new("Id"))
            .column(ColumnDescriptor::new("Value"))
    }

    fn field_values(&self, out: &mut Vec<FieldValue>) {
        out.push(FieldValue::of(&self.id));
        out.push(FieldValue::of(&self.value));
    }
}

#[derive(Default)]
struct InsertNullTest {
    f1: i32,
    f2: i32,
    f3: i32,
    f4: i32,
}

impl Record for InsertNullTest {
    fn describe() -> RecordDescriptor {
        RecordDescriptor::new("InsertNullTest")
            .column(ColumnDescriptor::new("F1"))
            .column(ColumnDescriptor::new("F2").not_null())
            .column(ColumnDescriptor::new("F3").pk())
            .column(ColumnDescriptor::new("F4").pk().not_null())
    }

    fn field_values(&self, out: &mut Vec<FieldValue>) {
        out.push(FieldValue::of(&self.f1));
        out.push(FieldValue::of(&self.f2));
        out.push(FieldValue::of(&self.f3));
        out.push(FieldValue::of(&self.f4));
    }
}

#[derive(Default)]
struct EmbeddingTest {
    id: i32,
    field: i32,
}

impl Record for EmbeddingTest {
    fn describe() -> RecordDescriptor {
        RecordDescriptor::new("EmbeddingTest")
            .table("name")
            .column(ColumnDescriptor::new("Id"))
            .column(ColumnDescriptor::new("Field"))
    }

    fn field_values(&self, out: &mut Vec<FieldValue>) {
        out.push(FieldValue::of(&self.id));
        out.push(FieldValue::of(&self.field));
    }
}

#[derive(Default)]
struct EmbeddedInsertTest {
    embedding: EmbeddingTest,
    field2: i32,
}

impl Record for EmbeddedInsertTest {
    fn describe() -> RecordDescriptor {
        RecordDescriptor::new("EmbeddedInsertTest")
            .table("my_name")
            .embed(EmbeddingTest::describe(), false)
            .column(ColumnDescriptor::new("Field2"))
    }

    fn field_values(&self, out: &mut Vec<FieldValue>) {
        self.embedding.field_values(out);
        out.push(FieldValue::of(&self.field2));
    }
}

#[derive(Default)]
struct OverrideInsertTest {
    embedding: EmbeddingTest,
    field2: i32,
}

impl Record for OverrideInsertTest {
    fn describe() -> RecordDescriptor {
        RecordDescriptor::new("OverrideInsertTest")
            .embed(EmbeddingTest::describe(), true)
            .column(ColumnDescriptor::new("Field2"))
    }

    fn field_values(&self, out: &mut Vec<FieldValue>) {
        self.embedding.field_values(out);
        out.push(FieldValue::of(&self.field2));
    }
}

struct InsertQTest {
    geo: Vec<(f64, f64)>,
    func: Fragment,
}

impl Record for InsertQTest {
    fn describe() -> RecordDescriptor {
        RecordDescriptor::new("InsertQTest")
            .column(ColumnDescriptor::new("Geo"))
            .column(ColumnDescriptor::new("Func"))
    }

    fn field_values(&self, out: &mut Vec<FieldValue>) {
        let points: Vec<Vec<f64>> = self.geo.iter().map(|(x, y)| vec![*x, *y]).collect();
        out.push(FieldValue::new(Value::custom("polygon", points), false));
        out.push(FieldValue::of(&self.func));
    }
}

struct OptionalTest {
    id: Option<i64>,
}

impl Record for OptionalTest {
    fn describe() -> RecordDescriptor {
        RecordDescriptor::new("OptionalTest").column(ColumnDescriptor::new("id"))
    }

    fn field_values(&self, out: &mut Vec<FieldValue>) {
        out.push(FieldValue::of(&self.id));
    }
}

fn polygon_literal(inner: &Value, out: &mut String) -> Result<(), String> {
    let Value::Array(points) = inner else {
        return Err("polygon expects an array of points".to_string());
    };
    out.push_str("ST_GeomFromText('POLYGON((");
    for (i, point) in points.iter().enumerate() {
        let Value::Array(xy) = point else {
            return Err("polygon point must be an array".to_string());
        };
        let [Value::Float(x), Value::Float(y)] = xy.as_slice() else {
            return Err("polygon point must have two coordinates".to_string());
        };
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{x:.6} {y:.6}");
    }
    out.push_str("))')");
    Ok(())
}

fn compiler() -> Compiler {
    Compiler::with_config(CompilerConfig::new().no_logging())
        .registry(Arc::new(SchemaRegistry::new()))
}

fn compile(query: &InsertQuery<'_>) -> String {
    compiler().compile(query).unwrap()
}

fn zero_row() -> InsertTest {
    InsertTest::default()
}

#[test]
fn multi_row_values_and_returning() {
    let rows = [
        InsertTest {
            id: 1,
            value: "hello".into(),
        },
        InsertTest {
            id: 2,
            value: String::new(),
        },
    ];
    let sql = compile(&InsertQuery::insert_many(&rows));
    assert_eq!(
        sql,
        r#"INSERT INTO "insert_tests" ("id", "value") VALUES (1, 'hello'), (2, DEFAULT) RETURNING "value""#
    );
}

#[test]
fn fully_explicit_row_has_no_returning() {
    let row = InsertTest {
        id: 1,
        value: "it's".into(),
    };
    assert_eq!(
        compile(&InsertQuery::insert(&row)),
        r#"INSERT INTO "insert_tests" ("id", "value") VALUES (1, 'it''s')"#
    );
}

#[test]
fn on_conflict_do_update() {
    let row = zero_row();
    let query = InsertQuery::insert(&row)
        .on_conflict("(unq1) DO UPDATE")
        .set_expr("count1 = count1 + 1")
        .where_expr("2 = 2");
    assert_eq!(
        compile(&query),
        r#"INSERT INTO "insert_tests" AS "insert_test" ("id", "value") VALUES (DEFAULT, DEFAULT) ON CONFLICT (unq1) DO UPDATE SET count1 = count1 + 1 WHERE (2 = 2) RETURNING "id", "value""#
    );
}

#[test]
fn where_fragments_accumulate_regardless_of_call_order() {
    let row = zero_row();
    let query = InsertQuery::insert(&row)
        .where_expr("1 = 1")
        .on_conflict("(unq1) DO UPDATE")
        .set_expr("count1 = count1 + 1")
        .where_expr("2 = 2");
    assert!(compile(&query).contains(" WHERE (1 = 1) AND (2 = 2) RETURNING "));
}

#[test]
fn on_conflict_do_nothing_drops_set_and_where() {
    let row = zero_row();
    let query = InsertQuery::insert(&row)
        .on_conflict("(unq1) DO NOTHING")
        .set_expr("count1 = count1 + 1")
        .where_expr("cond1 IS TRUE");
    assert_eq!(
        compile(&query),
        r#"INSERT INTO "insert_tests" AS "insert_test" ("id", "value") VALUES (DEFAULT, DEFAULT) ON CONFLICT (unq1) DO NOTHING RETURNING "id", "value""#
    );
}

#[test]
fn do_update_detection_ignores_case_and_trailing_space() {
    let row = zero_row();
    let query = InsertQuery::insert(&row)
        .on_conflict("(id)  do   update ")
        .set_expr("value = EXCLUDED.value");
    assert!(compile(&query).contains(" SET value = EXCLUDED.value"));
}

#[test]
fn set_and_where_without_conflict_are_appended() {
    let row = InsertTest {
        id: 1,
        value: "a".into(),
    };
    let query = InsertQuery::insert(&row)
        .set_expr("a = 1")
        .set_expr("b = 2")
        .where_expr("x OR y");
    assert_eq!(
        compile(&query),
        r#"INSERT INTO "insert_tests" ("id", "value") VALUES (1, 'a') SET a = 1, b = 2 WHERE (x OR y)"#
    );
}

#[test]
fn fragments_bind_values() {
    let row = zero_row();
    let query = InsertQuery::insert(&row)
        .on_conflict("(id) DO UPDATE")
        .set_expr(Fragment::new("value = ?").bind("o'neil"))
        .where_expr(Fragment::new("insert_test.id > ?").bind(10i32));
    assert!(compile(&query).ends_with(
        r#"SET value = 'o''neil' WHERE (insert_test.id > 10) RETURNING "id", "value""#
    ));
}

#[test]
fn embedded_record_keeps_outer_table() {
    let row = EmbeddedInsertTest::default();
    assert_eq!(
        compile(&InsertQuery::insert(&row)),
        r#"INSERT INTO my_name ("id", "field", "field2") VALUES (DEFAULT, DEFAULT, DEFAULT) RETURNING "id", "field", "field2""#
    );
}

#[test]
fn override_embed_takes_inner_table() {
    let row = OverrideInsertTest::default();
    assert_eq!(
        compile(&InsertQuery::insert(&row)),
        r#"INSERT INTO name ("id", "field", "field2") VALUES (DEFAULT, DEFAULT, DEFAULT) RETURNING "id", "field", "field2""#
    );
}

#[test]
fn override_embed_alias_under_conflict() {
    let row = OverrideInsertTest::default();
    let sql = compile(&InsertQuery::insert(&row).on_conflict("DO NOTHING"));
    assert!(sql.starts_with(r#"INSERT INTO name AS "embedding_test" ("id""#));
}

#[test]
fn not_null_and_pk_render_zero_literals() {
    let row = InsertNullTest::default();
    assert_eq!(
        compile(&InsertQuery::insert(&row)),
        r#"INSERT INTO "insert_null_tests" ("f1", "f2", "f3", "f4") VALUES (DEFAULT, 0, 0, 0) RETURNING "f1""#
    );
}

#[test]
fn option_is_explicit_when_some() {
    let rows = [OptionalTest { id: Some(0) }, OptionalTest { id: None }];
    assert_eq!(
        compile(&InsertQuery::insert_many(&rows)),
        r#"INSERT INTO "optional_tests" ("id") VALUES (0), (DEFAULT) RETURNING "id""#
    );
}

#[test]
fn custom_kinds_and_fragments() {
    let row = InsertQTest {
        geo: vec![(75.150, 29.530), (77.000, 29.000), (77.600, 29.500), (75.150, 29.530)],
        func: Fragment::new("my_func(?)").bind("param"),
    };
    let compiler = compiler().formatter(Formatter::new().register("polygon", polygon_literal));
    assert_eq!(
        compiler.compile(&InsertQuery::insert(&row)).unwrap(),
        "INSERT INTO \"insert_q_tests\" (\"geo\", \"func\") VALUES \
         (ST_GeomFromText('POLYGON((75.150000 29.530000, 77.000000 29.000000, 77.600000 29.500000, 75.150000 29.530000))'), my_func('param'))"
    );
}

#[test]
fn unregistered_custom_kind_fails_without_output() {
    let row = InsertQTest {
        geo: vec![(1.0, 2.0)],
        func: Fragment::raw("now()"),
    };
    let err = compiler().compile(&InsertQuery::insert(&row)).unwrap_err();
    assert!(err.is_unsupported_value());
    assert!(err.to_string().contains("'geo'"));
}

#[test]
fn cte_wrap_with_table_exprs() {
    let row = zero_row();
    let query = InsertQuery::insert(&row)
        .wrap_with("data")
        .table_expr("dst")
        .column_expr("dst_col1, dst_col2")
        .table_expr("data");
    assert_eq!(
        compile(&query),
        r#"WITH "data" AS (SELECT "insert_test"."id", "insert_test"."value" FROM "insert_tests" AS "insert_test") INSERT INTO dst (dst_col1, dst_col2) SELECT * FROM data"#
    );
}

#[test]
fn cte_wrap_defaults_to_model_and_wrap_name() {
    let row = zero_row();
    let query = InsertQuery::insert(&row).wrap_with("data");
    assert_eq!(
        compile(&query),
        r#"WITH "data" AS (SELECT "insert_test"."id", "insert_test"."value" FROM "insert_tests" AS "insert_test") INSERT INTO "insert_tests" ("id", "value") SELECT * FROM "data""#
    );
}

#[test]
fn cte_wrap_uses_raw_source_name_and_explicit_returning() {
    let row = EmbeddedInsertTest::default();
    let query = InsertQuery::insert(&row)
        .wrap_with("src")
        .table_expr("archive")
        .returning("id");
    assert_eq!(
        compile(&query),
        r#"WITH "src" AS (SELECT "embedded_insert_test"."id", "embedded_insert_test"."field", "embedded_insert_test"."field2" FROM my_name AS "embedded_insert_test") INSERT INTO archive ("id", "field", "field2") SELECT * FROM "src" RETURNING id"#
    );
}

#[test]
fn cte_wrap_with_conflict_emits_alias() {
    let row = zero_row();
    let query = InsertQuery::insert(&row)
        .wrap_with("data")
        .on_conflict("(id) DO UPDATE")
        .set_expr("value = EXCLUDED.value");
    assert!(compile(&query).ends_with(
        r#"INSERT INTO "insert_tests" AS "insert_test" ("id", "value") SELECT * FROM "data" ON CONFLICT (id) DO UPDATE SET value = EXCLUDED.value"#
    ));
}

#[test]
fn explicit_returning_replaces_computed_list() {
    let row = zero_row();
    let query = InsertQuery::insert(&row).returning("id").returning("value AS v");
    assert!(compile(&query).ends_with(" RETURNING id, value AS v"));
}

#[test]
fn second_table_expr_is_inert_without_wrap() {
    let row = zero_row();
    let query = InsertQuery::insert(&row)
        .table_expr("dst")
        .table_expr("ignored");
    assert_eq!(
        compile(&query),
        r#"INSERT INTO dst ("id", "value") VALUES (DEFAULT, DEFAULT) RETURNING "id", "value""#
    );
}

#[test]
fn alias_is_emitted_only_with_conflict() {
    let row = zero_row();
    let with_expr = InsertQuery::insert(&row).table_expr("dst");
    assert!(!compile(&with_expr).contains(" AS "));

    let with_conflict = with_expr.on_conflict("DO NOTHING");
    assert!(compile(&with_conflict).starts_with(r#"INSERT INTO dst AS "insert_test" ("id", "value")"#));
}

#[test]
fn column_expr_keeps_model_values() {
    let row = InsertTest {
        id: 3,
        value: String::new(),
    };
    let query = InsertQuery::insert(&row).column_expr("id, value");
    assert_eq!(
        compile(&query),
        r#"INSERT INTO "insert_tests" (id, value) VALUES (3, DEFAULT) RETURNING "value""#
    );

    let renamed = InsertQuery::insert(&row)
        .table_expr("dst")
        .column_expr("a, b")
        .returning("b");
    assert_eq!(
        compile(&renamed),
        r#"INSERT INTO dst (a, b) VALUES (3, DEFAULT) RETURNING b"#
    );
}

#[test]
fn zero_rows_is_invalid_override() {
    let err = compiler()
        .compile(&InsertQuery::new::<InsertTest>())
        .unwrap_err();
    assert!(err.is_invalid_override());

    let err = compiler()
        .compile(&InsertQuery::new::<InsertTest>().wrap_with("data"))
        .unwrap_err();
    assert!(err.is_invalid_override());

    let err = compiler()
        .compile(&InsertQuery::from_rows(Vec::<&dyn Instance>::new()))
        .unwrap_err();
    assert!(err.is_invalid_override());
}

#[test]
fn mixed_types_are_type_mismatch() {
    let a = zero_row();
    let b = InsertNullTest::default();
    let query = InsertQuery::insert(&a).push(&b);
    assert!(compiler().compile(&query).unwrap_err().is_type_mismatch());

    let wrapped = InsertQuery::insert(&a).push(&b).wrap_with("data");
    assert!(compiler().compile(&wrapped).unwrap_err().is_type_mismatch());
}

#[test]
fn target_type_is_checked_against_rows() {
    let b = InsertNullTest::default();
    let query = InsertQuery::new::<InsertTest>().push(&b);
    let err = compiler().compile(&query).unwrap_err();
    assert!(err.is_type_mismatch());
    assert!(err.to_string().contains("InsertTest"));
}

#[test]
fn from_rows_infers_target() {
    let row = InsertTest {
        id: 7,
        value: "x".into(),
    };
    let rows: [&dyn Instance; 1] = [&row];
    assert_eq!(
        compile(&InsertQuery::from_rows(rows)),
        r#"INSERT INTO "insert_tests" ("id", "value") VALUES (7, 'x')"#
    );
}

#[test]
fn dynamic_rows() {
    let model = dynamic_model(
        &RecordDescriptor::new("Item")
            .table("inventory.items")
            .column(ColumnDescriptor::new("sku").pk())
            .column(ColumnDescriptor::new("tags")),
    )
    .unwrap();
    let a = DynamicRecord::new(
        Arc::clone(&model),
        vec![Value::Text("A-1".into()), Value::Array(vec![Value::Text("red".into())])],
    );
    let b = DynamicRecord::new(Arc::clone(&model), vec![Value::Text(String::new()), Value::Null]);
    let query = InsertQuery::for_model(model).push(&a).push(&b);
    assert_eq!(
        compile(&query),
        r#"INSERT INTO inventory.items ("sku", "tags") VALUES ('A-1', '{"red"}'), ('', DEFAULT) RETURNING "tags""#
    );
}

#[test]
fn dynamic_row_with_wrong_arity_is_type_mismatch() {
    let model = dynamic_model(
        &RecordDescriptor::new("Item")
            .column(ColumnDescriptor::new("a"))
            .column(ColumnDescriptor::new("b")),
    )
    .unwrap();
    let row = DynamicRecord::new(Arc::clone(&model), vec![Value::Int(1)]);
    let err = compiler()
        .compile(&InsertQuery::for_model(model).push(&row))
        .unwrap_err();
    assert!(err.is_type_mismatch());
}

#[test]
fn compilation_is_deterministic() {
    let rows = [zero_row(), InsertTest { id: 1, value: "v".into() }];
    let query = InsertQuery::insert_many(&rows).on_conflict("(id) DO NOTHING");
    let c = compiler();
    assert_eq!(c.compile(&query).unwrap(), c.compile(&query).unwrap());
}

#[test]
fn private_registry_is_populated() {
    let registry = Arc::new(SchemaRegistry::new());
    let compiler = Compiler::new().registry(Arc::clone(&registry));
    let row = zero_row();
    compiler.compile(&InsertQuery::insert(&row)).unwrap();
    assert!(registry.contains::<InsertTest>());
}

#[test]
fn default_compiler_entry_point() {
    let row = InsertTest {
        id: 1,
        value: "a".into(),
    };
    assert_eq!(
        InsertQuery::insert(&row).to_sql().unwrap(),
        compile_insert(&InsertQuery::insert(&row)).unwrap()
    );
    assert!(SchemaRegistry::global().contains::<InsertTest>());
}

#[test]
fn compiler_without_registry_uses_global() {
    let row = InsertNullTest {
        f1: 1,
        ..Default::default()
    };
    let compiler = Compiler::with_config(CompilerConfig::new().no_logging());
    compiler.compile(&InsertQuery::insert(&row)).unwrap();
    assert!(SchemaRegistry::global().contains::<InsertNullTest>());
}

#[test]
fn do_update_suffix() {
    assert!(ends_with_do_update("(id) DO UPDATE"));
    assert!(ends_with_do_update("ON CONSTRAINT c do update\n"));
    assert!(!ends_with_do_update("(id) DO NOTHING"));
    assert!(!ends_with_do_update("UPDATE"));
}
