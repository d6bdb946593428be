use insta::assert_snapshot;
use ssql::convert::{convert, TableConverter};
use ssql::error::{SemanticError, SsqlError};
use ssql::sql::Dialect;

const COMPOSITE: &str =
    "CREATE TABLE sales (id INT, region INT, SAMPLEKEY(id, (id, region) AS ir));";

#[test]
fn test_composite_key_on_postgres() {
    let plan = convert(COMPOSITE, Dialect::Postgres).unwrap();

    assert_eq!(plan.table_name, "sales");
    assert_snapshot!(
        plan.staging_create,
        @"CREATE TABLE sales (_LEVEL_SUM SMALLINT, _id_level SMALLINT, _ir_level SMALLINT, id INT, region INT)"
    );
    assert_snapshot!(plan.catalog_insert, @r"
    INSERT INTO _SAMPLE_KEY_DEFS VALUES
    ('sales','id',1,'_id_level','id','INT'),
    ('sales','ir',2,'_ir_level','id,region','INT,INT')
    ");
    assert_eq!(
        plan.post,
        vec![
            "CREATE INDEX cidx_sales ON sales(_LEVEL_SUM,_id_level,_ir_level)",
            "CLUSTER sales USING cidx_sales",
            "CREATE INDEX lidx_id_level ON sales(_id_level)",
            "CREATE INDEX lidx_ir_level ON sales(_ir_level)",
        ]
    );
}

#[test]
fn test_migration_layers() {
    let plan = convert(COMPOSITE, Dialect::Postgres).unwrap();
    let migration = plan.migration;

    assert!(migration.starts_with("INSERT INTO sales\n SELECT\n _id_level+_ir_level AS _LEVEL_SUM,\n"));
    assert!(migration.contains(
        "CAST(((1341504661 * (id & CAST(4294967295 AS BIGINT)) + 305151913) % 2147483647) AS INTEGER) AS _id_hash"
    ));
    // composite keys XOR their components
    assert!(migration.contains(" # "));
    assert!(migration.contains("CASE WHEN _ir_hash=0 THEN -32 ELSE -31 + CAST(FLOOR(LOG(_ir_hash)/CAST("));
    assert!(migration.contains("   FROM sales\n  ) AS _HASH_INLINE\n ) AS _LEVEL_INLINE\n"));
}

#[test]
fn test_catalog_table_shape() {
    let plan = convert(COMPOSITE, Dialect::Generic).unwrap();
    assert_snapshot!(plan.catalog_create.trim_end(), @r"
    CREATE TABLE _SAMPLE_KEY_DEFS (
     TABLE_NAME VARCHAR(250),
     KEY_NAME VARCHAR(250),
     KEY_ORDER INTEGER,
     LEVEL_NAME VARCHAR(250),
     BASE_EXPR VARCHAR(250),
     BASE_TYPE VARCHAR(250),
     PRIMARY KEY (TABLE_NAME,KEY_ORDER)
    )
    ");
}

#[test]
fn test_redshift_appends_sort_key() {
    let plan = convert(
        "CREATE TABLE t (id INT, v INT, SAMPLEKEY(id), SORTKEY(v))",
        Dialect::Redshift,
    )
    .unwrap();
    assert_eq!(
        plan.staging_create,
        "CREATE TABLE t (_id_level SMALLINT, id INT, v INT)\nSORTKEY (_id_level,v)"
    );
    assert!(plan.post.is_empty());
}

#[test]
fn test_generic_has_no_post_statements() {
    let plan = convert("CREATE TABLE t (id INT, SAMPLEKEY(id))", Dialect::Generic).unwrap();
    assert!(plan.post.is_empty());
    assert_eq!(
        plan.statements(),
        vec![
            plan.staging_create.clone(),
            plan.catalog_create.clone(),
            plan.catalog_insert.clone(),
            plan.migration.clone(),
        ]
    );
}

#[test]
fn test_generation_is_idempotent() {
    let converter = TableConverter::new(COMPOSITE, Dialect::Postgres).unwrap();
    assert_eq!(converter.plan().unwrap(), converter.plan().unwrap());
    assert_eq!(converter.plan().unwrap(), convert(COMPOSITE, Dialect::Postgres).unwrap());
}

#[test]
fn test_conversion_errors() {
    let err = convert("CREATE TABLE t (id INT, SAMPLEKEY(id, Id))", Dialect::Generic).unwrap_err();
    assert!(matches!(
        err,
        SsqlError::Semantic(SemanticError::DuplicateUnitKey(ref key)) if key == "Id"
    ));

    let err = convert("CREATE TABLE t (id INT)", Dialect::Generic).unwrap_err();
    assert_eq!(err.to_string(), "SAMPLEKEY clause not found");
}

#[test]
fn test_undeclared_component_has_empty_base_type() {
    let plan = convert(
        "CREATE TABLE t (id INT, SAMPLEKEY(id, (id, ext) AS k))",
        Dialect::Generic,
    )
    .unwrap();
    assert_snapshot!(plan.catalog_insert, @r"
    INSERT INTO _SAMPLE_KEY_DEFS VALUES
    ('t','id',1,'_id_level','id','INT'),
    ('t','k',2,'_k_level','id,ext','INT,')
    ");
}
