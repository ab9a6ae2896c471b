use jsonschema::JSONSchema;
use schemars::schema_for;
use shadowgen_core::{
    ColumnKind, ColumnSpec, SchemaGraph, SyntheticDataset, TableSpec, Value, validate_schema,
};

fn sample_schema() -> SchemaGraph {
    SchemaGraph::new()
        .with_table(
            TableSpec::new("customer")
                .column(ColumnSpec::new("customer_id", ColumnKind::Integer))
                .column(ColumnSpec::from_sql("email", "character varying(50)", true))
                .primary_key(["customer_id"]),
        )
        .with_table(
            TableSpec::new("film")
                .column(ColumnSpec::new("film_id", ColumnKind::Integer))
                .column(
                    ColumnSpec::new("rating", ColumnKind::Text)
                        .with_enum_domain(["G", "PG", "PG-13", "R", "NC-17"]),
                )
                .primary_key(["film_id"]),
        )
}

#[test]
fn schema_graph_matches_its_json_schema() {
    let schema = sample_schema();
    validate_schema(&schema).expect("valid schema");

    let contract = serde_json::to_value(schema_for!(SchemaGraph)).expect("serialize contract");
    let compiled = JSONSchema::compile(&contract).expect("compile contract");
    let instance = serde_json::to_value(&schema).expect("serialize schema");
    assert!(compiled.is_valid(&instance));
}

#[test]
fn schema_graph_serializes_deterministically() {
    let first = serde_json::to_string_pretty(&sample_schema()).expect("serialize");
    let second = serde_json::to_string_pretty(&sample_schema()).expect("serialize");
    assert_eq!(first, second);
    assert!(first.find("\"customer\"").unwrap() < first.find("\"film\"").unwrap());
}

#[test]
fn schema_graph_round_trips_enum_domains() {
    let json = serde_json::to_string(&sample_schema()).expect("serialize");
    let parsed: SchemaGraph = serde_json::from_str(&json).expect("parse");
    let domain = parsed.enum_domain("film", "rating").expect("table exists");
    assert_eq!(domain.map(<[String]>::len), Some(5));
    let email = parsed.table("customer").unwrap().find_column("email").unwrap();
    assert_eq!(email.max_length, Some(50));
    assert!(email.nullable);
}

#[test]
fn snapshot_matches_its_json_schema() {
    let mut dataset = SyntheticDataset::new();
    dataset.insert_table(
        "customer",
        vec![
            [
                ("customer_id".to_string(), Value::Int(1)),
                ("email".to_string(), Value::Null),
            ]
            .into_iter()
            .collect(),
        ],
    );

    let contract = serde_json::to_value(schema_for!(SyntheticDataset)).expect("serialize contract");
    let compiled = JSONSchema::compile(&contract).expect("compile contract");
    let instance = serde_json::to_value(&dataset).expect("serialize dataset");
    assert!(compiled.is_valid(&instance));
    assert!(!compiled.is_valid(&serde_json::json!({"customer": 3})));
}
