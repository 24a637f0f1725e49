//! End-to-end tests: sample a real file, infer, generate artifacts.

use std::io::Write;
use std::sync::Arc;

use tempfile::{NamedTempFile, TempDir};

use pgdraft::{
    ConfidenceLevel, InferenceConfig, InferenceEngine, MockProvider, SampleReader, generate_all,
};

fn create_csv(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_sample_and_infer_heuristic() {
    let file = create_csv(
        "id,company,funding_usd,founded,active\n\
         1,Acme,1200000.50,2019-04-01,true\n\
         2,Globex,98000.00,2020-11-15,false\n\
         3,Initech,,2018-01-30,true\n",
    );

    let sample = SampleReader::new().sample_file(file.path()).unwrap();
    assert_eq!(sample.headers.len(), 5);
    assert_eq!(sample.sample_size, 3);

    let schema = InferenceEngine::new().infer_heuristic(&sample).unwrap();

    assert_eq!(schema.columns.len(), 5);
    assert_eq!(schema.get_column("id").unwrap().pg_type, "integer");
    assert_eq!(schema.get_column("funding_usd").unwrap().pg_type, "numeric");
    assert!(schema.get_column("funding_usd").unwrap().nullable);
    assert_eq!(schema.get_column("founded").unwrap().pg_type, "date");
    assert_eq!(schema.get_column("active").unwrap().pg_type, "boolean");
    assert_eq!(schema.primary_key, Some("id".to_string()));
    assert!(schema.validate().is_ok());
}

#[test]
fn test_headers_sanitized_end_to_end() {
    let file = create_csv(
        "Company Name,Funding (USD),SELECT\n\
         Acme,100.0,x\n",
    );

    let sample = SampleReader::new().sample_file(file.path()).unwrap();
    let schema = InferenceEngine::new().infer_heuristic(&sample).unwrap();

    let names = schema.column_names();
    assert_eq!(names, vec!["company_name", "funding_usd", "select_col"]);
}

#[tokio::test]
async fn test_fallback_merge_keeps_all_columns() {
    // Ten columns, chunk size 2 -> 5 chunks; chunks 1 and 3 fail.
    // With fallback enabled the final schema still has all ten.
    let header: Vec<String> = (0..10).map(|i| format!("c{i}")).collect();
    let row: Vec<String> = (0..10).map(|i| format!("{i}")).collect();
    let file = create_csv(&format!("{}\n{}\n", header.join(","), row.join(",")));

    let sample = SampleReader::new().sample_file(file.path()).unwrap();

    let engine = InferenceEngine::with_config(InferenceConfig {
        chunk_size: 2,
        smart_chunking: false,
        use_fallback: true,
    })
    .with_provider(Arc::new(MockProvider::failing_chunks([1, 3])));

    let schema = engine.infer(&sample).await.unwrap();
    assert_eq!(schema.columns.len(), 10);

    // Failed chunks (columns c2,c3 and c6,c7) resolved heuristically:
    // single digits classify as boolean-or-integer, not mock "text".
    for name in ["c2", "c3", "c6", "c7"] {
        let col = schema.get_column(name).unwrap();
        assert_ne!(col.pg_type, "text", "column {name} was not patched");
    }
    // Surviving chunks keep the provider verdict.
    assert_eq!(schema.get_column("c4").unwrap().pg_type, "text");
}

#[tokio::test]
async fn test_partial_schema_without_fallback() {
    let file = create_csv("a,b,c,d\n1,2,3,4\n");
    let sample = SampleReader::new().sample_file(file.path()).unwrap();

    let engine = InferenceEngine::with_config(InferenceConfig {
        chunk_size: 2,
        smart_chunking: false,
        use_fallback: false,
    })
    .with_provider(Arc::new(MockProvider::failing_chunks([0])));

    let schema = engine.infer(&sample).await.unwrap();
    // Chunk 0 (a, b) dropped; run still succeeds short of columns.
    assert_eq!(schema.columns.len(), 2);
    assert!(schema.get_column("a").is_none());
    assert!(schema.get_column("c").is_some());
}

#[test]
fn test_all_null_column_defaults_low_confidence_text() {
    let file = create_csv("filled,empty\n1,\n2,\n");
    let sample = SampleReader::new().sample_file(file.path()).unwrap();

    let classifier = pgdraft::HeuristicClassifier::new();
    let columns = sample.column_samples();
    let verdict = classifier.classify(&columns[1]);

    assert_eq!(verdict.pg_type, "text");
    assert_eq!(verdict.confidence, ConfidenceLevel::Low);
    assert!(verdict.nullable);
}

#[tokio::test]
async fn test_full_pipeline_generates_artifacts() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("orders.csv");
    std::fs::write(
        &csv_path,
        "order_id,customer,total\n1,alice,10.50\n2,bob,99.99\n",
    )
    .unwrap();

    let sample = SampleReader::new().sample_file(&csv_path).unwrap();
    let engine = InferenceEngine::new().with_provider(Arc::new(MockProvider::failing_all()));
    let schema = engine.infer(&sample).await.unwrap();

    // Systemic failure with fallback: heuristic types all the way.
    assert_eq!(schema.get_column("order_id").unwrap().pg_type, "integer");
    assert_eq!(schema.primary_key, Some("order_id".to_string()));

    let result = generate_all(
        &schema,
        &csv_path,
        dir.path(),
        "postgresql://localhost/orders",
        sample.properties.delimiter,
        None,
        false,
    )
    .unwrap();

    let config = std::fs::read_to_string(&result.loader_config_path).unwrap();
    assert!(config.contains("TARGET TABLE orders"));
    assert!(config.contains("alter table orders add primary key (order_id)"));

    let script = std::fs::read_to_string(&result.import_script_path).unwrap();
    assert!(script.contains("pgloader"));
}
