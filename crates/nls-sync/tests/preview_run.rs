// End-to-end preview run against a temp workspace.

use nls_adapters::default_registry;
use nls_storage::{read_lines, ContactStore};
use nls_sync::{Pipeline, PipelineConfig};
use tempfile::tempdir;
use tracing::Span;

#[tokio::test]
async fn preview_run_writes_one_marked_record_per_source() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig {
        keywords: vec!["weight loss".to_string()],
        limit: 1,
        output_dir: dir.path().join("data/latest"),
        db_path: dir.path().join("data/contacts.db"),
        inline_proxies: vec![" http://203.0.113.10:8080 ".to_string()],
        proxy_file: Some(dir.path().join("missing-proxies.txt")),
        preview: true,
    };
    let pipeline = Pipeline::new(config.clone(), default_registry(), Span::none());

    let results = pipeline
        .run_sources(&config.keywords, true, config.limit, None)
        .await
        .unwrap();
    assert_eq!(results.len(), 6);
    for (source_id, records) in results.iter() {
        assert_eq!(records.len(), 1, "{source_id}");
        assert!(records[0].preview);
        assert_eq!(records[0].source, source_id);
    }

    let summary = pipeline.run_once().await.unwrap();
    assert_eq!(summary.sources, 6);
    assert_eq!(summary.records, 6);
    assert_eq!(summary.inserted, 6);
    assert_eq!(summary.proxies, 1);

    for source_id in ["reddit", "quora", "twitter", "amazon", "youtube", "forums"] {
        let jsonl = config.output_dir.join(format!("{source_id}.jsonl"));
        let csv = config.output_dir.join(format!("{source_id}.csv"));
        let back = read_lines(&jsonl).await.unwrap();
        assert_eq!(back, results.get(source_id).unwrap());
        let table = std::fs::read_to_string(&csv).unwrap();
        assert_eq!(table.lines().count(), 2);
        assert!(table.lines().next().unwrap().starts_with("source,keyword,handle,email,url,note"));
    }

    let mut store = ContactStore::open(&config.db_path).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 6);
    let rows = store.contacts().await.unwrap();
    assert_eq!(rows[0].source, "reddit");
    assert_eq!(rows[0].handle, "preview_user_1");
    assert_eq!(rows[5].source, "forums");
}
