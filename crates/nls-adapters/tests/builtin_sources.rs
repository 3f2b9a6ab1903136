// Cross-adapter checks on the built-in placeholder sources.

use std::collections::HashSet;

use nls_adapters::{default_registry, FetchRequest};

#[tokio::test]
async fn builtin_records_are_tagged_with_their_source_and_have_unique_dedup_keys() {
    let keywords = vec![
        "weight loss".to_string(),
        "cybersecurity".to_string(),
        "passive income".to_string(),
    ];
    let request = FetchRequest {
        keywords: &keywords,
        limit: 25,
        proxies: None,
    };

    let mut seen = HashSet::new();
    for adapter in default_registry().iter() {
        let records = adapter.fetch_contacts(&request).await.unwrap();
        assert_eq!(records.len(), keywords.len());
        for record in records {
            assert_eq!(record.source, adapter.source_id());
            let key = (
                record.source.clone(),
                record.handle.clone(),
                record.keyword.clone(),
                record.url.clone(),
            );
            assert!(seen.insert(key), "duplicate dedup key from {}", adapter.source_id());
        }
    }
    assert_eq!(seen.len(), 18);
}

#[test]
fn every_builtin_source_has_a_profile() {
    for adapter in default_registry().iter() {
        let profile = adapter.profile();
        assert!(!profile.display_name.is_empty());
        assert!(!profile.description.is_empty());
        assert!(!profile.recommended_tools.is_empty());
    }
}
