//! Output sinks (JSON lines, CSV, deduplicated SQLite) + proxy list utilities for NLS.

use std::path::{Path, PathBuf};

use anyhow::Context;
use nls_core::SourceRecord;
use serde_json::Value as JsonValue;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub mod contacts;
pub mod proxies;

pub use contacts::{ContactRow, ContactStore, InsertReport};
pub use proxies::{load_proxies, sample_free_proxies, ProxyList};

pub const CRATE_NAME: &str = "nls-storage";

/// Write one JSON object per record per line, replacing `path`.
///
/// Non-ASCII text is written as-is (UTF-8), not escaped.
pub async fn write_lines(path: impl AsRef<Path>, records: &[SourceRecord]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record)
            .with_context(|| format!("serializing {} record for {}", record.source, path.display()))?;
        buf.push(b'\n');
    }
    replace_file(path, &buf).await
}

/// Read back a file produced by [`write_lines`]. Blank lines are skipped.
pub async fn read_lines(path: impl AsRef<Path>) -> anyhow::Result<Vec<SourceRecord>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("parsing {} line {}", path.display(), idx + 1))
        })
        .collect()
}

/// Write a CSV table, one row per record, replacing `path`.
///
/// Columns are the union of record keys in first-seen order; absent keys and
/// nulls render as empty cells.
pub async fn write_table(path: impl AsRef<Path>, records: &[SourceRecord]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let rows = records.iter().map(SourceRecord::to_flat).collect::<Vec<_>>();

    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        for (key, _) in row {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    if !columns.is_empty() {
        writer
            .write_record(&columns)
            .with_context(|| format!("writing header for {}", path.display()))?;
    }
    for row in &rows {
        let cells = columns.iter().map(|column| {
            row.iter()
                .find(|(key, _)| key == column)
                .map(|(_, value)| cell_text(value))
                .unwrap_or_default()
        });
        writer
            .write_record(cells)
            .with_context(|| format!("writing row for {}", path.display()))?;
    }
    let buf = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv buffer for {}: {}", path.display(), e))?;
    replace_file(path, &buf).await
}

fn cell_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace `path` with `bytes` through a temp file + rename in the same directory.
async fn replace_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .await
        .with_context(|| format!("creating output directory {}", parent.display()))?;

    let temp_path = parent.join(format!(".{}.{}.tmp", Uuid::new_v4(), bytes.len()));
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&temp_path)
        .await
        .with_context(|| format!("opening temp output file {}", temp_path.display()))?;
    file.write_all(bytes)
        .await
        .with_context(|| format!("writing temp output file {}", temp_path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("flushing temp output file {}", temp_path.display()))?;
    drop(file);

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err).with_context(|| {
            format!(
                "renaming temp output {} -> {}",
                temp_path.display(),
                path.display()
            )
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn contact(source: &str, keyword: &str, idx: usize) -> SourceRecord {
        SourceRecord::new(source)
            .with_keyword(keyword)
            .with_handle(format!("{source}_user_{idx}"))
            .with_url("https://example.com")
            .with_note(format!("Posted about {keyword}"))
    }

    #[tokio::test]
    async fn jsonl_round_trip_preserves_records() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested/out/forums.jsonl");
        let records = vec![
            contact("forums", "weight loss", 1),
            contact("forums", "cybersecurity", 2).with_extra("score", 7),
            contact("forums", "passive income", 3).marked_preview(),
        ];

        write_lines(&path, &records).await.expect("write");
        let back = read_lines(&path).await.expect("read");
        assert_eq!(back, records);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[tokio::test]
    async fn jsonl_keeps_non_ascii_unescaped_and_overwrites() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("quora.jsonl");
        write_lines(&path, &[contact("quora", "old", 1), contact("quora", "older", 2)])
            .await
            .unwrap();
        write_lines(&path, &[contact("quora", "pérdida de peso", 1)])
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("pérdida de peso"));
        assert!(!text.contains("\\u00e9"));
        assert_eq!(text.lines().count(), 1);
    }

    #[tokio::test]
    async fn csv_header_is_key_union_with_empty_cells() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("reddit.csv");
        let records = vec![
            SourceRecord::new("reddit").with_keyword("vpn").with_extra("title", "Thread"),
            SourceRecord::new("reddit")
                .with_handle("someone")
                .with_email("someone@example.com"),
        ];
        write_table(&path, &records).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "source,keyword,email,title,handle");
        assert_eq!(lines[1], "reddit,vpn,,Thread,");
        assert_eq!(lines[2], "reddit,,someone@example.com,,someone");
    }

    #[tokio::test]
    async fn csv_quotes_embedded_commas() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("twitter.csv");
        let records = vec![SourceRecord::new("twitter").with_note("Matched query: a, b")];
        write_table(&path, &records).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"Matched query: a, b\""));
    }

    #[tokio::test]
    async fn empty_inputs_write_empty_files() {
        let dir = tempdir().expect("tempdir");
        let jsonl = dir.path().join("amazon.jsonl");
        let csv = dir.path().join("amazon.csv");
        write_lines(&jsonl, &[]).await.unwrap();
        write_table(&csv, &[]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&jsonl).unwrap(), "");
        assert_eq!(std::fs::read_to_string(&csv).unwrap(), "");
    }

    #[tokio::test]
    async fn unwritable_output_directory_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = write_lines(blocker.join("out/reddit.jsonl"), &[contact("reddit", "keto", 1)])
            .await
            .err()
            .expect("parent is a file");
        assert!(format!("{err:#}").contains("creating output directory"));
        assert!(write_table(blocker.join("out/reddit.csv"), &[]).await.is_err());
        assert!(blocker.is_file());
    }
}
