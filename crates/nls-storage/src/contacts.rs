//! Deduplicated contact persistence on SQLite.

use std::path::{Path, PathBuf};

use anyhow::Context;
use nls_core::SourceRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::debug;

const MIGRATIONS: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source TEXT NOT NULL,
        keyword TEXT NOT NULL DEFAULT '',
        handle TEXT NOT NULL DEFAULT '',
        email TEXT,
        url TEXT NOT NULL DEFAULT '',
        note TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (source, handle, keyword, url)
    )
    "#];

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ContactRow {
    pub id: i64,
    pub source: String,
    pub keyword: String,
    pub handle: String,
    pub email: Option<String>,
    pub url: String,
    pub note: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Contact table keyed on `(source, handle, keyword, url)`.
pub struct ContactStore {
    conn: SqliteConnection,
    db_path: PathBuf,
}

impl ContactStore {
    /// Open (creating file, parent directory and table when absent).
    pub async fn open(db_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating database directory {}", parent.display()))?;
        }

        let mut conn = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .connect()
            .await
            .with_context(|| format!("opening contact store {}", db_path.display()))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&mut conn)
                .await
                .with_context(|| format!("running migration {i} on {}", db_path.display()))?;
        }

        Ok(Self { conn, db_path })
    }

    /// Open an existing store without creating or migrating anything.
    pub async fn open_existing(db_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let conn = SqliteConnectOptions::new()
            .filename(&db_path)
            .read_only(true)
            .connect()
            .await
            .with_context(|| format!("opening contact store {}", db_path.display()))?;
        Ok(Self { conn, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Insert every record in one transaction, committed at the end.
    ///
    /// A record whose dedup key already exists is skipped: the first insert
    /// wins and later field differences (`note`, `email`) are discarded.
    /// Absent key fields are stored as `''` so they still take part in the
    /// uniqueness check.
    pub async fn write_deduped(&mut self, records: &[SourceRecord]) -> anyhow::Result<InsertReport> {
        let mut report = InsertReport::default();
        let mut tx = self
            .conn
            .begin()
            .await
            .with_context(|| format!("starting transaction on {}", self.db_path.display()))?;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO contacts (source, keyword, handle, email, url, note)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.source)
            .bind(record.keyword.as_deref().unwrap_or_default())
            .bind(record.handle.as_deref().unwrap_or_default())
            .bind(record.email.as_deref())
            .bind(record.url.as_deref().unwrap_or_default())
            .bind(record.note.as_deref())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("inserting {} contact", record.source))?;

            if result.rows_affected() == 0 {
                debug!(source = %record.source, handle = ?record.handle, "duplicate contact skipped");
                report.skipped += 1;
            } else {
                report.inserted += 1;
            }
        }

        tx.commit()
            .await
            .with_context(|| format!("committing contacts to {}", self.db_path.display()))?;
        Ok(report)
    }

    pub async fn count(&mut self) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts")
            .fetch_one(&mut self.conn)
            .await
            .context("counting contacts")?;
        Ok(count)
    }

    pub async fn contacts(&mut self) -> anyhow::Result<Vec<ContactRow>> {
        sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT id, source, keyword, handle, email, url, note, created_at
            FROM contacts
            ORDER BY id
            "#,
        )
        .fetch_all(&mut self.conn)
        .await
        .context("listing contacts")
    }

    pub async fn close(self) -> anyhow::Result<()> {
        self.conn
            .close()
            .await
            .with_context(|| format!("closing contact store {}", self.db_path.display()))
    }
}
