use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;

use intel_core::{
    AnalysisResult, ArticleMetadata, ArticleStatus, ArticleStore, Classification, Entity, Error,
    Result, ScrapedArticle, StoreStats, StoredArticle,
};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        url TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        source TEXT NOT NULL,
        publish_date TEXT NOT NULL,
        summary TEXT,
        entities TEXT NOT NULL DEFAULT '[]',
        classification TEXT,
        sentiment_score INTEGER,
        scraped_at TEXT NOT NULL,
        analyzed_at TEXT,
        status TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}'
    )
    "#,
    // Add future migrations here
];

/// SQLite-backed article store. Timestamps are RFC 3339 text; entities and
/// metadata are JSON columns.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(db_path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn upsert_scraped(&self, article: &ScrapedArticle) -> Result<()> {
        let record = StoredArticle::pending(article);
        let metadata = serde_json::to_string(&record.metadata)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO articles
            (url, title, content, source, publish_date, summary, entities,
             classification, sentiment_score, scraped_at, analyzed_at, status, metadata)
            VALUES (?, ?, ?, ?, ?, NULL, '[]', NULL, NULL, ?, NULL, ?, ?)
            "#,
        )
        .bind(&record.url)
        .bind(&record.title)
        .bind(&record.content)
        .bind(&record.source)
        .bind(record.publish_date.to_rfc3339())
        .bind(record.scraped_at.to_rfc3339())
        .bind(record.status.as_str())
        .bind(metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to upsert article: {}", e)))?;

        Ok(())
    }

    async fn apply_analysis(&self, url: &str, analysis: &AnalysisResult) -> Result<bool> {
        let entities = serde_json::to_string(&analysis.entities)?;

        let result = sqlx::query(
            r#"
            UPDATE articles
            SET summary = ?, entities = ?, classification = ?, sentiment_score = ?,
                analyzed_at = ?, status = ?
            WHERE url = ?
            "#,
        )
        .bind(&analysis.summary)
        .bind(entities)
        .bind(analysis.classification.as_str())
        .bind(analysis.sentiment_score as i64)
        .bind(Utc::now().to_rfc3339())
        .bind(ArticleStatus::Complete.as_str())
        .bind(url)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to apply analysis: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(&self, url: &str, error: &str) -> Result<bool> {
        let Some(record) = self.get(url).await? else {
            return Ok(false);
        };

        let mut metadata = record.metadata;
        metadata.error = Some(error.to_string());
        metadata.failed_at = Some(Utc::now());
        let metadata = serde_json::to_string(&metadata)?;

        let result = sqlx::query("UPDATE articles SET status = ?, metadata = ? WHERE url = ?")
            .bind(ArticleStatus::Failed.as_str())
            .bind(metadata)
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to mark article failed: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_status(
        &self,
        status: ArticleStatus,
        limit: usize,
    ) -> Result<Vec<StoredArticle>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE status = ?
            ORDER BY scraped_at DESC
            LIMIT ?
            "#,
        )
        .bind(status.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to query by status: {}", e)))?;

        rows.iter().map(row_to_record).collect()
    }

    async fn get(&self, url: &str) -> Result<Option<StoredArticle>> {
        let row = sqlx::query("SELECT * FROM articles WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch article: {}", e)))?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn stats(&self) -> Result<StoreStats> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM articles GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to compute stats: {}", e)))?;

        let mut stats = StoreStats::default();
        for row in rows {
            let status: String = row.get("status");
            let count: i64 = row.get("n");
            let count = count as usize;
            stats.total += count;
            match status.parse::<ArticleStatus>()? {
                ArticleStatus::Pending => stats.pending = count,
                ArticleStatus::Complete => stats.complete = count,
                ArticleStatus::Failed => stats.failed = count,
            }
        }
        Ok(stats)
    }
}

fn row_to_record(row: &SqliteRow) -> Result<StoredArticle> {
    let entities_raw: String = row.get("entities");
    let entities: Vec<Entity> = serde_json::from_str(&entities_raw)?;

    let metadata_raw: String = row.get("metadata");
    let metadata: ArticleMetadata = serde_json::from_str(&metadata_raw)?;

    let classification = row
        .get::<Option<String>, _>("classification")
        .map(|raw| Classification::from_str(&raw))
        .transpose()?;

    Ok(StoredArticle {
        url: row.get("url"),
        title: row.get("title"),
        content: row.get("content"),
        publish_date: parse_timestamp(row.get("publish_date"))?,
        source: row.get("source"),
        summary: row.get("summary"),
        entities,
        classification,
        sentiment_score: row
            .get::<Option<i64>, _>("sentiment_score")
            .map(|s| s as u8),
        scraped_at: parse_timestamp(row.get("scraped_at"))?,
        analyzed_at: row
            .get::<Option<String>, _>("analyzed_at")
            .map(parse_timestamp)
            .transpose()?,
        status: row.get::<String, _>("status").parse()?,
        metadata,
    })
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("failed to parse timestamp: {}", e)))
}
