use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::paths;

/// Everything that determines the model's answer for one batch.
#[derive(Debug, Clone)]
pub struct CacheRequest<'a> {
    /// The batch payload sent as the user turn.
    pub batch_text: &'a str,
    pub model: &'a str,
    pub endpoint: &'a str,
    pub system_prompt: &'a str,
}

impl CacheRequest<'_> {
    pub fn prompt_hash(&self) -> String {
        hex::encode(Sha256::digest(self.system_prompt.as_bytes()))
    }

    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [self.batch_text, self.model, self.endpoint] {
            hasher.update(part.as_bytes());
            hasher.update([0]);
        }
        hasher.update(self.prompt_hash().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// `SQLite` store of batch responses that reconstructed successfully.
pub struct CacheManager {
    db_path: PathBuf,
}

impl CacheManager {
    pub fn new() -> Result<Self> {
        let cache_dir = paths::cache_dir()?;

        std::fs::create_dir_all(&cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", cache_dir.display())
        })?;

        Self::open(cache_dir.join("responses.db"))
    }

    pub fn open(db_path: PathBuf) -> Result<Self> {
        let manager = Self { db_path };
        manager.init_db()?;
        Ok(manager)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS batch_responses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cache_key TEXT UNIQUE NOT NULL,
                batch_text TEXT NOT NULL,
                response TEXT NOT NULL,
                model TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                prompt_hash TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                accessed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .context("Failed to create batch_responses table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cache_key ON batch_responses(cache_key)",
            [],
        )
        .context("Failed to create index")?;

        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open cache database: {}", self.db_path.display()))
    }

    pub fn get(&self, request: &CacheRequest<'_>) -> Result<Option<String>> {
        let cache_key = request.cache_key();
        let conn = self.connect()?;

        let result: Option<String> = conn
            .query_row(
                "SELECT response FROM batch_responses WHERE cache_key = ?1",
                [&cache_key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read from cache")?;

        if result.is_some() {
            conn.execute(
                "UPDATE batch_responses SET accessed_at = CURRENT_TIMESTAMP WHERE cache_key = ?1",
                [&cache_key],
            )?;
        }

        Ok(result)
    }

    pub fn put(&self, request: &CacheRequest<'_>, response: &str) -> Result<()> {
        let cache_key = request.cache_key();
        let prompt_hash = request.prompt_hash();
        let conn = self.connect()?;

        conn.execute(
            "INSERT OR REPLACE INTO batch_responses
             (cache_key, batch_text, response, model, endpoint, prompt_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            [
                cache_key.as_str(),
                request.batch_text,
                response,
                request.model,
                request.endpoint,
                prompt_hash.as_str(),
            ],
        )
        .context("Failed to insert response into cache")?;

        Ok(())
    }
}
