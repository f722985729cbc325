//! SQLite storage backend

use super::traits::{ResourceStoreCapability, StorageResult};
use crate::model::{ArtifactTag, ResourceTag};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed resource store
///
/// Uses a single database file with one table for decomposed resources and
/// one for whole artifacts. Content is stored as JSON text and replaced
/// wholesale on upsert. Thread-safe via internal mutex on the connection.
pub struct SqliteResourceStore {
    conn: Mutex<Connection>,
}

impl SqliteResourceStore {
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Decomposed resources, one row per (artifact type, class, id)
            CREATE TABLE IF NOT EXISTS resources (
                artifact TEXT NOT NULL,
                class_name TEXT NOT NULL,
                id TEXT NOT NULL,
                content_json TEXT NOT NULL,
                PRIMARY KEY (artifact, class_name, id)
            );

            CREATE INDEX IF NOT EXISTS idx_resources_artifact
                ON resources(artifact);

            -- Whole artifact instances for types that are not decomposed
            CREATE TABLE IF NOT EXISTS artifacts (
                artifact TEXT NOT NULL,
                external_id TEXT NOT NULL,
                content_json TEXT NOT NULL,
                PRIMARY KEY (artifact, external_id)
            );

            CREATE INDEX IF NOT EXISTS idx_artifacts_artifact
                ON artifacts(artifact);

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Ok(())
    }
}

#[async_trait]
impl ResourceStoreCapability for SqliteResourceStore {
    async fn get_all_resource_tags(&self, artifact: &str) -> StorageResult<HashSet<ResourceTag>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt =
            conn.prepare("SELECT class_name, id FROM resources WHERE artifact = ?1")?;
        let tags = stmt
            .query_map(params![artifact], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .map(|r| r.map(|(class_name, id)| ResourceTag::new(artifact, class_name, id)))
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(tags)
    }

    async fn get_resource(&self, tag: &ResourceTag) -> StorageResult<Option<Value>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let content_json: Option<String> = conn
            .query_row(
                "SELECT content_json FROM resources
                 WHERE artifact = ?1 AND class_name = ?2 AND id = ?3",
                params![tag.artifact, tag.class_name, tag.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match content_json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn upsert_resource(&self, tag: &ResourceTag, content: &Value) -> StorageResult<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let content_json = serde_json::to_string(content)?;

        conn.execute(
            r#"
            INSERT INTO resources (artifact, class_name, id, content_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(artifact, class_name, id) DO UPDATE SET
                content_json = excluded.content_json
            "#,
            params![tag.artifact, tag.class_name, tag.id.as_str(), content_json],
        )?;

        Ok(())
    }

    async fn delete_resource(&self, tag: &ResourceTag) -> StorageResult<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "DELETE FROM resources WHERE artifact = ?1 AND class_name = ?2 AND id = ?3",
            params![tag.artifact, tag.class_name, tag.id.as_str()],
        )?;
        Ok(())
    }

    async fn get_all_artifact_tags(&self, artifact: &str) -> StorageResult<HashSet<ArtifactTag>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare("SELECT external_id FROM artifacts WHERE artifact = ?1")?;
        let tags = stmt
            .query_map(params![artifact], |row| row.get::<_, String>(0))?
            .map(|r| r.map(|external_id| ArtifactTag::new(artifact, external_id)))
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(tags)
    }

    async fn get_artifact(&self, tag: &ArtifactTag) -> StorageResult<Option<Value>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let content_json: Option<String> = conn
            .query_row(
                "SELECT content_json FROM artifacts WHERE artifact = ?1 AND external_id = ?2",
                params![tag.artifact, tag.external_id],
                |row| row.get(0),
            )
            .optional()?;

        match content_json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn upsert_artifact(&self, tag: &ArtifactTag, content: &Value) -> StorageResult<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let content_json = serde_json::to_string(content)?;

        conn.execute(
            r#"
            INSERT INTO artifacts (artifact, external_id, content_json)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(artifact, external_id) DO UPDATE SET
                content_json = excluded.content_json
            "#,
            params![tag.artifact, tag.external_id, content_json],
        )?;

        Ok(())
    }

    async fn delete_artifact(&self, tag: &ArtifactTag) -> StorageResult<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "DELETE FROM artifacts WHERE artifact = ?1 AND external_id = ?2",
            params![tag.artifact, tag.external_id],
        )?;
        Ok(())
    }
}
