// src/store/json_file.rs
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{DataStore, Query, StoreError, Table};
use crate::models::profile::demo_profiles;
use crate::utils::id_generator::{IdGenerator, IdType};

type Database = Map<String, Value>;

/// Offline stand-in for the managed backend: every table lives in one JSON
/// document on disk, reloaded on each call.
pub struct JsonFileStore {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process only
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn seed() -> Result<Database, StoreError> {
        let seeded = json!({
            "profiles": serde_json::to_value(demo_profiles())?,
            "donations": [],
            "claims": [],
            "tasks": [],
        });
        match seeded {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject),
        }
    }

    async fn load(&self) -> Result<Database, StoreError> {
        if !tokio::fs::try_exists(&self.path).await? {
            tracing::info!("Seeding demo database at {}", self.path.display());
            let db = Self::seed()?;
            self.save(&db).await?;
            return Ok(db);
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject),
        }
    }

    async fn save(&self, db: &Database) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(db)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    fn rows(db: &Database, table: &Table) -> Vec<Value> {
        match db.get(table.name()) {
            Some(Value::Array(rows)) => rows.clone(),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl DataStore for JsonFileStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        let _guard = self.lock.lock().await;
        let db = self.load().await?;
        Ok(query.apply(Self::rows(&db, &query.table)))
    }

    async fn single(&self, query: &Query) -> Result<Option<Value>, StoreError> {
        let _guard = self.lock.lock().await;
        let db = self.load().await?;
        Ok(Self::rows(&db, &query.table)
            .into_iter()
            .find(|row| query.matches(row)))
    }

    async fn insert(&self, table: &Table, row: Value) -> Result<Value, StoreError> {
        let Value::Object(fields) = row else {
            return Err(StoreError::NotAnObject);
        };

        let _guard = self.lock.lock().await;
        let mut db = self.load().await?;

        let mut stored = Map::new();
        stored.insert("id".to_string(), Value::String(IdGenerator::generate(IdType::for_table(table))));
        stored.insert(
            "created_at".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        // Caller-supplied fields win over generated ones
        stored.extend(fields);
        let stored = Value::Object(stored);

        let entry = db
            .entry(table.name().to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(rows) => rows.push(stored.clone()),
            other => *other = Value::Array(vec![stored.clone()]),
        }

        self.save(&db).await?;
        tracing::debug!("Inserted row into {}", table);
        Ok(stored)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<usize, StoreError> {
        let Value::Object(patch) = patch else {
            return Err(StoreError::NotAnObject);
        };

        let _guard = self.lock.lock().await;
        let mut db = self.load().await?;

        let mut modified = 0;
        if let Some(Value::Array(rows)) = db.get_mut(query.table.name()) {
            for row in rows.iter_mut().filter(|row| query.matches(row)) {
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                    modified += 1;
                }
            }
        }

        if modified > 0 {
            self.save(&db).await?;
        }
        tracing::debug!("Updated {} row(s) in {}", modified, query.table);
        Ok(modified)
    }
}
