// src/store/mod.rs
//! Thin data-access wrapper shared by the managed backend client and the
//! offline JSON-file mock.
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::errors::SurplusError;

pub mod json_file;
pub mod query;
pub mod rest;

pub use json_file::JsonFileStore;
pub use query::{Filter, OrderBy, Query, Table};
pub use rest::RestStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Rows must be JSON objects")]
    NotAnObject,
}

impl From<StoreError> for SurplusError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Io(e) => SurplusError::StoreConnection(e.to_string()),
            StoreError::Http(e) => SurplusError::from(e),
            StoreError::Malformed(e) => SurplusError::StoreCorrupted(e.to_string()),
            other => SurplusError::StoreQuery(other.to_string()),
        }
    }
}

#[async_trait]
pub trait DataStore: Send + Sync {
    /// Rows matching the query's filters, ordered and limited.
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// First row matching the query's filters.
    async fn single(&self, query: &Query) -> Result<Option<Value>, StoreError>;

    /// Stores a row, filling `id` and `created_at` if absent, and returns it.
    async fn insert(&self, table: &Table, row: Value) -> Result<Value, StoreError>;

    /// Shallow-merges `patch` into every matching row; returns how many matched.
    async fn update(&self, query: &Query, patch: Value) -> Result<usize, StoreError>;
}

// Typed helpers over the untyped row surface
impl dyn DataStore {
    pub async fn fetch_all<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, SurplusError> {
        self.select(query)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(SurplusError::from))
            .collect()
    }

    /// Like `fetch_all`, but drops rows that do not deserialize.
    pub async fn fetch_valid<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, SurplusError> {
        let rows = self.select(query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("Skipping malformed {} row: {}", query.table, e);
                    None
                }
            })
            .collect())
    }

    pub async fn fetch_one<T: DeserializeOwned>(&self, query: &Query) -> Result<Option<T>, SurplusError> {
        match self.single(query).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    pub async fn insert_as<N: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: Table,
        row: &N,
    ) -> Result<T, SurplusError> {
        let stored = self.insert(&table, serde_json::to_value(row)?).await?;
        Ok(serde_json::from_value(stored)?)
    }
}
