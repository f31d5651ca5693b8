// src/store/rest.rs
use async_trait::async_trait;
use serde_json::Value;

use super::{DataStore, Filter, Query, StoreError, Table};

/// Managed backend tables exposed over a PostgREST-style API.
///
/// Every request is signed with `api_key` as both `apikey` and bearer token.
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn request(&self, method: reqwest::Method, table: &Table) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn rows(response: reqwest::Response) -> Result<Vec<Value>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Backend request failed ({}): {}", status, body);
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Vec<Value>>().await?)
    }
}

/// Renders a filter operand; strings holding list syntax are double-quoted.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains([',', '(', ')', '"']) => {
            format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
        }
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn filter_params(query: &Query) -> Vec<(String, String)> {
    query
        .filters
        .iter()
        .map(|filter| {
            let operand = match filter {
                Filter::Eq { value: Value::Null, .. } => "is.null".to_string(),
                Filter::Eq { value, .. } => format!("eq.{}", render(value)),
                Filter::In { values, .. } => {
                    let list: Vec<String> = values.iter().map(render).collect();
                    format!("in.({})", list.join(","))
                }
            };
            (filter.column().to_string(), operand)
        })
        .collect()
}

/// Query string for a read: projection, filters, ordering, limit.
pub fn read_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.columns.clone())];
    params.extend(filter_params(query));
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

#[async_trait]
impl DataStore for RestStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        tracing::debug!("GET {} {:?}", query.table, query.filters);
        let response = self
            .request(reqwest::Method::GET, &query.table)
            .query(&read_params(query))
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn single(&self, query: &Query) -> Result<Option<Value>, StoreError> {
        let first = Query {
            order: None,
            ..query.clone()
        }
        .limit(1);
        Ok(self.select(&first).await?.into_iter().next())
    }

    async fn insert(&self, table: &Table, row: Value) -> Result<Value, StoreError> {
        if !row.is_object() {
            return Err(StoreError::NotAnObject);
        }
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::Rejected {
                status: 200,
                body: "insert returned no row".to_string(),
            })
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<usize, StoreError> {
        if !patch.is_object() {
            return Err(StoreError::NotAnObject);
        }
        let response = self
            .request(reqwest::Method::PATCH, &query.table)
            .header("Prefer", "return=representation")
            .query(&filter_params(query))
            .json(&patch)
            .send()
            .await?;
        Ok(Self::rows(response).await?.len())
    }
}
