//! HTTP row store speaking the PostgREST filter convention

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde_json::Value;

use super::{Filter, Order, Row, RowStore, StoreError, Table};

pub struct RestStore {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, table.name());
        let mut req = self.client.request(method, url);
        if let Some(ref key) = self.api_key {
            req = req
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key));
        }
        req
    }

    fn send(&self, req: RequestBuilder) -> Result<reqwest::blocking::Response, StoreError> {
        let response = req.send()?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Response { status, body });
        }
        Ok(response)
    }
}

/// A filter value rendered for use inside a query pair. Values containing
/// reserved characters are double-quoted so `in.(...)` lists stay parseable.
fn literal(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    };
    if raw
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        raw
    } else {
        format!("\"{}\"", raw.replace('"', "\\\""))
    }
}

/// Flatten a filter into PostgREST query pairs; sibling pairs combine as AND.
fn query_pairs(filter: &Filter, pairs: &mut Vec<(String, String)>) {
    match filter {
        Filter::All => {}
        Filter::Eq(column, value) => {
            pairs.push((column.to_string(), format!("eq.{}", literal(value))));
        }
        Filter::In(column, values) => {
            let list: Vec<String> = values.iter().map(literal).collect();
            pairs.push((column.to_string(), format!("in.({})", list.join(","))));
        }
        Filter::And(filters) => {
            for f in filters {
                query_pairs(f, pairs);
            }
        }
    }
}

/// `In` over an empty set can match no row; callers short-circuit on it so
/// no request is issued at all.
fn matches_nothing(filter: &Filter) -> bool {
    match filter {
        Filter::In(_, values) => values.is_empty(),
        Filter::And(filters) => filters.iter().any(matches_nothing),
        _ => false,
    }
}

impl RowStore for RestStore {
    fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<Order>,
    ) -> Result<Vec<Row>, StoreError> {
        if matches_nothing(filter) {
            return Ok(Vec::new());
        }
        let mut pairs = Vec::new();
        query_pairs(filter, &mut pairs);
        if let Some(order) = order {
            pairs.push((
                "order".to_string(),
                format!(
                    "{}.{}",
                    order.column,
                    if order.ascending { "asc" } else { "desc" }
                ),
            ));
        }

        let response = self.send(self.request(Method::GET, table).query(&pairs))?;
        Ok(response.json()?)
    }

    fn insert(&self, table: Table, rows: &[Row]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.send(
            self.request(Method::POST, table)
                .header("Prefer", "return=minimal")
                .json(rows),
        )?;
        Ok(())
    }

    fn update(&self, table: Table, filter: &Filter, patch: &Row) -> Result<usize, StoreError> {
        if matches_nothing(filter) || patch.is_empty() {
            return Ok(0);
        }
        let mut pairs = Vec::new();
        query_pairs(filter, &mut pairs);

        let response = self.send(
            self.request(Method::PATCH, table)
                .header("Prefer", "return=representation")
                .query(&pairs)
                .json(patch),
        )?;
        let rows: Vec<Row> = response.json()?;
        Ok(rows.len())
    }

    fn upsert(
        &self,
        table: Table,
        rows: &[Row],
        conflict_columns: &[&str],
    ) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let pairs = [("on_conflict".to_string(), conflict_columns.join(","))];
        self.send(
            self.request(Method::POST, table)
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .query(&pairs)
                .json(rows),
        )?;
        Ok(())
    }

    fn delete(&self, table: Table, filter: &Filter) -> Result<usize, StoreError> {
        if matches_nothing(filter) {
            return Ok(0);
        }
        let mut pairs = Vec::new();
        query_pairs(filter, &mut pairs);

        let response = self.send(
            self.request(Method::DELETE, table)
                .header("Prefer", "return=representation")
                .query(&pairs),
        )?;
        let rows: Vec<Row> = response.json()?;
        Ok(rows.len())
    }
}
