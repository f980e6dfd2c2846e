//! Client for the external analytics engine (Metabase REST API).
//!
//! The engine only needs query execution: native SQL or MBQL through
//! `/api/dataset`, and saved questions through `/api/card/{id}/query`.
//! Responses are normalized into the `QueryResult` shape; any transport or
//! API failure surfaces as an error string the caller treats as a
//! per-placeholder failure.

use common::model::query::{QueryResult, ResultColumn};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::Settings;

#[derive(Clone)]
pub struct MetabaseClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl MetabaseClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.metabase_timeout_secs))
            .build()?;
        Ok(MetabaseClient {
            base_url: settings.metabase_url.trim_end_matches('/').to_string(),
            api_key: settings.metabase_api_key.clone(),
            http,
        })
    }

    pub async fn execute_native(
        &self,
        database_id: i64,
        sql: &str,
    ) -> Result<QueryResult, String> {
        let body = json!({
            "database": database_id,
            "type": "native",
            "native": { "query": sql },
        });
        let response = self.post("/api/dataset", &body).await?;
        parse_dataset(&response)
    }

    pub async fn execute_mbql(
        &self,
        database_id: i64,
        mbql: &Value,
    ) -> Result<QueryResult, String> {
        let body = json!({
            "database": database_id,
            "type": "query",
            "query": mbql,
        });
        let response = self.post("/api/dataset", &body).await?;
        parse_dataset(&response)
    }

    pub async fn execute_card(&self, card_id: i64) -> Result<QueryResult, String> {
        let response = self
            .post(&format!("/api/card/{}/query", card_id), &json!({}))
            .await?;
        parse_dataset(&response)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, String> {
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body);
        if !self.api_key.is_empty() {
            request = request.header("X-API-KEY", &self.api_key);
        }
        let response = request.send().await.map_err(|e| e.to_string())?;
        let response = response.error_for_status().map_err(|e| e.to_string())?;
        response.json::<Value>().await.map_err(|e| e.to_string())
    }
}

/// Normalizes a dataset response (`data.cols` + `data.rows`) into the
/// engine's result shape.
fn parse_dataset(response: &Value) -> Result<QueryResult, String> {
    let data = response
        .get("data")
        .ok_or("malformed query response: missing data")?;

    let columns = data
        .get("cols")
        .and_then(Value::as_array)
        .map(|cols| {
            cols.iter()
                .map(|col| {
                    let name = col
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let display_name = col
                        .get("display_name")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| name.clone());
                    ResultColumn {
                        name,
                        display_name,
                        base_type: col
                            .get("base_type")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| row.as_array().cloned().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();

    Ok(QueryResult { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dataset_reads_columns_and_rows() {
        let response = json!({
            "data": {
                "cols": [
                    { "name": "region", "display_name": "Region", "base_type": "type/Text" },
                    { "name": "total" },
                ],
                "rows": [["north", 10], ["south", 4]],
            }
        });
        let result = parse_dataset(&response).unwrap();
        assert_eq!(result.columns.len(), 2);
        assert_eq!(result.columns[0].display_name, "Region");
        assert_eq!(result.columns[1].display_name, "total");
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0][0], json!("north"));
    }

    #[test]
    fn parse_dataset_rejects_missing_data() {
        assert!(parse_dataset(&json!({"error": "nope"})).is_err());
    }
}
