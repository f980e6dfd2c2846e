//! Resolution of a mapping into executed query data.
//!
//! The engine only sees the `DataFetcher` trait; the production
//! implementation resolves visualization records from the local store and
//! executes their queries through the analytics engine client. Failures are
//! per-mapping and become per-placeholder errors during generation.

use crate::db;
use crate::metabase::MetabaseClient;
use common::model::mapping::{DataSourceMapping, DataSourceType};
use common::model::query::QueryResult;
use common::model::visualization::QueryType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("visualization {0} not found")]
    MissingVisualization(i64),
    #[error("mapping has no source_id")]
    MissingSourceId,
    #[error("inline mapping has no query or database_id")]
    MissingQuery,
    #[error("visualization {0} has no executable query")]
    UnusableVisualization(i64),
    #[error("query execution failed: {0}")]
    Query(String),
    #[error("database error: {0}")]
    Database(String),
}

pub trait DataFetcher {
    async fn fetch(&self, mapping: &DataSourceMapping) -> Result<QueryResult, FetchError>;
}

/// Fetcher backed by the visualization store and the analytics engine.
pub struct MetabaseFetcher {
    client: MetabaseClient,
}

impl MetabaseFetcher {
    pub fn new(client: MetabaseClient) -> Self {
        MetabaseFetcher { client }
    }

    async fn fetch_visualization(&self, source_id: i64) -> Result<QueryResult, FetchError> {
        let viz = load_visualization_query(source_id)?;

        // A visualization mirroring a saved question executes through it;
        // otherwise its own query definition is submitted directly.
        if let Some(question_id) = viz.metabase_question_id {
            return self
                .client
                .execute_card(question_id)
                .await
                .map_err(FetchError::Query);
        }
        match viz.query_type {
            QueryType::Native => {
                let database_id = viz
                    .database_id
                    .ok_or(FetchError::UnusableVisualization(source_id))?;
                let sql = viz
                    .native_query
                    .ok_or(FetchError::UnusableVisualization(source_id))?;
                self.client
                    .execute_native(database_id, &sql)
                    .await
                    .map_err(FetchError::Query)
            }
            QueryType::Mbql => {
                let database_id = viz
                    .database_id
                    .ok_or(FetchError::UnusableVisualization(source_id))?;
                let mbql = viz
                    .mbql_query
                    .ok_or(FetchError::UnusableVisualization(source_id))?;
                self.client
                    .execute_mbql(database_id, &mbql)
                    .await
                    .map_err(FetchError::Query)
            }
        }
    }
}

impl DataFetcher for MetabaseFetcher {
    async fn fetch(&self, mapping: &DataSourceMapping) -> Result<QueryResult, FetchError> {
        match mapping.source_type {
            DataSourceType::Visualization => {
                let source_id = mapping.source_id.ok_or(FetchError::MissingSourceId)?;
                self.fetch_visualization(source_id).await
            }
            DataSourceType::SavedQuery => {
                let source_id = mapping.source_id.ok_or(FetchError::MissingSourceId)?;
                self.client
                    .execute_card(source_id)
                    .await
                    .map_err(FetchError::Query)
            }
            DataSourceType::InlineQuery => {
                let database_id = mapping.database_id.ok_or(FetchError::MissingQuery)?;
                let sql = mapping.query.as_deref().ok_or(FetchError::MissingQuery)?;
                self.client
                    .execute_native(database_id, sql)
                    .await
                    .map_err(FetchError::Query)
            }
        }
    }
}

struct VisualizationQuery {
    metabase_question_id: Option<i64>,
    database_id: Option<i64>,
    query_type: QueryType,
    native_query: Option<String>,
    mbql_query: Option<serde_json::Value>,
}

fn load_visualization_query(source_id: i64) -> Result<VisualizationQuery, FetchError> {
    let conn = db::open().map_err(FetchError::Database)?;
    let mut stmt = conn
        .prepare(
            "SELECT metabase_question_id, database_id, query_type, native_query, mbql_query
             FROM visualizations WHERE id = ?1 AND is_archived = 0",
        )
        .map_err(|e| FetchError::Database(e.to_string()))?;

    let row = stmt.query_row([source_id], |row| {
        Ok((
            row.get::<_, Option<i64>>(0)?,
            row.get::<_, Option<i64>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    });

    let (metabase_question_id, database_id, query_type, native_query, mbql_json) = match row {
        Ok(fields) => fields,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(FetchError::MissingVisualization(source_id));
        }
        Err(e) => return Err(FetchError::Database(e.to_string())),
    };

    let query_type = if query_type == "mbql" {
        QueryType::Mbql
    } else {
        QueryType::Native
    };
    let mbql_query = mbql_json.and_then(|json| serde_json::from_str(&json).ok());

    Ok(VisualizationQuery {
        metabase_question_id,
        database_id,
        query_type,
        native_query,
        mbql_query,
    })
}
