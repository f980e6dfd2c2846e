use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Native,
    Mbql,
}

/// A saved visualization: a query definition resolved and executed through
/// the external analytics engine when a mapping references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visualization {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Question id in the analytics engine, when the visualization mirrors
    /// a saved question there.
    pub metabase_question_id: Option<i64>,
    pub database_id: Option<i64>,
    pub query_type: QueryType,
    pub native_query: Option<String>,
    pub mbql_query: Option<serde_json::Value>,
    pub is_archived: bool,
    pub created_at: Option<String>,
}
