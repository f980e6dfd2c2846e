use crate::model::mapping::Mappings;
use crate::model::placeholder::Placeholder;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateReportRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_archived: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMappingsRequest {
    pub mappings: Mappings,
}

#[derive(Debug, Default, Deserialize)]
pub struct DuplicateReportRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplateUploadResponse {
    pub message: String,
    pub filename: String,
    pub placeholders: Vec<Placeholder>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub share_url: String,
    pub share_token: String,
    pub is_public: bool,
}

/// One placeholder that could not be filled during generation. The output
/// document still contains an `#ERROR` marker in the affected cell; this
/// record carries the reason back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub placeholder_id: String,
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateVisualizationRequest {
    pub name: String,
    pub description: Option<String>,
    pub metabase_question_id: Option<i64>,
    pub database_id: Option<i64>,
    pub query_type: crate::model::visualization::QueryType,
    pub native_query: Option<String>,
    pub mbql_query: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateVisualizationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub metabase_question_id: Option<i64>,
    pub database_id: Option<i64>,
    pub native_query: Option<String>,
    pub mbql_query: Option<serde_json::Value>,
    pub is_archived: Option<bool>,
}
