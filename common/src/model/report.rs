use crate::model::mapping::Mappings;
use crate::model::placeholder::Placeholder;
use crate::model::structure::TemplateStructure;
use serde::{Deserialize, Serialize};

/// A stored Excel template report: the uploaded template's structure, the
/// mapping set, and sharing metadata.
///
/// Placeholders are not part of the stored record; they are re-derived by
/// scanning `structure` whenever the record is served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcelTemplateReport {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub template_file_path: Option<String>,
    pub template_filename: Option<String>,
    pub structure: Option<TemplateStructure>,
    pub mappings: Mappings,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub is_archived: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Lightweight list row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportListEntry {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub template_filename: Option<String>,
    pub placeholder_count: usize,
    pub mapped_count: usize,
    pub is_public: bool,
    pub is_archived: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Full report payload served to clients, with the freshly scanned
/// placeholder list alongside the stored fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDetail {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub template_filename: Option<String>,
    pub structure: Option<TemplateStructure>,
    pub placeholders: Vec<Placeholder>,
    pub mappings: Mappings,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub is_archived: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
