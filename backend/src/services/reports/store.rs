//! Row mapping and persistence helpers shared by the report endpoints.

use crate::db;
use common::model::mapping::Mappings;
use common::model::report::ExcelTemplateReport;
use common::model::structure::TemplateStructure;
use rusqlite::{params, OptionalExtension, Row};

const REPORT_COLUMNS: &str = "id, name, description, template_file_path, template_filename, \
     structure, mappings, is_public, share_token, is_archived, created_at, updated_at";

fn map_report(row: &Row) -> rusqlite::Result<ExcelTemplateReport> {
    let structure_json: Option<String> = row.get(5)?;
    let mappings_json: String = row.get(6)?;
    Ok(ExcelTemplateReport {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        template_file_path: row.get(3)?,
        template_filename: row.get(4)?,
        structure: structure_json.and_then(|json| serde_json::from_str(&json).ok()),
        mappings: serde_json::from_str(&mappings_json).unwrap_or_default(),
        is_public: row.get::<_, i64>(7)? != 0,
        share_token: row.get(8)?,
        is_archived: row.get::<_, i64>(9)? != 0,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

pub fn load_reports(include_archived: bool) -> Result<Vec<ExcelTemplateReport>, String> {
    let conn = db::open()?;
    let query = if include_archived {
        format!(
            "SELECT {} FROM excel_template_reports ORDER BY updated_at DESC, created_at DESC",
            REPORT_COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM excel_template_reports WHERE is_archived = 0 \
             ORDER BY updated_at DESC, created_at DESC",
            REPORT_COLUMNS
        )
    };
    let mut stmt = conn.prepare(&query).map_err(|e| e.to_string())?;
    let rows = stmt
        .query_map([], map_report)
        .map_err(|e| e.to_string())?;
    Ok(rows.filter_map(Result::ok).collect())
}

pub fn load_report(report_id: i64) -> Result<Option<ExcelTemplateReport>, String> {
    let conn = db::open()?;
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM excel_template_reports WHERE id = ?1",
            REPORT_COLUMNS
        ))
        .map_err(|e| e.to_string())?;
    stmt.query_row(params![report_id], map_report)
        .optional()
        .map_err(|e| e.to_string())
}

pub fn load_report_by_token(share_token: &str) -> Result<Option<ExcelTemplateReport>, String> {
    let conn = db::open()?;
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM excel_template_reports WHERE share_token = ?1 AND is_public = 1",
            REPORT_COLUMNS
        ))
        .map_err(|e| e.to_string())?;
    stmt.query_row(params![share_token], map_report)
        .optional()
        .map_err(|e| e.to_string())
}

pub fn insert_report(name: &str, description: Option<&str>) -> Result<i64, String> {
    let conn = db::open()?;
    conn.execute(
        "INSERT INTO excel_template_reports (name, description) VALUES (?1, ?2)",
        params![name, description],
    )
    .map_err(|e| e.to_string())?;
    Ok(conn.last_insert_rowid())
}

/// Inserts a full copy of a report row (used by duplication). The share
/// token is never copied.
pub fn insert_report_copy(
    report: &ExcelTemplateReport,
    name: &str,
    template_file_path: Option<&str>,
) -> Result<i64, String> {
    let conn = db::open()?;
    let structure_json = report
        .structure
        .as_ref()
        .map(|s| serde_json::to_string(s).unwrap_or_default());
    let mappings_json =
        serde_json::to_string(&report.mappings).unwrap_or_else(|_| "{}".to_string());
    conn.execute(
        "INSERT INTO excel_template_reports \
         (name, description, template_file_path, template_filename, structure, mappings) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            name,
            report.description,
            template_file_path,
            report.template_filename,
            structure_json,
            mappings_json,
        ],
    )
    .map_err(|e| e.to_string())?;
    Ok(conn.last_insert_rowid())
}

pub fn update_report(
    report_id: i64,
    name: &str,
    description: Option<&str>,
    is_archived: bool,
) -> Result<bool, String> {
    let conn = db::open()?;
    let changed = conn
        .execute(
            "UPDATE excel_template_reports \
             SET name = ?1, description = ?2, is_archived = ?3, updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?4",
            params![name, description, is_archived as i64, report_id],
        )
        .map_err(|e| e.to_string())?;
    Ok(changed > 0)
}

pub fn delete_report(report_id: i64) -> Result<bool, String> {
    let conn = db::open()?;
    let changed = conn
        .execute(
            "DELETE FROM excel_template_reports WHERE id = ?1",
            params![report_id],
        )
        .map_err(|e| e.to_string())?;
    Ok(changed > 0)
}

/// Records a freshly uploaded template and resets the mapping set, which
/// belongs to the previous template's placeholders.
pub fn save_template(
    report_id: i64,
    file_path: &str,
    filename: &str,
    structure: &TemplateStructure,
) -> Result<bool, String> {
    let conn = db::open()?;
    let structure_json = serde_json::to_string(structure).map_err(|e| e.to_string())?;
    let changed = conn
        .execute(
            "UPDATE excel_template_reports \
             SET template_file_path = ?1, template_filename = ?2, structure = ?3, \
                 mappings = '{}', updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?4",
            params![file_path, filename, structure_json, report_id],
        )
        .map_err(|e| e.to_string())?;
    Ok(changed > 0)
}

pub fn save_mappings(report_id: i64, mappings: &Mappings) -> Result<bool, String> {
    let conn = db::open()?;
    let mappings_json = serde_json::to_string(mappings).map_err(|e| e.to_string())?;
    let changed = conn
        .execute(
            "UPDATE excel_template_reports \
             SET mappings = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![mappings_json, report_id],
        )
        .map_err(|e| e.to_string())?;
    Ok(changed > 0)
}

pub fn set_share(report_id: i64, share_token: Option<&str>) -> Result<bool, String> {
    let conn = db::open()?;
    let changed = conn
        .execute(
            "UPDATE excel_template_reports \
             SET share_token = ?1, is_public = ?2, updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?3",
            params![share_token, share_token.is_some() as i64, report_id],
        )
        .map_err(|e| e.to_string())?;
    Ok(changed > 0)
}
