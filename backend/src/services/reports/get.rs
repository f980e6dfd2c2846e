//! Report retrieval: list, detail, and shared (token) access.
//!
//! Placeholders are derived on every fetch by scanning the stored template
//! structure, never read from a persisted list, so the scan is always in
//! agreement with the current template.

use crate::engine::scan::scan_placeholders;
use crate::services::reports::store;
use actix_web::{web, HttpResponse, Responder};
use common::model::placeholder::Placeholder;
use common::model::report::{ExcelTemplateReport, ReportDetail, ReportListEntry};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_archived: bool,
}

pub async fn list(query: web::Query<ListQuery>) -> impl Responder {
    match list_reports(query.include_archived) {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => HttpResponse::ServiceUnavailable()
            .body(format!("Error retrieving reports: {}", e)),
    }
}

pub async fn detail(report_id: web::Path<i64>) -> impl Responder {
    match load_detail(report_id.into_inner()) {
        Ok(Some(detail)) => HttpResponse::Ok().json(detail),
        Ok(None) => HttpResponse::NotFound().body("Excel report not found"),
        Err(e) => HttpResponse::ServiceUnavailable()
            .body(format!("Error retrieving report: {}", e)),
    }
}

pub async fn shared(share_token: web::Path<String>) -> impl Responder {
    match store::load_report_by_token(&share_token) {
        Ok(Some(report)) => HttpResponse::Ok().json(detail_from(report)),
        Ok(None) => HttpResponse::NotFound().body("Excel report not found or not shared"),
        Err(e) => HttpResponse::ServiceUnavailable()
            .body(format!("Error retrieving report: {}", e)),
    }
}

fn list_reports(include_archived: bool) -> Result<Vec<ReportListEntry>, String> {
    let reports = store::load_reports(include_archived)?;
    Ok(reports
        .into_iter()
        .map(|report| {
            let placeholders = derive_placeholders(&report);
            ReportListEntry {
                id: report.id,
                name: report.name,
                description: report.description,
                template_filename: report.template_filename,
                placeholder_count: placeholders.len(),
                mapped_count: report.mappings.len(),
                is_public: report.is_public,
                is_archived: report.is_archived,
                created_at: report.created_at,
                updated_at: report.updated_at,
            }
        })
        .collect())
}

pub fn load_detail(report_id: i64) -> Result<Option<ReportDetail>, String> {
    Ok(store::load_report(report_id)?.map(detail_from))
}

fn detail_from(report: ExcelTemplateReport) -> ReportDetail {
    let placeholders = derive_placeholders(&report);
    ReportDetail {
        id: report.id,
        name: report.name,
        description: report.description,
        template_filename: report.template_filename,
        structure: report.structure,
        placeholders,
        mappings: report.mappings,
        is_public: report.is_public,
        share_token: report.share_token,
        is_archived: report.is_archived,
        created_at: report.created_at,
        updated_at: report.updated_at,
    }
}

fn derive_placeholders(report: &ExcelTemplateReport) -> Vec<Placeholder> {
    report
        .structure
        .as_ref()
        .and_then(|structure| scan_placeholders(structure).ok())
        .unwrap_or_default()
}
