use crate::services::reports::{get, store};
use actix_web::{web, HttpResponse, Responder};
use common::requests::{CreateReportRequest, DuplicateReportRequest, UpdateReportRequest};
use std::fs;
use std::path::Path;
use uuid::Uuid;

pub async fn create(payload: web::Json<CreateReportRequest>) -> impl Responder {
    if payload.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Report name must not be empty");
    }
    match create_report(&payload) {
        Ok(detail) => HttpResponse::Created().json(detail),
        Err(e) => {
            HttpResponse::ServiceUnavailable().body(format!("Error creating report: {}", e))
        }
    }
}

pub async fn update(
    report_id: web::Path<i64>,
    payload: web::Json<UpdateReportRequest>,
) -> impl Responder {
    match update_report(report_id.into_inner(), &payload) {
        Ok(Some(detail)) => HttpResponse::Ok().json(detail),
        Ok(None) => HttpResponse::NotFound().body("Excel report not found"),
        Err(e) => {
            HttpResponse::ServiceUnavailable().body(format!("Error updating report: {}", e))
        }
    }
}

pub async fn delete(report_id: web::Path<i64>) -> impl Responder {
    match delete_report(report_id.into_inner()) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => HttpResponse::NotFound().body("Excel report not found"),
        Err(e) => {
            HttpResponse::ServiceUnavailable().body(format!("Error deleting report: {}", e))
        }
    }
}

pub async fn duplicate(
    report_id: web::Path<i64>,
    payload: Option<web::Json<DuplicateReportRequest>>,
) -> impl Responder {
    let new_name = payload.and_then(|p| p.into_inner().name);
    match duplicate_report(report_id.into_inner(), new_name) {
        Ok(Some(detail)) => HttpResponse::Created().json(detail),
        Ok(None) => HttpResponse::NotFound().body("Excel report not found"),
        Err(e) => {
            HttpResponse::ServiceUnavailable().body(format!("Error duplicating report: {}", e))
        }
    }
}

fn create_report(
    payload: &CreateReportRequest,
) -> Result<common::model::report::ReportDetail, String> {
    let report_id = store::insert_report(&payload.name, payload.description.as_deref())?;
    get::load_detail(report_id)?.ok_or_else(|| "Report not found after insert".to_string())
}

fn update_report(
    report_id: i64,
    payload: &UpdateReportRequest,
) -> Result<Option<common::model::report::ReportDetail>, String> {
    let Some(report) = store::load_report(report_id)? else {
        return Ok(None);
    };
    // Absent fields keep their current values.
    let name = payload.name.clone().unwrap_or(report.name);
    let description = payload.description.clone().or(report.description);
    let is_archived = payload.is_archived.unwrap_or(report.is_archived);
    store::update_report(report_id, &name, description.as_deref(), is_archived)?;
    get::load_detail(report_id)
}

fn delete_report(report_id: i64) -> Result<bool, String> {
    let Some(report) = store::load_report(report_id)? else {
        return Ok(false);
    };
    if let Some(file_path) = &report.template_file_path {
        if Path::new(file_path).exists() {
            let _ = fs::remove_file(file_path);
        }
    }
    store::delete_report(report_id)
}

fn duplicate_report(
    report_id: i64,
    new_name: Option<String>,
) -> Result<Option<common::model::report::ReportDetail>, String> {
    let Some(original) = store::load_report(report_id)? else {
        return Ok(None);
    };

    // Copy the stored template file so the two reports own separate files.
    let copied_path = match (&original.template_file_path, &original.template_filename) {
        (Some(file_path), Some(filename)) if Path::new(file_path).exists() => {
            let dir = crate::config::upload_dir();
            fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
            let copy_name = format!("copy_{}_{}", Uuid::new_v4().simple(), filename);
            let target = dir.join(&copy_name);
            fs::copy(file_path, &target).map_err(|e| e.to_string())?;
            Some(target.to_string_lossy().into_owned())
        }
        _ => None,
    };

    let name = new_name.unwrap_or_else(|| format!("{} (Copy)", original.name));
    let new_id = store::insert_report_copy(&original, &name, copied_path.as_deref())?;
    get::load_detail(new_id)
}
