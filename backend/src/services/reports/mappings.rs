use crate::services::reports::{get, store};
use actix_web::{web, HttpResponse, Responder};
use common::requests::UpdateMappingsRequest;

/// Replaces the report's mapping set. Mappings are only ever changed by
/// explicit calls here; a template rescan never touches them, and ids that
/// no longer match a live placeholder are left inert.
pub async fn process(
    report_id: web::Path<i64>,
    payload: web::Json<UpdateMappingsRequest>,
) -> impl Responder {
    let report_id = report_id.into_inner();
    match store::save_mappings(report_id, &payload.mappings) {
        Ok(true) => match get::load_detail(report_id) {
            Ok(Some(detail)) => HttpResponse::Ok().json(detail),
            Ok(None) => HttpResponse::NotFound().body("Excel report not found"),
            Err(e) => HttpResponse::ServiceUnavailable()
                .body(format!("Error retrieving report: {}", e)),
        },
        Ok(false) => HttpResponse::NotFound().body("Excel report not found"),
        Err(e) => {
            HttpResponse::ServiceUnavailable().body(format!("Error saving mappings: {}", e))
        }
    }
}
