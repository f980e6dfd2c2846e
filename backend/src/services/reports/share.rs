use crate::services::reports::store;
use actix_web::{web, HttpResponse, Responder};
use common::requests::ShareResponse;
use uuid::Uuid;

pub async fn create(report_id: web::Path<i64>) -> impl Responder {
    let share_token = Uuid::new_v4().simple().to_string();
    match store::set_share(report_id.into_inner(), Some(&share_token)) {
        Ok(true) => HttpResponse::Ok().json(ShareResponse {
            share_url: format!("/excel-reports/shared/{}", share_token),
            share_token,
            is_public: true,
        }),
        Ok(false) => HttpResponse::NotFound().body("Excel report not found"),
        Err(e) => {
            HttpResponse::ServiceUnavailable().body(format!("Error sharing report: {}", e))
        }
    }
}

pub async fn revoke(report_id: web::Path<i64>) -> impl Responder {
    match store::set_share(report_id.into_inner(), None) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => HttpResponse::NotFound().body("Excel report not found"),
        Err(e) => {
            HttpResponse::ServiceUnavailable().body(format!("Error revoking share: {}", e))
        }
    }
}
