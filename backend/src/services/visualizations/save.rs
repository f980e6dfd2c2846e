use crate::db;
use crate::services::visualizations::get;
use actix_web::{web, HttpResponse, Responder};
use common::model::visualization::QueryType;
use common::requests::{CreateVisualizationRequest, UpdateVisualizationRequest};
use rusqlite::params;

pub async fn create(payload: web::Json<CreateVisualizationRequest>) -> impl Responder {
    if payload.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Visualization name must not be empty");
    }
    match insert_visualization(&payload) {
        Ok(viz) => HttpResponse::Created().json(viz),
        Err(e) => HttpResponse::ServiceUnavailable()
            .body(format!("Error creating visualization: {}", e)),
    }
}

pub async fn update(
    visualization_id: web::Path<i64>,
    payload: web::Json<UpdateVisualizationRequest>,
) -> impl Responder {
    match update_visualization(visualization_id.into_inner(), &payload) {
        Ok(Some(viz)) => HttpResponse::Ok().json(viz),
        Ok(None) => HttpResponse::NotFound().body("Visualization not found"),
        Err(e) => HttpResponse::ServiceUnavailable()
            .body(format!("Error updating visualization: {}", e)),
    }
}

pub async fn delete(visualization_id: web::Path<i64>) -> impl Responder {
    match delete_visualization(visualization_id.into_inner()) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => HttpResponse::NotFound().body("Visualization not found"),
        Err(e) => HttpResponse::ServiceUnavailable()
            .body(format!("Error deleting visualization: {}", e)),
    }
}

fn query_type_text(query_type: QueryType) -> &'static str {
    match query_type {
        QueryType::Native => "native",
        QueryType::Mbql => "mbql",
    }
}

fn insert_visualization(
    payload: &CreateVisualizationRequest,
) -> Result<common::model::visualization::Visualization, String> {
    let conn = db::open()?;
    let mbql_json = payload
        .mbql_query
        .as_ref()
        .map(|value| value.to_string());
    conn.execute(
        "INSERT INTO visualizations \
         (name, description, metabase_question_id, database_id, query_type, native_query, mbql_query) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            payload.name,
            payload.description,
            payload.metabase_question_id,
            payload.database_id,
            query_type_text(payload.query_type),
            payload.native_query,
            mbql_json,
        ],
    )
    .map_err(|e| e.to_string())?;
    let id = conn.last_insert_rowid();
    get::load_visualization(id)?.ok_or_else(|| "Visualization not found after insert".to_string())
}

fn update_visualization(
    visualization_id: i64,
    payload: &UpdateVisualizationRequest,
) -> Result<Option<common::model::visualization::Visualization>, String> {
    let Some(current) = get::load_visualization(visualization_id)? else {
        return Ok(None);
    };

    let name = payload.name.clone().unwrap_or(current.name);
    let description = payload.description.clone().or(current.description);
    let metabase_question_id = payload
        .metabase_question_id
        .or(current.metabase_question_id);
    let database_id = payload.database_id.or(current.database_id);
    let native_query = payload.native_query.clone().or(current.native_query);
    let mbql_query = payload
        .mbql_query
        .clone()
        .or(current.mbql_query)
        .map(|value| value.to_string());
    let is_archived = payload.is_archived.unwrap_or(current.is_archived);

    let conn = db::open()?;
    conn.execute(
        "UPDATE visualizations \
         SET name = ?1, description = ?2, metabase_question_id = ?3, database_id = ?4, \
             native_query = ?5, mbql_query = ?6, is_archived = ?7 \
         WHERE id = ?8",
        params![
            name,
            description,
            metabase_question_id,
            database_id,
            native_query,
            mbql_query,
            is_archived as i64,
            visualization_id,
        ],
    )
    .map_err(|e| e.to_string())?;
    get::load_visualization(visualization_id)
}

fn delete_visualization(visualization_id: i64) -> Result<bool, String> {
    let conn = db::open()?;
    let changed = conn
        .execute(
            "DELETE FROM visualizations WHERE id = ?1",
            params![visualization_id],
        )
        .map_err(|e| e.to_string())?;
    Ok(changed > 0)
}
