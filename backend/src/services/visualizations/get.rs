use crate::db;
use actix_web::{web, HttpResponse, Responder};
use common::model::visualization::{QueryType, Visualization};
use rusqlite::{params, OptionalExtension, Row};
use serde::Deserialize;

const COLUMNS: &str = "id, name, description, metabase_question_id, database_id, query_type, \
     native_query, mbql_query, is_archived, created_at";

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_archived: bool,
}

pub async fn list(query: web::Query<ListQuery>) -> impl Responder {
    match load_visualizations(query.include_archived) {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => HttpResponse::ServiceUnavailable()
            .body(format!("Error retrieving visualizations: {}", e)),
    }
}

pub async fn detail(visualization_id: web::Path<i64>) -> impl Responder {
    match load_visualization(visualization_id.into_inner()) {
        Ok(Some(viz)) => HttpResponse::Ok().json(viz),
        Ok(None) => HttpResponse::NotFound().body("Visualization not found"),
        Err(e) => HttpResponse::ServiceUnavailable()
            .body(format!("Error retrieving visualization: {}", e)),
    }
}

fn map_visualization(row: &Row) -> rusqlite::Result<Visualization> {
    let query_type: String = row.get(5)?;
    let mbql_json: Option<String> = row.get(7)?;
    Ok(Visualization {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        metabase_question_id: row.get(3)?,
        database_id: row.get(4)?,
        query_type: if query_type == "mbql" {
            QueryType::Mbql
        } else {
            QueryType::Native
        },
        native_query: row.get(6)?,
        mbql_query: mbql_json.and_then(|json| serde_json::from_str(&json).ok()),
        is_archived: row.get::<_, i64>(8)? != 0,
        created_at: row.get(9)?,
    })
}

pub fn load_visualizations(include_archived: bool) -> Result<Vec<Visualization>, String> {
    let conn = db::open()?;
    let query = if include_archived {
        format!("SELECT {} FROM visualizations ORDER BY created_at DESC", COLUMNS)
    } else {
        format!(
            "SELECT {} FROM visualizations WHERE is_archived = 0 ORDER BY created_at DESC",
            COLUMNS
        )
    };
    let mut stmt = conn.prepare(&query).map_err(|e| e.to_string())?;
    let rows = stmt
        .query_map([], map_visualization)
        .map_err(|e| e.to_string())?;
    Ok(rows.filter_map(Result::ok).collect())
}

pub fn load_visualization(visualization_id: i64) -> Result<Option<Visualization>, String> {
    let conn = db::open()?;
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM visualizations WHERE id = ?1",
            COLUMNS
        ))
        .map_err(|e| e.to_string())?;
    stmt.query_row(params![visualization_id], map_visualization)
        .optional()
        .map_err(|e| e.to_string())
}
