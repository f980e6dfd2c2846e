//! The generation endpoint.
//!
//! Operates on a snapshot of the report taken at invocation time: the
//! stored template file, a fresh placeholder scan, and the mapping set as
//! currently saved. Query executions for all mapped placeholders run
//! concurrently; the workbook write pass then runs on the blocking pool.
//!
//! Generation is never gated on mapping completeness. Unmapped
//! placeholders stay as literal tokens and failed ones are marked
//! `#ERROR` in the output; the structured failure list travels in the
//! `X-Generation-Failures` response header so callers can show which
//! mappings need fixing.

use crate::engine::fetch::MetabaseFetcher;
use crate::engine::generate::{download_filename, generate_workbook, resolve_mapping_data};
use crate::engine::scan::scan_placeholders;
use crate::metabase::MetabaseClient;
use crate::services::reports::store;
use actix_web::{web, HttpResponse, Responder};
use common::requests::GenerationFailure;
use log::warn;
use std::path::PathBuf;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub async fn process(
    report_id: web::Path<i64>,
    client: web::Data<MetabaseClient>,
) -> impl Responder {
    match generate_report(report_id.into_inner(), client.get_ref().clone()).await {
        Ok((bytes, filename, failures)) => {
            if !failures.is_empty() {
                warn!(
                    "report generated with {} failed placeholder(s): {}",
                    failures.len(),
                    failures
                        .iter()
                        .map(|f| f.placeholder_id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            let failures_json =
                serde_json::to_string(&failures).unwrap_or_else(|_| "[]".to_string());
            HttpResponse::Ok()
                .content_type(XLSX_CONTENT_TYPE)
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", filename),
                ))
                .insert_header(("X-Generation-Failures", failures_json))
                .body(bytes)
        }
        Err(e) => HttpResponse::BadRequest().body(e),
    }
}

async fn generate_report(
    report_id: i64,
    client: MetabaseClient,
) -> Result<(Vec<u8>, String, Vec<GenerationFailure>), String> {
    // Snapshot: everything below works off this one read, so concurrent
    // mapping edits cannot affect an in-flight generation.
    let report = store::load_report(report_id)?.ok_or("Excel report not found")?;
    let template_path = report
        .template_file_path
        .clone()
        .ok_or("No template uploaded for this report")?;
    let structure = report
        .structure
        .clone()
        .ok_or("No template uploaded for this report")?;

    let placeholders = scan_placeholders(&structure).map_err(|e| e.to_string())?;
    let mappings = report.mappings;

    let fetcher = MetabaseFetcher::new(client);
    let data = resolve_mapping_data(&placeholders, &mappings, &fetcher).await;

    let filename = download_filename(&report.name);
    let path = PathBuf::from(template_path);
    let (bytes, failures) = tokio::task::spawn_blocking(move || {
        generate_workbook(&path, &placeholders, &mappings, &data)
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
    .map_err(|e| e.to_string())?;

    Ok((bytes, filename, failures))
}
