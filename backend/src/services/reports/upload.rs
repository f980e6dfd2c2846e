//! Template upload: streams the multipart file to the upload directory,
//! parses it into the structural model, scans for placeholders, and stores
//! the result on the report. A new template always resets the mapping set —
//! mappings belong to the previous template's placeholder ids.

use crate::config;
use crate::engine;
use crate::services::reports::store;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::requests::TemplateUploadResponse;
use futures_util::StreamExt;
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub async fn process(report_id: web::Path<i64>, payload: Multipart) -> impl Responder {
    match upload_template(report_id.into_inner(), payload).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => HttpResponse::BadRequest().body(format!("Error: {}", e)),
    }
}

async fn upload_template(
    report_id: i64,
    mut payload: Multipart,
) -> Result<TemplateUploadResponse, Box<dyn Error>> {
    let report = store::load_report(report_id)?.ok_or("Report not found")?;

    let mut saved: Option<(PathBuf, String)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if field_name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !(filename.ends_with(".xlsx") || filename.ends_with(".xls")) {
            return Err("Only Excel files (.xlsx, .xls) are allowed".into());
        }

        let dir = config::upload_dir();
        fs::create_dir_all(&dir)?;
        let stored_name = format!("{}_{}_{}", report_id, Uuid::new_v4().simple(), filename);
        let path = dir.join(stored_name);

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        while let Some(chunk) = field.next().await {
            writer.write_all(&chunk?)?;
        }
        writer.flush()?;

        saved = Some((path, filename));
    }

    let (path, filename) = saved.ok_or("Missing file")?;

    // Parsing is blocking spreadsheet I/O; keep it off the async workers.
    let parse_path = path.clone();
    let parsed =
        tokio::task::spawn_blocking(move || engine::structure::parse_template(&parse_path))
            .await?;
    let structure = match parsed {
        Ok(structure) => structure,
        Err(e) => {
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }
    };

    let placeholders = engine::scan::scan_placeholders(&structure)?;

    // The previous template file is no longer referenced by anything.
    if let Some(old_path) = &report.template_file_path {
        if Path::new(old_path).exists() {
            let _ = fs::remove_file(old_path);
        }
    }

    store::save_template(report_id, &path.to_string_lossy(), &filename, &structure)?;

    Ok(TemplateUploadResponse {
        message: "Template uploaded successfully".to_string(),
        filename,
        placeholders,
    })
}
