//! # Excel Template Report Service
//!
//! Aggregates the endpoints of the template report workflow under
//! `/api/excel-reports` and routes each to its handler module.
//!
//! ## Registered routes
//!
//! *   **`GET ""`** / **`GET /{report_id}`** / **`GET /shared/{token}`** —
//!     `get`: list rows with placeholder/mapping counts, full detail with a
//!     freshly scanned placeholder list, and public access by share token.
//! *   **`POST ""`**, **`PUT /{report_id}`**, **`DELETE /{report_id}`**,
//!     **`POST /{report_id}/duplicate`** — `save`: record CRUD plus
//!     duplication (copies the stored template file, never the share token).
//! *   **`POST /{report_id}/template`** — `upload`: multipart template
//!     upload, structure parse, placeholder scan, mapping reset.
//! *   **`PUT /{report_id}/mappings`** — `mappings`: replace the mapping
//!     set.
//! *   **`POST /{report_id}/generate`** — `generate`: produce the populated
//!     workbook for download.
//! *   **`POST /{report_id}/share`** / **`DELETE /{report_id}/share`** —
//!     `share`: mint or revoke the public share token.

mod generate;
mod get;
mod mappings;
mod save;
mod share;
mod store;
mod upload;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/excel-reports";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(get::list))
        .route("", post().to(save::create))
        .route("/shared/{share_token}", get().to(get::shared))
        .route("/{report_id}", get().to(get::detail))
        .route("/{report_id}", put().to(save::update))
        .route("/{report_id}", delete().to(save::delete))
        .route("/{report_id}/template", post().to(upload::process))
        .route("/{report_id}/mappings", put().to(mappings::process))
        .route("/{report_id}/generate", post().to(generate::process))
        .route("/{report_id}/share", post().to(share::create))
        .route("/{report_id}/share", delete().to(share::revoke))
        .route("/{report_id}/duplicate", post().to(save::duplicate))
}
