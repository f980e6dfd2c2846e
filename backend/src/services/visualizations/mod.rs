//! CRUD for saved visualizations, the records generation mappings point at
//! through `source_id`.

mod get;
mod save;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/visualizations";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(get::list))
        .route("", post().to(save::create))
        .route("/{visualization_id}", get().to(get::detail))
        .route("/{visualization_id}", put().to(save::update))
        .route("/{visualization_id}", delete().to(save::delete))
}
