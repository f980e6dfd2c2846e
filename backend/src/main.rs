mod config;
mod db;
mod engine;
mod metabase;
mod services;

use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let settings = config::Settings::from_env();

    db::init().map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let client = metabase::MetabaseClient::from_settings(&settings)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let address = (settings.host.clone(), settings.port);
    info!("Server running at http://{}:{}", address.0, address.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(client.clone()))
            .service(services::reports::configure_routes())
            .service(services::visualizations::configure_routes())
    })
    .bind(address)?
    .run()
    .await
}
