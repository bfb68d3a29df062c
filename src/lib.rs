use std::path::Path;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};

use crate::models::config::ServerConfig;
use crate::services::storage::create_dir_if_not_exists;
use crate::services::upload::UploadService;

pub mod domain;
pub mod dto;
pub mod forms;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod test_support;

/// Start the HTTP server exposing the toolkit routes.
pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
    create_dir_if_not_exists(Path::new(&server_config.upload_path))?;

    let address = server_config.address.clone();
    let port = server_config.port;
    let upload_service = web::Data::new(UploadService::new(server_config.upload_config()));
    let server_config = web::Data::new(server_config);

    log::info!("Starting server on {address}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&server_config.cors_origins))
            .wrap(Logger::default())
            .app_data(server_config.clone())
            .app_data(upload_service.clone())
            .configure(routes::configure)
    })
    .bind((address, port))?
    .run()
    .await
}

fn build_cors(origins: &[String]) -> Cors {
    origins.iter().fold(
        Cors::default()
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header(),
        |cors, origin| cors.allowed_origin(origin),
    )
}
