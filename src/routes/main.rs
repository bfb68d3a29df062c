use std::path::Path;

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, get, post, web};
use serde::Deserialize;
use validator::Validate;

use crate::dto::{JsonResponse, UploadedFileDto};
use crate::forms::main::SlugForm;
use crate::models::config::ServerConfig;
use crate::routes::log_server_error;
use crate::services::json::{read_json, write_json};
use crate::services::slug::slugify;
use crate::services::storage::download_static_file;
use crate::services::upload::{UploadFailure, UploadService};
use crate::services::{ServiceError, ServiceResult};

#[derive(Deserialize)]
struct UploadQueryParams {
    rename: Option<bool>,
}

impl UploadQueryParams {
    fn rename(&self) -> bool {
        self.rename.unwrap_or(true)
    }
}

/// Envelope for a batch that stopped early, listing what was stored.
fn partial_upload_response(failure: UploadFailure) -> ServiceResult<HttpResponse> {
    let status = failure.error.status_code();
    if status.is_server_error() {
        log_server_error(&failure.error);
    }
    if !failure.uploaded.is_empty() {
        log::warn!(
            "Upload stopped after {} file(s): {}",
            failure.uploaded.len(),
            failure.error
        );
    }

    let files: Vec<UploadedFileDto> = failure.uploaded.into_iter().map(Into::into).collect();
    write_json(
        status,
        &JsonResponse::failure(failure.error.to_string()).with_data(files),
        None,
    )
}

#[post("/files/upload")]
pub async fn upload_files(
    params: web::Query<UploadQueryParams>,
    server_config: web::Data<ServerConfig>,
    service: web::Data<UploadService>,
    multipart: Multipart,
) -> ServiceResult<HttpResponse> {
    let upload_dir = Path::new(&server_config.upload_path);

    match service
        .upload_files(multipart, upload_dir, params.rename())
        .await
    {
        Ok(files) => {
            let files: Vec<UploadedFileDto> = files.into_iter().map(Into::into).collect();
            let message = format!("{} file(s) uploaded", files.len());
            write_json(
                StatusCode::OK,
                &JsonResponse::success(message).with_data(files),
                None,
            )
        }
        Err(failure) => partial_upload_response(failure),
    }
}

#[post("/files/upload/single")]
pub async fn upload_file(
    params: web::Query<UploadQueryParams>,
    server_config: web::Data<ServerConfig>,
    service: web::Data<UploadService>,
    multipart: Multipart,
) -> ServiceResult<HttpResponse> {
    let upload_dir = Path::new(&server_config.upload_path);
    let file = service
        .upload_file(multipart, upload_dir, params.rename())
        .await?;

    write_json(
        StatusCode::OK,
        &JsonResponse::success("file uploaded").with_data(UploadedFileDto::from(file)),
        None,
    )
}

#[get("/files/download/{name}")]
pub async fn download_file(
    req: HttpRequest,
    name: web::Path<String>,
    server_config: web::Data<ServerConfig>,
) -> ServiceResult<HttpResponse> {
    let name = name.into_inner();
    download_static_file(&req, Path::new(&server_config.upload_path), &name, &name)
}

#[post("/slug")]
pub async fn slug(
    payload: web::Payload,
    server_config: web::Data<ServerConfig>,
) -> ServiceResult<HttpResponse> {
    let form: SlugForm = read_json(payload, &server_config.json_config()).await?;
    form.validate()
        .map_err(|e| ServiceError::Validation(e.to_string()))?;

    let slug = slugify(&form.text)?;
    write_json(
        StatusCode::OK,
        &JsonResponse::success("slug created").with_data(serde_json::json!({ "slug": slug })),
        None,
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use actix_web::http::header;
    use actix_web::{App, test};
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::routes::configure;
    use crate::test_support::{PNG_BYTES, Part, content_type, multipart_body};

    fn server_config(dir: &TempDir, allowed: &[&str]) -> ServerConfig {
        ServerConfig {
            address: "127.0.0.1".into(),
            port: 0,
            upload_path: dir.path().join("upload").to_string_lossy().to_string(),
            max_file_size: 0,
            allowed_file_types: allowed.iter().map(|s| s.to_string()).collect(),
            max_json_size: 1024,
            allow_unknown_fields: false,
            cors_origins: vec![],
        }
    }

    macro_rules! app {
        ($config:expr) => {{
            let config = $config;
            let service = UploadService::new(config.upload_config());
            test::init_service(
                App::new()
                    .app_data(web::Data::new(config))
                    .app_data(web::Data::new(service))
                    .configure(configure),
            )
            .await
        }};
    }

    fn upload_request(uri: &str, parts: &[Part<'_>]) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header((header::CONTENT_TYPE, content_type()))
            .set_payload(multipart_body(parts))
    }

    #[actix_web::test]
    async fn upload_route_returns_uploaded_files() {
        let dir = tempdir().unwrap();
        let app = app!(server_config(&dir, &["image/png"]));
        let req = upload_request(
            "/files/upload?rename=false",
            &[Part::file("file", "img.png", PNG_BYTES)],
        )
        .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: JsonResponse<Vec<UploadedFileDto>> = test::read_body_json(resp).await;
        assert!(!body.error);
        let files = body.data.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].new_file_name, "img.png");
        assert!(dir.path().join("upload").join("img.png").exists());
    }

    #[actix_web::test]
    async fn upload_route_reports_partial_batches() {
        let dir = tempdir().unwrap();
        let app = app!(server_config(&dir, &["image/png"]));
        let req = upload_request(
            "/files/upload",
            &[
                Part::file("file", "img.png", PNG_BYTES),
                Part::file("file", "notes.txt", b"hello"),
            ],
        )
        .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let body: JsonResponse<Vec<UploadedFileDto>> = test::read_body_json(resp).await;
        assert!(body.error);
        assert!(body.message.contains("text/plain"));
        assert_eq!(body.data.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn upload_route_lists_stored_files_when_saving_fails() {
        let dir = tempdir().unwrap();
        let config = server_config(&dir, &["image/png"]);
        fs::create_dir_all(Path::new(&config.upload_path).join("b.png")).unwrap();
        let upload_path = config.upload_path.clone();
        let app = app!(config);
        let req = upload_request(
            "/files/upload?rename=false",
            &[
                Part::file("file", "a.png", PNG_BYTES),
                Part::file("file", "b.png", PNG_BYTES),
            ],
        )
        .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: JsonResponse<Vec<UploadedFileDto>> = test::read_body_json(resp).await;
        assert!(body.error);
        assert_eq!(body.message, "failed to save file");
        let files = body.data.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].new_file_name, "a.png");
        assert!(Path::new(&upload_path).join("a.png").is_file());
    }

    #[actix_web::test]
    async fn single_upload_without_file_is_bad_request() {
        let dir = tempdir().unwrap();
        let app = app!(server_config(&dir, &[]));
        let req = upload_request("/files/upload/single", &[Part::field("title", b"x")])
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: JsonResponse = test::read_body_json(resp).await;
        assert!(body.error);
        assert_eq!(body.message, "no files were uploaded");
    }

    #[actix_web::test]
    async fn download_route_serves_attachment() {
        let dir = tempdir().unwrap();
        let config = server_config(&dir, &[]);
        fs::create_dir_all(&config.upload_path).unwrap();
        fs::write(Path::new(&config.upload_path).join("report.txt"), b"data").unwrap();
        let app = app!(config);

        let req = test::TestRequest::get()
            .uri("/files/download/report.txt")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            resp.headers()
                .get(header::CONTENT_DISPOSITION)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("attachment")
        );

        let req = test::TestRequest::get()
            .uri("/files/download/missing.txt")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn slug_route_decodes_strictly() {
        let dir = tempdir().unwrap();
        let app = app!(server_config(&dir, &[]));

        let req = test::TestRequest::post()
            .uri("/slug")
            .set_payload(r#"{"text": "Now is the time"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: JsonResponse = test::read_body_json(resp).await;
        assert_eq!(body.data.unwrap()["slug"], "now-is-the-time");

        let req = test::TestRequest::post()
            .uri("/slug")
            .set_payload(r#"{"text": "a", "extra": true}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: JsonResponse = test::read_body_json(resp).await;
        assert!(body.error);
        assert_eq!(body.message, r#"body contains unknown key "extra""#);

        let req = test::TestRequest::post()
            .uri("/slug")
            .set_payload(format!(r#"{{"text": "{}"}}"#, "a".repeat(2048)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
