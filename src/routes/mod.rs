use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};

use crate::services::ServiceError;
use crate::services::json::error_json;

pub mod main;

/// Register every toolkit route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(main::upload_files)
        .service(main::upload_file)
        .service(main::download_file)
        .service(main::slug);
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServiceError::OpenFile(err) if err.kind() == std::io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Configuration(_)
            | ServiceError::StorageSetup(_)
            | ServiceError::Spool(_)
            | ServiceError::SaveFile(_)
            | ServiceError::OpenFile(_)
            | ServiceError::EncodeJson(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Remote(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log_server_error(self);
        }

        error_json(self, Some(status)).unwrap_or_else(|_| HttpResponse::build(status).finish())
    }
}

/// Log an internal failure with its underlying cause. The cause stays out of
/// the response body; the `Display` text of internal variants is generic.
pub(crate) fn log_server_error(err: &ServiceError) {
    match std::error::Error::source(err) {
        Some(source) => log::error!("Request failed: {err}: {source}"),
        None => log::error!("Request failed: {err}"),
    }
}
