//! Strict JSON request decoding and the uniform response envelope.
use std::fmt;

use actix_web::HttpResponse;
use actix_web::error::PayloadError;
use actix_web::http::StatusCode;
use actix_web::http::header::{ContentType, HeaderMap};
use actix_web::web::{Bytes, BytesMut};
use futures_util::stream::{Stream, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::dto::JsonResponse;
use crate::services::{ServiceError, ServiceResult};

/// Ceiling applied when `max_json_size` is zero (1 MiB).
pub const DEFAULT_MAX_JSON_SIZE: usize = 1024 * 1024;

/// Rules applied when decoding a JSON request body.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JsonDecodeConfig {
    /// Byte ceiling for the body; `0` selects [`DEFAULT_MAX_JSON_SIZE`].
    pub max_json_size: usize,
    /// Accept keys the destination type does not declare.
    pub allow_unknown_fields: bool,
}

impl JsonDecodeConfig {
    pub fn effective_max_json_size(&self) -> usize {
        match self.max_json_size {
            0 => DEFAULT_MAX_JSON_SIZE,
            n => n,
        }
    }
}

/// Collect a request body and decode it as exactly one JSON value.
pub async fn read_json<T, S>(body: S, config: &JsonDecodeConfig) -> ServiceResult<T>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<Bytes, PayloadError>>,
{
    let limit = config.effective_max_json_size();
    let mut body = std::pin::pin!(body);
    let mut buf = BytesMut::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|err| match err {
            PayloadError::Overflow => ServiceError::body_too_large(limit as u64),
            other => ServiceError::ReadBody(other.to_string()),
        })?;
        if buf.len() + chunk.len() > limit {
            return Err(ServiceError::body_too_large(limit as u64));
        }
        buf.extend_from_slice(&chunk);
    }

    decode_json(&buf, config)
}

/// Decode `body` into `T`.
///
/// Fails on an empty body, on any syntax or type error, on keys `T` does not
/// know (unless allowed) and on anything but whitespace after the first value.
pub fn decode_json<T: DeserializeOwned>(
    body: &[u8],
    config: &JsonDecodeConfig,
) -> ServiceResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ServiceError::MalformedJson("body must not be empty".into()));
    }

    let mut unknown = Vec::new();
    let mut track = |path: serde_ignored::Path<'_>| unknown.push(path.to_string());
    let mut json = serde_json::Deserializer::from_slice(body);

    let value: T =
        serde_path_to_error::deserialize(serde_ignored::Deserializer::new(&mut json, &mut track))
            .map_err(describe_decode_error)?;

    if !config.allow_unknown_fields {
        if let Some(key) = unknown.into_iter().next() {
            log::debug!("Rejected JSON body with unknown key {key}");
            return Err(ServiceError::UnknownField(key));
        }
    }

    json.end().map_err(|_| ServiceError::TrailingData)?;

    Ok(value)
}

/// Serialize `payload` with indentation into a response with `status`.
///
/// Extra `headers` are written first, `Content-Type: application/json` last.
pub fn write_json<T: Serialize + ?Sized>(
    status: StatusCode,
    payload: &T,
    headers: Option<&HeaderMap>,
) -> ServiceResult<HttpResponse> {
    let body = serde_json::to_vec_pretty(payload).map_err(ServiceError::EncodeJson)?;

    let mut response = HttpResponse::build(status);
    if let Some(headers) = headers {
        for (name, value) in headers.iter() {
            response.append_header((name.clone(), value.clone()));
        }
    }
    response.insert_header(ContentType::json());

    Ok(response.body(body))
}

/// Respond with `{"error": true, "message": <err>}`; status defaults to 400.
pub fn error_json(
    err: impl fmt::Display,
    status: Option<StatusCode>,
) -> ServiceResult<HttpResponse> {
    let payload = JsonResponse::<()>::failure(err.to_string());
    write_json(status.unwrap_or(StatusCode::BAD_REQUEST), &payload, None)
}

fn describe_decode_error(err: serde_path_to_error::Error<serde_json::Error>) -> ServiceError {
    let field = err.path().to_string();
    let inner = err.into_inner();
    let detail = inner.to_string();
    let position = format!("line {}, column {}", inner.line(), inner.column());

    let message = match inner.classify() {
        Category::Eof => {
            format!("body contains badly-formed JSON (unexpected end of input at {position})")
        }
        Category::Syntax if detail.starts_with("key must be a string") => {
            format!("body contains an invalid key (at {position})")
        }
        Category::Syntax => format!("body contains badly-formed JSON (at {position})"),
        Category::Data if detail.starts_with("unknown field") => {
            let key = quoted_name(&detail).unwrap_or_default();
            return ServiceError::UnknownField(match field.as_str() {
                "." => key.to_string(),
                parent => format!("{parent}.{key}"),
            });
        }
        Category::Data if detail.starts_with("invalid type") || detail.starts_with("invalid value") => {
            match field.as_str() {
                "." => format!("body contains incorrect JSON type (at {position})"),
                field => format!("body contains incorrect JSON type for field \"{field}\""),
            }
        }
        Category::Data => format!("body contains invalid JSON: {detail}"),
        Category::Io => format!("error reading JSON: {detail}"),
    };

    ServiceError::MalformedJson(message)
}

/// First name wrapped in backticks, as serde quotes field names.
fn quoted_name(detail: &str) -> Option<&str> {
    let start = detail.find('`')? + 1;
    let len = detail[start..].find('`')?;
    Some(&detail[start..start + len])
}
