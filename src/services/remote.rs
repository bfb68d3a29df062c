//! Outbound JSON delivery.
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;

use crate::services::{ServiceError, ServiceResult};

/// POST `payload` as JSON to `uri`, returning the response and its status.
pub async fn push_json_to_remote<T: Serialize + ?Sized>(
    client: &Client,
    uri: &str,
    payload: &T,
) -> ServiceResult<(Response, StatusCode)> {
    let body = serde_json::to_vec(payload).map_err(ServiceError::EncodeJson)?;

    let response = client
        .post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|err| {
            log::error!("Failed to push JSON to {uri}: {err}");
            ServiceError::Remote(err)
        })?;

    let status = response.status();
    log::debug!("Pushed JSON to {uri}: {status}");

    Ok((response, status))
}
