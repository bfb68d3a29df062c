//! Configuration model loaded from external sources.

use serde::Deserialize;

use crate::services::json::JsonDecodeConfig;
use crate::services::upload::UploadConfig;

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub upload_path: String,
    #[serde(default)]
    pub max_file_size: i64,
    #[serde(default)]
    pub allowed_file_types: Vec<String>,
    #[serde(default)]
    pub max_json_size: usize,
    #[serde(default)]
    pub allow_unknown_fields: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            max_file_size: self.max_file_size,
            allowed_file_types: self.allowed_file_types.clone(),
        }
    }

    pub fn json_config(&self) -> JsonDecodeConfig {
        JsonDecodeConfig {
            max_json_size: self.max_json_size,
            allow_unknown_fields: self.allow_unknown_fields,
        }
    }
}
