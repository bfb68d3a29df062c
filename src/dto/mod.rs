use serde::{Deserialize, Serialize};

/// Uniform envelope for every JSON response produced by the toolkit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonResponse<T = serde_json::Value> {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonResponse<T> {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            error: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }
}

/// Serializable view of an accepted upload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadedFileDto {
    pub original_file_name: String,
    pub new_file_name: String,
    pub file_size: u64,
}

impl From<crate::domain::UploadedFile> for UploadedFileDto {
    fn from(file: crate::domain::UploadedFile) -> Self {
        let file_size = file.file_size();
        let original_file_name = file.original_file_name().to_string();
        let new_file_name = file.new_file_name().as_str().to_string();

        Self {
            original_file_name,
            new_file_name,
            file_size,
        }
    }
}
