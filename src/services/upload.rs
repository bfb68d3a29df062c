//! Multipart upload pipeline.
//!
//! The whole form is spooled to temporary files first so the size ceiling is
//! enforced before anything reaches the upload directory. Parts are then
//! classified, named and copied one at a time; the first failure stops the
//! batch and files already written stay on disk.
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use actix_multipart::Multipart;
use futures_util::stream::TryStreamExt;
use tempfile::NamedTempFile;

use crate::domain::{FileName, UploadedFile};
use crate::services::classifier::{self, SNIFF_LEN};
use crate::services::storage::create_dir_if_not_exists;
use crate::services::token::random_string;
use crate::services::{ServiceError, ServiceResult};

/// Ceiling applied when `max_file_size` is zero (1 GiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Length of the random part of a renamed file.
pub const RENAMED_TOKEN_LEN: usize = 25;

/// Limits applied to a multipart upload.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UploadConfig {
    /// Byte ceiling for the whole form; `0` selects [`DEFAULT_MAX_FILE_SIZE`].
    pub max_file_size: i64,
    /// Accepted sniffed media types; empty accepts everything.
    pub allowed_file_types: Vec<String>,
}

impl UploadConfig {
    pub fn effective_max_file_size(&self) -> ServiceResult<u64> {
        match self.max_file_size {
            n if n < 0 => Err(ServiceError::Configuration(format!(
                "max file size must not be negative, got {n}"
            ))),
            0 => Ok(DEFAULT_MAX_FILE_SIZE),
            n => Ok(n as u64),
        }
    }
}

/// A batch that stopped early, with the files written before the failure.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct UploadFailure {
    pub uploaded: Vec<UploadedFile>,
    pub error: ServiceError,
}

impl UploadFailure {
    fn before_any(error: ServiceError) -> Self {
        Self {
            uploaded: Vec::new(),
            error,
        }
    }
}

impl From<UploadFailure> for ServiceError {
    fn from(failure: UploadFailure) -> Self {
        failure.error
    }
}

/// File part buffered on disk until it is validated.
struct SpooledPart {
    original_file_name: String,
    file: NamedTempFile,
}

/// Service accepting multipart file uploads into a directory.
#[derive(Clone, Debug, Default)]
pub struct UploadService {
    config: UploadConfig,
}

impl UploadService {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Store every file part of `multipart` in `upload_dir`, in form order.
    ///
    /// With `rename` (the usual choice) each file gets a random name that keeps
    /// the original extension. Without it the last segment of the client's
    /// file name is used, an existing file of that name is overwritten and a
    /// name that is not a single path component fails the part with
    /// [`ServiceError::InvalidFileName`].
    pub async fn upload_files(
        &self,
        mut multipart: Multipart,
        upload_dir: &Path,
        rename: bool,
    ) -> Result<Vec<UploadedFile>, UploadFailure> {
        let limit = self
            .config
            .effective_max_file_size()
            .map_err(UploadFailure::before_any)?;

        create_dir_if_not_exists(upload_dir)
            .map_err(|err| UploadFailure::before_any(ServiceError::StorageSetup(err)))?;

        let parts = spool_parts(&mut multipart, limit)
            .await
            .map_err(UploadFailure::before_any)?;

        let mut uploaded = Vec::with_capacity(parts.len());
        for part in parts {
            match self.store_part(part, upload_dir, rename) {
                Ok(file) => uploaded.push(file),
                Err(error) => return Err(UploadFailure { uploaded, error }),
            }
        }

        Ok(uploaded)
    }

    /// Like [`upload_files`](Self::upload_files) but returns only the first
    /// file. Fails with [`ServiceError::NoFiles`] when the form has none.
    pub async fn upload_file(
        &self,
        multipart: Multipart,
        upload_dir: &Path,
        rename: bool,
    ) -> ServiceResult<UploadedFile> {
        let files = self.upload_files(multipart, upload_dir, rename).await?;
        files.into_iter().next().ok_or(ServiceError::NoFiles)
    }

    fn store_part(
        &self,
        part: SpooledPart,
        upload_dir: &Path,
        rename: bool,
    ) -> ServiceResult<UploadedFile> {
        let SpooledPart {
            original_file_name,
            mut file,
        } = part;

        file.seek(SeekFrom::Start(0)).map_err(ServiceError::Spool)?;
        let mut sample = Vec::with_capacity(SNIFF_LEN);
        Read::take(&mut file, SNIFF_LEN as u64)
            .read_to_end(&mut sample)
            .map_err(ServiceError::Spool)?;

        let mime = classifier::detect_content_type(&sample);
        if !classifier::is_allowed(&mime, &self.config.allowed_file_types) {
            log::warn!("Rejected upload {original_file_name}: type {mime} is not permitted");
            return Err(ServiceError::UnsupportedType(mime));
        }

        file.seek(SeekFrom::Start(0)).map_err(ServiceError::Spool)?;

        let new_file_name = if rename {
            FileName::try_new(format!(
                "{}{}",
                random_string(RENAMED_TOKEN_LEN),
                FileName::extension_of(&original_file_name)
            ))?
        } else {
            FileName::from_client(&original_file_name)?
        };

        let target = upload_dir.join(new_file_name.as_str());
        let mut outfile = File::create(&target).map_err(|err| {
            log::error!("Failed to create {target:?}: {err}");
            ServiceError::SaveFile(err)
        })?;
        let file_size = io::copy(&mut file, &mut outfile).map_err(|err| {
            log::error!("Failed to write {target:?}: {err}");
            ServiceError::SaveFile(err)
        })?;

        log::info!(
            "Stored upload {original_file_name} as {new_file_name} ({file_size} bytes, {mime})"
        );

        Ok(UploadedFile::new(original_file_name, new_file_name, file_size))
    }
}

/// Drain the form into temporary files, failing once more than `limit` bytes
/// of part content have been received.
async fn spool_parts(multipart: &mut Multipart, limit: u64) -> ServiceResult<Vec<SpooledPart>> {
    let mut parts = Vec::new();
    let mut received: u64 = 0;

    while let Some(mut field) = multipart.try_next().await.map_err(multipart_error)? {
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .filter(|name| !name.is_empty())
            .map(|name| FileName::base_name(name).to_string());

        let mut spool = match file_name {
            Some(_) => Some(NamedTempFile::new().map_err(ServiceError::Spool)?),
            None => None,
        };

        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            received += chunk.len() as u64;
            if received > limit {
                log::warn!("Multipart form exceeds {limit} bytes");
                return Err(ServiceError::upload_too_large(limit));
            }
            if let Some(spool) = spool.as_mut() {
                spool.write_all(&chunk).map_err(ServiceError::Spool)?;
            }
        }

        if let (Some(original_file_name), Some(file)) = (file_name, spool) {
            log::debug!("Buffered file part {original_file_name}");
            parts.push(SpooledPart {
                original_file_name,
                file,
            });
        }
    }

    Ok(parts)
}

fn multipart_error(err: actix_multipart::MultipartError) -> ServiceError {
    ServiceError::Multipart(err.to_string())
}
