//! Directory bootstrap and file downloads.
use std::fs;
use std::io;
use std::path::Path;

use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse};

use crate::domain::FileName;
use crate::services::{ServiceError, ServiceResult};

/// Create `path` and any missing parents with mode `0755`. Does nothing when
/// the directory already exists.
pub fn create_dir_if_not_exists(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}

/// Serve `dir/file` as an attachment named `display_name`.
pub fn download_static_file(
    req: &HttpRequest,
    dir: &Path,
    file: &str,
    display_name: &str,
) -> ServiceResult<HttpResponse> {
    let file = FileName::try_from_str(file)?;
    let path = dir.join(file.as_str());

    let named = NamedFile::open(&path).map_err(|err| {
        log::warn!("Cannot open {path:?} for download: {err}");
        ServiceError::OpenFile(err)
    })?;

    Ok(named
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(display_name.to_string())],
        })
        .into_response(req))
}
