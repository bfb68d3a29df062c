//! Strongly-typed domain structures for upload handling.
use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Sanitized file name (single path component).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FileName(String);

impl FileName {
    pub fn try_new(value: String) -> Result<Self, TypeConstraintError> {
        let path = Path::new(&value);
        let mut components = path.components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(component)), None) => {
                Ok(Self(component.to_string_lossy().to_string()))
            }
            _ => Err(TypeConstraintError::InvalidFileName),
        }
    }

    pub fn try_from_str(value: &str) -> Result<Self, TypeConstraintError> {
        Self::try_new(value.to_string())
    }

    /// Build a name from the `filename` parameter of a multipart part.
    ///
    /// Clients may send a full path (`C:\photos\cat.png`, `./data/cat.png`),
    /// only the last segment is kept.
    pub fn from_client(raw: &str) -> Result<Self, TypeConstraintError> {
        Self::try_from_str(Self::base_name(raw))
    }

    /// Last `/` or `\` separated segment of `raw`, unchecked.
    pub fn base_name(raw: &str) -> &str {
        raw.rsplit(['/', '\\']).next().unwrap_or_default()
    }

    /// [`extension`](Self::extension) of the last segment of an arbitrary
    /// client-supplied name.
    pub fn extension_of(raw: &str) -> &str {
        let base = Self::base_name(raw);
        base.rfind('.').map(|idx| &base[idx..]).unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Suffix starting at the final dot, including the dot; empty when the
    /// name has none.
    pub fn extension(&self) -> &str {
        Self::extension_of(&self.0)
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A file accepted from a multipart form and written to disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadedFile {
    /// Name as declared by the client, reduced to its last path segment.
    original_file_name: String,
    new_file_name: FileName,
    file_size: u64,
}

impl UploadedFile {
    pub fn new(original_file_name: String, new_file_name: FileName, file_size: u64) -> Self {
        Self {
            original_file_name,
            new_file_name,
            file_size,
        }
    }

    pub fn original_file_name(&self) -> &str {
        &self.original_file_name
    }

    pub fn new_file_name(&self) -> &FileName {
        &self.new_file_name
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

/// Byte count rendered with binary units for error messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct ByteSize(u64);

impl ByteSize {
    pub fn new(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

        let mut value = self.0 as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }

        if unit == 0 {
            write!(f, "{} B", self.0)
        } else if value.fract() == 0.0 {
            write!(f, "{value:.0} {}", UNITS[unit])
        } else {
            write!(f, "{value:.1} {}", UNITS[unit])
        }
    }
}

#[derive(Debug, Error)]
pub enum TypeConstraintError {
    #[error("invalid file name")]
    InvalidFileName,
}
