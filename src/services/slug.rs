use crate::services::{ServiceError, ServiceResult};

/// Lowercase `s` and join its ASCII alphanumeric runs with `-`.
pub fn slugify(s: &str) -> ServiceResult<String> {
    if s.is_empty() {
        return Err(ServiceError::InvalidSlug("empty string not permitted"));
    }

    let mut slug = String::with_capacity(s.len());
    for c in s.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();

    if slug.is_empty() {
        return Err(ServiceError::InvalidSlug(
            "after removing characters, slug is zero length",
        ));
    }

    Ok(slug)
}
