//! Validation for CLI arguments

use crate::error::{Error, Result};
use std::path::Path;
use url::Url;

/// Validate file path exists and is readable
pub fn validate_file_exists(path: &Path, description: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::Validation(format!(
            "{} does not exist: {}",
            description,
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(Error::Validation(format!(
            "{} is not a file: {}",
            description,
            path.display()
        )));
    }

    Ok(())
}

/// Validate directory exists and is writable
pub fn validate_dir_writable(path: &Path, description: &str) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(Error::Validation(format!(
            "{} exists but is not a directory: {}",
            description,
            path.display()
        )));
    }

    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| {
            Error::Validation(format!(
                "Cannot create {}: {}: {}",
                description,
                path.display(),
                e
            ))
        })?;
    }

    // Probe writability with a throwaway file
    let test_file = path.join(".chart_report_write_test");
    match std::fs::write(&test_file, "test") {
        Ok(_) => {
            let _ = std::fs::remove_file(&test_file);
            Ok(())
        }
        Err(e) => Err(Error::Validation(format!(
            "{} is not writable: {}: {}",
            description,
            path.display(),
            e
        ))),
    }
}

/// Parse a base URL for report links; only http(s) and file URLs are accepted
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" | "file" => Ok(url),
        other => Err(Error::Validation(format!(
            "Unsupported base URL scheme '{}': expected http, https or file",
            other
        ))),
    }
}

/// Split a comma-separated id list, dropping empty entries
pub fn parse_id_list(raw: &str) -> Result<Vec<String>> {
    let ids: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(Error::Validation("Chart id list cannot be empty".to_string()));
    }
    Ok(ids)
}
