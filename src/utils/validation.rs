use crate::utils::error::{Result, SweepError};
use std::collections::HashSet;
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl Into<String>, reason: impl Into<String>) -> SweepError {
    SweepError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.into(),
        reason: reason.into(),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value.to_string(),
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

/// Extensions are compared case-insensitively, so `Report.XLSX` passes for `xlsx`.
pub fn validate_file_extensions(field_name: &str, files: &[String], allowed: &[&str]) -> Result<()> {
    for file in files {
        let extension = Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| invalid(field_name, file.as_str(), "File name has no extension"))?;

        if !allowed.iter().any(|a| a.eq_ignore_ascii_case(extension)) {
            return Err(invalid(
                field_name,
                file.as_str(),
                format!("Only {} files are supported", allowed.join(" and ")),
            ));
        }
    }
    Ok(())
}

pub fn validate_unique_names(field_name: &str, names: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    match names.iter().find(|name| !seen.insert(name.as_str())) {
        Some(repeated) => Err(invalid(field_name, repeated.as_str(), "Column listed more than once")),
        None => Ok(()),
    }
}
