//! Buffered multipart forms.

use crate::media::ImageFile;
use crate::types::{AppError, Result};
use axum::extract::{multipart::MultipartError, Multipart};
use axum::http::StatusCode;
use std::collections::HashMap;

/// A fully read `multipart/form-data` body: text fields and file parts.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<ImageFile>>,
}

fn form_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::InvalidInput("Upload exceeds the request size limit".to_string())
    } else {
        AppError::InvalidInput(format!("Invalid form data: {}", e.body_text()))
    }
}

impl FormData {
    /// Reads every part. Parts with a file name are files; the rest are text.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await.map_err(form_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(form_error)?;
                    // browsers send an empty part for an untouched file input
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files
                        .entry(name)
                        .or_default()
                        .push(ImageFile::new(file_name, content_type, bytes));
                }
                None => {
                    let value = field.text().await.map_err(form_error)?;
                    form.fields.entry(name).or_default().push(value);
                }
            }
        }

        Ok(form)
    }

    /// First non-blank value of a text field, trimmed.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)?
            .iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }

    /// Comma-separated values across every occurrence of `name`.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .map(|values| {
                values
                    .iter()
                    .flat_map(|value| value.split(','))
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Boolean text field; accepts `true`/`false`/`1`/`0`/`on`.
    pub fn flag(&self, name: &str) -> Result<Option<bool>> {
        match self.text(name).map(str::to_ascii_lowercase).as_deref() {
            None => Ok(None),
            Some("true") | Some("1") | Some("on") => Ok(Some(true)),
            Some("false") | Some("0") | Some("off") => Ok(Some(false)),
            Some(other) => Err(AppError::InvalidInput(format!(
                "Invalid value '{}' for {}",
                other, name
            ))),
        }
    }

    /// Removes and returns every file sent under `name`.
    pub fn take_files(&mut self, name: &str) -> Vec<ImageFile> {
        self.files.remove(name).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn with_fields(fields: &[(&str, &str)]) -> Self {
        let mut form = FormData::default();
        for (name, value) in fields {
            form.fields
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }
        form
    }
}
