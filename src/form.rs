//! Multipart bodies for the upload endpoints.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::error::CubicError;
use crate::types::{FileDescriptor, FormFields};

/// Builds the upload form and the headers the request needs to carry it.
///
/// Text fields are appended in insertion order, then one streamed part per
/// file under `field_name`. Each file's declared `size` is used as the part
/// length as-is. The open file handles live inside the returned form and are
/// closed when the request body is dropped.
pub async fn build_form(
    fields: &FormFields,
    field_name: &str,
    files: &[FileDescriptor],
) -> Result<(Form, HeaderMap), CubicError> {
    let mut form = Form::new();
    for (key, value) in fields.iter() {
        form = form.text(key.to_string(), value.to_string());
    }

    for file in files {
        let handle = File::open(&file.filepath).await.map_err(|e| {
            error!(path = %file.filepath.display(), error = ?e, "Failed to open upload file");
            CubicError::Transport(format!("failed to open {}: {e}", file.filepath.display()))
        })?;
        let body = Body::wrap_stream(ReaderStream::new(handle));
        let part = Part::stream_with_length(body, file.size)
            .file_name(file.original_filename.clone())
            .mime_str(&file.mime_type)
            .map_err(|_| CubicError::validation("mimeType", "Provide valid file MIME type"))?;
        debug!(
            filename = %file.original_filename,
            size = file.size,
            field = field_name,
            "Appended file part"
        );
        form = form.part(field_name.to_string(), part);
    }

    let content_type = format!("multipart/form-data; boundary={}", form.boundary());
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .map_err(|e| CubicError::Transport(format!("invalid multipart boundary: {e}")))?,
    );
    Ok((form, headers))
}

/// Copies `overrides` into `base`, replacing any header already present.
pub fn merge_headers(base: &mut HeaderMap, overrides: &HeaderMap) {
    for (name, value) in overrides {
        base.insert(name.clone(), value.clone());
    }
}
