//! Attachment upload.
//!
//! Messages carrying a file bypass the tier chain entirely: the file is
//! uploaded as a multipart request and the extracted text (when the
//! backend could produce any) becomes the answer.  Upload failure is
//! surfaced as-is — an attachment is never silently dropped and resent
//! as plain text.

use serde::Deserialize;

use courier_domain::error::{Error, Result};

/// Response body of the upload endpoint.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    content_text: Option<String>,
}

/// What the backend made of the uploaded file.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Text extracted from the file, when the backend supports the format.
    pub content_text: Option<String>,
}

pub struct AttachmentUploader {
    url: String,
    client: reqwest::Client,
}

impl AttachmentUploader {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// Upload one file tied to the user message at `message_index`.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        session_id: &str,
        message_index: usize,
    ) -> Result<UploadOutcome> {
        tracing::debug!(url = %self.url, file_name, bytes = bytes.len(), "uploading attachment");

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("session_id", session_id.to_string())
            .text("message_index", message_index.to_string());

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upload(format!("upload endpoint returned {status}")));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::Upload(format!("malformed upload response: {e}")))?;

        Ok(UploadOutcome {
            content_text: body.content_text,
        })
    }
}
