use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}, {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessingStatus::Processing)
    }
}

/// Status fields of a resume; also accepted from full record responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeStatus {
    pub id: Uuid,
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub processing_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResumeEnvelope<T> {
    resume: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Typed client for the resume HTTP API, acting as one user.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    user_id: Uuid,
}

impl ApiClient {
    pub fn new(base_url: &str, user_id: Uuid) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/resumes{}", self.base_url, path)
    }

    /// Uploads a file from disk. Without an explicit MIME type it is guessed
    /// from the extension.
    pub async fn upload(
        &self,
        path: &Path,
        mime_type: Option<&str>,
    ) -> Result<ResumeStatus, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume".to_string());
        let mime_type = mime_type.unwrap_or_else(|| guess_mime_type(path));
        self.upload_bytes(&file_name, mime_type, bytes).await
    }

    pub async fn upload_bytes(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ResumeStatus, ClientError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = Form::new().part("resume", part);

        let response = self
            .client
            .post(self.url("/upload"))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .multipart(form)
            .send()
            .await?;
        let envelope: ResumeEnvelope<ResumeStatus> = parse(response).await?;
        Ok(envelope.resume)
    }

    pub async fn status(&self, id: Uuid) -> Result<ResumeStatus, ClientError> {
        self.get(&format!("/{id}/status")).await
    }

    /// Full record including the analysis payload, as raw JSON.
    pub async fn resume(&self, id: Uuid) -> Result<Value, ClientError> {
        let envelope: ResumeEnvelope<Value> = self.get(&format!("/{id}")).await?;
        Ok(envelope.resume)
    }

    pub async fn active(&self) -> Result<Value, ClientError> {
        let envelope: ResumeEnvelope<Value> = self.get("/active").await?;
        Ok(envelope.resume)
    }

    pub async fn reprocess(&self, id: Uuid) -> Result<ResumeStatus, ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/{id}/reprocess")))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;
        let envelope: ResumeEnvelope<ResumeStatus> = parse(response).await?;
        Ok(envelope.resume)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/{id}")))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;
        let _: Value = parse(response).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .client
            .get(self.url(path))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;
        parse(response).await
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => ("UNKNOWN".to_string(), body),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

pub fn guess_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("cv.PDF")), "application/pdf");
        assert_eq!(guess_mime_type(Path::new("old.doc")), "application/msword");
        assert!(guess_mime_type(Path::new("cv.docx")).contains("wordprocessingml"));
        assert_eq!(
            guess_mime_type(Path::new("notes")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_status_parses_from_full_record() {
        let json = serde_json::json!({
            "id": "7d444840-9dc0-11d1-b245-5ffdce74fad2",
            "file_name": "cv.pdf",
            "processing_status": "failed",
            "processing_error": "Insufficient text content",
            "analysis": null
        });
        let status: ResumeStatus = serde_json::from_value(json).unwrap();
        assert_eq!(status.processing_status, ProcessingStatus::Failed);
        assert!(status.processing_status.is_terminal());
        assert_eq!(
            status.processing_error.as_deref(),
            Some("Insufficient text content")
        );
    }
}
