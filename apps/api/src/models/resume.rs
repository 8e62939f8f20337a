use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::{ExperienceLevel, ResumeAnalysis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessingStatus::Processing)
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            other => Err(format!("unknown processing status '{other}'")),
        }
    }
}

/// A row of the `resumes` table as stored.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_key: String,
    pub processing_status: String,
    pub processing_error: Option<String>,
    pub extracted_text: Option<String>,
    pub analysis: Option<Json<ResumeAnalysis>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One uploaded resume and the state of its analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub extracted_text: Option<String>,
    pub analysis: Option<ResumeAnalysis>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ResumeRow> for ResumeRecord {
    type Error = sqlx::Error;

    fn try_from(row: ResumeRow) -> Result<Self, Self::Error> {
        let processing_status = parse_status(&row.processing_status)?;
        Ok(ResumeRecord {
            id: row.id,
            user_id: row.user_id,
            file_name: row.file_name,
            file_size: row.file_size,
            mime_type: row.mime_type,
            storage_key: row.storage_key,
            processing_status,
            processing_error: row.processing_error,
            extracted_text: row.extracted_text,
            analysis: row.analysis.map(|Json(a)| a),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// List entry: metadata, status and headline scores. Never the payload.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeSummary {
    pub id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub processing_status: ProcessingStatus,
    pub analysis_score: Option<f64>,
    pub experience_level: Option<ExperienceLevel>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ResumeRecord> for ResumeSummary {
    fn from(record: &ResumeRecord) -> Self {
        ResumeSummary {
            id: record.id,
            file_name: record.file_name.clone(),
            file_size: record.file_size,
            mime_type: record.mime_type.clone(),
            processing_status: record.processing_status,
            analysis_score: record.analysis.as_ref().map(|a| a.analysis_score),
            experience_level: record.analysis.as_ref().map(|a| a.experience_level),
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Summary columns selected for listings; the headline scores are read out
/// of the JSONB payload.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeSummaryRow {
    pub id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub processing_status: String,
    pub analysis_score: Option<f64>,
    pub experience_level: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ResumeSummaryRow> for ResumeSummary {
    type Error = sqlx::Error;

    fn try_from(row: ResumeSummaryRow) -> Result<Self, Self::Error> {
        Ok(ResumeSummary {
            id: row.id,
            file_name: row.file_name,
            file_size: row.file_size,
            mime_type: row.mime_type,
            processing_status: parse_status(&row.processing_status)?,
            analysis_score: row.analysis_score,
            experience_level: row
                .experience_level
                .as_deref()
                .and_then(ExperienceLevel::from_label),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StatusRow {
    pub id: Uuid,
    pub processing_status: String,
    pub processing_error: Option<String>,
}

impl TryFrom<StatusRow> for StatusView {
    type Error = sqlx::Error;

    fn try_from(row: StatusRow) -> Result<Self, Self::Error> {
        Ok(StatusView {
            id: row.id,
            processing_status: parse_status(&row.processing_status)?,
            processing_error: row.processing_error,
        })
    }
}

fn parse_status(raw: &str) -> Result<ProcessingStatus, sqlx::Error> {
    raw.parse()
        .map_err(|e: String| sqlx::Error::Decode(e.into()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusView {
    pub id: Uuid,
    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
}

impl From<&ResumeRecord> for StatusView {
    fn from(record: &ResumeRecord) -> Self {
        StatusView {
            id: record.id,
            processing_status: record.processing_status,
            processing_error: record.processing_error.clone(),
        }
    }
}

/// Fields supplied when a resume is first stored.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub user_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_key: String,
}
