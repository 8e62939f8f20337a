use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::analysis::ResumeAnalysis;
use crate::errors::AppError;
use crate::models::resume::{
    NewResume, ProcessingStatus, ResumeRecord, ResumeRow, ResumeSummary, ResumeSummaryRow,
    StatusRow, StatusView,
};

/// Persistence for resume records.
///
/// Terminal writes (`complete`, `fail`) only apply to a record that is still
/// `processing` and report whether they did.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Deactivates every record of the user and inserts the new one as the
    /// active record, atomically per user.
    async fn create_active(&self, new: NewResume) -> Result<ResumeRecord, AppError>;

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<ResumeRecord>, AppError>;

    async fn find_active(&self, user_id: Uuid) -> Result<Option<ResumeRecord>, AppError>;

    /// Newest first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeSummary>, AppError>;

    async fn status(&self, id: Uuid, user_id: Uuid) -> Result<Option<StatusView>, AppError>;

    async fn complete(
        &self,
        id: Uuid,
        extracted_text: &str,
        analysis: &ResumeAnalysis,
    ) -> Result<bool, AppError>;

    async fn fail(&self, id: Uuid, error: &str) -> Result<bool, AppError>;

    /// Moves a terminal record back to `processing`. Returns `false` when the
    /// record is missing or already processing.
    async fn reset_for_reprocess(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<Option<ResumeRecord>, AppError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

pub struct PgResumeStore {
    db: PgPool,
}

impl PgResumeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn create_active(&self, new: NewResume) -> Result<ResumeRecord, AppError> {
        let mut tx = self.db.begin().await?;

        // Serializes concurrent uploads of the same user until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(new.user_id.to_string())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE resumes SET is_active = FALSE, updated_at = NOW() WHERE user_id = $1 AND is_active",
        )
        .bind(new.user_id)
        .execute(&mut *tx)
        .await?;

        let row: ResumeRow = sqlx::query_as(
            r#"
            INSERT INTO resumes
                (id, user_id, file_name, file_size, mime_type, storage_key,
                 processing_status, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, 'processing', TRUE)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.file_name)
        .bind(new.file_size)
        .bind(&new.mime_type)
        .bind(&new.storage_key)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ResumeRecord::try_from(row)?)
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<ResumeRecord>, AppError> {
        let row: Option<ResumeRow> =
            sqlx::query_as("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
        Ok(row.map(ResumeRecord::try_from).transpose()?)
    }

    async fn find_active(&self, user_id: Uuid) -> Result<Option<ResumeRecord>, AppError> {
        let row: Option<ResumeRow> =
            sqlx::query_as("SELECT * FROM resumes WHERE user_id = $1 AND is_active")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
        Ok(row.map(ResumeRecord::try_from).transpose()?)
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeSummary>, AppError> {
        let rows: Vec<ResumeSummaryRow> = sqlx::query_as(
            r#"
            SELECT id, file_name, file_size, mime_type, processing_status,
                   (analysis->>'analysis_score')::FLOAT8 AS analysis_score,
                   analysis->>'experience_level' AS experience_level,
                   is_active, created_at, updated_at
            FROM resumes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(ResumeSummary::try_from)
            .collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn status(&self, id: Uuid, user_id: Uuid) -> Result<Option<StatusView>, AppError> {
        let row: Option<StatusRow> = sqlx::query_as(
            "SELECT id, processing_status, processing_error FROM resumes WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(StatusView::try_from).transpose()?)
    }

    async fn complete(
        &self,
        id: Uuid,
        extracted_text: &str,
        analysis: &ResumeAnalysis,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET processing_status = 'completed', processing_error = NULL,
                extracted_text = $2, analysis = $3, updated_at = NOW()
            WHERE id = $1 AND processing_status = 'processing'
            "#,
        )
        .bind(id)
        .bind(extracted_text)
        .bind(Json(analysis))
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET processing_status = 'failed', processing_error = $2,
                extracted_text = NULL, analysis = NULL, updated_at = NOW()
            WHERE id = $1 AND processing_status = 'processing'
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn reset_for_reprocess(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET processing_status = 'processing', processing_error = NULL, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND processing_status <> 'processing'
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<Option<ResumeRecord>, AppError> {
        let row: Option<ResumeRow> =
            sqlx::query_as("DELETE FROM resumes WHERE id = $1 AND user_id = $2 RETURNING *")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
        Ok(row.map(ResumeRecord::try_from).transpose()?)
    }
}

// ---------------------------------------------------------------------------
// In-process
// ---------------------------------------------------------------------------

/// Store used when no database is configured, and in tests. A single mutex
/// guards every operation, so deactivate+insert is atomic.
#[derive(Default)]
pub struct MemoryResumeStore {
    records: Mutex<HashMap<Uuid, ResumeRecord>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn create_active(&self, new: NewResume) -> Result<ResumeRecord, AppError> {
        let mut records = self.records.lock().await;
        let now = Utc::now();

        for record in records.values_mut() {
            if record.user_id == new.user_id && record.is_active {
                record.is_active = false;
                record.updated_at = now;
            }
        }

        let record = ResumeRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            file_name: new.file_name,
            file_size: new.file_size,
            mime_type: new.mime_type,
            storage_key: new.storage_key,
            processing_status: ProcessingStatus::Processing,
            processing_error: None,
            extracted_text: None,
            analysis: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<ResumeRecord>, AppError> {
        let records = self.records.lock().await;
        Ok(records.get(&id).filter(|r| r.user_id == user_id).cloned())
    }

    async fn find_active(&self, user_id: Uuid) -> Result<Option<ResumeRecord>, AppError> {
        let records = self.records.lock().await;
        Ok(records
            .values()
            .find(|r| r.user_id == user_id && r.is_active)
            .cloned())
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeSummary>, AppError> {
        let records = self.records.lock().await;
        let mut owned: Vec<&ResumeRecord> =
            records.values().filter(|r| r.user_id == user_id).collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned.into_iter().map(ResumeSummary::from).collect())
    }

    async fn status(&self, id: Uuid, user_id: Uuid) -> Result<Option<StatusView>, AppError> {
        let records = self.records.lock().await;
        Ok(records
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .map(StatusView::from))
    }

    async fn complete(
        &self,
        id: Uuid,
        extracted_text: &str,
        analysis: &ResumeAnalysis,
    ) -> Result<bool, AppError> {
        let mut records = self.records.lock().await;
        let Some(record) = records
            .get_mut(&id)
            .filter(|r| r.processing_status == ProcessingStatus::Processing)
        else {
            return Ok(false);
        };
        record.processing_status = ProcessingStatus::Completed;
        record.processing_error = None;
        record.extracted_text = Some(extracted_text.to_string());
        record.analysis = Some(analysis.clone());
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<bool, AppError> {
        let mut records = self.records.lock().await;
        let Some(record) = records
            .get_mut(&id)
            .filter(|r| r.processing_status == ProcessingStatus::Processing)
        else {
            return Ok(false);
        };
        record.processing_status = ProcessingStatus::Failed;
        record.processing_error = Some(error.to_string());
        record.extracted_text = None;
        record.analysis = None;
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn reset_for_reprocess(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut records = self.records.lock().await;
        let Some(record) = records
            .get_mut(&id)
            .filter(|r| r.user_id == user_id && r.processing_status.is_terminal())
        else {
            return Ok(false);
        };
        record.processing_status = ProcessingStatus::Processing;
        record.processing_error = None;
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<Option<ResumeRecord>, AppError> {
        let mut records = self.records.lock().await;
        if records.get(&id).is_some_and(|r| r.user_id == user_id) {
            Ok(records.remove(&id))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_resume(user_id: Uuid, name: &str) -> NewResume {
        NewResume {
            user_id,
            file_name: name.to_string(),
            file_size: 2048,
            mime_type: "application/pdf".to_string(),
            storage_key: format!("resumes/{user_id}/{name}"),
        }
    }

    #[tokio::test]
    async fn test_create_active_deactivates_previous() {
        let store = MemoryResumeStore::new();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        let first = store.create_active(new_resume(user, "a.pdf")).await.unwrap();
        let theirs = store.create_active(new_resume(other, "x.pdf")).await.unwrap();
        let second = store.create_active(new_resume(user, "b.pdf")).await.unwrap();

        assert!(!store.find(first.id, user).await.unwrap().unwrap().is_active);
        assert_eq!(store.find_active(user).await.unwrap().unwrap().id, second.id);
        assert!(store.find(theirs.id, other).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_leave_one_active() {
        let store = std::sync::Arc::new(MemoryResumeStore::new());
        let user = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_active(new_resume(user, &format!("{i}.pdf")))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let list = store.list(user).await.unwrap();
        assert_eq!(list.len(), 8);
        assert_eq!(list.iter().filter(|r| r.is_active).count(), 1);
    }

    #[tokio::test]
    async fn test_terminal_writes_only_apply_while_processing() {
        let store = MemoryResumeStore::new();
        let user = Uuid::new_v4();
        let record = store.create_active(new_resume(user, "a.pdf")).await.unwrap();

        assert!(store.fail(record.id, "boom").await.unwrap());
        assert!(!store
            .complete(record.id, "text", &ResumeAnalysis::default())
            .await
            .unwrap());

        let status = store.status(record.id, user).await.unwrap().unwrap();
        assert_eq!(status.processing_status, ProcessingStatus::Failed);
        assert_eq!(status.processing_error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_reset_for_reprocess_requires_terminal_state() {
        let store = MemoryResumeStore::new();
        let user = Uuid::new_v4();
        let record = store.create_active(new_resume(user, "a.pdf")).await.unwrap();

        assert!(!store.reset_for_reprocess(record.id, user).await.unwrap());
        store.fail(record.id, "boom").await.unwrap();
        assert!(!store.reset_for_reprocess(record.id, Uuid::new_v4()).await.unwrap());
        assert!(store.reset_for_reprocess(record.id, user).await.unwrap());

        let status = store.status(record.id, user).await.unwrap().unwrap();
        assert_eq!(status.processing_status, ProcessingStatus::Processing);
        assert!(status.processing_error.is_none());
    }

    #[tokio::test]
    async fn test_records_are_scoped_to_owner() {
        let store = MemoryResumeStore::new();
        let user = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let record = store.create_active(new_resume(user, "a.pdf")).await.unwrap();

        assert!(store.find(record.id, stranger).await.unwrap().is_none());
        assert!(store.status(record.id, stranger).await.unwrap().is_none());
        assert!(store.delete(record.id, stranger).await.unwrap().is_none());
        assert!(store.delete(record.id, user).await.unwrap().is_some());
        assert!(store.find(record.id, user).await.unwrap().is_none());
    }
}
