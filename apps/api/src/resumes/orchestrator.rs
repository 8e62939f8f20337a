use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::{HeuristicAnalyzer, ResumeAnalysis, ResumeAnalyzer};
use crate::errors::AppError;
use crate::extraction::{DocumentKind, ExtractError, TextExtractor};
use crate::models::resume::{NewResume, ProcessingStatus, ResumeRecord, ResumeSummary, StatusView};

use super::files::{storage_key, FileStore};
use super::store::ResumeStore;

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub min_text_length: usize,
    pub max_file_size: usize,
}

/// A document as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// The freshly created record plus a handle on its background analysis.
/// Dropping the handle detaches the task; it keeps running.
pub struct ScheduledAnalysis {
    pub record: ResumeRecord,
    pub task: JoinHandle<()>,
}

/// Which analyzer produced the stored payload.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Ai(ResumeAnalysis),
    Heuristic {
        analysis: ResumeAnalysis,
        advisory: Option<String>,
    },
}

impl AnalysisOutcome {
    pub fn into_analysis(self) -> ResumeAnalysis {
        match self {
            AnalysisOutcome::Ai(analysis) => analysis,
            AnalysisOutcome::Heuristic {
                mut analysis,
                advisory,
            } => {
                analysis.advisory = advisory;
                analysis
            }
        }
    }
}

/// Drives a resume from upload to a terminal state and answers queries
/// about it. Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    store: Arc<dyn ResumeStore>,
    files: Arc<dyn FileStore>,
    extractor: TextExtractor,
    ai: Option<Arc<dyn ResumeAnalyzer>>,
    heuristic: HeuristicAnalyzer,
    settings: PipelineSettings,
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<dyn ResumeStore>,
        files: Arc<dyn FileStore>,
        ai: Option<Arc<dyn ResumeAnalyzer>>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            files,
            extractor: TextExtractor,
            ai,
            heuristic: HeuristicAnalyzer,
            settings,
        }
    }

    /// Validates and stores an upload, creates its `processing` record and
    /// schedules the analysis. Returns without waiting for the analysis.
    pub async fn submit(&self, user_id: Uuid, upload: Upload) -> Result<ScheduledAnalysis, AppError> {
        if upload.bytes.is_empty() {
            return Err(AppError::NoFile);
        }
        if upload.bytes.len() > self.settings.max_file_size {
            return Err(AppError::FileTooLarge {
                max_bytes: self.settings.max_file_size,
            });
        }
        DocumentKind::from_mime(&upload.mime_type)?;

        let key = storage_key(user_id, &upload.file_name);
        let file_size = upload.bytes.len() as i64;
        self.files
            .put(&key, &upload.mime_type, upload.bytes)
            .await?;

        let new = NewResume {
            user_id,
            file_name: upload.file_name,
            file_size,
            mime_type: upload.mime_type,
            storage_key: key.clone(),
        };
        let record = match self.store.create_active(new).await {
            Ok(record) => record,
            Err(e) => {
                if let Err(cleanup) = self.files.delete(&key).await {
                    warn!("Failed to clean up stored file {key}: {cleanup}");
                }
                return Err(e);
            }
        };

        info!(
            "Resume {} uploaded by {} ({} bytes, {})",
            record.id, user_id, record.file_size, record.mime_type
        );

        let task = self.schedule(record.clone());
        Ok(ScheduledAnalysis { record, task })
    }

    pub async fn get_active(&self, user_id: Uuid) -> Result<ResumeRecord, AppError> {
        self.store
            .find_active(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No active resume found".to_string()))
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<ResumeRecord, AppError> {
        self.store
            .find(id, user_id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeSummary>, AppError> {
        self.store.list(user_id).await
    }

    pub async fn get_status(&self, id: Uuid, user_id: Uuid) -> Result<StatusView, AppError> {
        self.store
            .status(id, user_id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Re-runs the pipeline for a record in a terminal state.
    pub async fn reprocess(&self, id: Uuid, user_id: Uuid) -> Result<ScheduledAnalysis, AppError> {
        let record = self.get(id, user_id).await?;
        if record.processing_status == ProcessingStatus::Processing {
            return Err(AppError::Conflict(format!(
                "Resume {id} is still being processed"
            )));
        }
        if !self.store.reset_for_reprocess(id, user_id).await? {
            return Err(AppError::Conflict(format!(
                "Resume {id} is already being reprocessed"
            )));
        }

        info!("Reprocessing resume {id}");
        let record = self.get(id, user_id).await?;
        let task = self.schedule(record.clone());
        Ok(ScheduledAnalysis { record, task })
    }

    /// Removes the record, then its file. A file that cannot be removed is
    /// logged and left behind.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let record = self
            .store
            .delete(id, user_id)
            .await?
            .ok_or_else(|| not_found(id))?;

        if let Err(e) = self.files.delete(&record.storage_key).await {
            warn!("Failed to delete resume file {}: {e}", record.storage_key);
        }
        info!("Deleted resume {id}");
        Ok(())
    }

    /// Runs the pipeline in an inner task watched by a supervisor, so that an
    /// error or a panic still lands the record in `failed`.
    fn schedule(&self, record: ResumeRecord) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let id = record.id;
            let worker = this.clone();
            let inner = tokio::spawn(async move { worker.process(&record).await });

            let failure = match inner.await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => e.to_string(),
                Err(join_error) if join_error.is_panic() => {
                    panic_message(join_error.into_panic())
                }
                Err(join_error) => format!("Resume processing was aborted: {join_error}"),
            };

            error!("Resume {id} processing failed: {failure}");
            match this.store.fail(id, &failure).await {
                Ok(true) => {}
                Ok(false) => warn!("Resume {id} was no longer processing; failure not recorded"),
                Err(e) => error!("Could not record failure for resume {id}: {e}"),
            }
        })
    }

    async fn process(&self, record: &ResumeRecord) -> Result<(), AppError> {
        let id = record.id;
        info!("Processing resume {id}");

        let bytes = self.files.get(&record.storage_key).await?;
        let text = match self.extract(bytes, &record.mime_type).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Resume {id} extraction failed: {e}");
                if !self.store.fail(id, &e.to_string()).await? {
                    warn!("Resume {id} was no longer processing; failure not recorded");
                }
                return Ok(());
            }
        };

        let outcome = self.analyze(&text).await;
        let provenance = match &outcome {
            AnalysisOutcome::Ai(_) => "ai",
            AnalysisOutcome::Heuristic { .. } => "heuristic",
        };

        if self.store.complete(id, &text, &outcome.into_analysis()).await? {
            info!("Resume {id} processing completed ({provenance} analysis)");
        } else {
            warn!("Resume {id} was no longer processing; analysis discarded");
        }
        Ok(())
    }

    async fn extract(&self, bytes: Bytes, mime_type: &str) -> Result<String, ExtractError> {
        let text = self.extractor.extract(bytes, mime_type).await?;
        let found = text.trim().chars().count();
        if found < self.settings.min_text_length {
            return Err(ExtractError::InsufficientContent {
                found,
                required: self.settings.min_text_length,
            });
        }
        Ok(text)
    }

    /// Never fails: any AI error falls back to the heuristic analyzer.
    async fn analyze(&self, text: &str) -> AnalysisOutcome {
        let Some(ai) = &self.ai else {
            return AnalysisOutcome::Heuristic {
                analysis: self.heuristic.analyze(text),
                advisory: None,
            };
        };

        match ai.analyze(text).await {
            Ok(analysis) => AnalysisOutcome::Ai(analysis),
            Err(e) => {
                warn!("AI analysis via {} failed, using heuristic analysis: {e}", ai.name());
                AnalysisOutcome::Heuristic {
                    analysis: self.heuristic.analyze(text),
                    advisory: Some(format!(
                        "AI analysis unavailable ({e}); heuristic analysis was substituted."
                    )),
                }
            }
        }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Resume {id} not found"))
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match detail {
        Some(detail) => format!("Resume processing crashed: {detail}"),
        None => "Resume processing crashed unexpectedly".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::analysis::{AiError, AnalyzedBy};
    use crate::extraction::{fixtures, MIME_DOC, MIME_DOCX};
    use crate::resumes::files::LocalFileStore;
    use crate::resumes::store::MemoryResumeStore;

    const RESUME_LINES: &[&str] = &[
        "Jane Doe",
        "Senior Software Engineer",
        "jane.doe@example.com | +1 (555) 123-4567",
        "Led a team of five building Rust and Python services on AWS.",
        "Improved p99 latency by 40% using Docker and Kubernetes.",
    ];

    enum Behavior {
        Succeed,
        Fail,
        Panic,
    }

    struct StubAnalyzer {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl StubAnalyzer {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ResumeAnalyzer for StubAnalyzer {
        fn name(&self) -> &str {
            "stub"
        }

        async fn analyze(&self, _text: &str) -> Result<ResumeAnalysis, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Succeed => Ok(ResumeAnalysis {
                    summary: "From the model".to_string(),
                    analyzed_by: AnalyzedBy::Ai,
                    analysis_score: 0.92,
                    ..ResumeAnalysis::default()
                }),
                Behavior::Fail => Err(AiError::RequestFailed("timed out after 30s".to_string())),
                Behavior::Panic => panic!("analyzer exploded"),
            }
        }
    }

    struct Harness {
        orchestrator: AnalysisOrchestrator,
        store: Arc<MemoryResumeStore>,
        dir: tempfile::TempDir,
    }

    fn harness(ai: Option<Arc<dyn ResumeAnalyzer>>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryResumeStore::new());
        let orchestrator = AnalysisOrchestrator::new(
            store.clone(),
            Arc::new(LocalFileStore::new(dir.path())),
            ai,
            PipelineSettings {
                min_text_length: 50,
                max_file_size: 5 * 1024 * 1024,
            },
        );
        Harness {
            orchestrator,
            store,
            dir,
        }
    }

    fn docx_upload(lines: &[&str]) -> Upload {
        Upload {
            file_name: "resume.docx".to_string(),
            mime_type: MIME_DOCX.to_string(),
            bytes: Bytes::from(fixtures::docx(lines, &[])),
        }
    }

    async fn submit_and_wait(h: &Harness, user: Uuid, upload: Upload) -> ResumeRecord {
        let scheduled = h.orchestrator.submit(user, upload).await.unwrap();
        assert_eq!(scheduled.record.processing_status, ProcessingStatus::Processing);
        scheduled.task.await.unwrap();
        h.orchestrator.get(scheduled.record.id, user).await.unwrap()
    }

    #[tokio::test]
    async fn test_ai_success_is_stored_with_ai_provenance() {
        let ai = StubAnalyzer::new(Behavior::Succeed);
        let h = harness(Some(ai.clone()));
        let record = submit_and_wait(&h, Uuid::new_v4(), docx_upload(RESUME_LINES)).await;

        assert_eq!(record.processing_status, ProcessingStatus::Completed);
        let analysis = record.analysis.unwrap();
        assert_eq!(analysis.analyzed_by, AnalyzedBy::Ai);
        assert_eq!(analysis.summary, "From the model");
        assert!(analysis.advisory.is_none());
        assert!(record.extracted_text.unwrap().contains("Jane Doe"));
        assert_eq!(ai.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ai_failure_falls_back_to_heuristic_with_advisory() {
        let h = harness(Some(StubAnalyzer::new(Behavior::Fail)));
        let record = submit_and_wait(&h, Uuid::new_v4(), docx_upload(RESUME_LINES)).await;

        assert_eq!(record.processing_status, ProcessingStatus::Completed);
        assert!(record.processing_error.is_none());
        let analysis = record.analysis.unwrap();
        assert_eq!(analysis.analyzed_by, AnalyzedBy::Heuristic);
        assert_eq!(
            analysis.advisory.as_deref(),
            Some("AI analysis unavailable (AI request failed: timed out after 30s); heuristic analysis was substituted.")
        );
        assert_eq!(
            analysis.contact_info.email.as_deref(),
            Some("jane.doe@example.com")
        );
        assert!(!analysis.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_without_ai_heuristic_has_no_advisory() {
        let h = harness(None);
        let record = submit_and_wait(&h, Uuid::new_v4(), docx_upload(RESUME_LINES)).await;

        let analysis = record.analysis.unwrap();
        assert_eq!(analysis.analyzed_by, AnalyzedBy::Heuristic);
        assert!(analysis.advisory.is_none());
    }

    #[tokio::test]
    async fn test_short_text_fails_without_payload() {
        let ai = StubAnalyzer::new(Behavior::Succeed);
        let h = harness(Some(ai.clone()));
        let record = submit_and_wait(&h, Uuid::new_v4(), docx_upload(&["Jane Doe."])).await;

        assert_eq!(record.processing_status, ProcessingStatus::Failed);
        assert!(record
            .processing_error
            .unwrap()
            .contains("Insufficient text content"));
        assert!(record.analysis.is_none());
        assert!(record.extracted_text.is_none());
        assert_eq!(ai.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupt_document_fails() {
        let h = harness(None);
        let upload = Upload {
            file_name: "resume.doc".to_string(),
            mime_type: MIME_DOC.to_string(),
            bytes: Bytes::from_static(b"this is not a word document at all"),
        };
        let record = submit_and_wait(&h, Uuid::new_v4(), upload).await;

        assert_eq!(record.processing_status, ProcessingStatus::Failed);
        assert!(record.analysis.is_none());
    }

    #[tokio::test]
    async fn test_panicking_analyzer_marks_record_failed() {
        let h = harness(Some(StubAnalyzer::new(Behavior::Panic)));
        let record = submit_and_wait(&h, Uuid::new_v4(), docx_upload(RESUME_LINES)).await;

        assert_eq!(record.processing_status, ProcessingStatus::Failed);
        assert_eq!(
            record.processing_error.as_deref(),
            Some("Resume processing crashed: analyzer exploded")
        );
    }

    #[test]
    fn test_panic_message_keeps_formatted_payloads() {
        assert_eq!(
            panic_message(Box::new(format!("index {} out of range", 7))),
            "Resume processing crashed: index 7 out of range"
        );
        assert_eq!(
            panic_message(Box::new(42u8)),
            "Resume processing crashed unexpectedly"
        );
    }

    #[tokio::test]
    async fn test_second_upload_deactivates_first() {
        let h = harness(None);
        let user = Uuid::new_v4();
        let first = submit_and_wait(&h, user, docx_upload(RESUME_LINES)).await;
        let second = submit_and_wait(&h, user, docx_upload(RESUME_LINES)).await;

        let list = h.orchestrator.list(user).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.iter().filter(|r| r.is_active).count(), 1);
        assert_eq!(h.orchestrator.get_active(user).await.unwrap().id, second.id);
        assert!(!h.orchestrator.get(first.id, user).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected_before_storage() {
        let h = harness(None);
        let user = Uuid::new_v4();
        let upload = Upload {
            file_name: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
            bytes: Bytes::from_static(b"plain text resume"),
        };

        let err = h.orchestrator.submit(user, upload).await.err().unwrap();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
        assert!(h.store.list(user).await.unwrap().is_empty());
        assert!(std::fs::read_dir(h.dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_empty_and_oversized_uploads_rejected() {
        let h = harness(None);
        let user = Uuid::new_v4();

        let mut empty = docx_upload(RESUME_LINES);
        empty.bytes = Bytes::new();
        assert!(matches!(
            h.orchestrator.submit(user, empty).await.err().unwrap(),
            AppError::NoFile
        ));

        let mut huge = docx_upload(RESUME_LINES);
        huge.bytes = Bytes::from(vec![0u8; 5 * 1024 * 1024 + 1]);
        assert!(matches!(
            h.orchestrator.submit(user, huge).await.err().unwrap(),
            AppError::FileTooLarge { .. }
        ));
    }

    #[tokio::test]
    async fn test_reprocess_failed_record_reaches_completed() {
        let h = harness(Some(StubAnalyzer::new(Behavior::Succeed)));
        let user = Uuid::new_v4();

        let scheduled = h.orchestrator.submit(user, docx_upload(RESUME_LINES)).await.unwrap();
        let id = scheduled.record.id;
        scheduled.task.await.unwrap();

        // Force a failed state as if an earlier attempt had crashed.
        let failed = h.store.reset_for_reprocess(id, user).await.unwrap()
            && h.store.fail(id, "earlier failure").await.unwrap();
        assert!(failed);

        let rescheduled = h.orchestrator.reprocess(id, user).await.unwrap();
        assert_eq!(rescheduled.record.processing_status, ProcessingStatus::Processing);
        assert!(rescheduled.record.processing_error.is_none());

        rescheduled.task.await.unwrap();
        let record = h.orchestrator.get(id, user).await.unwrap();
        assert_eq!(record.processing_status, ProcessingStatus::Completed);
        assert_eq!(record.analysis.unwrap().summary, "From the model");
    }

    #[tokio::test]
    async fn test_reprocess_while_processing_conflicts() {
        let h = harness(None);
        let user = Uuid::new_v4();
        let record = h
            .store
            .create_active(NewResume {
                user_id: user,
                file_name: "a.pdf".to_string(),
                file_size: 1,
                mime_type: "application/pdf".to_string(),
                storage_key: "resumes/x/a.pdf".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            h.orchestrator.reprocess(record.id, user).await.err().unwrap(),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            h.orchestrator.reprocess(Uuid::new_v4(), user).await.err().unwrap(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_file() {
        let h = harness(None);
        let user = Uuid::new_v4();
        let record = submit_and_wait(&h, user, docx_upload(RESUME_LINES)).await;

        h.orchestrator.delete(record.id, user).await.unwrap();

        assert!(matches!(
            h.orchestrator.get(record.id, user).await.err().unwrap(),
            AppError::NotFound(_)
        ));
        assert!(!h.dir.path().join(&record.storage_key).exists());
        assert!(matches!(
            h.orchestrator.delete(record.id, user).await.err().unwrap(),
            AppError::NotFound(_)
        ));
    }
}
