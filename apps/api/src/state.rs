use crate::config::Config;
use crate::resumes::AnalysisOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub resumes: AnalysisOrchestrator,
    pub config: Config,
}
