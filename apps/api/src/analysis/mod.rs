//! Structured resume analysis.
//!
//! Two producers share one output schema, [`ResumeAnalysis`]:
//! - [`ai::AiAnalyzer`] calls a chat-completion endpoint and may fail;
//! - [`heuristic::HeuristicAnalyzer`] matches patterns locally and never fails.
//!
//! Every collection in the schema is a `Vec`, so a payload from either
//! producer can be consumed without special-casing missing lists.

pub mod ai;
mod coerce;
pub mod heuristic;
pub mod prompts;
mod vocabulary;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ai::AiAnalyzer;
pub use heuristic::HeuristicAnalyzer;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI service not configured")]
    Unavailable,

    #[error("AI request failed: {0}")]
    RequestFailed(String),

    #[error("AI response invalid: {0}")]
    ResponseInvalid(String),
}

/// A fallible analyzer backed by a remote model.
///
/// Carried by the orchestrator as `Option<Arc<dyn ResumeAnalyzer>>`; `None`
/// means heuristic-only mode.
#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn analyze(&self, text: &str) -> Result<ResumeAnalysis, AiError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Junior,
    #[default]
    Mid,
    Senior,
    Lead,
    Executive,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
            ExperienceLevel::Executive => "executive",
        }
    }

    /// Maps a free-form label onto a level. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .trim()
            .to_lowercase()
            .replace(['-', '_'], " ")
            .replace(" level", "");
        let level = match normalized.trim() {
            "entry" | "intern" | "internship" | "graduate" | "student" => ExperienceLevel::Entry,
            "junior" | "associate" => ExperienceLevel::Junior,
            "mid" | "middle" | "intermediate" | "mid senior" => ExperienceLevel::Mid,
            "senior" | "experienced" => ExperienceLevel::Senior,
            "lead" | "principal" | "staff" | "manager" => ExperienceLevel::Lead,
            "executive" | "director" | "vp" | "c suite" => ExperienceLevel::Executive,
            _ => return None,
        };
        Some(level)
    }
}

/// Which analyzer produced a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzedBy {
    Ai,
    #[default]
    Heuristic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub technical: Vec<String>,
    pub tools: Vec<String>,
    pub soft: Vec<String>,
    pub languages: Vec<String>,
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub title: Option<String>,
    pub company: Option<String>,
    pub duration: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub graduation_year: Option<String>,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtsOptimization {
    pub score: f64, // 0 – 100
    pub missing_keywords: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverallScore {
    pub score: f64, // 0 – 100
    pub breakdown: BTreeMap<String, f64>,
    pub feedback: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerPath {
    pub current_level: String,
    pub next_steps: Vec<String>,
    pub skill_gaps: Vec<String>,
}

/// Full structured analysis of one resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeAnalysis {
    pub summary: String,
    pub contact_info: ContactInfo,
    pub skills: Skills,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub ats_optimization: AtsOptimization,
    pub overall_score: OverallScore,
    pub recommendations: Vec<String>,
    pub keywords: Vec<String>,
    pub industry_tags: Vec<String>,
    pub experience_level: ExperienceLevel,
    pub analysis_score: f64, // 0.0 – 1.0
    pub career_path: CareerPath,
    pub analyzed_by: AnalyzedBy,
    /// Non-fatal note, set when the AI path failed and heuristics stood in.
    pub advisory: Option<String>,
}

/// Clamps a score into `[0, max]`, mapping NaN to zero.
pub(crate) fn clamp_score(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}
