// Lenient conversion of a model's JSON reply into `ResumeAnalysis`.
// Missing or mistyped fields fall back to empty/neutral values; nothing here fails.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use super::{
    clamp_score, AnalyzedBy, AtsOptimization, CareerPath, ContactInfo, EducationEntry,
    ExperienceEntry, ExperienceLevel, OverallScore, ResumeAnalysis, Skills,
};

const DEFAULT_SUMMARY: &str = "Professional summary not available";
const DEFAULT_ANALYSIS_SCORE: f64 = 0.5;
const DEFAULT_ATS_SCORE: f64 = 50.0;
const DEFAULT_OVERALL_SCORE: f64 = 50.0;

pub(crate) fn analysis_from_value(root: &Map<String, Value>) -> ResumeAnalysis {
    let contact = object(root.get("contactInfo"));
    let skills = object(root.get("skills"));
    let ats = object(root.get("atsOptimization"));
    let overall = object(root.get("overallScore"));
    let career = object(root.get("careerPath"));

    ResumeAnalysis {
        summary: opt_string(root.get("summary")).unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
        contact_info: ContactInfo {
            name: opt_string(contact.get("name")),
            email: opt_string(contact.get("email")),
            phone: opt_string(contact.get("phone")),
            location: opt_string(contact.get("location")),
            linkedin: opt_string(contact.get("linkedin")),
            website: opt_string(contact.get("website")),
        },
        skills: Skills {
            technical: string_list(skills.get("technical")),
            tools: string_list(skills.get("tools")),
            soft: string_list(skills.get("soft")),
            languages: string_list(skills.get("languages")),
            certifications: string_list(skills.get("certifications")),
        },
        experience: objects(root.get("experience"))
            .map(|entry| ExperienceEntry {
                title: opt_string(entry.get("title")),
                company: opt_string(entry.get("company")),
                duration: opt_string(entry.get("duration").or_else(|| entry.get("dates"))),
                location: opt_string(entry.get("location")),
                description: opt_string(entry.get("description")),
                achievements: string_list(entry.get("achievements")),
            })
            .collect(),
        education: objects(root.get("education"))
            .map(|entry| EducationEntry {
                degree: opt_string(entry.get("degree")),
                institution: opt_string(entry.get("institution")),
                graduation_year: opt_string(entry.get("graduationYear")),
                gpa: opt_string(entry.get("gpa")),
            })
            .collect(),
        strengths: string_list(root.get("strengths")),
        improvements: string_list(root.get("improvements")),
        ats_optimization: AtsOptimization {
            score: clamp_score(number_or(ats.get("score"), DEFAULT_ATS_SCORE), 100.0),
            missing_keywords: string_list(ats.get("missingKeywords")),
            suggestions: string_list(ats.get("suggestions")),
        },
        overall_score: OverallScore {
            score: clamp_score(number_or(overall.get("score"), DEFAULT_OVERALL_SCORE), 100.0),
            breakdown: breakdown(overall.get("breakdown")),
            feedback: opt_string(overall.get("feedback")).unwrap_or_default(),
        },
        recommendations: string_list(root.get("recommendations")),
        keywords: string_list(root.get("keywords")),
        industry_tags: string_list(root.get("industryTags")),
        experience_level: root
            .get("experienceLevel")
            .and_then(Value::as_str)
            .and_then(ExperienceLevel::from_label)
            .unwrap_or_default(),
        analysis_score: analysis_score(root.get("analysisScore")),
        career_path: CareerPath {
            current_level: opt_string(career.get("currentLevel")).unwrap_or_default(),
            next_steps: string_list(career.get("nextSteps")),
            skill_gaps: string_list(career.get("skillGaps")),
        },
        analyzed_by: AnalyzedBy::Ai,
        advisory: None,
    }
}

static EMPTY: Lazy<Map<String, Value>> = Lazy::new(Map::new);

fn object(value: Option<&Value>) -> &Map<String, Value> {
    value.and_then(Value::as_object).unwrap_or(&*EMPTY)
}

fn objects<'a>(value: Option<&'a Value>) -> impl Iterator<Item = &'a Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

/// Non-empty strings; numbers are rendered (e.g. a numeric graduation year).
fn opt_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("null"))
                .then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// String entries of an array; anything else is dropped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| opt_string(Some(v))).collect())
        .unwrap_or_default()
}

fn number_or(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(default)
}

fn analysis_score(value: Option<&Value>) -> f64 {
    let raw = number_or(value, DEFAULT_ANALYSIS_SCORE);
    // Models sometimes answer on a percentage scale.
    let scaled = if raw > 1.0 && raw <= 100.0 { raw / 100.0 } else { raw };
    clamp_score(scaled, 1.0)
}

fn breakdown(value: Option<&Value>) -> BTreeMap<String, f64> {
    object(value)
        .iter()
        .filter_map(|(category, score)| {
            let score = number_or(Some(score), f64::NAN);
            (!score.is_nan()).then(|| (category.clone(), clamp_score(score, 100.0)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coerce(value: Value) -> ResumeAnalysis {
        analysis_from_value(value.as_object().unwrap())
    }

    #[test]
    fn test_empty_object_yields_complete_defaults() {
        let analysis = coerce(json!({}));
        assert_eq!(analysis.summary, DEFAULT_SUMMARY);
        assert!(analysis.skills.tools.is_empty());
        assert!(analysis.experience.is_empty());
        assert_eq!(analysis.analysis_score, DEFAULT_ANALYSIS_SCORE);
        assert_eq!(analysis.ats_optimization.score, DEFAULT_ATS_SCORE);
        assert_eq!(analysis.experience_level, ExperienceLevel::Mid);
        assert_eq!(analysis.analyzed_by, AnalyzedBy::Ai);
    }

    #[test]
    fn test_wrong_types_fall_back() {
        let analysis = coerce(json!({
            "skills": "rust, go",
            "keywords": ["rust", 42, null, {"x": 1}, "  "],
            "experience": [{"title": "Engineer", "achievements": "many"}, "garbage"],
            "contactInfo": ["not", "an", "object"],
            "overallScore": {"score": "not a number", "breakdown": {"content": "88", "format": true}}
        }));
        assert!(analysis.skills.technical.is_empty());
        assert_eq!(analysis.keywords, vec!["rust", "42"]);
        assert_eq!(analysis.experience.len(), 1);
        assert_eq!(analysis.experience[0].title.as_deref(), Some("Engineer"));
        assert!(analysis.experience[0].achievements.is_empty());
        assert!(analysis.contact_info.email.is_none());
        assert_eq!(analysis.overall_score.score, DEFAULT_OVERALL_SCORE);
        assert_eq!(analysis.overall_score.breakdown.get("content"), Some(&88.0));
        assert!(!analysis.overall_score.breakdown.contains_key("format"));
    }

    #[test]
    fn test_scores_are_clamped_and_scaled() {
        let analysis = coerce(json!({
            "analysisScore": 87,
            "atsOptimization": {"score": 140},
            "overallScore": {"score": "72.5"}
        }));
        assert!((analysis.analysis_score - 0.87).abs() < 1e-9);
        assert_eq!(analysis.ats_optimization.score, 100.0);
        assert_eq!(analysis.overall_score.score, 72.5);
    }

    #[test]
    fn test_experience_level_clamped_to_default() {
        assert_eq!(
            coerce(json!({"experienceLevel": "galactic"})).experience_level,
            ExperienceLevel::Mid
        );
        assert_eq!(
            coerce(json!({"experienceLevel": "Senior"})).experience_level,
            ExperienceLevel::Senior
        );
    }

    #[test]
    fn test_null_string_literal_is_treated_as_missing() {
        let analysis = coerce(json!({"contactInfo": {"name": "null", "email": "a@b.co"}}));
        assert!(analysis.contact_info.name.is_none());
        assert_eq!(analysis.contact_info.email.as_deref(), Some("a@b.co"));
    }
}
