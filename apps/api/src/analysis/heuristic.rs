//! Heuristic Analyzer: deterministic, local extraction over plain text.
//!
//! Always available and never fails. Scores are capped below what the AI path
//! can report (`analysis_score` ≤ 0.7, overall ≤ 85); provenance is carried
//! explicitly in `analyzed_by` regardless.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::vocabulary::{
    current_level_assessment, level_blurb, next_steps, ACTION_VERBS, ATS_SUGGESTIONS,
    CERTIFICATIONS, DEFAULT_MISSING_KEYWORDS, DEFAULT_SKILL_GAPS, INDUSTRIES, INDUSTRY_KEYWORDS,
    INDUSTRY_SKILLS, LANGUAGES, LEVEL_WORDS, RECOMMENDATIONS, SOFT_SKILLS, TECHNICAL_SKILLS, TOOLS,
};
use super::{
    AnalyzedBy, AtsOptimization, CareerPath, ContactInfo, ExperienceLevel, OverallScore,
    ResumeAnalysis, Skills,
};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}").unwrap()
});

static LINKEDIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)linkedin\.com/in/[\w-]+").unwrap());

static WEBSITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://[^\s,;|]+|(?:www\.)?(?:github|gitlab)\.com/[\w-]+").unwrap()
});

static QUANTIFIED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+%|\d+\+|\$\d+|\d+ years?|\d+ months?").unwrap());

/// Lines considered for the name guess.
const NAME_SEARCH_LINES: usize = 5;
const HEURISTIC_SCORE_CAP: f64 = 85.0;
const HEURISTIC_CONFIDENCE_CAP: f64 = 0.7;

/// Skills matched against the fixed vocabularies.
#[derive(Debug, Default)]
struct SkillMatches {
    technical: Vec<String>,
    tools: Vec<String>,
    soft: Vec<String>,
    languages: Vec<String>,
    certifications: Vec<String>,
    /// Technical skills and tools, deduplicated, in vocabulary order.
    all: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn analyze(&self, text: &str) -> ResumeAnalysis {
        let lower = text.to_lowercase();
        let skills = match_skills(&lower);
        let name = guess_name(text);
        let level = detect_experience_level(&lower);
        let industries = detect_industries(&lower);

        let email = EMAIL_RE.find(text).map(|m| m.as_str().to_string());
        let linkedin = LINKEDIN_RE
            .find(text)
            .map(|m| format!("https://{}", m.as_str()));

        let matched = skills.all.len();
        let summary = build_summary(name.as_deref(), text.len(), &skills, &industries, level);

        ResumeAnalysis {
            summary,
            contact_info: ContactInfo {
                name,
                phone: PHONE_RE.find(text).map(|m| m.as_str().trim().to_string()),
                location: None,
                website: find_website(text),
                linkedin: linkedin.clone(),
                email: email.clone(),
            },
            strengths: strengths(text.len(), &skills),
            improvements: improvements(text, &lower, matched),
            ats_optimization: AtsOptimization {
                score: if matched > 5 { 70.0 } else { 50.0 },
                missing_keywords: missing_keywords(&industries),
                suggestions: to_strings(ATS_SUGGESTIONS),
            },
            overall_score: OverallScore {
                score: overall_score(text.len(), matched, email.is_some(), linkedin.is_some()),
                breakdown: breakdown(text.len(), matched),
                feedback: "Resume analyzed with text pattern matching. AI analysis provides more \
                           detailed insights when available."
                    .to_string(),
            },
            recommendations: to_strings(RECOMMENDATIONS),
            keywords: skills.all.clone(),
            career_path: CareerPath {
                current_level: current_level_assessment(level).to_string(),
                next_steps: to_strings(next_steps(level)),
                skill_gaps: skill_gaps(&industries, &skills.all),
            },
            industry_tags: industries,
            experience_level: level,
            analysis_score: (0.4 + 0.03 * matched as f64).min(HEURISTIC_CONFIDENCE_CAP),
            skills: Skills {
                technical: skills.technical,
                tools: skills.tools,
                soft: skills.soft,
                languages: skills.languages,
                certifications: skills.certifications,
            },
            experience: Vec::new(),
            education: Vec::new(),
            analyzed_by: AnalyzedBy::Heuristic,
            advisory: None,
        }
    }
}

/// True when `term` occurs in `haystack` bounded by non-alphanumeric characters
/// (or the ends of the string). Both inputs are expected to be lowercase.
pub(crate) fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn matching(lower: &str, vocabulary: &[&str]) -> Vec<String> {
    vocabulary
        .iter()
        .filter(|term| contains_term(lower, term))
        .map(|term| term.to_string())
        .collect()
}

fn match_skills(lower: &str) -> SkillMatches {
    let technical = matching(lower, TECHNICAL_SKILLS);
    let tools = matching(lower, TOOLS);
    let mut all = technical.clone();
    for tool in &tools {
        if !all.contains(tool) {
            all.push(tool.clone());
        }
    }
    SkillMatches {
        soft: matching(lower, SOFT_SKILLS),
        languages: matching(lower, LANGUAGES),
        certifications: matching(lower, CERTIFICATIONS),
        technical,
        tools,
        all,
    }
}

/// First short, letters-only line near the top of the document.
fn guess_name(text: &str) -> Option<String> {
    text.lines()
        .take(NAME_SEARCH_LINES)
        .map(str::trim)
        .find(|line| {
            line.len() > 3
                && line.len() < 50
                && line
                    .chars()
                    .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        })
        .map(String::from)
}

fn detect_experience_level(lower: &str) -> ExperienceLevel {
    LEVEL_WORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| contains_term(lower, w)))
        .map(|(_, level)| *level)
        .unwrap_or_default()
}

fn detect_industries(lower: &str) -> Vec<String> {
    INDUSTRIES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| contains_term(lower, k)))
        .map(|(industry, _)| industry.to_string())
        .collect()
}

fn find_website(text: &str) -> Option<String> {
    WEBSITE_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|url| !url.to_lowercase().contains("linkedin"))
        .map(|url| {
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            }
        })
}

fn build_summary(
    name: Option<&str>,
    text_len: usize,
    skills: &SkillMatches,
    industries: &[String],
    level: ExperienceLevel,
) -> String {
    let name = name.unwrap_or("This professional");
    let industry = industries
        .first()
        .map(String::as_str)
        .unwrap_or("technology");

    let mut summary = format!(
        "{name} is a {}-level professional with expertise in {industry}. ",
        level.as_str()
    );

    let skill_count = skills.all.len();
    if skill_count > 5 {
        let top: Vec<&str> = skills.technical.iter().take(3).map(String::as_str).collect();
        summary.push_str(&format!(
            "They demonstrate proficiency across {skill_count} technical areas, including {}. ",
            top.join(", ")
        ));
    } else if skill_count > 0 {
        summary.push_str(&format!(
            "They have experience with {}. ",
            skills.all.join(", ")
        ));
    }

    if !skills.tools.is_empty() {
        let tools: Vec<&str> = skills.tools.iter().take(2).map(String::as_str).collect();
        summary.push_str(&format!(
            "Their toolkit includes modern tools like {}. ",
            tools.join(" and ")
        ));
    }

    if text_len > 1500 {
        summary.push_str("Their comprehensive background shows substantial hands-on experience. ");
    }

    summary.push_str(level_blurb(level));
    summary
}

fn improvements(text: &str, lower: &str, matched: usize) -> Vec<String> {
    let mut suggestions = Vec::new();
    if !QUANTIFIED_RE.is_match(text) {
        suggestions.push(
            "Add quantified achievements with specific numbers (e.g., 'Increased sales by 25%')"
                .to_string(),
        );
    }
    if !ACTION_VERBS.iter().any(|verb| lower.contains(verb)) {
        suggestions.push(
            "Start bullet points with strong action verbs (managed, led, developed, implemented)"
                .to_string(),
        );
    }
    if matched < 5 {
        suggestions.push("Include more relevant technical skills and tools".to_string());
    }
    suggestions.truncate(3);
    suggestions
}

fn strengths(text_len: usize, skills: &SkillMatches) -> Vec<String> {
    let mut strengths = Vec::new();
    if skills.technical.len() > 3 {
        strengths.push("Strong technical skill set with diverse technologies".to_string());
    }
    if text_len > 1500 {
        strengths.push("Comprehensive work experience and detailed background".to_string());
    }
    if skills.tools.len() > 2 {
        strengths.push("Proficient with multiple industry-standard tools".to_string());
    }
    if strengths.is_empty() {
        strengths.push("Resume successfully processed and analyzed".to_string());
        strengths.push("Clear presentation of professional information".to_string());
    }
    strengths.truncate(3);
    strengths
}

fn missing_keywords(industries: &[String]) -> Vec<String> {
    let mut keywords: Vec<String> = industries
        .iter()
        .filter_map(|industry| lookup(INDUSTRY_KEYWORDS, industry))
        .flat_map(|words| words.iter().map(|w| w.to_string()))
        .collect();
    if keywords.is_empty() {
        return to_strings(DEFAULT_MISSING_KEYWORDS);
    }
    keywords.truncate(4);
    keywords
}

fn skill_gaps(industries: &[String], known: &[String]) -> Vec<String> {
    let mut gaps: Vec<String> = industries
        .iter()
        .filter_map(|industry| lookup(INDUSTRY_SKILLS, industry))
        .flat_map(|skills| skills.iter())
        .filter(|skill| !known.iter().any(|k| k.contains(*skill)))
        .map(|skill| skill.to_string())
        .collect();
    if gaps.is_empty() {
        return to_strings(DEFAULT_SKILL_GAPS);
    }
    gaps.truncate(3);
    gaps
}

fn overall_score(text_len: usize, matched: usize, has_email: bool, has_linkedin: bool) -> f64 {
    let mut score = 50.0;
    if text_len > 1000 {
        score += 10.0;
    }
    if text_len > 2000 {
        score += 5.0;
    }
    score += (matched as f64 * 2.0).min(20.0);
    if has_email {
        score += 5.0;
    }
    if has_linkedin {
        score += 5.0;
    }
    score.min(HEURISTIC_SCORE_CAP)
}

fn breakdown(text_len: usize, matched: usize) -> BTreeMap<String, f64> {
    BTreeMap::from([
        (
            "content".to_string(),
            if matched > 3 { 75.0 } else { 60.0 },
        ),
        ("format".to_string(), 70.0),
        (
            "keywords".to_string(),
            if matched > 5 { 80.0 } else { 50.0 },
        ),
        (
            "experience".to_string(),
            if text_len > 1000 { 75.0 } else { 60.0 },
        ),
    ])
}

fn lookup(table: &[(&str, &'static [&'static str])], key: &str) -> Option<&'static [&'static str]> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, values)| *values)
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENIOR_RESUME: &str = "Jane Doe
Senior Software Engineer
jane.doe@example.com | +1 (555) 123-4567 | linkedin.com/in/janedoe | https://github.com/janedoe

Experience
Led a team of 6 engineers building Rust and Python services on AWS with Docker and Kubernetes.
Developed React and TypeScript dashboards, improved latency by 40%.
Strong communication and leadership skills.";

    #[test]
    fn test_contact_extraction() {
        let analysis = HeuristicAnalyzer.analyze(SENIOR_RESUME);
        let contact = &analysis.contact_info;
        assert_eq!(contact.name.as_deref(), Some("Jane Doe"));
        assert_eq!(contact.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("+1 (555) 123-4567"));
        assert_eq!(
            contact.linkedin.as_deref(),
            Some("https://linkedin.com/in/janedoe")
        );
        assert_eq!(
            contact.website.as_deref(),
            Some("https://github.com/janedoe")
        );
    }

    #[test]
    fn test_skill_categories() {
        let analysis = HeuristicAnalyzer.analyze(SENIOR_RESUME);
        let skills = &analysis.skills;
        assert!(skills.technical.contains(&"rust".to_string()));
        assert!(skills.technical.contains(&"react".to_string()));
        assert!(skills.tools.contains(&"docker".to_string()));
        assert!(skills.tools.contains(&"kubernetes".to_string()));
        assert!(skills.soft.contains(&"leadership".to_string()));
        assert!(skills.languages.contains(&"python".to_string()));
        // "go" must not match inside other words such as "good" or "google".
        assert!(!skills.technical.contains(&"go".to_string()));
    }

    #[test]
    fn test_whole_term_matching() {
        assert!(contains_term("i write go daily", "go"));
        assert!(!contains_term("a good engineer", "go"));
        assert!(contains_term("c++, rust", "c++"));
        assert!(contains_term("node.js services", "node"));
        assert!(!contains_term("javascript", "java"));
    }

    #[test]
    fn test_experience_level_order() {
        assert_eq!(
            detect_experience_level("senior engineer and former intern"),
            ExperienceLevel::Senior
        );
        assert_eq!(
            detect_experience_level("computer science student"),
            ExperienceLevel::Entry
        );
        assert_eq!(
            detect_experience_level("engineering manager"),
            ExperienceLevel::Lead
        );
        assert_eq!(detect_experience_level("engineer"), ExperienceLevel::Mid);
    }

    #[test]
    fn test_industry_detection() {
        let industries = detect_industries("software engineer with a marketing background");
        assert_eq!(industries, vec!["technology", "marketing"]);
    }

    #[test]
    fn test_scores_stay_below_heuristic_caps() {
        let long = SENIOR_RESUME.repeat(20);
        let analysis = HeuristicAnalyzer.analyze(&long);
        assert!(analysis.overall_score.score <= HEURISTIC_SCORE_CAP);
        assert!(analysis.analysis_score <= HEURISTIC_CONFIDENCE_CAP);
        assert_eq!(analysis.analyzed_by, AnalyzedBy::Heuristic);
    }

    #[test]
    fn test_overall_score_formula() {
        // 50 base + 10 (>1000 chars) + 2*3 skills + 5 email
        assert_eq!(overall_score(1200, 3, true, false), 71.0);
        assert_eq!(overall_score(100, 0, false, false), 50.0);
    }

    #[test]
    fn test_empty_text_still_produces_complete_payload() {
        let analysis = HeuristicAnalyzer.analyze("");
        assert!(analysis.skills.technical.is_empty());
        assert!(analysis.keywords.is_empty());
        assert_eq!(analysis.strengths.len(), 2);
        assert_eq!(
            analysis.ats_optimization.missing_keywords,
            vec!["leadership", "teamwork", "communication"]
        );
        assert_eq!(analysis.career_path.skill_gaps.len(), 3);
        assert!(analysis.summary.starts_with("This professional is a mid-level"));
    }

    #[test]
    fn test_name_guess_skips_lines_with_symbols() {
        let text = "resume.pdf\njohn@x.io\nJohn Smith\nEngineer";
        assert_eq!(guess_name(text).as_deref(), Some("John Smith"));
    }
}
