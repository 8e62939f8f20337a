// Resume analysis LLM prompt templates.
// All prompts for the analysis module are defined here.

/// Upper bound on resume characters embedded in the prompt.
pub const MAX_PROMPT_CHARS: usize = 12_000;

pub const ANALYSIS_SYSTEM: &str = "\
You are an expert HR professional and resume analyst. \
Extract and structure information from resumes accurately and professionally. \
You MUST respond with valid JSON only. \
Do NOT include any text outside the JSON object. \
Do NOT include explanations or apologies.";

pub const ANALYSIS_PROMPT: &str = r#"Provide a comprehensive analysis of this resume with actionable insights and improvement suggestions.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "summary": "string: 5-6 sentence professional summary specific to this person's background",
  "contactInfo": {
    "name": "string | null",
    "email": "string | null",
    "phone": "string | null",
    "location": "string | null",
    "linkedin": "string | null",
    "website": "string | null"
  },
  "skills": {
    "technical": ["string"],
    "soft": ["string"],
    "tools": ["string"],
    "languages": ["string: programming or spoken languages"],
    "certifications": ["string"]
  },
  "experience": [
    {
      "title": "string",
      "company": "string",
      "duration": "string: employment dates",
      "location": "string | null",
      "description": "string",
      "achievements": ["string"]
    }
  ],
  "education": [
    {
      "degree": "string: degree and field",
      "institution": "string",
      "graduationYear": "string | null",
      "gpa": "string | null"
    }
  ],
  "strengths": ["string"],
  "improvements": ["string: specific, actionable"],
  "atsOptimization": {
    "score": "number 0-100",
    "missingKeywords": ["string"],
    "suggestions": ["string"]
  },
  "overallScore": {
    "score": "number 0-100",
    "breakdown": {"content": "number 0-100", "format": "number 0-100", "keywords": "number 0-100", "experience": "number 0-100"},
    "feedback": "string"
  },
  "recommendations": ["string: priority action items"],
  "keywords": ["string: ATS-relevant keywords found in the resume"],
  "industryTags": ["string"],
  "experienceLevel": "entry" | "junior" | "mid" | "senior" | "lead" | "executive",
  "analysisScore": "number 0.0-1.0: your confidence in this analysis",
  "careerPath": {
    "currentLevel": "string",
    "nextSteps": ["string"],
    "skillGaps": ["string"]
  }
}

RULES:
1. Give realistic scores based on the actual resume content
2. Use null for contact fields that are not present; never invent them
3. Return ONLY the JSON object. No code fences or other text."#;

/// Embeds the resume text into the analysis prompt, truncating on a char boundary.
pub fn build_analysis_prompt(resume_text: &str) -> String {
    let text = match resume_text.char_indices().nth(MAX_PROMPT_CHARS) {
        Some((cut, _)) => &resume_text[..cut],
        None => resume_text,
    };
    ANALYSIS_PROMPT.replace("{resume_text}", text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text() {
        let prompt = build_analysis_prompt("  Jane Doe, Rust engineer  ");
        assert!(prompt.contains("RESUME TEXT:\nJane Doe, Rust engineer\n"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_prompt_truncates_long_text_on_char_boundary() {
        let long = "é".repeat(MAX_PROMPT_CHARS + 500);
        let prompt = build_analysis_prompt(&long);
        assert_eq!(prompt.matches('é').count(), MAX_PROMPT_CHARS);
    }
}
