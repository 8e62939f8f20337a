// Fixed vocabularies and lookup tables for the heuristic analyzer.
// Terms are lowercase; matching is whole-term and case-insensitive.

use super::ExperienceLevel;

pub const TECHNICAL_SKILLS: &[&str] = &[
    "javascript",
    "typescript",
    "python",
    "java",
    "c++",
    "c#",
    "go",
    "rust",
    "php",
    "ruby",
    "swift",
    "kotlin",
    "scala",
    "sql",
    "html",
    "css",
    "react",
    "angular",
    "vue",
    "node",
    "django",
    "flask",
    "spring",
    "graphql",
    "machine learning",
];

pub const TOOLS: &[&str] = &[
    "git",
    "docker",
    "kubernetes",
    "aws",
    "azure",
    "gcp",
    "terraform",
    "jenkins",
    "linux",
    "mongodb",
    "postgresql",
    "mysql",
    "redis",
    "jira",
    "figma",
    "photoshop",
    "illustrator",
];

pub const SOFT_SKILLS: &[&str] = &[
    "leadership",
    "communication",
    "teamwork",
    "collaboration",
    "problem solving",
    "analytical",
    "creative",
    "management",
    "planning",
    "mentoring",
];

pub const LANGUAGES: &[&str] = &[
    "javascript",
    "typescript",
    "python",
    "java",
    "c++",
    "c#",
    "go",
    "rust",
    "php",
    "ruby",
    "swift",
    "kotlin",
    "scala",
    "sql",
    "english",
    "spanish",
    "french",
    "german",
    "portuguese",
    "mandarin",
    "hindi",
    "arabic",
    "japanese",
];

pub const CERTIFICATIONS: &[&str] = &[
    "aws certified",
    "pmp",
    "cissp",
    "ccna",
    "comptia",
    "cka",
    "scrum master",
    "cpa",
    "cfa",
    "six sigma",
];

pub const INDUSTRIES: &[(&str, &[&str])] = &[
    (
        "technology",
        &[
            "software",
            "developer",
            "engineer",
            "programmer",
            "tech",
            "information technology",
        ],
    ),
    ("design", &["designer", "ui", "ux", "graphic", "creative"]),
    (
        "marketing",
        &["marketing", "seo", "social media", "advertising"],
    ),
    (
        "finance",
        &["finance", "accounting", "banking", "investment"],
    ),
    ("healthcare", &["healthcare", "medical", "nurse", "doctor"]),
    (
        "education",
        &["teacher", "education", "training", "academic"],
    ),
];

pub const INDUSTRY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "technology",
        &["agile", "scrum", "ci/cd", "api", "database"],
    ),
    (
        "design",
        &["user experience", "wireframing", "prototyping", "brand"],
    ),
    ("marketing", &["analytics", "conversion", "campaign", "roi"]),
    (
        "finance",
        &["financial analysis", "budgeting", "forecasting", "risk"],
    ),
];

pub const DEFAULT_MISSING_KEYWORDS: &[&str] = &["leadership", "teamwork", "communication"];

pub const INDUSTRY_SKILLS: &[(&str, &[&str])] = &[
    (
        "technology",
        &["cloud computing", "microservices", "devops", "ai/ml"],
    ),
    (
        "design",
        &[
            "user research",
            "accessibility",
            "design systems",
            "animation",
        ],
    ),
    (
        "marketing",
        &[
            "data analytics",
            "automation",
            "social media",
            "content strategy",
        ],
    ),
    (
        "finance",
        &[
            "financial modeling",
            "risk assessment",
            "compliance",
            "fintech",
        ],
    ),
];

pub const DEFAULT_SKILL_GAPS: &[&str] = &[
    "Communication skills",
    "Project management",
    "Data analysis",
];

pub const ACTION_VERBS: &[&str] = &[
    "managed",
    "led",
    "developed",
    "created",
    "implemented",
    "improved",
    "achieved",
];

/// Level words checked in order; the first hit wins.
pub const LEVEL_WORDS: &[(&[&str], ExperienceLevel)] = &[
    (&["senior", "lead"], ExperienceLevel::Senior),
    (&["junior", "entry"], ExperienceLevel::Junior),
    (&["intern", "student"], ExperienceLevel::Entry),
    (&["manager", "director"], ExperienceLevel::Lead),
];

pub fn level_blurb(level: ExperienceLevel) -> &'static str {
    match level {
        ExperienceLevel::Entry => {
            "They are building foundational skills and eager to contribute to dynamic teams."
        }
        ExperienceLevel::Junior => {
            "They are developing specialized expertise and taking on increasing responsibilities."
        }
        ExperienceLevel::Mid => {
            "They bring proven problem-solving abilities and project delivery experience."
        }
        ExperienceLevel::Senior => "They offer leadership capabilities and deep technical expertise.",
        ExperienceLevel::Lead => {
            "They provide strategic thinking and mentorship to drive team success."
        }
        ExperienceLevel::Executive => {
            "They bring valuable experience and skills to any organization."
        }
    }
}

pub fn current_level_assessment(level: ExperienceLevel) -> &'static str {
    match level {
        ExperienceLevel::Entry => "Beginning career with foundational skills",
        ExperienceLevel::Junior => "Early career professional building experience",
        ExperienceLevel::Mid => "Experienced professional with proven track record",
        ExperienceLevel::Senior => "Senior professional with leadership experience",
        ExperienceLevel::Lead => "Leadership role with strategic responsibilities",
        ExperienceLevel::Executive => "Professional with industry experience",
    }
}

pub fn next_steps(level: ExperienceLevel) -> &'static [&'static str] {
    match level {
        ExperienceLevel::Entry => &[
            "Gain specialized skills",
            "Seek mentorship opportunities",
            "Build portfolio projects",
        ],
        ExperienceLevel::Junior => &[
            "Take on larger projects",
            "Develop leadership skills",
            "Pursue certifications",
        ],
        ExperienceLevel::Mid => &[
            "Lead team initiatives",
            "Mentor junior staff",
            "Consider management track",
        ],
        ExperienceLevel::Senior => &[
            "Strategic planning roles",
            "Cross-functional leadership",
            "Industry expertise",
        ],
        ExperienceLevel::Lead => &[
            "Executive positions",
            "Board opportunities",
            "Thought leadership",
        ],
        ExperienceLevel::Executive => &[
            "Continue professional development",
            "Expand network",
            "Seek new challenges",
        ],
    }
}

pub const ATS_SUGGESTIONS: &[&str] = &[
    "Add more quantified achievements with numbers",
    "Include industry-specific keywords",
    "Use action verbs to start bullet points",
];

pub const RECOMMENDATIONS: &[&str] = &[
    "Add specific achievements with measurable results",
    "Include more industry-relevant keywords",
    "Re-run the analysis once AI analysis is available for detailed feedback",
];
