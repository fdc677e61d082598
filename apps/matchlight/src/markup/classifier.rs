//! Classifier — assigns each non-empty line a semantic region kind.
//!
//! Pure and total: any string maps to exactly one kind, with a fixed
//! precedence order when several patterns match.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The closed set of region kinds a line can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Section,
    Item,
    Requirement,
    Skill,
    Qualification,
    Contact,
    Plain,
}

impl RegionKind {
    /// Address token for this kind, e.g. `section` in `cv_section_4`.
    pub fn token(self) -> &'static str {
        match self {
            RegionKind::Section => "section",
            RegionKind::Item => "item",
            RegionKind::Requirement => "requirement",
            RegionKind::Skill => "skill",
            RegionKind::Qualification => "qualification",
            RegionKind::Contact => "contact",
            RegionKind::Plain => "plain",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "section" => Some(RegionKind::Section),
            "item" => Some(RegionKind::Item),
            "requirement" => Some(RegionKind::Requirement),
            "skill" => Some(RegionKind::Skill),
            "qualification" => Some(RegionKind::Qualification),
            "contact" => Some(RegionKind::Contact),
            "plain" => Some(RegionKind::Plain),
            _ => None,
        }
    }
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Section header vocabulary (CV and JD sections combined).
const SECTION_KEYWORDS: &[&str] = &[
    "EXPERIENCE",
    "EDUCATION",
    "SKILLS",
    "SUMMARY",
    "COMPETENCIES",
    "CERTIFICATIONS",
    "PROJECTS",
    "ACHIEVEMENTS",
    "LANGUAGES",
    "OBJECTIVE",
    "PROFILE",
    "QUALIFICATIONS",
    "EMPLOYMENT",
    "WORK HISTORY",
    "CAREER",
    "BACKGROUND",
    "REQUIREMENTS",
    "RESPONSIBILITIES",
    "ABOUT",
    "COMPANY",
    "BENEFITS",
    "PERKS",
    "JOB DESCRIPTION",
    "DUTIES",
    "POSITION",
    "ROLE",
];

/// Seniority / role keywords that mark a position or requirement line.
const ROLE_KEYWORDS: &[&str] = &[
    "CEO",
    "CTO",
    "CFO",
    "Manager",
    "Director",
    "Engineer",
    "Analyst",
    "Lead",
    "Senior",
    "Junior",
    "Associate",
    "Coordinator",
    "Specialist",
    "Developer",
    "Architect",
    "Consultant",
    "Administrator",
];

const MONTHS: &[&str] = &[
    "January",
    "February",
    "March",
    "April",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
    "Jan",
    "Feb",
    "Mar",
    "Apr",
    "May",
    "Jun",
    "Jul",
    "Aug",
    "Sep",
    "Oct",
    "Nov",
    "Dec",
];

/// Curated technology vocabulary for skill-line detection. Short ambiguous
/// names ("Go", "R", "C") are deliberately absent — they collide with prose.
const SKILL_VOCABULARY: &[&str] = &[
    "Python",
    "JavaScript",
    "TypeScript",
    "Java",
    "Rust",
    "Kotlin",
    "Swift",
    "Ruby",
    "PHP",
    "Scala",
    "React",
    "Angular",
    "Vue",
    "Django",
    "Flask",
    "Spring",
    "Rails",
    "HTML",
    "CSS",
    "SQL",
    "NoSQL",
    "MongoDB",
    "PostgreSQL",
    "MySQL",
    "Redis",
    "Kafka",
    "AWS",
    "Azure",
    "GCP",
    "Docker",
    "Kubernetes",
    "Terraform",
    "Jenkins",
    "Linux",
    "Git",
    "GraphQL",
    "DevOps",
    "Salesforce",
    "ServiceNow",
    "Tableau",
    "PowerBI",
    "Excel",
];

const BULLET_GLYPHS: &[char] = &['•', '-', '*', '●', '○', '◦', '▪', '▫', '►', '⬥'];

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());
static MODAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(required|must have|preferred|should have|nice to have|experience with)\b")
        .unwrap()
});
static SKILL_RE: Lazy<Regex> = Lazy::new(|| {
    let alternatives = SKILL_VOCABULARY
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).unwrap()
});
static YEARS_OF_EXPERIENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d+\+?\s*(years?|yrs?)\b").unwrap());
static DEGREE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(Bachelor|Master|PhD|MBA|degree|certified|certification)\b|\b(B\.S\.|M\.S\.|B\.A\.|M\.A\.|Ph\.D\.)",
    )
    .unwrap()
});
static ENUMERATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w.\-]+@[\w.\-]+\.\w+").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+]?[\s(\-)]?[\d\s(\-)]{10,}").unwrap());
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+|linkedin\.com\S*").unwrap());

/// Classifies one line. Deterministic, side-effect-free, and total; the
/// `line` is the raw line content (indentation intact, no trailing newline).
/// Precedence when several patterns match:
/// section → requirement → skill → qualification → item → contact → plain.
pub fn classify(line: &str, _line_index: usize) -> RegionKind {
    let trimmed = line.trim();

    if is_section_header(trimmed) {
        RegionKind::Section
    } else if is_requirement_line(trimmed) {
        RegionKind::Requirement
    } else if SKILL_RE.is_match(trimmed) {
        RegionKind::Skill
    } else if is_qualification_line(trimmed) {
        RegionKind::Qualification
    } else if is_list_item(line, trimmed) {
        RegionKind::Item
    } else if is_contact_line(trimmed) {
        RegionKind::Contact
    } else {
        RegionKind::Plain
    }
}

fn is_section_header(line: &str) -> bool {
    if line.len() > 2 && line.chars().any(|c| c.is_alphabetic()) && line == line.to_uppercase() {
        return true;
    }
    let upper = line.to_uppercase();
    SECTION_KEYWORDS.iter().any(|kw| upper.contains(kw))
}

fn is_requirement_line(line: &str) -> bool {
    if YEAR_RE.is_match(line) || MODAL_RE.is_match(line) {
        return true;
    }
    if MONTHS.iter().any(|m| contains_word(line, m)) {
        return true;
    }
    ROLE_KEYWORDS.iter().any(|kw| line.contains(kw))
}

fn is_qualification_line(line: &str) -> bool {
    YEARS_OF_EXPERIENCE_RE.is_match(line) || DEGREE_RE.is_match(line)
}

fn is_list_item(raw: &str, trimmed: &str) -> bool {
    if trimmed
        .chars()
        .next()
        .is_some_and(|c| BULLET_GLYPHS.contains(&c))
    {
        return true;
    }
    if ENUMERATOR_RE.is_match(trimmed) {
        return true;
    }
    raw.starts_with("  ") || raw.starts_with('\t')
}

fn is_contact_line(line: &str) -> bool {
    EMAIL_RE.is_match(line) || URL_RE.is_match(line) || PHONE_RE.is_match(line)
}

/// Case-sensitive whole-word containment (month names are cased tokens;
/// a substring check would turn "democracy" into a march).
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(pos, _)| {
        let before_ok = haystack[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[pos + word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}
