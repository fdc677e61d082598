//! Heuristic extraction — the no-credential degradation path.
//!
//! Regex and keyword scans produce a best-effort record from plain text.
//! Confidence is capped low so downstream consumers can tell a degraded
//! record from a provider extraction at a glance.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::records::{CvRecord, ExperienceEntry, JobRecord};

/// Ceiling for heuristic confidence — never competes with the provider.
pub const FALLBACK_CONFIDENCE: f64 = 0.2;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}").unwrap()
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s|,;]+|www\.[^\s|,;]+").unwrap());

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    // "2019 - 2023", "2020 – Present", "2021-current"
    Regex::new(r"(?i)\b((19|20)\d{2})\s*[-–—]\s*((19|20)\d{2}|present|current|now)\b").unwrap()
});

/// Technology vocabulary for keyword skill scans. Short names that the
/// classifier deliberately avoids are safe here because matching is
/// word-boundary exact against the raw text.
const TECH_KEYWORDS: &[&str] = &[
    "Python",
    "Java",
    "JavaScript",
    "TypeScript",
    "Rust",
    "Go",
    "C++",
    "C#",
    "Ruby",
    "PHP",
    "Swift",
    "Kotlin",
    "Scala",
    "SQL",
    "PostgreSQL",
    "MySQL",
    "MongoDB",
    "Redis",
    "Kafka",
    "Docker",
    "Kubernetes",
    "Terraform",
    "AWS",
    "Azure",
    "GCP",
    "Linux",
    "Git",
    "React",
    "Angular",
    "Vue",
    "Node.js",
    "Django",
    "Flask",
    "Spring",
    "GraphQL",
    "REST",
    "gRPC",
    "TensorFlow",
    "PyTorch",
    "Spark",
    "Hadoop",
    "Jenkins",
    "CI/CD",
    "Agile",
    "Scrum",
];

static TECH_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = TECH_KEYWORDS
        .iter()
        .map(|kw| regex::escape(kw))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)(^|[^A-Za-z0-9+#.])({alternation})($|[^A-Za-z0-9+#])")).unwrap()
});

const TITLE_WORDS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "analyst",
    "architect",
    "designer",
    "scientist",
    "consultant",
    "lead",
    "director",
    "administrator",
    "specialist",
];

/// Best-effort CV extraction from plain text.
pub fn extract_cv(text: &str) -> CvRecord {
    let mut record = CvRecord {
        email: first_match(&EMAIL_RE, text),
        phone: first_match(&PHONE_RE, text),
        full_name: guess_name(text),
        key_skills: scan_skills(text),
        work_experience: scan_experience(text),
        raw_text: text.to_string(),
        confidence_score: FALLBACK_CONFIDENCE,
        parsing_notes: vec![
            "extracted heuristically without a provider; fields are best-effort".to_string(),
        ],
        ..CvRecord::default()
    };

    for url in URL_RE.find_iter(text) {
        let url = url.as_str().trim_end_matches(['.', ')']);
        if url.to_ascii_lowercase().contains("linkedin.com") {
            if record.linkedin_url.is_empty() {
                record.linkedin_url = url.to_string();
            }
        } else if record.portfolio_url.is_empty() {
            record.portfolio_url = url.to_string();
        }
    }

    debug!(
        skills = record.key_skills.len(),
        experience = record.work_experience.len(),
        "heuristic CV extraction"
    );
    record
}

/// Best-effort job-posting extraction from plain text.
pub fn extract_jd(text: &str) -> JobRecord {
    let required_skills = scan_skills(text);
    let required_experience: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_ascii_lowercase();
            !line.is_empty()
                && (lower.contains("years of experience")
                    || lower.contains("years' experience")
                    || lower.contains("must have")
                    || lower.starts_with("required"))
        })
        .map(str::to_string)
        .collect();

    let record = JobRecord {
        job_title: guess_job_title(text),
        required_skills,
        required_experience,
        raw_text: text.to_string(),
        confidence_score: FALLBACK_CONFIDENCE,
        parsing_notes: vec![
            "extracted heuristically without a provider; fields are best-effort".to_string(),
        ],
        ..JobRecord::default()
    };

    debug!(
        required_skills = record.required_skills.len(),
        "heuristic JD extraction"
    );
    record
}

fn first_match(re: &Regex, text: &str) -> String {
    re.find(text).map(|m| m.as_str().to_string()).unwrap_or_default()
}

/// The name is usually one of the first few lines: short, no digits, no
/// contact markers, two to four capitalized words.
fn guess_name(text: &str) -> String {
    for line in text.lines().take(5) {
        let line = line.trim();
        if line.is_empty() || line.len() > 60 {
            continue;
        }
        if line.contains('@') || line.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        if (2..=4).contains(&words.len())
            && words.iter().all(|w| {
                w.chars()
                    .next()
                    .map(|c| c.is_uppercase())
                    .unwrap_or(false)
            })
        {
            return line.to_string();
        }
    }
    String::new()
}

fn guess_job_title(text: &str) -> String {
    for line in text.lines().take(8) {
        let line = line.trim();
        if line.is_empty() || line.len() > 80 {
            continue;
        }
        let lower = line.to_ascii_lowercase();
        if TITLE_WORDS.iter().any(|w| lower.contains(w)) {
            return line.to_string();
        }
    }
    String::new()
}

fn scan_skills(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for keyword in TECH_KEYWORDS {
        let pattern = TECH_RE.captures_iter(text).any(|cap| {
            cap.get(2)
                .map(|m| m.as_str().eq_ignore_ascii_case(keyword))
                .unwrap_or(false)
        });
        if pattern {
            found.push((*keyword).to_string());
        }
    }
    found
}

/// Year-range lines anchor experience entries: the range is the duration,
/// the rest of the line (or the preceding line) names company/position.
fn scan_experience(text: &str) -> Vec<ExperienceEntry> {
    let lines: Vec<&str> = text.lines().collect();
    let mut entries = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(m) = DURATION_RE.find(line) else {
            continue;
        };
        let duration = m.as_str().to_string();
        let mut header = format!("{}{}", &line[..m.start()], &line[m.end()..]);
        header = header
            .trim_matches(|c: char| c.is_whitespace() || ",|-–()".contains(c))
            .to_string();
        if header.is_empty() && i > 0 {
            header = lines[i - 1].trim().to_string();
        }

        // "Position, Company" is the common layout; fall back to the
        // whole header as the position.
        let (position, company) = match header.split_once(',') {
            Some((p, c)) => (p.trim().to_string(), c.trim().to_string()),
            None => (header, String::new()),
        };

        entries.push(ExperienceEntry {
            company,
            position,
            duration,
            responsibilities: Vec::new(),
        });
    }
    entries
}
