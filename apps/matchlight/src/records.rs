//! Extraction records — fixed, provider-agnostic schemas for parsed
//! documents.
//!
//! Records are total by construction: every field is always present, and
//! the lenient readers default anything missing or mistyped instead of
//! failing, so no caller ever sees a partial record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One employment entry on a CV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

/// One education entry on a CV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub year: String,
}

/// Structured extraction of a CV / résumé.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvRecord {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub linkedin_url: String,
    #[serde(default)]
    pub portfolio_url: String,
    #[serde(default)]
    pub professional_summary: Vec<String>,
    #[serde(default)]
    pub key_skills: Vec<String>,
    #[serde(default)]
    pub work_experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    /// Full document text as extracted by the provider. Populated for
    /// binary inputs so the caller can still annotate and highlight.
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub parsing_notes: Vec<String>,
}

/// Structured extraction of a job posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_summary: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub required_experience: Vec<String>,
    #[serde(default)]
    pub required_education: Vec<String>,
    #[serde(default)]
    pub required_qualifications: Vec<String>,
    #[serde(default)]
    pub key_responsibilities: Vec<String>,
    #[serde(default)]
    pub salary_range: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub parsing_notes: Vec<String>,
}

impl CvRecord {
    /// Builds a record from a parsed JSON object, field by field. Missing
    /// or mistyped fields default; the result is always schema-complete.
    pub fn from_value(value: &Value) -> Self {
        CvRecord {
            full_name: str_field(value, "full_name"),
            email: str_field(value, "email"),
            phone: str_field(value, "phone"),
            location: str_field(value, "location"),
            linkedin_url: str_field(value, "linkedin_url"),
            portfolio_url: str_field(value, "portfolio_url"),
            professional_summary: list_field(value, "professional_summary"),
            key_skills: list_field(value, "key_skills"),
            work_experience: entry_list(value, "work_experience", |v| ExperienceEntry {
                company: str_field(v, "company"),
                position: str_field(v, "position"),
                duration: str_field(v, "duration"),
                responsibilities: list_field(v, "responsibilities"),
            }),
            education: entry_list(value, "education", |v| EducationEntry {
                institution: str_field(v, "institution"),
                degree: str_field(v, "degree"),
                year: str_field(v, "year"),
            }),
            certifications: list_field(value, "certifications"),
            projects: list_field(value, "projects"),
            languages: list_field(value, "languages"),
            achievements: list_field(value, "achievements"),
            raw_text: str_field(value, "raw_text"),
            confidence_score: score_field(value, "confidence_score"),
            parsing_notes: list_field(value, "parsing_notes"),
        }
    }
}

impl JobRecord {
    pub fn from_value(value: &Value) -> Self {
        JobRecord {
            job_title: str_field(value, "job_title"),
            company_name: str_field(value, "company_name"),
            location: str_field(value, "location"),
            job_summary: list_field(value, "job_summary"),
            required_skills: list_field(value, "required_skills"),
            preferred_skills: list_field(value, "preferred_skills"),
            required_experience: list_field(value, "required_experience"),
            required_education: list_field(value, "required_education"),
            required_qualifications: list_field(value, "required_qualifications"),
            key_responsibilities: list_field(value, "key_responsibilities"),
            salary_range: str_field(value, "salary_range"),
            job_type: str_field(value, "job_type"),
            raw_text: str_field(value, "raw_text"),
            confidence_score: score_field(value, "confidence_score"),
            parsing_notes: list_field(value, "parsing_notes"),
        }
    }
}

/// Reads a string field; non-strings are stringified, missing values
/// become the empty string.
pub fn str_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Reads a string-list field; non-string elements are dropped, anything
/// that is not an array becomes the empty list.
pub fn list_field(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Reads a confidence-style float, clamped to [0, 1]; anything unusable
/// becomes 0.0.
pub fn score_field(value: &Value, key: &str) -> f64 {
    value
        .get(key)
        .and_then(Value::as_f64)
        .map(|s| s.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

fn entry_list<T>(value: &Value, key: &str, build: impl Fn(&Value) -> T) -> Vec<T> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| item.is_object())
            .map(|item| build(item))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cv_from_complete_value() {
        let value = json!({
            "full_name": "Jane Roe",
            "email": "jane@example.com",
            "key_skills": ["Rust", "Python"],
            "work_experience": [
                {"company": "Acme", "position": "Engineer", "duration": "2019-2023",
                 "responsibilities": ["built things"]}
            ],
            "education": [{"institution": "State U", "degree": "B.S.", "year": "2018"}],
            "confidence_score": 0.9
        });
        let record = CvRecord::from_value(&value);
        assert_eq!(record.full_name, "Jane Roe");
        assert_eq!(record.key_skills, vec!["Rust", "Python"]);
        assert_eq!(record.work_experience[0].company, "Acme");
        assert_eq!(record.education[0].degree, "B.S.");
        assert!((record.confidence_score - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_fields_default_not_absent() {
        let record = CvRecord::from_value(&json!({}));
        assert_eq!(record.full_name, "");
        assert!(record.key_skills.is_empty());
        assert!(record.work_experience.is_empty());
        assert_eq!(record.confidence_score, 0.0);
    }

    #[test]
    fn test_mistyped_fields_are_tolerated() {
        let value = json!({
            "full_name": 42,
            "key_skills": "not a list",
            "work_experience": [{"company": "Acme"}, "stray string"],
            "confidence_score": "high"
        });
        let record = CvRecord::from_value(&value);
        assert_eq!(record.full_name, "42");
        assert!(record.key_skills.is_empty());
        assert_eq!(record.work_experience.len(), 1);
        assert_eq!(record.confidence_score, 0.0);
    }

    #[test]
    fn test_confidence_is_clamped_to_unit_interval() {
        let record = CvRecord::from_value(&json!({"confidence_score": 3.5}));
        assert_eq!(record.confidence_score, 1.0);
        let record = CvRecord::from_value(&json!({"confidence_score": -0.2}));
        assert_eq!(record.confidence_score, 0.0);
    }

    #[test]
    fn test_list_field_drops_non_string_elements() {
        let value = json!({"key_skills": ["Rust", 7, null, "SQL"]});
        let record = CvRecord::from_value(&value);
        assert_eq!(record.key_skills, vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_job_record_from_value() {
        let value = json!({
            "job_title": "Senior Engineer",
            "required_skills": ["Rust", "Kubernetes"],
            "preferred_skills": ["Kafka"],
            "confidence_score": 0.8
        });
        let record = JobRecord::from_value(&value);
        assert_eq!(record.job_title, "Senior Engineer");
        assert_eq!(record.required_skills.len(), 2);
        assert_eq!(record.preferred_skills, vec!["Kafka"]);
        assert_eq!(record.company_name, "");
    }

    #[test]
    fn test_records_serde_round_trip() {
        let record = CvRecord {
            full_name: "Jane Roe".to_string(),
            key_skills: vec!["Rust".to_string()],
            confidence_score: 0.7,
            ..CvRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: CvRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
