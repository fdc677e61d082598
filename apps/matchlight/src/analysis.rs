//! Gap analysis — the second provider stage: compare two extracted
//! records and return address-based highlight instructions plus scores.
//!
//! The reply goes through the same repair ladder as extraction. A reply
//! that repairs into something unusable degrades to a neutral report
//! instead of failing the comparison.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::extraction::client::{ExtractError, ExtractionClient};
use crate::extraction::prompts;
use crate::extraction::repair::repair;
use crate::highlight::{Classification, HighlightInstruction};
use crate::markup::AnnotatedDocument;
use crate::records::{list_field, str_field, CvRecord, JobRecord};

/// Score a degraded report carries in every category.
const NEUTRAL_SCORE: f64 = 50.0;

/// Percentage scores for the comparison, each clamped to [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub overall_score: f64,
    pub skills_score: f64,
    pub experience_score: f64,
    pub education_score: f64,
    pub qualifications_score: f64,
    pub recommendations: Vec<String>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
}

impl MatchScore {
    fn from_value(value: &Value) -> Self {
        MatchScore {
            overall_score: pct_field(value, "overall_score"),
            skills_score: pct_field(value, "skills_score"),
            experience_score: pct_field(value, "experience_score"),
            education_score: pct_field(value, "education_score"),
            qualifications_score: pct_field(value, "qualifications_score"),
            recommendations: list_field(value, "recommendations"),
            strengths: list_field(value, "strengths"),
            gaps: list_field(value, "gaps"),
        }
    }

    fn neutral() -> Self {
        MatchScore {
            overall_score: NEUTRAL_SCORE,
            skills_score: NEUTRAL_SCORE,
            experience_score: NEUTRAL_SCORE,
            education_score: NEUTRAL_SCORE,
            qualifications_score: NEUTRAL_SCORE,
            ..MatchScore::default()
        }
    }
}

/// Complete second-stage result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    pub cv_instructions: Vec<HighlightInstruction>,
    pub jd_instructions: Vec<HighlightInstruction>,
    pub score: MatchScore,
    pub analysis_notes: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl GapReport {
    /// Neutral report used when the analysis reply cannot be interpreted.
    fn degraded(note: &str) -> Self {
        GapReport {
            cv_instructions: Vec::new(),
            jd_instructions: Vec::new(),
            score: MatchScore::neutral(),
            analysis_notes: vec![note.to_string()],
            analyzed_at: Utc::now(),
        }
    }
}

/// Runs the gap analysis over two extracted records, constrained to the
/// addresses the two documents actually carry.
pub async fn analyze(
    client: &ExtractionClient,
    cv_doc: &AnnotatedDocument,
    cv_record: &CvRecord,
    jd_doc: &AnnotatedDocument,
    jd_record: &JobRecord,
) -> Result<GapReport, ExtractError> {
    let prompt = match build_prompt(cv_doc, cv_record, jd_doc, jd_record) {
        Ok(prompt) => prompt,
        Err(err) => {
            warn!(%err, "could not serialize records for analysis");
            return Ok(GapReport::degraded(
                "records could not be serialized for analysis; neutral scores reported",
            ));
        }
    };

    let raw = client.complete(prompts::GAP_ANALYSIS_SYSTEM, &prompt).await?;
    let value = repair(&raw);

    if !value.get("match_score").map(Value::is_object).unwrap_or(false) {
        warn!("analysis reply unusable after repair, returning neutral report");
        return Ok(GapReport::degraded(
            "analysis response could not be interpreted; neutral scores reported",
        ));
    }

    let report = GapReport {
        cv_instructions: instruction_list(&value, "cv_instructions"),
        jd_instructions: instruction_list(&value, "jd_instructions"),
        score: MatchScore::from_value(&value["match_score"]),
        analysis_notes: list_field(&value, "analysis_notes"),
        analyzed_at: Utc::now(),
    };

    info!(
        overall = report.score.overall_score,
        cv_instructions = report.cv_instructions.len(),
        jd_instructions = report.jd_instructions.len(),
        "gap analysis complete"
    );
    Ok(report)
}

fn build_prompt(
    cv_doc: &AnnotatedDocument,
    cv_record: &CvRecord,
    jd_doc: &AnnotatedDocument,
    jd_record: &JobRecord,
) -> Result<String, serde_json::Error> {
    let cv_addresses = address_list(cv_doc);
    let jd_addresses = address_list(jd_doc);

    Ok(prompts::GAP_ANALYSIS_PROMPT_TEMPLATE
        .replace("{cv_addresses}", &cv_addresses)
        .replace("{jd_addresses}", &jd_addresses)
        .replace("{cv_data}", &serde_json::to_string_pretty(cv_record)?)
        .replace("{jd_data}", &serde_json::to_string_pretty(jd_record)?))
}

fn address_list(doc: &AnnotatedDocument) -> String {
    doc.regions
        .iter()
        .map(|r| r.address.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reads an instruction array leniently: entries with a missing address or
/// an unknown classification are dropped, never fatal.
fn instruction_list(value: &Value, key: &str) -> Vec<HighlightInstruction> {
    let Some(Value::Array(items)) = value.get(key) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let address = str_field(item, "address");
            if address.is_empty() {
                return None;
            }
            let classification = match str_field(item, "classification").as_str() {
                "match" => Classification::Match,
                "potential" => Classification::Potential,
                "gap" => Classification::Gap,
                _ => return None,
            };
            Some(HighlightInstruction {
                address,
                classification,
                rationale: str_field(item, "rationale"),
            })
        })
        .collect()
}

fn pct_field(value: &Value, key: &str) -> f64 {
    value
        .get(key)
        .and_then(Value::as_f64)
        .map(|s| s.clamp(0.0, 100.0))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::extraction::client::{ProviderReply, ProviderTransport};
    use crate::markup::annotate;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct FixedTransport {
        body: String,
    }

    #[async_trait]
    impl ProviderTransport for FixedTransport {
        async fn send(
            &self,
            _api_key: &str,
            _payload: &Value,
        ) -> Result<ProviderReply, ExtractError> {
            Ok(ProviderReply {
                status: 200,
                retry_after: None,
                body: self.body.clone(),
            })
        }
    }

    fn client_replying(text: &str) -> ExtractionClient {
        let body = serde_json::to_string(&json!({
            "content": [{ "type": "text", "text": text }],
        }))
        .unwrap();
        ExtractionClient::with_transport(
            Config::default().with_api_key("test-key"),
            Arc::new(FixedTransport { body }),
        )
    }

    fn fixtures() -> (AnnotatedDocument, CvRecord, AnnotatedDocument, JobRecord) {
        let cv_doc = annotate("cv", "SKILLS\nRust, Python");
        let jd_doc = annotate("jd", "REQUIREMENTS\nMust have Rust experience");
        (cv_doc, CvRecord::default(), jd_doc, JobRecord::default())
    }

    #[tokio::test]
    async fn test_well_formed_reply_builds_full_report() {
        let reply = json!({
            "cv_instructions": [
                {"address": "cv_skill_1", "classification": "match", "rationale": "Rust matches"}
            ],
            "jd_instructions": [
                {"address": "jd_requirement_1", "classification": "gap", "rationale": "missing"}
            ],
            "match_score": {
                "overall_score": 72.5,
                "skills_score": 60.0,
                "experience_score": 80.0,
                "education_score": 90.0,
                "qualifications_score": 55.0,
                "recommendations": ["lead with Rust projects"],
                "strengths": ["systems background"],
                "gaps": ["no cloud experience listed"]
            },
            "analysis_notes": ["solid technical fit"]
        });
        let client = client_replying(&reply.to_string());
        let (cv_doc, cv_record, jd_doc, jd_record) = fixtures();

        let report = analyze(&client, &cv_doc, &cv_record, &jd_doc, &jd_record)
            .await
            .unwrap();

        assert_eq!(report.cv_instructions.len(), 1);
        assert_eq!(report.cv_instructions[0].classification, Classification::Match);
        assert_eq!(report.jd_instructions[0].address, "jd_requirement_1");
        assert_eq!(report.score.overall_score, 72.5);
        assert_eq!(report.analysis_notes, vec!["solid technical fit"]);
    }

    #[tokio::test]
    async fn test_scores_are_clamped_to_percentage_range() {
        let reply = json!({
            "match_score": {
                "overall_score": 150.0,
                "skills_score": -20.0,
                "experience_score": 80.0
            }
        });
        let client = client_replying(&reply.to_string());
        let (cv_doc, cv_record, jd_doc, jd_record) = fixtures();

        let report = analyze(&client, &cv_doc, &cv_record, &jd_doc, &jd_record)
            .await
            .unwrap();

        assert_eq!(report.score.overall_score, 100.0);
        assert_eq!(report.score.skills_score, 0.0);
        assert_eq!(report.score.experience_score, 80.0);
    }

    #[tokio::test]
    async fn test_unknown_classification_entries_are_dropped() {
        let reply = json!({
            "cv_instructions": [
                {"address": "cv_skill_1", "classification": "superb", "rationale": "?"},
                {"address": "", "classification": "match", "rationale": "no address"},
                {"address": "cv_skill_1", "classification": "potential", "rationale": "ok"}
            ],
            "match_score": { "overall_score": 50.0 }
        });
        let client = client_replying(&reply.to_string());
        let (cv_doc, cv_record, jd_doc, jd_record) = fixtures();

        let report = analyze(&client, &cv_doc, &cv_record, &jd_doc, &jd_record)
            .await
            .unwrap();

        assert_eq!(report.cv_instructions.len(), 1);
        assert_eq!(
            report.cv_instructions[0].classification,
            Classification::Potential
        );
    }

    #[tokio::test]
    async fn test_unusable_reply_degrades_to_neutral_report() {
        let client = client_replying("I'm sorry, I can't produce JSON today.");
        let (cv_doc, cv_record, jd_doc, jd_record) = fixtures();

        let report = analyze(&client, &cv_doc, &cv_record, &jd_doc, &jd_record)
            .await
            .unwrap();

        assert_eq!(report.score.overall_score, NEUTRAL_SCORE);
        assert_eq!(report.score.skills_score, NEUTRAL_SCORE);
        assert!(report.cv_instructions.is_empty());
        assert!(report.analysis_notes[0].contains("could not be interpreted"));
    }

    #[test]
    fn test_prompt_carries_real_addresses_and_data() {
        let (cv_doc, cv_record, jd_doc, jd_record) = fixtures();
        let prompt = build_prompt(&cv_doc, &cv_record, &jd_doc, &jd_record).unwrap();

        for region in cv_doc.regions.iter().chain(jd_doc.regions.iter()) {
            assert!(prompt.contains(&region.address));
        }
        assert!(!prompt.contains("{cv_data}"));
        assert!(!prompt.contains("{jd_addresses}"));
    }
}
