//! Highlight re-application — renders analysis instructions back onto the
//! original document as HTML, line by line.
//!
//! Rendering works from the document's source lines and region index, not
//! from the marked-up text, so the output always reflects the exact
//! original line order and separators.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::markup::AnnotatedDocument;

/// How an addressed line relates the CV to the posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Match,
    Potential,
    Gap,
}

impl Classification {
    /// CSS class suffix for the rendered span.
    pub fn css_class(self) -> &'static str {
        match self {
            Classification::Match => "highlight-match",
            Classification::Potential => "highlight-potential",
            Classification::Gap => "highlight-gap",
        }
    }
}

/// One instruction from the analysis stage: highlight this address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightInstruction {
    pub address: String,
    pub classification: Classification,
    pub rationale: String,
}

/// Renders the document as HTML with instructed lines wrapped in
/// classification spans. Instructions for addresses the document does not
/// contain are dropped; duplicate addresses resolve last-write-wins.
pub fn apply(doc: &AnnotatedDocument, instructions: &[HighlightInstruction]) -> String {
    let mut by_address: HashMap<&str, &HighlightInstruction> = HashMap::new();
    let mut dropped = 0usize;
    for instruction in instructions {
        if doc.region(&instruction.address).is_some() {
            by_address.insert(instruction.address.as_str(), instruction);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        debug!(dropped, "ignored instructions for unknown addresses");
    }

    let by_line: HashMap<usize, &HighlightInstruction> = doc
        .regions
        .iter()
        .filter_map(|region| {
            by_address
                .get(region.address.as_str())
                .map(|instruction| (region.line_index, *instruction))
        })
        .collect();

    let rendered: Vec<String> = doc
        .source_text
        .split('\n')
        .enumerate()
        .map(|(line_index, line)| match by_line.get(&line_index) {
            Some(instruction) => format!(
                r#"<span class="{}" title="{}">{}</span>"#,
                instruction.classification.css_class(),
                escape_attribute(&instruction.rationale),
                escape_text(line),
            ),
            None => escape_text(line),
        })
        .collect();

    rendered.join("\n")
}

/// Structural HTML escaping for text content.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Attribute values additionally escape double quotes.
fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::annotate;

    const CV: &str = "SKILLS\nRust, Python & C++\n\n• Built APIs with Go";

    fn instruction(address: &str, classification: Classification, rationale: &str) -> HighlightInstruction {
        HighlightInstruction {
            address: address.to_string(),
            classification,
            rationale: rationale.to_string(),
        }
    }

    #[test]
    fn test_instructed_line_is_wrapped_in_span() {
        let doc = annotate("cv", CV);
        let skill_address = doc.regions[1].address.clone();
        let html = apply(
            &doc,
            &[instruction(&skill_address, Classification::Match, "Rust required")],
        );
        assert!(html.contains(
            r#"<span class="highlight-match" title="Rust required">Rust, Python &amp; C++</span>"#
        ));
    }

    #[test]
    fn test_uninstructed_lines_are_escaped_only() {
        let doc = annotate("cv", CV);
        let html = apply(&doc, &[]);
        assert_eq!(html, "SKILLS\nRust, Python &amp; C++\n\n• Built APIs with Go");
    }

    #[test]
    fn test_unknown_address_is_silently_dropped() {
        let doc = annotate("cv", CV);
        let html = apply(
            &doc,
            &[instruction("cv_skill_999", Classification::Gap, "nope")],
        );
        assert!(!html.contains("span"));
    }

    #[test]
    fn test_duplicate_address_last_write_wins() {
        let doc = annotate("cv", CV);
        let addr = doc.regions[0].address.clone();
        let html = apply(
            &doc,
            &[
                instruction(&addr, Classification::Gap, "first"),
                instruction(&addr, Classification::Match, "second"),
            ],
        );
        assert!(html.contains("highlight-match"));
        assert!(html.contains(r#"title="second""#));
        assert!(!html.contains("highlight-gap"));
    }

    #[test]
    fn test_rationale_quotes_are_escaped_in_title() {
        let doc = annotate("cv", CV);
        let addr = doc.regions[0].address.clone();
        let html = apply(
            &doc,
            &[instruction(&addr, Classification::Potential, r#"needs "Rust" focus"#)],
        );
        assert!(html.contains(r#"title="needs &quot;Rust&quot; focus""#));
    }

    #[test]
    fn test_blank_lines_and_order_preserved() {
        let doc = annotate("cv", CV);
        let html = apply(&doc, &[]);
        let lines: Vec<&str> = html.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "");
    }

    #[test]
    fn test_each_classification_has_distinct_class() {
        assert_eq!(Classification::Match.css_class(), "highlight-match");
        assert_eq!(Classification::Potential.css_class(), "highlight-potential");
        assert_eq!(Classification::Gap.css_class(), "highlight-gap");
    }

    #[test]
    fn test_classification_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Classification::Potential).unwrap(),
            "\"potential\""
        );
        let parsed: Classification = serde_json::from_str("\"gap\"").unwrap();
        assert_eq!(parsed, Classification::Gap);
    }
}
