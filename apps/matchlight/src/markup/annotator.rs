//! Annotator — wraps every non-empty line of a document in an invisible,
//! uniquely addressed marker pair.
//!
//! The wrapped text keeps the original line bytes untouched (including any
//! trailing `\r`), lines are re-joined with `\n`, and blank lines pass
//! through unaddressed — stripping all markers reproduces the source
//! byte-for-byte.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::markup::classifier::{classify, RegionKind};
use crate::markup::{format_address, strip_markers, wrap};

/// One addressed line of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub address: String,
    pub kind: RegionKind,
    pub line_index: usize,
}

/// A document plus its addressed region index. Created once per ingestion
/// and never mutated; re-annotation builds a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    /// The immutable original text.
    pub source_text: String,
    /// Address namespace, e.g. `cv` or `jd`.
    pub doc_prefix: String,
    /// Addressed regions in line order. Blank lines carry no region.
    pub regions: Vec<Region>,
    /// Source text with marker pairs around every addressed line.
    pub annotated_text: String,
}

impl AnnotatedDocument {
    /// Looks up a region by address.
    pub fn region(&self, address: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.address == address)
    }

    /// Strips all markers from the annotated text. By construction this
    /// equals `source_text`.
    pub fn stripped(&self) -> String {
        strip_markers(&self.annotated_text)
    }

    /// Number of addressed regions per kind — handy for logging and for
    /// sanity-checking a provider's addressing instructions.
    pub fn region_counts(&self) -> HashMap<RegionKind, usize> {
        let mut counts = HashMap::new();
        for region in &self.regions {
            *counts.entry(region.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Annotates a document: classifies each non-empty line and wraps it in a
/// marker pair addressed `<doc_prefix>_<kind>_<line_index>`. Addresses are
/// derived from the line index, so they are unique and deterministic.
pub fn annotate(doc_prefix: &str, text: &str) -> AnnotatedDocument {
    let mut regions = Vec::new();
    let mut annotated_lines = Vec::new();

    for (line_index, line) in text.split('\n').enumerate() {
        if line.trim().is_empty() {
            // blank-line spacing is part of the document's formatting
            annotated_lines.push(line.to_string());
            continue;
        }

        let kind = classify(line, line_index);
        let address = format_address(doc_prefix, kind, line_index);
        annotated_lines.push(wrap(&address, line));
        regions.push(Region {
            address,
            kind,
            line_index,
        });
    }

    debug!(
        doc_prefix,
        lines = annotated_lines.len(),
        regions = regions.len(),
        "annotated document"
    );

    AnnotatedDocument {
        source_text: text.to_string(),
        doc_prefix: doc_prefix.to_string(),
        regions,
        annotated_text: annotated_lines.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CV: &str = "JOHN DOE\njohn@x.com | (555) 123-4567\n\nEXPERIENCE\nSoftware Engineer, Acme, 2019-2023\n• Built APIs with Go\n";

    #[test]
    fn test_round_trip_reproduces_source_exactly() {
        let doc = annotate("cv", CV);
        assert_eq!(doc.stripped(), CV);
    }

    #[test]
    fn test_round_trip_preserves_crlf_lines() {
        let text = "SKILLS\r\nPython, Docker\r\n\r\nplain tail";
        let doc = annotate("cv", text);
        assert_eq!(doc.stripped(), text);
    }

    #[test]
    fn test_blank_lines_are_not_addressed() {
        let doc = annotate("cv", CV);
        assert!(doc.regions.iter().all(|r| r.line_index != 2));
        // blank line survives verbatim in the annotated text
        assert!(doc.annotated_text.contains("\n\n"));
    }

    #[test]
    fn test_addresses_are_unique_and_index_derived() {
        let doc = annotate("cv", CV);
        let mut seen = std::collections::HashSet::new();
        for region in &doc.regions {
            assert!(seen.insert(region.address.clone()), "duplicate address");
            assert!(region.address.ends_with(&region.line_index.to_string()));
            assert!(region.address.starts_with("cv_"));
        }
    }

    #[test]
    fn test_expected_kinds_assigned() {
        let doc = annotate("cv", CV);
        assert_eq!(doc.region("cv_section_0").map(|r| r.kind), Some(RegionKind::Section));
        assert_eq!(doc.region("cv_contact_1").map(|r| r.kind), Some(RegionKind::Contact));
        assert_eq!(doc.region("cv_section_3").map(|r| r.kind), Some(RegionKind::Section));
        assert_eq!(
            doc.region("cv_requirement_4").map(|r| r.kind),
            Some(RegionKind::Requirement)
        );
        assert_eq!(doc.region("cv_item_5").map(|r| r.kind), Some(RegionKind::Item));
    }

    #[test]
    fn test_region_counts_tally_kinds() {
        let doc = annotate("cv", CV);
        let counts = doc.region_counts();
        assert_eq!(counts.get(&RegionKind::Section), Some(&2));
        assert_eq!(counts.get(&RegionKind::Item), Some(&1));
    }

    #[test]
    fn test_empty_document_round_trips() {
        let doc = annotate("cv", "");
        assert!(doc.regions.is_empty());
        assert_eq!(doc.stripped(), "");
    }

    #[test]
    fn test_whitespace_only_document_passes_through() {
        let text = "   \n\t\n  ";
        let doc = annotate("cv", text);
        assert!(doc.regions.is_empty());
        assert_eq!(doc.stripped(), text);
    }

    proptest! {
        /// strip(annotate(d)) == d for arbitrary documents, including ones
        /// that happen to contain our sentinel characters.
        #[test]
        fn prop_round_trip_arbitrary_text(text in ".{0,400}") {
            let doc = annotate("cv", &text);
            prop_assert_eq!(doc.stripped(), text);
        }

        #[test]
        fn prop_round_trip_multiline(lines in proptest::collection::vec("[a-zA-Z0-9 •\\-@.]{0,40}", 0..20)) {
            let text = lines.join("\n");
            let doc = annotate("jd", &text);
            prop_assert_eq!(doc.stripped(), text);
        }
    }
}
