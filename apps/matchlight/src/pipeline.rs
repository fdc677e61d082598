//! Pipeline — the upstream-facing orchestration: annotate, budget,
//! extract, analyze, and re-apply highlights in one place.

use tracing::{info, warn};

use crate::analysis::{self, GapReport};
use crate::budget;
use crate::extraction::client::{DocumentInput, ExtractError, ExtractionClient};
use crate::extraction::fallback;
use crate::highlight;
use crate::markup::{annotate, AnnotatedDocument};
use crate::records::{CvRecord, JobRecord};

/// Address namespace for CV documents.
pub const CV_PREFIX: &str = "cv";
/// Address namespace for job postings.
pub const JD_PREFIX: &str = "jd";

/// Full two-document comparison output.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub report: GapReport,
    /// The CV rendered as HTML with highlight spans applied.
    pub cv_html: String,
    /// The posting rendered as HTML with highlight spans applied.
    pub jd_html: String,
}

/// One pipeline per configured client. All operations are sequential and
/// side-effect free apart from provider calls.
#[derive(Clone)]
pub struct DocumentPipeline {
    client: ExtractionClient,
}

impl DocumentPipeline {
    pub fn new(client: ExtractionClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ExtractionClient {
        &self.client
    }

    /// Ingests a CV: extract a record, then annotate the text. For file
    /// inputs the annotated text is the provider-extracted `raw_text`.
    pub async fn ingest_cv(
        &self,
        input: DocumentInput,
    ) -> Result<(AnnotatedDocument, CvRecord), ExtractError> {
        let record = self.client.extract_cv(&input).await?;
        let doc = annotate(CV_PREFIX, document_text(&input, &record.raw_text));
        info!(regions = doc.regions.len(), "CV ingested");
        Ok((doc, record))
    }

    /// Ingests a job posting. Oversized postings are budgeted down before
    /// extraction and annotation, so addresses refer to the budgeted text.
    pub async fn ingest_jd(
        &self,
        input: DocumentInput,
    ) -> Result<(AnnotatedDocument, JobRecord), ExtractError> {
        let input = match input {
            DocumentInput::Text(text) => DocumentInput::Text(budget::budget(&text)),
            file => file,
        };
        let record = self.client.extract_jd(&input).await?;
        let doc = annotate(JD_PREFIX, document_text(&input, &record.raw_text));
        info!(regions = doc.regions.len(), "JD ingested");
        Ok((doc, record))
    }

    /// Like `ingest_cv`, but provider failures on text input degrade to
    /// the heuristic extractor instead of surfacing.
    pub async fn ingest_cv_or_fallback(
        &self,
        input: DocumentInput,
    ) -> Result<(AnnotatedDocument, CvRecord), ExtractError> {
        match self.ingest_cv(input.clone()).await {
            Ok(result) => Ok(result),
            Err(err) => match input {
                DocumentInput::Text(text) => {
                    warn!(%err, "CV extraction failed, degrading to heuristics");
                    let record = fallback::extract_cv(&text);
                    Ok((annotate(CV_PREFIX, &text), record))
                }
                DocumentInput::File { .. } => Err(err),
            },
        }
    }

    /// Like `ingest_jd`, with the same degradation rules.
    pub async fn ingest_jd_or_fallback(
        &self,
        input: DocumentInput,
    ) -> Result<(AnnotatedDocument, JobRecord), ExtractError> {
        match self.ingest_jd(input.clone()).await {
            Ok(result) => Ok(result),
            Err(err) => match input {
                DocumentInput::Text(text) => {
                    warn!(%err, "JD extraction failed, degrading to heuristics");
                    let text = budget::budget(&text);
                    let record = fallback::extract_jd(&text);
                    Ok((annotate(JD_PREFIX, &text), record))
                }
                DocumentInput::File { .. } => Err(err),
            },
        }
    }

    /// Runs the gap analysis over two ingested documents and renders both
    /// with the resulting highlights.
    pub async fn compare(
        &self,
        cv_doc: &AnnotatedDocument,
        cv_record: &CvRecord,
        jd_doc: &AnnotatedDocument,
        jd_record: &JobRecord,
    ) -> Result<ComparisonResult, ExtractError> {
        let report =
            analysis::analyze(&self.client, cv_doc, cv_record, jd_doc, jd_record).await?;

        let cv_html = highlight::apply(cv_doc, &report.cv_instructions);
        let jd_html = highlight::apply(jd_doc, &report.jd_instructions);

        Ok(ComparisonResult {
            report,
            cv_html,
            jd_html,
        })
    }
}

/// The text a document is annotated from: the input itself for text, the
/// provider-extracted `raw_text` for files.
fn document_text<'a>(input: &'a DocumentInput, raw_text: &'a str) -> &'a str {
    match input {
        DocumentInput::Text(text) => text,
        DocumentInput::File { .. } => raw_text,
    }
}
