//! Generation orchestrator

use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::parser::{parse_extract_response, parse_generate_response};
use crate::prompt::{compose_extract_prompt, compose_generate_prompt};
use crate::types::{BatchReport, DocumentFailure, FailureStage, PipelineState};
use gym_domain::traits::{LearningStore, LlmProvider};
use gym_domain::{Document, DocumentCategory, LearningSession, Locator, Question};
use gym_text::ExtractionResult;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Maximum length of the context snippet stored on a locator
const CONTEXT_CHARS: usize = 200;

/// Extra wait past the budget for a provider to report its own timeout
const GATEWAY_GRACE: Duration = Duration::from_millis(250);

/// Which of the two batch operations a document is processed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode<'a> {
    Generate { topic: Option<&'a str> },
    Extract,
}

/// Tracks one document through the pipeline states
struct DocumentRun<'a> {
    document: &'a Document,
    state: PipelineState,
}

impl<'a> DocumentRun<'a> {
    fn new(document: &'a Document) -> Self {
        Self {
            document,
            state: PipelineState::Pending,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!("Document {}: {} -> {}", self.document.id, self.state, next);
        self.state = next;
    }

    fn fail(&mut self, stage: FailureStage, reason: impl Into<String>) -> DocumentFailure {
        self.advance(stage.terminal_state());
        DocumentFailure {
            document_id: self.document.id.clone(),
            filename: self.document.filename.clone(),
            stage,
            reason: reason.into(),
        }
    }
}

/// Turns a session's documents into stored questions
///
/// Documents are processed one at a time. A failure in one document is
/// recorded in the [`BatchReport`] and the batch moves on.
pub struct Generator<L, S>
where
    L: LlmProvider,
    S: LearningStore,
{
    llm_provider: Arc<L>,
    store: Arc<Mutex<S>>,
    config: GeneratorConfig,
    rng: Mutex<StdRng>,
}

impl<L, S> Generator<L, S>
where
    L: LlmProvider + Send + Sync + 'static,
    S: LearningStore,
    L::Error: std::fmt::Display,
    S::Error: std::fmt::Display,
{
    /// Create a new Generator
    pub fn new(llm_provider: L, store: S, config: GeneratorConfig) -> Result<Self, GeneratorError> {
        Self::with_shared_store(Arc::new(llm_provider), Arc::new(Mutex::new(store)), config)
    }

    /// Create a Generator over a store that other code also uses
    pub fn with_shared_store(
        llm_provider: Arc<L>,
        store: Arc<Mutex<S>>,
        config: GeneratorConfig,
    ) -> Result<Self, GeneratorError> {
        config.validate().map_err(GeneratorError::Config)?;
        Ok(Self {
            llm_provider,
            store,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Use a fixed seed for prompt choices (deterministic prompts)
    pub fn with_rng_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Active configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate one new question per RESOURCE document of the session
    pub async fn generate_from_resources(
        &self,
        session_id: &str,
    ) -> Result<BatchReport, GeneratorError> {
        self.generate_from_resources_on(session_id, None).await
    }

    /// Like [`generate_from_resources`](Self::generate_from_resources), steering
    /// every question towards `topic`
    pub async fn generate_from_resources_on(
        &self,
        session_id: &str,
        topic: Option<&str>,
    ) -> Result<BatchReport, GeneratorError> {
        self.run_batch(session_id, DocumentCategory::Resource, Mode::Generate { topic })
            .await
    }

    /// Extract the questions already present in the session's TEST documents
    pub async fn extract_from_tests(&self, session_id: &str) -> Result<BatchReport, GeneratorError> {
        self.run_batch(session_id, DocumentCategory::Test, Mode::Extract)
            .await
    }

    async fn run_batch(
        &self,
        session_id: &str,
        category: DocumentCategory,
        mode: Mode<'_>,
    ) -> Result<BatchReport, GeneratorError> {
        let (session, documents) = self.load_session_documents(session_id, category)?;

        let (eligible, skipped) = partition_by_category(documents, category);
        let mut report = BatchReport {
            skipped,
            ..Default::default()
        };

        if eligible.is_empty() {
            return Err(GeneratorError::NoDocuments {
                session_id: session.id,
                category,
            });
        }

        info!(
            "Starting {} batch for session {} over {} document(s)",
            category,
            session.id,
            eligible.len()
        );

        for document in &eligible {
            match self.run_document(&session, document, mode).await {
                Ok(questions) => report.record(questions),
                Err(failure) => {
                    warn!("Document failed: {}", failure);
                    report.failures.push(failure);
                }
            }
        }

        info!(
            "Batch complete for session {}: {} created, {} failed, {} skipped",
            session.id,
            report.created_count,
            report.failures.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn load_session_documents(
        &self,
        session_id: &str,
        category: DocumentCategory,
    ) -> Result<(LearningSession, Vec<Document>), GeneratorError> {
        let store = self.lock_store().map_err(GeneratorError::Store)?;
        let session = store
            .get_session(session_id)
            .map_err(|e| GeneratorError::Store(e.to_string()))?
            .ok_or_else(|| GeneratorError::SessionNotFound(session_id.to_string()))?;
        let documents = store
            .session_documents(session_id, category)
            .map_err(|e| GeneratorError::Store(e.to_string()))?;
        Ok((session, documents))
    }

    /// Run one document through the pipeline; stored questions on success
    async fn run_document(
        &self,
        session: &LearningSession,
        document: &Document,
        mode: Mode<'_>,
    ) -> Result<Vec<Question>, DocumentFailure> {
        let mut run = DocumentRun::new(document);

        run.advance(PipelineState::Extracting);
        let text = match self.document_text(document).await {
            Ok(text) => text,
            Err(reason) => return Err(run.fail(FailureStage::Extraction, reason)),
        };

        run.advance(PipelineState::Prompting);
        let prompt = self.compose_prompt(&text, mode);
        let reply = match self.call_llm(prompt).await {
            Ok(reply) => reply,
            Err(reason) => return Err(run.fail(FailureStage::Gateway, reason)),
        };

        run.advance(PipelineState::Parsing);
        let questions = match mode {
            Mode::Generate { .. } => match parse_generate_response(&reply) {
                Ok(parsed) => {
                    let parse_mode = parsed.parse_mode();
                    if parse_mode.is_low_confidence() {
                        warn!("Document {}: question recovered heuristically", document.id);
                    }
                    let pair = parsed.into_pair();
                    vec![Question::from_resource(
                        &session.id,
                        pair.question,
                        pair.answer,
                        &document.id,
                        parse_mode,
                    )]
                }
                Err(e) => return Err(run.fail(FailureStage::Parse, e.to_string())),
            },
            Mode::Extract => match parse_extract_response(&reply) {
                Ok(pairs) => pairs
                    .into_iter()
                    .map(|pair| {
                        let locator = locate(&text, &pair.question);
                        Question::from_test(
                            &session.id,
                            pair.question,
                            pair.answer,
                            &document.id,
                            locator,
                        )
                    })
                    .collect(),
                Err(e) => return Err(run.fail(FailureStage::Parse, e.to_string())),
            },
        };

        for question in &questions {
            if let Err(e) = question.validate() {
                return Err(run.fail(FailureStage::Validation, e.to_string()));
            }
        }

        if let Err(reason) = self.persist(&questions) {
            return Err(run.fail(FailureStage::Persistence, reason));
        }

        run.advance(PipelineState::Done);
        debug!(
            "Document {}: stored {} question(s)",
            document.id,
            questions.len()
        );
        Ok(questions)
    }

    /// Extracted text of a document, from the cache when allowed
    async fn document_text(&self, document: &Document) -> Result<String, String> {
        if self.config.cache_extracted_text {
            if let Some(content) = &document.content {
                debug!("Document {}: using cached text", document.id);
                return Ok(content.clone());
            }
        }

        let path = document.file_path.clone();
        let result = tokio::task::spawn_blocking(move || gym_text::extract(path))
            .await
            .map_err(|e| format!("extraction error: task join error: {}", e))?;

        let text = match result {
            ExtractionResult::Text(text) => text,
            ExtractionResult::Failure(failure) => return Err(failure.to_string()),
        };

        if self.config.cache_extracted_text {
            let cached = self
                .lock_store()
                .and_then(|mut store| {
                    store
                        .cache_document_content(&document.id, &text)
                        .map_err(|e| e.to_string())
                });
            if let Err(e) = cached {
                warn!("Document {}: could not cache text: {}", document.id, e);
            }
        }
        Ok(text)
    }

    fn compose_prompt(&self, text: &str, mode: Mode<'_>) -> String {
        match mode {
            Mode::Generate { topic } => {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                compose_generate_prompt(text, topic, &self.config, &mut *rng)
            }
            Mode::Extract => compose_extract_prompt(text, &self.config),
        }
    }

    /// Call the LLM provider on the blocking pool, bounded by the gateway timeout
    ///
    /// The provider gets the timeout as its own budget. A provider that
    /// ignores it is abandoned shortly after; its thread runs to completion
    /// in the background and the reply is discarded.
    async fn call_llm(&self, prompt: String) -> Result<String, String> {
        let llm = Arc::clone(&self.llm_provider);
        let budget = self.config.gateway_timeout();
        debug!("Prompt length: {} chars", prompt.len());

        let call = tokio::task::spawn_blocking(move || {
            llm.generate_within(&prompt, budget)
                .map_err(|e| e.to_string())
        });

        let reply = timeout(budget.saturating_add(GATEWAY_GRACE), call)
            .await
            .map_err(|_| {
                format!(
                    "gateway timed out after {}s",
                    self.config.gateway_timeout_secs
                )
            })?
            .map_err(|e| format!("gateway task join error: {}", e))??;

        debug!("LLM response length: {} chars", reply.len());
        Ok(reply)
    }

    /// Store all questions of one document, or none of them
    fn persist(&self, questions: &[Question]) -> Result<(), String> {
        let mut store = self.lock_store()?;
        let mut stored: Vec<&str> = Vec::with_capacity(questions.len());

        for question in questions {
            if let Err(e) = store.create_question(question.clone()) {
                for id in stored {
                    if let Err(undo) = store.delete_question(id) {
                        warn!("Could not roll back question {}: {}", id, undo);
                    }
                }
                return Err(e.to_string());
            }
            stored.push(&question.id);
        }
        Ok(())
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, S>, String> {
        self.store
            .lock()
            .map_err(|e| format!("Store lock error: {}", e))
    }
}

/// Split documents into those of `category` and the IDs of the rest
fn partition_by_category(
    documents: Vec<Document>,
    category: DocumentCategory,
) -> (Vec<Document>, Vec<String>) {
    let (eligible, other): (Vec<_>, Vec<_>) = documents
        .into_iter()
        .partition(|d| d.category == category);
    let skipped = other
        .into_iter()
        .map(|d| {
            debug!("Skipping document {}: category {} is not {}", d.id, d.category, category);
            d.id
        })
        .collect();
    (eligible, skipped)
}

/// Find where `question` appears in `text`
///
/// Returns 1-based line, character offset and the surrounding line. The page
/// is not recoverable from flattened text. An empty locator means the
/// question was not found verbatim.
pub fn locate(text: &str, question: &str) -> Locator {
    let needle = question.trim();
    if needle.is_empty() {
        return Locator::default();
    }
    let Some(byte_offset) = text.find(needle) else {
        return Locator::default();
    };

    let before = &text[..byte_offset];
    let line = before.matches('\n').count() + 1;
    let offset = before.chars().count();

    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[byte_offset..]
        .find('\n')
        .map(|i| byte_offset + i)
        .unwrap_or(text.len());
    let context: String = text[line_start..line_end]
        .trim()
        .chars()
        .take(CONTEXT_CHARS)
        .collect();

    Locator {
        line: u32::try_from(line).ok(),
        page: None,
        offset: u32::try_from(offset).ok(),
        context: Some(context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_skips_other_categories() {
        let docs = vec![
            Document::new("p", "exam.pdf", "/u/exam.pdf", DocumentCategory::Test).with_id("t1"),
            Document::new("p", "notes.txt", "/u/notes.txt", DocumentCategory::Resource).with_id("r1"),
            Document::new("p", "quiz.odt", "/u/quiz.odt", DocumentCategory::Test).with_id("t2"),
        ];
        let (eligible, skipped) = partition_by_category(docs, DocumentCategory::Test);
        let ids: Vec<_> = eligible.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(skipped, vec!["r1".to_string()]);
    }

    #[test]
    fn test_locate_finds_line_and_offset() {
        let text = "Quiz 1\n1. What is ownership?\n2. Define borrowing.\n";
        let locator = locate(text, "Define borrowing.");
        assert_eq!(locator.line, Some(3));
        assert_eq!(locator.offset, Some(32));
        assert_eq!(locator.context.as_deref(), Some("2. Define borrowing."));
        assert_eq!(locator.page, None);
    }

    #[test]
    fn test_locate_counts_characters() {
        let text = "Über\nQuestion?";
        assert_eq!(locate(text, "Question?").offset, Some(5));
    }

    #[test]
    fn test_locate_missing_question() {
        assert!(locate("abc", "xyz").is_empty());
        assert!(locate("abc", "   ").is_empty());
    }

    #[test]
    fn test_locate_truncates_long_context() {
        let text = format!("{} Q?", "x".repeat(500));
        let context = locate(&text, "Q?").context.unwrap();
        assert_eq!(context.chars().count(), CONTEXT_CHARS);
    }
}
