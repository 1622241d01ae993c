//! Integration tests for the Generator

#[cfg(test)]
mod tests {
    use crate::{FailureStage, Generator, GeneratorConfig, GeneratorError};
    use gym_domain::traits::{LearningStore, LlmProvider};
    use gym_domain::{Document, DocumentCategory, LearningSession, ParseMode, Project, QuestionSource};
    use gym_llm::{LlmError, MockProvider};
    use gym_store::SqliteStore;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    const GOOD_REPLY: &str = r#"{"question": "What happens to a value after a move?", "answer": "The source can no longer be used."}"#;

    struct Fixture {
        dir: TempDir,
        store: SqliteStore,
        project_id: String,
        session_id: String,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mut store = SqliteStore::new(":memory:").unwrap();
            let project_id = store.create_project(Project::new("Rust")).unwrap();
            let session_id = store
                .create_session(LearningSession::new(&project_id, 60))
                .unwrap();
            Self {
                dir,
                store,
                project_id,
                session_id,
            }
        }

        /// Write a file and attach it to the session under `category`
        fn attach(&mut self, name: &str, content: &str, category: DocumentCategory) -> String {
            let path = self.dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            let doc = Document::new(&self.project_id, name, path.to_string_lossy(), category);
            let id = self.store.create_document(doc).unwrap();
            let linked = self
                .store
                .link_session_documents(&self.session_id, category, &[id.clone()])
                .unwrap();
            assert_eq!(linked, 1);
            id
        }

        fn generator<L>(self, llm: L, config: GeneratorConfig) -> (Generator<L, SqliteStore>, String, TempDir)
        where
            L: LlmProvider + Send + Sync + 'static,
            L::Error: std::fmt::Display,
        {
            let generator = Generator::new(llm, self.store, config)
                .unwrap()
                .with_rng_seed(7);
            (generator, self.session_id, self.dir)
        }
    }

    #[tokio::test]
    async fn test_generated_question_links_source_document() {
        let mut fixture = Fixture::new();
        let doc_id = fixture.attach("notes.txt", "Ownership moves values.", DocumentCategory::Resource);

        let llm = MockProvider::new(format!("```json\n{}\n```", GOOD_REPLY));
        let (generator, session_id, _dir) = fixture.generator(llm.clone(), GeneratorConfig::default());

        let report = generator.generate_from_resources(&session_id).await.unwrap();
        assert_eq!(report.created_count, 1);
        assert!(report.failures.is_empty());

        let question = &report.questions[0];
        assert_eq!(question.source_document_id(), Some(doc_id.as_str()));
        assert_eq!(question.source, QuestionSource::Resource);
        assert_eq!(question.parse_mode, ParseMode::Structured);
        assert_eq!(question.question, "What happens to a value after a move?");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Ownership moves values."));
        assert!(prompts[0].contains("Variation seed: "));

        let stored = generator.store().lock().unwrap().list_questions(&session_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].resource_document_ids, vec![doc_id]);
    }

    #[tokio::test]
    async fn test_fixed_seed_gives_identical_prompts() {
        let mut prompts = Vec::new();
        for _ in 0..2 {
            let mut fixture = Fixture::new();
            fixture.attach("notes.txt", "Borrowing rules.", DocumentCategory::Resource);
            let llm = MockProvider::new(GOOD_REPLY);
            let (generator, session_id, _dir) = fixture.generator(llm.clone(), GeneratorConfig::default());
            generator.generate_from_resources(&session_id).await.unwrap();
            prompts.push(llm.prompts().remove(0));
        }
        assert_eq!(prompts[0], prompts[1]);
    }

    #[tokio::test]
    async fn test_batch_isolates_extraction_failure() {
        let mut fixture = Fixture::new();
        let first = fixture.attach("a.txt", "First document.", DocumentCategory::Resource);
        let broken = fixture.attach("b.xyz", "Not a supported format.", DocumentCategory::Resource);
        let third = fixture.attach("c.txt", "Third document.", DocumentCategory::Resource);

        let llm = MockProvider::new(GOOD_REPLY);
        let (generator, session_id, _dir) = fixture.generator(llm.clone(), GeneratorConfig::default());

        let report = generator.generate_from_resources(&session_id).await.unwrap();
        assert_eq!(report.created_count, 2);
        assert_eq!(report.questions.len(), 2);
        assert_eq!(report.questions[0].source_document_id(), Some(first.as_str()));
        assert_eq!(report.questions[1].source_document_id(), Some(third.as_str()));

        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.document_id, broken);
        assert_eq!(failure.stage, FailureStage::Extraction);
        assert!(failure.reason.contains("unsupported format"));

        // The broken document never reached the gateway
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_batch_isolates_gateway_and_parse_failures() {
        let mut fixture = Fixture::new();
        fixture.attach("a.txt", "Alpha topic.", DocumentCategory::Resource);
        let offline = fixture.attach("b.txt", "Beta topic.", DocumentCategory::Resource);
        let garbled = fixture.attach("c.txt", "Gamma topic.", DocumentCategory::Resource);

        let mut llm = MockProvider::new(GOOD_REPLY);
        llm.add_error("Beta topic.");
        llm.add_response("Gamma topic.", "I would rather not.");
        let (generator, session_id, _dir) = fixture.generator(llm, GeneratorConfig::default());

        let report = generator.generate_from_resources(&session_id).await.unwrap();
        assert_eq!(report.created_count, 1);
        assert_eq!(report.failures.len(), 2);

        assert_eq!(report.failures[0].document_id, offline);
        assert_eq!(report.failures[0].stage, FailureStage::Gateway);
        assert!(report.failures[0].reason.contains("Mock error"));

        assert_eq!(report.failures[1].document_id, garbled);
        assert_eq!(report.failures[1].stage, FailureStage::Parse);
    }

    #[tokio::test]
    async fn test_heuristic_reply_is_marked_low_confidence() {
        let mut fixture = Fixture::new();
        fixture.attach("notes.txt", "Lifetimes.", DocumentCategory::Resource);

        let llm = MockProvider::new("question: What is a lifetime? answer: A scope for references.");
        let (generator, session_id, _dir) = fixture.generator(llm, GeneratorConfig::default());

        let report = generator.generate_from_resources(&session_id).await.unwrap();
        assert_eq!(report.created_count, 1);
        assert_eq!(report.low_confidence().count(), 1);

        let stored = generator.store().lock().unwrap().list_questions(&session_id).unwrap();
        assert_eq!(stored[0].parse_mode, ParseMode::Heuristic);
        assert_eq!(stored[0].question, "What is a lifetime?");
        assert_eq!(stored[0].answer, "A scope for references.");
    }

    #[tokio::test]
    async fn test_topic_reaches_prompt() {
        let mut fixture = Fixture::new();
        fixture.attach("notes.txt", "Traits and generics.", DocumentCategory::Resource);

        let llm = MockProvider::new(GOOD_REPLY);
        let (generator, session_id, _dir) = fixture.generator(llm.clone(), GeneratorConfig::default());

        generator
            .generate_from_resources_on(&session_id, Some("trait objects"))
            .await
            .unwrap();
        assert!(llm.prompts()[0].contains("Focus the question on the topic of: trait objects"));
    }

    #[tokio::test]
    async fn test_extract_from_tests_keeps_order_and_locators() {
        let mut fixture = Fixture::new();
        fixture.attach("notes.txt", "Resource text.", DocumentCategory::Resource);
        let exam = fixture.attach(
            "exam.txt",
            "Midterm\n1. What is ownership?\n2. Define borrowing.\n",
            DocumentCategory::Test,
        );

        let llm = MockProvider::new(
            r#"[{"question": "What is ownership?", "answer": ""}, {"question": "Define borrowing."}]"#,
        );
        let (generator, session_id, _dir) = fixture.generator(llm.clone(), GeneratorConfig::default());

        let report = generator.extract_from_tests(&session_id).await.unwrap();
        assert_eq!(report.created_count, 2);
        assert!(report.failures.is_empty());
        assert!(report.skipped.is_empty());

        let first = &report.questions[0];
        assert_eq!(first.question, "What is ownership?");
        assert_eq!(first.source, QuestionSource::Test);
        assert_eq!(first.test_document_id.as_deref(), Some(exam.as_str()));
        assert_eq!(first.references[0].locator.line, Some(2));

        let second = &report.questions[1];
        assert_eq!(second.question, "Define borrowing.");
        assert_eq!(second.answer, "");
        assert_eq!(second.references[0].locator.line, Some(3));
        assert_eq!(
            second.references[0].locator.context.as_deref(),
            Some("2. Define borrowing.")
        );

        // Only the TEST document was sent to the model
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Define borrowing."));
        assert!(!prompts[0].contains("Resource text."));
    }

    #[tokio::test]
    async fn test_extract_single_object_and_empty_array() {
        let mut fixture = Fixture::new();
        fixture.attach("one.txt", "Only question?", DocumentCategory::Test);
        fixture.attach("none.txt", "No questions here.", DocumentCategory::Test);

        let mut llm = MockProvider::new("[]");
        llm.add_response("Only question?", r#"{"question": "Only question?", "answer": "Yes"}"#);
        let (generator, session_id, _dir) = fixture.generator(llm, GeneratorConfig::default());

        let report = generator.extract_from_tests(&session_id).await.unwrap();
        assert_eq!(report.created_count, 1);
        assert!(report.failures.is_empty());
        assert_eq!(report.questions[0].question, "Only question?");
    }

    #[tokio::test]
    async fn test_extract_empty_question_is_parse_failure() {
        let mut fixture = Fixture::new();
        let exam = fixture.attach("exam.txt", "1. Q?", DocumentCategory::Test);

        let llm = MockProvider::new(r#"[{"question": "Q?"}, {"question": "  "}]"#);
        let (generator, session_id, _dir) = fixture.generator(llm, GeneratorConfig::default());

        let report = generator.extract_from_tests(&session_id).await.unwrap();
        assert_eq!(report.created_count, 0);
        assert_eq!(report.failures[0].document_id, exam);
        assert_eq!(report.failures[0].stage, FailureStage::Parse);
        assert!(generator
            .store()
            .lock()
            .unwrap()
            .list_questions(&session_id)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_no_documents_of_category() {
        let mut fixture = Fixture::new();
        fixture.attach("exam.txt", "1. Q?", DocumentCategory::Test);

        let llm = MockProvider::new(GOOD_REPLY);
        let (generator, session_id, _dir) = fixture.generator(llm.clone(), GeneratorConfig::default());

        let result = generator.generate_from_resources(&session_id).await;
        assert!(matches!(
            result,
            Err(GeneratorError::NoDocuments {
                category: DocumentCategory::Resource,
                ..
            })
        ));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extract_without_tests_fails_before_work() {
        let mut fixture = Fixture::new();
        fixture.attach("notes.txt", "Resource.", DocumentCategory::Resource);

        let llm = MockProvider::new("[]");
        let (generator, session_id, _dir) = fixture.generator(llm, GeneratorConfig::default());

        let result = generator.extract_from_tests(&session_id).await;
        assert!(matches!(
            result,
            Err(GeneratorError::NoDocuments {
                category: DocumentCategory::Test,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let fixture = Fixture::new();
        let (generator, _, _dir) = fixture.generator(MockProvider::default(), GeneratorConfig::default());

        let result = generator.generate_from_resources("no-such-session").await;
        assert!(matches!(result, Err(GeneratorError::SessionNotFound(id)) if id == "no-such-session"));
    }

    #[tokio::test]
    async fn test_extracted_text_is_cached_until_file_replaced() {
        let mut fixture = Fixture::new();
        let doc_id = fixture.attach("notes.txt", "Cached content.", DocumentCategory::Resource);
        let path = fixture.dir.path().join("notes.txt");

        let llm = MockProvider::new(GOOD_REPLY);
        let (generator, session_id, dir) = fixture.generator(llm.clone(), GeneratorConfig::default());

        generator.generate_from_resources(&session_id).await.unwrap();
        let cached = generator.store().lock().unwrap().get_document(&doc_id).unwrap().unwrap();
        assert_eq!(cached.content.as_deref(), Some("Cached content."));

        // The file is gone but the cache still serves the text
        std::fs::remove_file(&path).unwrap();
        let report = generator.generate_from_resources(&session_id).await.unwrap();
        assert_eq!(report.created_count, 1);
        assert!(llm.prompts()[1].contains("Cached content."));

        // Replacing the file clears the cache, so the missing file now fails
        let missing = dir.path().join("replacement.txt");
        generator
            .store()
            .lock()
            .unwrap()
            .replace_document_file(&doc_id, "replacement.txt", &missing.to_string_lossy())
            .unwrap();
        let report = generator.generate_from_resources(&session_id).await.unwrap();
        assert_eq!(report.created_count, 0);
        assert_eq!(report.failures[0].stage, FailureStage::Extraction);
        assert!(report.failures[0].reason.starts_with("extraction error:"));
    }

    #[tokio::test]
    async fn test_cache_disabled_leaves_document_untouched() {
        let mut fixture = Fixture::new();
        let doc_id = fixture.attach("notes.txt", "Fresh each time.", DocumentCategory::Resource);

        let config = GeneratorConfig {
            cache_extracted_text: false,
            ..Default::default()
        };
        let (generator, session_id, _dir) = fixture.generator(MockProvider::new(GOOD_REPLY), config);

        generator.generate_from_resources(&session_id).await.unwrap();
        let doc = generator.store().lock().unwrap().get_document(&doc_id).unwrap().unwrap();
        assert!(doc.content.is_none());
    }

    /// Takes `delay` to answer, but stops at the budget it is given
    struct BudgetedProvider {
        delay: Duration,
    }

    impl LlmProvider for BudgetedProvider {
        type Error = LlmError;

        fn generate(&self, _prompt: &str) -> Result<String, Self::Error> {
            std::thread::sleep(self.delay);
            Ok(GOOD_REPLY.to_string())
        }

        fn generate_within(&self, prompt: &str, budget: Duration) -> Result<String, Self::Error> {
            if budget < self.delay {
                std::thread::sleep(budget);
                return Err(LlmError::Communication("deadline reached".to_string()));
            }
            self.generate(prompt)
        }
    }

    /// Ignores the budget entirely
    struct StubbornProvider;

    impl LlmProvider for StubbornProvider {
        type Error = LlmError;

        fn generate(&self, _prompt: &str) -> Result<String, Self::Error> {
            std::thread::sleep(Duration::from_millis(2_500));
            Ok(GOOD_REPLY.to_string())
        }
    }

    #[test]
    fn test_gateway_timeout_bounds_whole_run() {
        let mut fixture = Fixture::new();
        fixture.attach("notes.txt", "Slow.", DocumentCategory::Resource);

        let config = GeneratorConfig {
            gateway_timeout_secs: 1,
            ..Default::default()
        };
        let provider = BudgetedProvider {
            delay: Duration::from_secs(3),
        };
        let (generator, session_id, _dir) = fixture.generator(provider, config);

        let started = Instant::now();
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let report = runtime
            .block_on(generator.generate_from_resources(&session_id))
            .unwrap();
        // Shutting the runtime down waits for blocking-pool threads
        drop(runtime);
        let elapsed = started.elapsed();

        assert_eq!(report.created_count, 0);
        assert_eq!(report.failures[0].stage, FailureStage::Gateway);
        assert!(elapsed < Duration::from_millis(1_800), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_gateway_timeout_is_document_failure() {
        let mut fixture = Fixture::new();
        fixture.attach("notes.txt", "Slow.", DocumentCategory::Resource);

        let config = GeneratorConfig {
            gateway_timeout_secs: 1,
            ..Default::default()
        };
        let (generator, session_id, _dir) = fixture.generator(StubbornProvider, config);

        let started = Instant::now();
        let report = generator.generate_from_resources(&session_id).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(report.created_count, 0);
        assert_eq!(report.failures[0].stage, FailureStage::Gateway);
        assert!(report.failures[0].reason.contains("timed out"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let store = SqliteStore::new(":memory:").unwrap();
        let config = GeneratorConfig {
            max_text_length: 0,
            ..Default::default()
        };
        let result = Generator::new(MockProvider::default(), store, config);
        assert!(matches!(result, Err(GeneratorError::Config(_))));
    }

    #[test]
    fn test_shared_store_handle() {
        let store = Arc::new(std::sync::Mutex::new(SqliteStore::new(":memory:").unwrap()));
        let generator = Generator::with_shared_store(
            Arc::new(MockProvider::default()),
            Arc::clone(&store),
            GeneratorConfig::default(),
        )
        .unwrap();
        assert!(Arc::ptr_eq(&store, &generator.store()));
        assert_eq!(generator.config().truncation_marker, "...");
    }
}
