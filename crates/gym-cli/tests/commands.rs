//! Command-level tests against an in-memory store and a scripted model

use gym_cli::cli::{CreateSessionArgs, ProjectAction, ProjectArgs};
use gym_cli::commands::{document, project, questions, session};
use gym_cli::config::OutputFormat;
use gym_cli::{CliError, Config, Context, Formatter};
use gym_domain::traits::LearningStore;
use gym_domain::{DocumentCategory, ParseMode, Project, QuestionSource};
use gym_llm::MockProvider;
use gym_store::SqliteStore;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Setup {
    ctx: Context,
    project_id: String,
    dir: TempDir,
}

impl Setup {
    fn new() -> Self {
        Self::with_config(Config::default())
    }

    fn with_config(mut config: Config) -> Self {
        let dir = TempDir::new().unwrap();
        config.storage.uploads = dir.path().join("uploads");
        let ctx = Context::with_store(config, SqliteStore::new(":memory:").unwrap());
        let project_id = ctx.store().unwrap().create_project(Project::new("Rust")).unwrap();
        Self {
            ctx,
            project_id,
            dir,
        }
    }

    fn local_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join("local").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn upload(&self, name: &str, content: &str, category: DocumentCategory) -> String {
        let path = self.local_file(name, content);
        document::upload_document(&self.ctx, &self.project_id, &path, category)
            .unwrap()
            .document
            .id
    }

    fn session(&self, resources: Vec<String>, tests: Vec<String>) -> String {
        let args = CreateSessionArgs {
            project_id: self.project_id.clone(),
            duration: 30,
            motivation: None,
            objective: Some("borrowing".to_string()),
            awareness: None,
            confidence: None,
            energy: Some(60.0),
            performance: None,
            satisfaction: None,
            resources,
            tests,
        };
        session::create_session(&self.ctx, args).unwrap().id
    }
}

#[test]
fn test_project_create_and_delete_commands() {
    let setup = Setup::new();
    let formatter = Formatter::new(OutputFormat::Quiet, false);

    project::execute_project(
        ProjectArgs {
            action: ProjectAction::Create {
                title: "Linear algebra".to_string(),
                performance: 40.0,
                difficulty: 70.0,
                interest: 90.0,
                motivations: vec!["exam".to_string()],
            },
        },
        &setup.ctx,
        &formatter,
    )
    .unwrap();
    assert_eq!(setup.ctx.store().unwrap().list_projects().unwrap().len(), 2);

    let bad = project::execute_project(
        ProjectArgs {
            action: ProjectAction::Create {
                title: "Too keen".to_string(),
                performance: 0.0,
                difficulty: 0.0,
                interest: 150.0,
                motivations: vec![],
            },
        },
        &setup.ctx,
        &formatter,
    );
    assert!(matches!(bad, Err(CliError::Store(_))));

    let missing = project::execute_project(
        ProjectArgs {
            action: ProjectAction::Delete {
                id: "nope".to_string(),
                yes: true,
            },
        },
        &setup.ctx,
        &formatter,
    );
    assert!(matches!(missing, Err(CliError::NotFound { kind: "Project", .. })));
}

#[test]
fn test_upload_stores_sanitized_copy() {
    let setup = Setup::new();
    let path = setup.local_file("my notes.txt", "Ownership moves values.");

    let upload =
        document::upload_document(&setup.ctx, &setup.project_id, &path, DocumentCategory::Resource)
            .unwrap();
    assert!(!upload.replaced);
    assert_eq!(upload.document.filename, "my_notes.txt");
    assert!(upload.document.file_path.starts_with(setup.dir.path().join("uploads").to_str().unwrap()));
    assert_eq!(fs::read_to_string(&upload.document.file_path).unwrap(), "Ownership moves values.");
}

#[test]
fn test_reupload_replaces_file_and_clears_cache() {
    let setup = Setup::new();
    let id = setup.upload("notes.txt", "first version", DocumentCategory::Resource);

    assert_eq!(document::document_text(&setup.ctx, &id).unwrap(), "first version");
    let cached = setup.ctx.store().unwrap().get_document(&id).unwrap().unwrap();
    assert_eq!(cached.content.as_deref(), Some("first version"));

    let path = setup.local_file("notes.txt", "second version");
    let upload =
        document::upload_document(&setup.ctx, &setup.project_id, &path, DocumentCategory::Resource)
            .unwrap();
    assert!(upload.replaced);
    assert_eq!(upload.document.id, id);
    assert!(upload.document.content.is_none());
    assert_eq!(document::document_text(&setup.ctx, &id).unwrap(), "second version");
}

#[test]
fn test_document_text_ignores_cache_when_disabled() {
    let mut config = Config::default();
    config.generator.cache_extracted_text = false;
    let setup = Setup::with_config(config);
    let id = setup.upload("notes.txt", "on disk", DocumentCategory::Resource);

    // Text left behind by an earlier run with caching on
    setup.ctx.store().unwrap().cache_document_content(&id, "stale copy").unwrap();

    assert_eq!(document::document_text(&setup.ctx, &id).unwrap(), "on disk");
    let stored = setup.ctx.store().unwrap().get_document(&id).unwrap().unwrap();
    assert_eq!(stored.content.as_deref(), Some("stale copy"));
}

#[test]
fn test_reupload_with_other_category_rejected() {
    let setup = Setup::new();
    setup.upload("exam.txt", "Q1?", DocumentCategory::Test);

    let path = setup.local_file("exam.txt", "Q1?");
    let result =
        document::upload_document(&setup.ctx, &setup.project_id, &path, DocumentCategory::Resource);
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}

#[test]
fn test_upload_to_unknown_project() {
    let setup = Setup::new();
    let path = setup.local_file("notes.txt", "text");
    let result = document::upload_document(&setup.ctx, "nope", &path, DocumentCategory::Resource);
    assert!(matches!(result, Err(CliError::NotFound { kind: "Project", .. })));
}

#[test]
fn test_document_text_unsupported_format() {
    let setup = Setup::new();
    let id = setup.upload("slides.key", "binary", DocumentCategory::Resource);
    let result = document::document_text(&setup.ctx, &id);
    assert!(matches!(result, Err(CliError::Extraction(msg)) if msg.contains("unsupported format")));
}

#[test]
fn test_session_links_only_matching_categories() {
    let setup = Setup::new();
    let resource = setup.upload("notes.txt", "text", DocumentCategory::Resource);
    let test = setup.upload("exam.txt", "Q?", DocumentCategory::Test);

    // The test document is offered as a resource and is skipped
    let session_id = setup.session(vec![resource.clone(), test.clone()], vec![]);
    let stored = setup.ctx.store().unwrap().get_session(&session_id).unwrap().unwrap();
    assert_eq!(stored.resource_document_ids, vec![resource]);
    assert!(stored.test_document_ids.is_empty());

    let linked = session::attach_documents(&setup.ctx, &session_id, &[], &[test.clone()]).unwrap();
    assert_eq!(linked, 1);
    let linked = session::attach_documents(&setup.ctx, &session_id, &[], &[test]).unwrap();
    assert_eq!(linked, 0);
}

#[test]
fn test_attach_to_unknown_session() {
    let setup = Setup::new();
    let result = session::attach_documents(&setup.ctx, "nope", &[], &[]);
    assert!(matches!(result, Err(CliError::NotFound { kind: "Session", .. })));
}

#[test]
fn test_delete_project_removes_files() {
    let setup = Setup::new();
    let id = setup.upload("notes.txt", "text", DocumentCategory::Resource);
    let path = setup.ctx.store().unwrap().get_document(&id).unwrap().unwrap().file_path;
    assert!(PathBuf::from(&path).exists());

    project::delete_project(&setup.ctx, &setup.project_id).unwrap();
    assert!(!PathBuf::from(&path).exists());
    assert!(setup.ctx.store().unwrap().get_document(&id).unwrap().is_none());
}

#[tokio::test]
async fn test_generate_through_shared_store() {
    let setup = Setup::new();
    let good = setup.upload("ownership.txt", "Each value has one owner.", DocumentCategory::Resource);
    let broken = setup.upload("deck.key", "binary", DocumentCategory::Resource);
    let session_id = setup.session(vec![good.clone(), broken.clone()], vec![]);

    let provider = MockProvider::new(r#"{"question":"Who owns a value?","answer":"One owner."}"#);
    let report = questions::generate(&setup.ctx, provider.clone(), &session_id, Some("ownership"))
        .await
        .unwrap();

    assert_eq!(report.created_count, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].document_id, broken);
    assert_eq!(provider.call_count(), 1);
    assert!(provider.prompts()[0].contains("topic of: ownership"));

    let stored = setup.ctx.store().unwrap().list_questions(&session_id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].source, QuestionSource::Resource);
    assert_eq!(stored[0].parse_mode, ParseMode::Structured);
    assert_eq!(stored[0].resource_document_ids, vec![good]);
}

#[tokio::test]
async fn test_extract_without_test_documents() {
    let setup = Setup::new();
    let resource = setup.upload("notes.txt", "text", DocumentCategory::Resource);
    let session_id = setup.session(vec![resource], vec![]);

    let result = questions::extract(&setup.ctx, MockProvider::default(), &session_id).await;
    assert!(matches!(result, Err(CliError::Generator(_))));
}

#[tokio::test]
async fn test_extract_then_review() {
    let setup = Setup::new();
    let exam = setup.upload(
        "exam.txt",
        "Midterm\n1. Define ownership.\n2. What is a lifetime?",
        DocumentCategory::Test,
    );
    let session_id = setup.session(vec![], vec![exam.clone()]);

    let provider = MockProvider::new(
        r#"```json
[{"question":"1. Define ownership.","answer":""},{"question":"2. What is a lifetime?"}]
```"#,
    );
    let report = questions::extract(&setup.ctx, provider, &session_id).await.unwrap();
    assert_eq!(report.created_count, 2);
    assert_eq!(report.questions[0].test_document_id.as_deref(), Some(exam.as_str()));
    assert_eq!(report.questions[1].references[0].locator.line, Some(3));

    let review = gym_domain::QuestionReview {
        correction: Some("A scope-bound borrow region.".to_string()),
        evaluation: Some(75.0),
    };
    let id = report.questions[1].id.clone();
    setup.ctx.store().unwrap().review_question(&id, &review).unwrap();
    let reviewed = setup.ctx.store().unwrap().get_question(&id).unwrap().unwrap();
    assert_eq!(reviewed.evaluation, Some(75.0));
}
