//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use std::time::Duration;

use crate::{
    Document, DocumentCategory, LearningSession, Milestone, Project, Question, QuestionReview,
};

/// Trait for storing and retrieving learning records
///
/// Implemented by the infrastructure layer (gym-store). Records are keyed by
/// opaque string identifiers; child records are filtered by their parent key.
pub trait LearningStore {
    /// Error type for store operations
    type Error;

    /// Create a project
    fn create_project(&mut self, project: Project) -> Result<String, Self::Error>;

    /// Get a project by ID
    fn get_project(&self, id: &str) -> Result<Option<Project>, Self::Error>;

    /// List all projects
    fn list_projects(&self) -> Result<Vec<Project>, Self::Error>;

    /// Delete a project and everything it owns; returns whether it existed
    fn delete_project(&mut self, id: &str) -> Result<bool, Self::Error>;

    /// Create a milestone; a new deadline replaces the project's previous one
    fn create_milestone(&mut self, milestone: Milestone) -> Result<String, Self::Error>;

    /// List milestones of a project ordered by due date
    fn list_milestones(&self, project_id: &str) -> Result<Vec<Milestone>, Self::Error>;

    /// Create a learning session
    fn create_session(&mut self, session: LearningSession) -> Result<String, Self::Error>;

    /// Get a session (with linked document IDs) by ID
    fn get_session(&self, id: &str) -> Result<Option<LearningSession>, Self::Error>;

    /// List sessions of a project
    fn list_sessions(&self, project_id: &str) -> Result<Vec<LearningSession>, Self::Error>;

    /// Link documents of `category` to a session
    ///
    /// Documents that do not exist, belong to another project, have another
    /// category, or are already linked are skipped. Returns how many were linked.
    fn link_session_documents(
        &mut self,
        session_id: &str,
        category: DocumentCategory,
        document_ids: &[String],
    ) -> Result<usize, Self::Error>;

    /// Documents linked to a session under `category`
    fn session_documents(
        &self,
        session_id: &str,
        category: DocumentCategory,
    ) -> Result<Vec<Document>, Self::Error>;

    /// Create a document record
    fn create_document(&mut self, document: Document) -> Result<String, Self::Error>;

    /// Get a document by ID
    fn get_document(&self, id: &str) -> Result<Option<Document>, Self::Error>;

    /// List documents of a project
    fn list_documents(&self, project_id: &str) -> Result<Vec<Document>, Self::Error>;

    /// Cache extracted text on a document
    fn cache_document_content(&mut self, id: &str, content: &str) -> Result<(), Self::Error>;

    /// Point a document at a new file; clears any cached text
    fn replace_document_file(
        &mut self,
        id: &str,
        filename: &str,
        file_path: &str,
    ) -> Result<(), Self::Error>;

    /// Delete a document; returns whether it existed
    fn delete_document(&mut self, id: &str) -> Result<bool, Self::Error>;

    /// Create a question together with its references and document links
    fn create_question(&mut self, question: Question) -> Result<String, Self::Error>;

    /// Get a question by ID
    fn get_question(&self, id: &str) -> Result<Option<Question>, Self::Error>;

    /// List questions of a session in creation order
    fn list_questions(&self, session_id: &str) -> Result<Vec<Question>, Self::Error>;

    /// Apply reviewer edits (correction / evaluation)
    fn review_question(&mut self, id: &str, review: &QuestionReview) -> Result<(), Self::Error>;

    /// Delete a question; returns whether it existed
    fn delete_question(&mut self, id: &str) -> Result<bool, Self::Error>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (gym-llm). Calls may be slow and
/// may fail; callers must not assume either way.
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Send a prompt and return the raw reply text
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Like [`generate`](Self::generate), but give up once `budget` has elapsed
    ///
    /// Blocking calls cannot be cancelled from outside, so providers that can
    /// bound their own work (request timeouts, retries) should override this.
    /// The default ignores the budget.
    fn generate_within(&self, prompt: &str, budget: Duration) -> Result<String, Self::Error> {
        let _ = budget;
        self.generate(prompt)
    }

    /// Name of the model answering the prompts
    fn model_name(&self) -> &str {
        "llm"
    }
}

