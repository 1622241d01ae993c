//! Learning Gym Storage Layer
//!
//! Implements the [`LearningStore`] trait on SQLite, plus a [`FileStore`] for
//! the uploaded files themselves.
//!
//! # Architecture
//!
//! - SQLite for projects, milestones, sessions, documents and questions
//! - Foreign keys with `ON DELETE CASCADE`: deleting a project removes
//!   everything it owns
//! - Uploaded bytes live on disk under `<root>/<project_id>/<filename>`
//!
//! # Examples
//!
//! ```no_run
//! use gym_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for project operations
//! ```

#![warn(missing_docs)]

mod files;

pub use files::{sanitize_filename, FileStore};

use gym_domain::traits::LearningStore;
use gym_domain::{
    Document, DocumentCategory, DocumentReference, LearningSession, Locator, Milestone, ParseMode,
    Project, Question, QuestionReview, QuestionSource, SessionMetrics, ValidationError,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind ("project", "session", ...)
        kind: &'static str,
        /// Requested identifier
        id: String,
    },

    /// Record failed domain validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Filesystem error (uploads)
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    fn not_found(kind: &'static str, id: &str) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

fn conversion_error(column: usize, detail: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(StoreError::InvalidData(detail)),
    )
}

/// SQLite-based implementation of [`LearningStore`]
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store across tasks behind
/// a `Mutex`, or give each thread its own `SqliteStore`.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gym_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("learning-gym.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn exists(&self, table: &str, id: &str) -> Result<bool, StoreError> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table);
        Ok(self
            .conn
            .query_row(&sql, params![id], |_| Ok(true))
            .optional()?
            .unwrap_or(false))
    }

    fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
        let motivations: String = row.get(5)?;
        let motivations = serde_json::from_str(&motivations)
            .map_err(|e| conversion_error(5, format!("motivations: {}", e)))?;
        Ok(Project {
            id: row.get(0)?,
            title: row.get(1)?,
            overall_performance: row.get(2)?,
            difficulty: row.get(3)?,
            interest: row.get(4)?,
            motivations,
        })
    }

    fn row_to_milestone(row: &Row<'_>) -> rusqlite::Result<Milestone> {
        Ok(Milestone {
            id: row.get(0)?,
            project_id: row.get(1)?,
            title: row.get(2)?,
            due_date: row.get::<_, i64>(3)? as u64,
            is_deadline: row.get(4)?,
        })
    }

    fn row_to_session(row: &Row<'_>) -> rusqlite::Result<LearningSession> {
        Ok(LearningSession {
            id: row.get(0)?,
            project_id: row.get(1)?,
            duration_minutes: row.get(2)?,
            motivation: row.get(3)?,
            learning_objective: row.get(4)?,
            metrics: SessionMetrics {
                awareness_level: row.get(5)?,
                confidence_level: row.get(6)?,
                energy_level: row.get(7)?,
                performance_level: row.get(8)?,
                satisfaction_level: row.get(9)?,
            },
            resource_document_ids: Vec::new(),
            test_document_ids: Vec::new(),
            created_at: row.get::<_, i64>(10)? as u64,
        })
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let category: String = row.get(4)?;
        let category = DocumentCategory::parse(&category)
            .ok_or_else(|| conversion_error(4, format!("unknown category: {}", category)))?;
        Ok(Document {
            id: row.get(0)?,
            project_id: row.get(1)?,
            filename: row.get(2)?,
            file_path: row.get(3)?,
            category,
            content: row.get(5)?,
            uploaded_at: row.get::<_, i64>(6)? as u64,
        })
    }

    fn row_to_question(row: &Row<'_>) -> rusqlite::Result<Question> {
        let source: String = row.get(6)?;
        let source = QuestionSource::parse(&source)
            .ok_or_else(|| conversion_error(6, format!("unknown source: {}", source)))?;
        let parse_mode: String = row.get(7)?;
        let parse_mode = ParseMode::parse(&parse_mode)
            .ok_or_else(|| conversion_error(7, format!("unknown parse mode: {}", parse_mode)))?;
        Ok(Question {
            id: row.get(0)?,
            session_id: row.get(1)?,
            question: row.get(2)?,
            answer: row.get(3)?,
            correction: row.get(4)?,
            evaluation: row.get(5)?,
            source,
            parse_mode,
            test_document_id: row.get(8)?,
            resource_document_ids: Vec::new(),
            references: Vec::new(),
            created_at: row.get::<_, i64>(9)? as u64,
        })
    }

    fn linked_document_ids(
        &self,
        session_id: &str,
        category: DocumentCategory,
    ) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT document_id FROM session_documents
             WHERE session_id = ?1 AND category = ?2 ORDER BY rowid",
        )?;
        let ids = stmt
            .query_map(params![session_id, category.as_str()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn load_session_links(&self, mut session: LearningSession) -> Result<LearningSession, StoreError> {
        session.resource_document_ids =
            self.linked_document_ids(&session.id, DocumentCategory::Resource)?;
        session.test_document_ids = self.linked_document_ids(&session.id, DocumentCategory::Test)?;
        Ok(session)
    }

    fn load_question_links(&self, mut question: Question) -> Result<Question, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT document_id FROM question_resources WHERE question_id = ?1 ORDER BY rowid",
        )?;
        question.resource_document_ids = stmt
            .query_map(params![&question.id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT document_id, line, page, char_offset, context
             FROM question_references WHERE question_id = ?1 ORDER BY position",
        )?;
        question.references = stmt
            .query_map(params![&question.id], |row| {
                Ok(DocumentReference {
                    document_id: row.get(0)?,
                    locator: Locator {
                        line: row.get(1)?,
                        page: row.get(2)?,
                        offset: row.get(3)?,
                        context: row.get(4)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(question)
    }
}

const PROJECT_COLUMNS: &str = "id, title, overall_performance, difficulty, interest, motivations";
const MILESTONE_COLUMNS: &str = "id, project_id, title, due_date, is_deadline";
const SESSION_COLUMNS: &str = "id, project_id, duration_minutes, motivation, learning_objective,
     awareness_level, confidence_level, energy_level, performance_level, satisfaction_level,
     created_at";
const DOCUMENT_COLUMNS: &str = "id, project_id, filename, file_path, category, content, uploaded_at";
const QUESTION_COLUMNS: &str = "id, session_id, question, answer, correction, evaluation, source,
     parse_mode, test_document_id, created_at";

impl LearningStore for SqliteStore {
    type Error = StoreError;

    fn create_project(&mut self, project: Project) -> Result<String, Self::Error> {
        project.validate()?;
        let motivations = serde_json::to_string(&project.motivations)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO projects (id, title, overall_performance, difficulty, interest, motivations)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &project.id,
                &project.title,
                project.overall_performance,
                project.difficulty,
                project.interest,
                motivations,
            ],
        )?;
        debug!("Created project {}", project.id);
        Ok(project.id)
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>, Self::Error> {
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_project)
            .optional()?)
    }

    fn list_projects(&self) -> Result<Vec<Project>, Self::Error> {
        let sql = format!("SELECT {} FROM projects ORDER BY rowid", PROJECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let projects = stmt
            .query_map([], Self::row_to_project)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    fn delete_project(&mut self, id: &str) -> Result<bool, Self::Error> {
        let removed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn create_milestone(&mut self, milestone: Milestone) -> Result<String, Self::Error> {
        milestone.validate()?;
        if !self.exists("projects", &milestone.project_id)? {
            return Err(StoreError::not_found("project", &milestone.project_id));
        }

        let tx = self.conn.transaction()?;
        if milestone.is_deadline {
            // A new deadline demotes the previous one
            tx.execute(
                "UPDATE milestones SET is_deadline = 0 WHERE project_id = ?1 AND is_deadline = 1",
                params![&milestone.project_id],
            )?;
        }
        tx.execute(
            "INSERT INTO milestones (id, project_id, title, due_date, is_deadline)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &milestone.id,
                &milestone.project_id,
                &milestone.title,
                milestone.due_date as i64,
                milestone.is_deadline,
            ],
        )?;
        tx.commit()?;
        Ok(milestone.id)
    }

    fn list_milestones(&self, project_id: &str) -> Result<Vec<Milestone>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM milestones WHERE project_id = ?1 ORDER BY due_date, rowid",
            MILESTONE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let milestones = stmt
            .query_map(params![project_id], Self::row_to_milestone)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(milestones)
    }

    fn create_session(&mut self, session: LearningSession) -> Result<String, Self::Error> {
        session.validate()?;
        if !self.exists("projects", &session.project_id)? {
            return Err(StoreError::not_found("project", &session.project_id));
        }

        let m = &session.metrics;
        self.conn.execute(
            "INSERT INTO sessions (id, project_id, duration_minutes, motivation, learning_objective,
                awareness_level, confidence_level, energy_level, performance_level,
                satisfaction_level, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &session.id,
                &session.project_id,
                session.duration_minutes,
                &session.motivation,
                &session.learning_objective,
                m.awareness_level,
                m.confidence_level,
                m.energy_level,
                m.performance_level,
                m.satisfaction_level,
                session.created_at as i64,
            ],
        )?;

        let id = session.id.clone();
        let resources = session.resource_document_ids.clone();
        let tests = session.test_document_ids.clone();
        self.link_session_documents(&id, DocumentCategory::Resource, &resources)?;
        self.link_session_documents(&id, DocumentCategory::Test, &tests)?;
        Ok(id)
    }

    fn get_session(&self, id: &str) -> Result<Option<LearningSession>, Self::Error> {
        let sql = format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS);
        let session = self
            .conn
            .query_row(&sql, params![id], Self::row_to_session)
            .optional()?;
        session.map(|s| self.load_session_links(s)).transpose()
    }

    fn list_sessions(&self, project_id: &str) -> Result<Vec<LearningSession>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE project_id = ?1 ORDER BY created_at, rowid",
            SESSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let sessions = stmt
            .query_map(params![project_id], Self::row_to_session)?
            .collect::<Result<Vec<_>, _>>()?;
        sessions
            .into_iter()
            .map(|s| self.load_session_links(s))
            .collect()
    }

    fn link_session_documents(
        &mut self,
        session_id: &str,
        category: DocumentCategory,
        document_ids: &[String],
    ) -> Result<usize, Self::Error> {
        let project_id: String = self
            .conn
            .query_row(
                "SELECT project_id FROM sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("session", session_id))?;

        let tx = self.conn.transaction()?;
        let mut linked = 0;
        for document_id in document_ids {
            // Only documents of the same project and category qualify
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO session_documents (session_id, document_id, category)
                 SELECT ?1, id, category FROM documents
                 WHERE id = ?2 AND project_id = ?3 AND category = ?4",
                params![session_id, document_id, &project_id, category.as_str()],
            )?;
            if inserted == 0 {
                debug!(
                    "Skipped linking document {} to session {} as {}",
                    document_id, session_id, category
                );
            }
            linked += inserted;
        }
        tx.commit()?;
        Ok(linked)
    }

    fn session_documents(
        &self,
        session_id: &str,
        category: DocumentCategory,
    ) -> Result<Vec<Document>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.project_id, d.filename, d.file_path, d.category, d.content, d.uploaded_at
             FROM session_documents sd JOIN documents d ON d.id = sd.document_id
             WHERE sd.session_id = ?1 AND sd.category = ?2
             ORDER BY sd.rowid",
        )?;
        let documents = stmt
            .query_map(params![session_id, category.as_str()], Self::row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    fn create_document(&mut self, document: Document) -> Result<String, Self::Error> {
        if document.filename.trim().is_empty() {
            return Err(ValidationError::new("filename", "filename is required").into());
        }
        if !self.exists("projects", &document.project_id)? {
            return Err(StoreError::not_found("project", &document.project_id));
        }

        self.conn.execute(
            "INSERT INTO documents (id, project_id, filename, file_path, category, content, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &document.id,
                &document.project_id,
                &document.filename,
                &document.file_path,
                document.category.as_str(),
                &document.content,
                document.uploaded_at as i64,
            ],
        )?;
        Ok(document.id)
    }

    fn get_document(&self, id: &str) -> Result<Option<Document>, Self::Error> {
        let sql = format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_document)
            .optional()?)
    }

    fn list_documents(&self, project_id: &str) -> Result<Vec<Document>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM documents WHERE project_id = ?1 ORDER BY uploaded_at, rowid",
            DOCUMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let documents = stmt
            .query_map(params![project_id], Self::row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    fn cache_document_content(&mut self, id: &str, content: &str) -> Result<(), Self::Error> {
        let updated = self.conn.execute(
            "UPDATE documents SET content = ?2 WHERE id = ?1",
            params![id, content],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("document", id));
        }
        Ok(())
    }

    fn replace_document_file(
        &mut self,
        id: &str,
        filename: &str,
        file_path: &str,
    ) -> Result<(), Self::Error> {
        let updated = self.conn.execute(
            "UPDATE documents SET filename = ?2, file_path = ?3, content = NULL WHERE id = ?1",
            params![id, filename, file_path],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("document", id));
        }
        Ok(())
    }

    fn delete_document(&mut self, id: &str) -> Result<bool, Self::Error> {
        let removed = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn create_question(&mut self, question: Question) -> Result<String, Self::Error> {
        question.validate()?;
        if !self.exists("sessions", &question.session_id)? {
            return Err(StoreError::not_found("session", &question.session_id));
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO questions (id, session_id, question, answer, correction, evaluation,
                source, parse_mode, test_document_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &question.id,
                &question.session_id,
                &question.question,
                &question.answer,
                &question.correction,
                question.evaluation,
                question.source.as_str(),
                question.parse_mode.as_str(),
                &question.test_document_id,
                question.created_at as i64,
            ],
        )?;
        for document_id in &question.resource_document_ids {
            tx.execute(
                "INSERT OR IGNORE INTO question_resources (question_id, document_id) VALUES (?1, ?2)",
                params![&question.id, document_id],
            )?;
        }
        for (position, reference) in question.references.iter().enumerate() {
            let locator = &reference.locator;
            tx.execute(
                "INSERT INTO question_references
                    (question_id, document_id, position, line, page, char_offset, context)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    &question.id,
                    &reference.document_id,
                    position as i64,
                    locator.line,
                    locator.page,
                    locator.offset,
                    &locator.context,
                ],
            )?;
        }
        tx.commit()?;
        Ok(question.id)
    }

    fn get_question(&self, id: &str) -> Result<Option<Question>, Self::Error> {
        let sql = format!("SELECT {} FROM questions WHERE id = ?1", QUESTION_COLUMNS);
        let question = self
            .conn
            .query_row(&sql, params![id], Self::row_to_question)
            .optional()?;
        question.map(|q| self.load_question_links(q)).transpose()
    }

    fn list_questions(&self, session_id: &str) -> Result<Vec<Question>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM questions WHERE session_id = ?1 ORDER BY created_at, rowid",
            QUESTION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let questions = stmt
            .query_map(params![session_id], Self::row_to_question)?
            .collect::<Result<Vec<_>, _>>()?;
        questions
            .into_iter()
            .map(|q| self.load_question_links(q))
            .collect()
    }

    fn review_question(&mut self, id: &str, review: &QuestionReview) -> Result<(), Self::Error> {
        review.validate()?;
        let updated = self.conn.execute(
            "UPDATE questions
             SET correction = COALESCE(?2, correction), evaluation = COALESCE(?3, evaluation)
             WHERE id = ?1",
            params![id, &review.correction, review.evaluation],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("question", id));
        }
        Ok(())
    }

    fn delete_question(&mut self, id: &str) -> Result<bool, Self::Error> {
        let removed = self
            .conn
            .execute("DELETE FROM questions WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
