//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use gym_domain::{Document, LearningSession, Milestone, Project, Question};
use gym_generator::BatchReport;
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest cell text shown in tables before eliding
const MAX_CELL_CHARS: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Active output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format projects.
    pub fn format_projects(&self, projects: &[Project]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(projects.iter().map(project_json).collect()),
            OutputFormat::Quiet => Ok(ids(projects.iter().map(|p| p.id.as_str()))),
            OutputFormat::Table => {
                if projects.is_empty() {
                    return Ok(self.colorize("No projects found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Title", "Performance", "Difficulty", "Interest", "Motivations"]);
                for p in projects {
                    builder.push_record([
                        p.id.clone(),
                        elide(&p.title),
                        format!("{:.0}", p.overall_performance),
                        format!("{:.0}", p.difficulty),
                        format!("{:.0}", p.interest),
                        elide(&p.motivations.join(", ")),
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format one project together with its milestones.
    pub fn format_project(&self, project: &Project, milestones: &[Milestone]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut value = project_json(project);
                value["milestones"] = milestones.iter().map(milestone_json).collect();
                to_json(value)
            }
            OutputFormat::Quiet => Ok(project.id.clone()),
            OutputFormat::Table => Ok(format!(
                "{}\n{}",
                self.format_projects(std::slice::from_ref(project))?,
                self.format_milestones(milestones)?
            )),
        }
    }

    /// Format milestones.
    pub fn format_milestones(&self, milestones: &[Milestone]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(milestones.iter().map(milestone_json).collect()),
            OutputFormat::Quiet => Ok(ids(milestones.iter().map(|m| m.id.as_str()))),
            OutputFormat::Table => {
                if milestones.is_empty() {
                    return Ok(self.colorize("No milestones found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Title", "Due", "Deadline"]);
                for m in milestones {
                    builder.push_record([
                        m.id.clone(),
                        elide(&m.title),
                        format_date(m.due_date),
                        if m.is_deadline { "yes" } else { "" }.to_string(),
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format sessions.
    pub fn format_sessions(&self, sessions: &[LearningSession]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(sessions.iter().map(session_json).collect()),
            OutputFormat::Quiet => Ok(ids(sessions.iter().map(|s| s.id.as_str()))),
            OutputFormat::Table => {
                if sessions.is_empty() {
                    return Ok(self.colorize("No sessions found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Date", "Minutes", "Objective", "Resources", "Tests"]);
                for s in sessions {
                    builder.push_record([
                        s.id.clone(),
                        format_date(s.created_at),
                        s.duration_minutes.to_string(),
                        elide(s.learning_objective.as_deref().unwrap_or("")),
                        s.resource_document_ids.len().to_string(),
                        s.test_document_ids.len().to_string(),
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format one session with the documents linked to it.
    pub fn format_session(&self, session: &LearningSession, documents: &[Document]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut value = session_json(session);
                value["documents"] = documents.iter().map(document_json).collect();
                to_json(value)
            }
            OutputFormat::Quiet => Ok(session.id.clone()),
            OutputFormat::Table => Ok(format!(
                "{}\n{}",
                self.format_sessions(std::slice::from_ref(session))?,
                self.format_documents(documents)?
            )),
        }
    }

    /// Format documents.
    pub fn format_documents(&self, documents: &[Document]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(documents.iter().map(document_json).collect()),
            OutputFormat::Quiet => Ok(ids(documents.iter().map(|d| d.id.as_str()))),
            OutputFormat::Table => {
                if documents.is_empty() {
                    return Ok(self.colorize("No documents found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Filename", "Category", "Uploaded", "Text cached"]);
                for d in documents {
                    builder.push_record([
                        d.id.clone(),
                        elide(&d.filename),
                        d.category.to_string(),
                        format_date(d.uploaded_at),
                        if d.content.is_some() { "yes" } else { "no" }.to_string(),
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format questions.
    pub fn format_questions(&self, questions: &[Question]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(questions.iter().map(question_json).collect()),
            OutputFormat::Quiet => Ok(ids(questions.iter().map(|q| q.id.as_str()))),
            OutputFormat::Table => self.questions_table(questions),
        }
    }

    fn questions_table(&self, questions: &[Question]) -> Result<String> {
        if questions.is_empty() {
            return Ok(self.colorize("No questions found.", "yellow"));
        }
        let mut builder = Builder::default();
        builder.push_record(["ID", "Source", "Question", "Answer", "Evaluation", "Line"]);
        for q in questions {
            let mut source = q.source.as_str().to_string();
            if q.parse_mode.is_low_confidence() {
                source.push_str(" (?)");
            }
            let line = q
                .references
                .first()
                .and_then(|r| r.locator.line)
                .map(|l| l.to_string())
                .unwrap_or_default();
            builder.push_record([
                q.id.clone(),
                source,
                elide(&q.question),
                elide(q.correction.as_deref().unwrap_or(&q.answer)),
                q.evaluation.map(|e| format!("{:.0}", e)).unwrap_or_default(),
                line,
            ]);
        }
        Ok(render(builder))
    }

    /// Format the outcome of a generation or extraction batch.
    pub fn format_report(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(json!({
                "createdCount": report.created_count,
                "questions": report.questions.iter().map(question_json).collect::<Vec<_>>(),
                "failures": report.failures.iter().map(|f| json!({
                    "documentId": f.document_id,
                    "filename": f.filename,
                    "stage": f.stage.as_str(),
                    "state": f.stage.terminal_state().to_string(),
                    "reason": f.reason,
                })).collect::<Vec<_>>(),
                "skipped": report.skipped,
            })),
            OutputFormat::Quiet => Ok(ids(report.questions.iter().map(|q| q.id.as_str()))),
            OutputFormat::Table => {
                let mut lines = Vec::new();
                if !report.questions.is_empty() {
                    lines.push(self.questions_table(&report.questions)?);
                }
                lines.push(self.success(&format!("Created {} question(s)", report.created_count)));

                let low_confidence = report.low_confidence().count();
                if low_confidence > 0 {
                    lines.push(self.warning(&format!(
                        "{} question(s) were recovered from a non-JSON reply (marked ?)",
                        low_confidence
                    )));
                }
                for failure in &report.failures {
                    lines.push(self.error(&failure.to_string()));
                }
                if !report.skipped.is_empty() {
                    lines.push(self.info(&format!(
                        "Skipped {} document(s) of another category",
                        report.skipped.len()
                    )));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Message for a newly created record; just the ID in quiet mode.
    pub fn created(&self, kind: &str, id: &str) -> String {
        match self.format {
            OutputFormat::Quiet => id.to_string(),
            _ => self.success(&format!("{} created: {}", kind, id)),
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Render a Unix timestamp as a UTC calendar date.
pub fn format_date(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn elide(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

fn ids<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    ids.collect::<Vec<_>>().join("\n")
}

fn to_json(value: Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(&value)?)
}

fn project_json(p: &Project) -> Value {
    json!({
        "id": p.id,
        "title": p.title,
        "overallPerformance": p.overall_performance,
        "difficulty": p.difficulty,
        "interest": p.interest,
        "motivations": p.motivations,
    })
}

fn milestone_json(m: &Milestone) -> Value {
    json!({
        "id": m.id,
        "projectId": m.project_id,
        "title": m.title,
        "dueDate": format_date(m.due_date),
        "isDeadline": m.is_deadline,
    })
}

fn session_json(s: &LearningSession) -> Value {
    json!({
        "id": s.id,
        "projectId": s.project_id,
        "durationMinutes": s.duration_minutes,
        "motivation": s.motivation,
        "learningObjective": s.learning_objective,
        "awarenessLevel": s.metrics.awareness_level,
        "confidenceLevel": s.metrics.confidence_level,
        "energyLevel": s.metrics.energy_level,
        "performanceLevel": s.metrics.performance_level,
        "satisfactionLevel": s.metrics.satisfaction_level,
        "resourceDocumentIds": s.resource_document_ids,
        "testDocumentIds": s.test_document_ids,
        "createdAt": s.created_at,
    })
}

fn document_json(d: &Document) -> Value {
    json!({
        "id": d.id,
        "projectId": d.project_id,
        "filename": d.filename,
        "category": d.category.as_str(),
        "textCached": d.content.is_some(),
        "uploadedAt": d.uploaded_at,
    })
}

fn question_json(q: &Question) -> Value {
    json!({
        "id": q.id,
        "sessionId": q.session_id,
        "question": q.question,
        "answer": q.answer,
        "correction": q.correction,
        "evaluation": q.evaluation,
        "source": q.source.as_str(),
        "parseMode": q.parse_mode.as_str(),
        "testDocumentId": q.test_document_id,
        "resourceDocumentIds": q.resource_document_ids,
        "references": q.references.iter().map(|r| json!({
            "documentId": r.document_id,
            "line": r.locator.line,
            "page": r.locator.page,
            "offset": r.locator.offset,
            "context": r.locator.context,
        })).collect::<Vec<_>>(),
    })
}
