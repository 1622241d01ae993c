//! Session command implementation.

use crate::cli::{CreateSessionArgs, SessionAction, SessionArgs};
use crate::context::Context;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gym_domain::traits::LearningStore;
use gym_domain::{DocumentCategory, LearningSession};

/// Execute a session command.
pub fn execute_session(args: SessionArgs, ctx: &Context, formatter: &Formatter) -> Result<()> {
    match args.action {
        SessionAction::Create(args) => {
            let requested = args.resources.len() + args.tests.len();
            let session = create_session(ctx, args)?;
            println!("{}", formatter.created("Session", &session.id));

            let linked = session.resource_document_ids.len() + session.test_document_ids.len();
            if linked < requested {
                println!("{}", formatter.warning(&skipped_message(requested - linked)));
            }
        }
        SessionAction::List { project_id } => {
            let store = ctx.store()?;
            if store.get_project(&project_id)?.is_none() {
                return Err(CliError::not_found("Project", &project_id));
            }
            let sessions = store.list_sessions(&project_id)?;
            println!("{}", formatter.format_sessions(&sessions)?);
        }
        SessionAction::Show { id } => {
            let store = ctx.store()?;
            let session = store
                .get_session(&id)?
                .ok_or_else(|| CliError::not_found("Session", &id))?;
            let mut documents = store.session_documents(&id, DocumentCategory::Resource)?;
            documents.extend(store.session_documents(&id, DocumentCategory::Test)?);
            println!("{}", formatter.format_session(&session, &documents)?);
        }
        SessionAction::Attach {
            session_id,
            resources,
            tests,
        } => {
            let requested = resources.len() + tests.len();
            let linked = attach_documents(ctx, &session_id, &resources, &tests)?;
            println!(
                "{}",
                formatter.success(&format!("Linked {} document(s) to {}", linked, session_id))
            );
            if linked < requested {
                println!("{}", formatter.warning(&skipped_message(requested - linked)));
            }
        }
    }
    Ok(())
}

/// Record a session and link the requested documents
///
/// Returns the session as stored, so its document lists show what was
/// actually linked.
pub fn create_session(ctx: &Context, args: CreateSessionArgs) -> Result<LearningSession> {
    let mut session = LearningSession::new(args.project_id, args.duration);
    session.motivation = args.motivation;
    session.learning_objective = args.objective;
    session.metrics.awareness_level = args.awareness;
    session.metrics.confidence_level = args.confidence;
    session.metrics.energy_level = args.energy;
    session.metrics.performance_level = args.performance;
    session.metrics.satisfaction_level = args.satisfaction;
    session.resource_document_ids = args.resources;
    session.test_document_ids = args.tests;

    let mut store = ctx.store()?;
    let id = store.create_session(session)?;
    store
        .get_session(&id)?
        .ok_or_else(|| CliError::not_found("Session", &id))
}

/// Link more documents to an existing session; returns how many were new links
pub fn attach_documents(
    ctx: &Context,
    session_id: &str,
    resources: &[String],
    tests: &[String],
) -> Result<usize> {
    let mut store = ctx.store()?;
    if store.get_session(session_id)?.is_none() {
        return Err(CliError::not_found("Session", session_id));
    }
    let linked = store.link_session_documents(session_id, DocumentCategory::Resource, resources)?
        + store.link_session_documents(session_id, DocumentCategory::Test, tests)?;
    Ok(linked)
}

fn skipped_message(count: usize) -> String {
    format!(
        "{} document(s) skipped: unknown, from another project, of the wrong category, or already linked",
        count
    )
}
