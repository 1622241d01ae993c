//! Project command implementation.

use crate::cli::{ProjectAction, ProjectArgs};
use crate::context::Context;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gym_domain::traits::LearningStore;
use gym_domain::Project;
use std::io::{self, Write};
use tracing::warn;

/// Execute a project command.
pub fn execute_project(args: ProjectArgs, ctx: &Context, formatter: &Formatter) -> Result<()> {
    match args.action {
        ProjectAction::Create {
            title,
            performance,
            difficulty,
            interest,
            motivations,
        } => {
            let mut project = Project::new(title);
            project.overall_performance = performance;
            project.difficulty = difficulty;
            project.interest = interest;
            project.motivations = motivations;

            let id = ctx.store()?.create_project(project)?;
            println!("{}", formatter.created("Project", &id));
        }
        ProjectAction::List => {
            let projects = ctx.store()?.list_projects()?;
            println!("{}", formatter.format_projects(&projects)?);
        }
        ProjectAction::Show { id } => {
            let store = ctx.store()?;
            let project = store
                .get_project(&id)?
                .ok_or_else(|| CliError::not_found("Project", &id))?;
            let milestones = store.list_milestones(&id)?;
            println!("{}", formatter.format_project(&project, &milestones)?);
        }
        ProjectAction::Delete { id, yes } => {
            let project = ctx
                .store()?
                .get_project(&id)?
                .ok_or_else(|| CliError::not_found("Project", &id))?;

            if !yes && !confirm(&format!(
                "Delete project '{}' with all its sessions, documents and questions?",
                project.title
            ))? {
                println!("{}", formatter.info("Operation cancelled"));
                return Ok(());
            }

            delete_project(ctx, &id)?;
            println!("{}", formatter.success(&format!("Deleted project {}", id)));
        }
    }
    Ok(())
}

/// Delete a project's records, then its stored files
pub fn delete_project(ctx: &Context, id: &str) -> Result<()> {
    let documents = {
        let mut store = ctx.store()?;
        let documents = store.list_documents(id)?;
        store.delete_project(id)?;
        documents
    };

    for document in documents {
        if let Err(e) = ctx.files().remove(&document.file_path) {
            warn!("Could not remove {}: {}", document.file_path, e);
        }
    }
    Ok(())
}

/// Ask a yes/no question on stdin.
pub(crate) fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}
