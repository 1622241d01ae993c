//! Document command implementation.

use crate::cli::{DocumentAction, DocumentArgs};
use crate::context::Context;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gym_domain::traits::LearningStore;
use gym_domain::{Document, DocumentCategory};
use gym_store::sanitize_filename;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Execute a document command.
pub fn execute_document(args: DocumentArgs, ctx: &Context, formatter: &Formatter) -> Result<()> {
    match args.action {
        DocumentAction::Upload {
            project_id,
            path,
            category,
        } => {
            let upload = upload_document(ctx, &project_id, &path, category.into())?;
            if upload.replaced {
                println!(
                    "{}",
                    formatter.success(&format!(
                        "Replaced file of {} ({})",
                        upload.document.filename, upload.document.id
                    ))
                );
            } else {
                println!("{}", formatter.created("Document", &upload.document.id));
            }
        }
        DocumentAction::List {
            project_id,
            category,
        } => {
            let store = ctx.store()?;
            if store.get_project(&project_id)?.is_none() {
                return Err(CliError::not_found("Project", &project_id));
            }
            let category: Option<DocumentCategory> = category.map(Into::into);
            let documents: Vec<Document> = store
                .list_documents(&project_id)?
                .into_iter()
                .filter(|d| category.map_or(true, |c| d.category == c))
                .collect();
            println!("{}", formatter.format_documents(&documents)?);
        }
        DocumentAction::Show { id } => {
            let document = get_document(ctx, &id)?;
            println!("{}", formatter.format_documents(std::slice::from_ref(&document))?);
        }
        DocumentAction::Text { id } => {
            println!("{}", document_text(ctx, &id)?);
        }
        DocumentAction::Download { id, output } => {
            let document = get_document(ctx, &id)?;
            let destination = output.unwrap_or_else(|| PathBuf::from(&document.filename));
            let bytes = ctx.files().read(&document.file_path)?;
            fs::write(&destination, bytes)?;
            println!(
                "{}",
                formatter.success(&format!("Saved {} to {}", document.filename, destination.display()))
            );
        }
        DocumentAction::Delete { id } => {
            let document = get_document(ctx, &id)?;
            ctx.store()?.delete_document(&id)?;
            if let Err(e) = ctx.files().remove(&document.file_path) {
                warn!("Could not remove {}: {}", document.file_path, e);
            }
            println!("{}", formatter.success(&format!("Deleted document {}", id)));
        }
    }
    Ok(())
}

/// Result of an upload
#[derive(Debug)]
pub struct Upload {
    /// The document as stored
    pub document: Document,

    /// Whether an existing document with the same filename got the new file
    pub replaced: bool,
}

/// Copy a local file into the project's upload area and record it
///
/// Uploading a filename the project already has (after sanitizing) replaces
/// that document's file and drops its cached text. The category must match.
pub fn upload_document(
    ctx: &Context,
    project_id: &str,
    path: &Path,
    category: DocumentCategory,
) -> Result<Upload> {
    let original = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::InvalidInput(format!("Not a file: {}", path.display())))?;
    let stored_name = sanitize_filename(original).ok_or_else(|| {
        CliError::InvalidInput(format!("Filename '{}' has no usable characters", original))
    })?;
    let bytes = fs::read(path)?;

    let mut store = ctx.store()?;
    if store.get_project(project_id)?.is_none() {
        return Err(CliError::not_found("Project", project_id));
    }
    let existing = store
        .list_documents(project_id)?
        .into_iter()
        .find(|d| d.filename == stored_name);
    if let Some(doc) = &existing {
        if doc.category != category {
            return Err(CliError::InvalidInput(format!(
                "'{}' is already uploaded as a {} document",
                stored_name, doc.category
            )));
        }
    }

    let (stored_name, stored_path) = ctx.files().save(project_id, original, &bytes)?;
    let stored_path = stored_path.to_string_lossy().into_owned();

    let (id, replaced) = match existing {
        Some(doc) => {
            store.replace_document_file(&doc.id, &stored_name, &stored_path)?;
            (doc.id, true)
        }
        None => {
            let document = Document::new(project_id, &stored_name, &stored_path, category);
            (store.create_document(document)?, false)
        }
    };
    info!("Stored {} as document {}", stored_name, id);

    let document = store
        .get_document(&id)?
        .ok_or_else(|| CliError::not_found("Document", &id))?;
    Ok(Upload { document, replaced })
}

/// Plain text of a document, from the cache when caching is enabled
pub fn document_text(ctx: &Context, id: &str) -> Result<String> {
    let document = get_document(ctx, id)?;
    let use_cache = ctx.config().generator.cache_extracted_text;
    if let Some(content) = document.content.filter(|_| use_cache) {
        return Ok(content);
    }

    let text = gym_text::extract(&document.file_path)
        .into_result()
        .map_err(|e| CliError::Extraction(format!("{}: {}", document.filename, e)))?;
    if use_cache {
        ctx.store()?.cache_document_content(id, &text)?;
    }
    Ok(text)
}

fn get_document(ctx: &Context, id: &str) -> Result<Document> {
    ctx.store()?
        .get_document(id)?
        .ok_or_else(|| CliError::not_found("Document", id))
}
