//! Questions command implementation.

use crate::cli::{QuestionsAction, QuestionsArgs};
use crate::context::Context;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gym_domain::traits::{LearningStore, LlmProvider};
use gym_domain::QuestionReview;
use gym_generator::{BatchReport, Generator};
use gym_llm::GeminiProvider;
use std::fmt::Display;
use std::sync::Arc;

/// Execute a questions command.
pub async fn execute_questions(
    args: QuestionsArgs,
    ctx: &Context,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        QuestionsAction::Generate { session_id, topic } => {
            let provider = GeminiProvider::from_config(&ctx.config().llm)?;
            let report = generate(ctx, provider, &session_id, topic.as_deref()).await?;
            println!("{}", formatter.format_report(&report)?);
        }
        QuestionsAction::Extract { session_id } => {
            let provider = GeminiProvider::from_config(&ctx.config().llm)?;
            let report = extract(ctx, provider, &session_id).await?;
            println!("{}", formatter.format_report(&report)?);
        }
        QuestionsAction::List { session_id } => {
            let store = ctx.store()?;
            if store.get_session(&session_id)?.is_none() {
                return Err(CliError::not_found("Session", &session_id));
            }
            let questions = store.list_questions(&session_id)?;
            println!("{}", formatter.format_questions(&questions)?);
        }
        QuestionsAction::Review {
            id,
            correction,
            evaluation,
        } => {
            if correction.is_none() && evaluation.is_none() {
                return Err(CliError::InvalidInput(
                    "Give --correction and/or --evaluation".to_string(),
                ));
            }
            let review = QuestionReview {
                correction,
                evaluation,
            };
            ctx.store()?.review_question(&id, &review)?;
            println!("{}", formatter.success(&format!("Reviewed question {}", id)));
        }
    }
    Ok(())
}

/// Generate one question per RESOURCE document of a session
pub async fn generate<L>(
    ctx: &Context,
    provider: L,
    session_id: &str,
    topic: Option<&str>,
) -> Result<BatchReport>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    let generator = build_generator(ctx, provider)?;
    Ok(generator.generate_from_resources_on(session_id, topic).await?)
}

/// Extract the questions of a session's TEST documents
pub async fn extract<L>(ctx: &Context, provider: L, session_id: &str) -> Result<BatchReport>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    let generator = build_generator(ctx, provider)?;
    Ok(generator.extract_from_tests(session_id).await?)
}

fn build_generator<L>(ctx: &Context, provider: L) -> Result<Generator<L, gym_store::SqliteStore>>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    Ok(Generator::with_shared_store(
        Arc::new(provider),
        ctx.shared_store(),
        ctx.config().generator.clone(),
    )?)
}
