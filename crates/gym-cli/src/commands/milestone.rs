//! Milestone command implementation.

use crate::cli::{MilestoneAction, MilestoneArgs};
use crate::context::Context;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use chrono::NaiveDate;
use gym_domain::traits::LearningStore;
use gym_domain::Milestone;

/// Execute a milestone command.
pub fn execute_milestone(args: MilestoneArgs, ctx: &Context, formatter: &Formatter) -> Result<()> {
    match args.action {
        MilestoneAction::Add {
            project_id,
            title,
            due,
            deadline,
        } => {
            let mut milestone = Milestone::new(project_id, title, parse_due_date(&due)?);
            if deadline {
                milestone = milestone.as_deadline();
            }
            let id = ctx.store()?.create_milestone(milestone)?;
            println!("{}", formatter.created("Milestone", &id));
        }
        MilestoneAction::List { project_id } => {
            let store = ctx.store()?;
            if store.get_project(&project_id)?.is_none() {
                return Err(CliError::not_found("Project", &project_id));
            }
            let milestones = store.list_milestones(&project_id)?;
            println!("{}", formatter.format_milestones(&milestones)?);
        }
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date into seconds since the epoch (midnight UTC).
pub fn parse_due_date(input: &str) -> Result<u64> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| {
        CliError::InvalidInput(format!("Invalid due date '{}' (expected YYYY-MM-DD): {}", input, e))
    })?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CliError::InvalidInput(format!("Invalid due date '{}'", input)))?;
    u64::try_from(midnight.and_utc().timestamp())
        .map_err(|_| CliError::InvalidInput(format!("Due date '{}' is before 1970", input)))
}
