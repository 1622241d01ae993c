//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use gym_domain::DocumentCategory;
use std::path::PathBuf;

/// Learning Gym - track learning projects and quiz yourself on your documents.
#[derive(Debug, Parser)]
#[command(name = "gym")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "GYM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage learning projects
    Project(ProjectArgs),

    /// Manage project milestones
    Milestone(MilestoneArgs),

    /// Manage learning sessions
    Session(SessionArgs),

    /// Upload and inspect documents
    Document(DocumentArgs),

    /// Generate, extract and review questions
    Questions(QuestionsArgs),
}

/// Arguments for project management.
#[derive(Debug, Parser)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub action: ProjectAction,
}

/// Project actions.
#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Create a project
    Create {
        /// Project title
        title: String,

        /// Overall performance (0-100)
        #[arg(long, default_value = "0")]
        performance: f64,

        /// Perceived difficulty (0-100)
        #[arg(long, default_value = "0")]
        difficulty: f64,

        /// Interest (0-100)
        #[arg(long, default_value = "0")]
        interest: f64,

        /// Motivation (repeatable)
        #[arg(short, long = "motivation")]
        motivations: Vec<String>,
    },

    /// List all projects
    List,

    /// Show a project with its milestones
    Show {
        /// Project ID
        id: String,
    },

    /// Delete a project with its sessions, documents and questions
    Delete {
        /// Project ID
        id: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Arguments for milestone management.
#[derive(Debug, Parser)]
pub struct MilestoneArgs {
    #[command(subcommand)]
    pub action: MilestoneAction,
}

/// Milestone actions.
#[derive(Debug, Subcommand)]
pub enum MilestoneAction {
    /// Add a milestone to a project
    Add {
        /// Project ID
        project_id: String,

        /// Milestone title
        title: String,

        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: String,

        /// Make this the project deadline (replaces the current one)
        #[arg(long)]
        deadline: bool,
    },

    /// List a project's milestones
    List {
        /// Project ID
        project_id: String,
    },
}

/// Arguments for session management.
#[derive(Debug, Parser)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionAction,
}

/// Session actions.
#[derive(Debug, Subcommand)]
pub enum SessionAction {
    /// Record a learning session
    Create(CreateSessionArgs),

    /// List a project's sessions
    List {
        /// Project ID
        project_id: String,
    },

    /// Show a session with its documents
    Show {
        /// Session ID
        id: String,
    },

    /// Link more documents to a session
    Attach {
        /// Session ID
        session_id: String,

        /// RESOURCE document ID (repeatable)
        #[arg(short, long = "resource")]
        resources: Vec<String>,

        /// TEST document ID (repeatable)
        #[arg(short, long = "test")]
        tests: Vec<String>,
    },
}

/// Arguments for recording a session.
#[derive(Debug, Parser)]
pub struct CreateSessionArgs {
    /// Project ID
    pub project_id: String,

    /// Duration in minutes
    #[arg(short, long)]
    pub duration: u32,

    /// What motivated the session
    #[arg(long)]
    pub motivation: Option<String>,

    /// Learning objective
    #[arg(long)]
    pub objective: Option<String>,

    /// Awareness level (0-100)
    #[arg(long)]
    pub awareness: Option<f64>,

    /// Confidence level (0-100)
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Energy level (0-100)
    #[arg(long)]
    pub energy: Option<f64>,

    /// Performance level (0-100)
    #[arg(long)]
    pub performance: Option<f64>,

    /// Satisfaction level (0-100)
    #[arg(long)]
    pub satisfaction: Option<f64>,

    /// RESOURCE document ID (repeatable)
    #[arg(short, long = "resource")]
    pub resources: Vec<String>,

    /// TEST document ID (repeatable)
    #[arg(short, long = "test")]
    pub tests: Vec<String>,
}

/// Arguments for document management.
#[derive(Debug, Parser)]
pub struct DocumentArgs {
    #[command(subcommand)]
    pub action: DocumentAction,
}

/// Document actions.
#[derive(Debug, Subcommand)]
pub enum DocumentAction {
    /// Upload a file to a project
    Upload {
        /// Project ID
        project_id: String,

        /// File to upload
        path: PathBuf,

        /// Document category
        #[arg(long, value_enum, default_value = "resource")]
        category: CategoryArg,
    },

    /// List a project's documents
    List {
        /// Project ID
        project_id: String,

        /// Only this category
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,
    },

    /// Show document details
    Show {
        /// Document ID
        id: String,
    },

    /// Print the extracted text of a document
    Text {
        /// Document ID
        id: String,
    },

    /// Copy the stored file out
    Download {
        /// Document ID
        id: String,

        /// Destination (defaults to the stored filename in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a document and its stored file
    Delete {
        /// Document ID
        id: String,
    },
}

/// Arguments for question management.
#[derive(Debug, Parser)]
pub struct QuestionsArgs {
    #[command(subcommand)]
    pub action: QuestionsAction,
}

/// Question actions.
#[derive(Debug, Subcommand)]
pub enum QuestionsAction {
    /// Generate one question per RESOURCE document of a session
    Generate {
        /// Session ID
        session_id: String,

        /// Steer questions towards a topic
        #[arg(long)]
        topic: Option<String>,
    },

    /// Extract the questions of a session's TEST documents
    Extract {
        /// Session ID
        session_id: String,
    },

    /// List a session's questions
    List {
        /// Session ID
        session_id: String,
    },

    /// Record a correction and/or evaluation for a question
    Review {
        /// Question ID
        id: String,

        /// Corrected answer
        #[arg(long)]
        correction: Option<String>,

        /// Evaluation (0-100)
        #[arg(short, long)]
        evaluation: Option<f64>,
    },
}

/// Document category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CategoryArg {
    /// Source material for new questions
    Resource,
    /// Exam whose questions are extracted
    Test,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<CategoryArg> for DocumentCategory {
    fn from(category: CategoryArg) -> Self {
        match category {
            CategoryArg::Resource => DocumentCategory::Resource,
            CategoryArg::Test => DocumentCategory::Test,
        }
    }
}
