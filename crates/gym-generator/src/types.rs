//! Result types for generation batches

use gym_domain::{ParseMode, Question};
use std::fmt;
use thiserror::Error;

/// A question/answer pair read out of a model reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    /// Question text (never empty after trimming)
    pub question: String,

    /// Answer text (may be empty for extracted questions)
    pub answer: String,
}

impl QaPair {
    /// Create a pair from anything string-like
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Outcome of parsing a generate reply
///
/// A heuristic parse is a lower-confidence guess recovered from text that
/// was not valid JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateParse {
    /// The reply held the expected JSON object
    Structured(QaPair),

    /// Recovered by splitting free text on the "answer" label
    Heuristic(QaPair),
}

impl GenerateParse {
    /// The parsed pair, whatever the confidence
    pub fn pair(&self) -> &QaPair {
        match self {
            GenerateParse::Structured(pair) | GenerateParse::Heuristic(pair) => pair,
        }
    }

    /// Consume into the parsed pair
    pub fn into_pair(self) -> QaPair {
        match self {
            GenerateParse::Structured(pair) | GenerateParse::Heuristic(pair) => pair,
        }
    }

    /// How the pair was obtained, as stored on the question
    pub fn parse_mode(&self) -> ParseMode {
        match self {
            GenerateParse::Structured(_) => ParseMode::Structured,
            GenerateParse::Heuristic(_) => ParseMode::Heuristic,
        }
    }
}

/// Why a model reply could not be turned into question/answer pairs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The selected payload is not valid JSON
    #[error("malformed JSON: {0}")]
    Malformed(String),

    /// Valid JSON of the wrong shape
    #[error("unexpected response shape: {0}")]
    Shape(String),

    /// A question was empty after trimming
    #[error("question {index} is empty")]
    EmptyQuestion {
        /// Zero-based position in the reply
        index: usize,
    },
}

/// Per-document pipeline state
///
/// ```text
/// Pending -> Extracting -> {ExtractFailed | Prompting}
///         -> {GatewayFailed | Parsing} -> {ParseFailed | Done}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started
    Pending,
    /// Reading the document text
    Extracting,
    /// Text could not be extracted
    ExtractFailed,
    /// Prompt composed, waiting on the gateway
    Prompting,
    /// Gateway call failed or timed out
    GatewayFailed,
    /// Reading the reply and persisting questions
    Parsing,
    /// Reply unusable, or its questions could not be stored
    ParseFailed,
    /// Questions stored
    Done,
}

impl PipelineState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::ExtractFailed
                | PipelineState::GatewayFailed
                | PipelineState::ParseFailed
                | PipelineState::Done
        )
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Pending, Extracting)
                | (Extracting, ExtractFailed)
                | (Extracting, Prompting)
                | (Prompting, GatewayFailed)
                | (Prompting, Parsing)
                | (Parsing, ParseFailed)
                | (Parsing, Done)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Pending => "PENDING",
            PipelineState::Extracting => "EXTRACTING",
            PipelineState::ExtractFailed => "EXTRACT_FAILED",
            PipelineState::Prompting => "PROMPTING",
            PipelineState::GatewayFailed => "GATEWAY_FAILED",
            PipelineState::Parsing => "PARSING",
            PipelineState::ParseFailed => "PARSE_FAILED",
            PipelineState::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Pipeline step a document failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Text extraction
    Extraction,
    /// Language-model call
    Gateway,
    /// Reply parsing
    Parse,
    /// Domain validation of the built questions
    Validation,
    /// Writing questions to the store
    Persistence,
}

impl FailureStage {
    /// Lowercase label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Extraction => "extraction",
            FailureStage::Gateway => "gateway",
            FailureStage::Parse => "parse",
            FailureStage::Validation => "validation",
            FailureStage::Persistence => "persistence",
        }
    }

    /// Terminal pipeline state a failure in this stage ends in
    pub fn terminal_state(&self) -> PipelineState {
        match self {
            FailureStage::Extraction => PipelineState::ExtractFailed,
            FailureStage::Gateway => PipelineState::GatewayFailed,
            FailureStage::Parse | FailureStage::Validation | FailureStage::Persistence => {
                PipelineState::ParseFailed
            }
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document whose pipeline ended in a failure state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    /// Failed document
    pub document_id: String,

    /// Its filename, for display
    pub filename: String,

    /// Where it failed
    pub stage: FailureStage,

    /// Human-readable reason
    pub reason: String,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} failed: {}",
            self.filename, self.document_id, self.stage, self.reason
        )
    }
}

/// Result of a generation or extraction batch
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Number of questions stored
    pub created_count: usize,

    /// Stored questions in document order
    pub questions: Vec<Question>,

    /// Documents that ended in a failure state
    pub failures: Vec<DocumentFailure>,

    /// Documents passed over because their category did not match
    pub skipped: Vec<String>,
}

impl BatchReport {
    /// Add a document's stored questions
    pub(crate) fn record(&mut self, questions: Vec<Question>) {
        self.created_count += questions.len();
        self.questions.extend(questions);
    }

    /// Questions that came from the heuristic fallback
    pub fn low_confidence(&self) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(|q| q.parse_mode.is_low_confidence())
    }
}
