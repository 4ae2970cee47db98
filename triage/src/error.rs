use crate::span::Span;
use std::fmt;
use std::sync::Arc;

/// Detailed error information with an optional source location
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub message: String,
    pub span: Option<Span>,
    pub source_id: String,
    pub source_text: Arc<str>,
    pub suggestion: Option<String>,
}

/// Error types for loading and configuring rule sets
///
/// Evaluation itself never fails; every variant here is raised before an
/// engine exists.
#[derive(Debug, Clone)]
pub enum TriageError {
    /// Rule source could not be parsed (malformed JSON or wrong shape)
    Parse(Box<ErrorDetails>),

    /// Rule source parsed but describes an invalid rule set
    Validation(Box<ErrorDetails>),

    /// Engine error without specific source location
    Engine(String),

    /// A configured resource limit was exceeded
    ResourceLimitExceeded {
        limit_name: String,
        limit_value: String,
        actual_value: String,
        suggestion: String,
    },

    /// Multiple errors collected together
    MultipleErrors(Vec<TriageError>),
}

impl TriageError {
    /// Create a parse error with source information
    pub fn parse(
        message: impl Into<String>,
        span: Option<Span>,
        source_id: impl Into<String>,
        source_text: Arc<str>,
    ) -> Self {
        Self::Parse(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: None,
        }))
    }

    /// Create a validation error with source information
    pub fn validation(
        message: impl Into<String>,
        span: Option<Span>,
        source_id: impl Into<String>,
        source_text: Arc<str>,
    ) -> Self {
        Self::Validation(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: None,
        }))
    }

    /// Create a validation error with suggestion
    pub fn validation_with_suggestion(
        message: impl Into<String>,
        span: Option<Span>,
        source_id: impl Into<String>,
        source_text: Arc<str>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Validation(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: Some(suggestion.into()),
        }))
    }

    /// Collapse a list of errors: one error stays itself, several are grouped
    pub fn from_many(mut errors: Vec<TriageError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(TriageError::MultipleErrors(errors)),
        }
    }

    /// Number of individual problems represented by this error
    pub fn count(&self) -> usize {
        match self {
            TriageError::MultipleErrors(errors) => errors.iter().map(TriageError::count).sum(),
            _ => 1,
        }
    }
}

fn write_located(f: &mut fmt::Formatter<'_>, kind: &str, details: &ErrorDetails) -> fmt::Result {
    write!(f, "{}: {}", kind, details.message)?;
    if let Some(suggestion) = &details.suggestion {
        write!(f, " (suggestion: {})", suggestion)?;
    }
    match &details.span {
        Some(span) => write!(f, " at {}:{}:{}", details.source_id, span.line, span.col),
        None => write!(f, " in {}", details.source_id),
    }
}

impl fmt::Display for TriageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriageError::Parse(details) => write_located(f, "Parse error", details),
            TriageError::Validation(details) => write_located(f, "Validation error", details),
            TriageError::Engine(msg) => write!(f, "Engine error: {}", msg),
            TriageError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
                suggestion,
            } => write!(
                f,
                "Resource limit exceeded: {} (limit {}, actual {}). {}",
                limit_name, limit_value, actual_value, suggestion
            ),
            TriageError::MultipleErrors(errors) => {
                writeln!(f, "Multiple errors:")?;
                for (i, error) in errors.iter().enumerate() {
                    write!(f, "  {}. {}", i + 1, error)?;
                    if i < errors.len() - 1 {
                        writeln!(f)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for TriageError {}

impl From<std::fmt::Error> for TriageError {
    fn from(err: std::fmt::Error) -> Self {
        TriageError::Engine(format!("Format error: {}", err))
    }
}
