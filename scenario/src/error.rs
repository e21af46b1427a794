use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

use quantum::Position;
use quantum::ScopeError;
use quantum::document::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("invalid scenario: {0}")]
    Parse(String),

    #[error("unknown block label '{0}'")]
    UnknownBlock(String),

    #[error("unknown label '{0}'")]
    UnknownLabel(String),

    #[error("label '{0}' is already in use")]
    DuplicateLabel(String),

    #[error("'{label}' is not a {expected}")]
    WrongKind { label: String, expected: &'static str },

    #[error("variable '{name}' at {position} precedes its scope")]
    Unplaced { name: String, position: Position },

    #[error("no chain named '{0}' in this scope; the inherited value was dropped")]
    NoChain(String),

    #[error("expectation failed: {0}")]
    Expectation(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Scope(#[from] ScopeError),
}

/// A scenario error or warning located in the scenario source.
#[derive(Debug)]
pub struct ScenarioDiagnostic {
    pub error: ScenarioError,
    pub span: Option<Range<usize>>,
    pub source_id: usize,
    pub is_warning: bool,
}

impl ScenarioDiagnostic {
    pub fn error(error: impl Into<ScenarioError>, span: Range<usize>, source_id: usize) -> Self {
        ScenarioDiagnostic {
            error: error.into(),
            span: Some(span),
            source_id,
            is_warning: false,
        }
    }

    pub fn warning(error: impl Into<ScenarioError>, span: Range<usize>, source_id: usize) -> Self {
        ScenarioDiagnostic {
            is_warning: true,
            ..ScenarioDiagnostic::error(error, span, source_id)
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let severity = if self.is_warning {
            Severity::Warning
        } else {
            Severity::Error
        };
        let diagnostic = Diagnostic::new(severity).with_message(self.error.to_string());
        match &self.span {
            Some(span) => {
                diagnostic.with_labels(vec![Label::primary(self.source_id, span.clone())])
            }
            None => diagnostic,
        }
    }
}

impl From<ScenarioError> for ScenarioDiagnostic {
    fn from(error: ScenarioError) -> Self {
        ScenarioDiagnostic {
            error,
            span: None,
            source_id: 0,
            is_warning: false,
        }
    }
}

impl std::fmt::Display for ScenarioDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for ScenarioDiagnostic {}
