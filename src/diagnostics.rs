use std::fmt;

use thiserror::Error;

/// A 1-based line/column position within a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Classification of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lex,
    Parse,
    Name,
    Type,
    InvariantViolation,
}

impl DiagnosticKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::Lex => "lex error",
            DiagnosticKind::Parse => "parse error",
            DiagnosticKind::Name => "name error",
            DiagnosticKind::Type => "type error",
            DiagnosticKind::InvariantViolation => "invariant violation",
        }
    }
}

/// Diagnostic surfaced to embedders and end users: kind, message, position.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: 0,
            column: 0,
        }
    }

    pub fn at(mut self, pos: Position) -> Self {
        self.line = pos.line;
        self.column = pos.column;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)?;
        if self.line > 0 {
            write!(f, " (line {}, column {})", self.line, self.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Unified error type for the TinyTalk toolchain.
#[derive(Debug, Error)]
pub enum TinyTalkError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
    #[error("execution budget exhausted after {steps} steps")]
    Budget { steps: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TinyTalkError {
    /// The diagnostic payload, when this error belongs to the language's
    /// own taxonomy.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            TinyTalkError::Diagnostic(diag) => Some(diag),
            _ => None,
        }
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            TinyTalkError::Diagnostic(Diagnostic {
                kind: DiagnosticKind::InvariantViolation,
                ..
            })
        )
    }
}

pub type Result<T> = std::result::Result<T, TinyTalkError>;
