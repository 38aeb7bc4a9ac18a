use thiserror::Error;

use crate::frontend::parser_error::ParseError;

/// Errors raised while generating code from a parsed statement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A variable was read before any assignment to it.
    #[error("Uninitialized variable: '{name}'")]
    UninitializedVariable { name: String, line: usize },
}

impl CompileError {
    pub fn line(&self) -> Option<usize> {
        match self {
            CompileError::UninitializedVariable { line, .. } => Some(*line),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Parse,
    Compile,
}

/// One user-facing message of a failed compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// 1-based source line, if known.
    pub line: Option<usize>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            DiagnosticKind::Parse => write!(f, "Parsing error. {}", self.message)?,
            DiagnosticKind::Compile => write!(f, "Compile error. {}", self.message)?,
        }
        if let Some(line) = self.line {
            write!(f, " at line: {}", line)?;
        }
        Ok(())
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Parse,
            message: err.to_string(),
            line: Some(err.line()),
        }
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(err: &CompileError) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Compile,
            message: err.to_string(),
            line: err.line(),
        }
    }
}

/// A failed compilation: every diagnostic collected before the driver
/// stopped, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileFailure {
    /// Line of the first diagnostic that has one.
    pub fn first_line(&self) -> Option<usize> {
        self.diagnostics.iter().find_map(|d| d.line)
    }

    pub fn lines(&self) -> Vec<usize> {
        self.diagnostics.iter().filter_map(|d| d.line).collect()
    }
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileFailure {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::span::SourcePos;

    #[test]
    fn test_uninitialized_variable_display() {
        let err = CompileError::UninitializedVariable {
            name: "ghost".to_string(),
            line: 3,
        };
        let diagnostic = Diagnostic::from(&err);
        assert_eq!(
            diagnostic.to_string(),
            "Compile error. Uninitialized variable: 'ghost' at line: 3"
        );
    }

    #[test]
    fn test_parse_diagnostic_carries_line() {
        let err = ParseError::UnexpectedToken {
            expected: "';'".to_string(),
            found: "'}'".to_string(),
            pos: SourcePos::new(40, 5, 9),
        };
        let diagnostic = Diagnostic::from(&err);
        assert_eq!(diagnostic.line, Some(5));
        assert!(diagnostic.to_string().starts_with("Parsing error."));
        assert!(diagnostic.to_string().ends_with("at line: 5"));
    }

    #[test]
    fn test_failure_joins_diagnostics() {
        let failure = CompileFailure {
            diagnostics: vec![
                Diagnostic {
                    kind: DiagnosticKind::Parse,
                    message: "first".to_string(),
                    line: Some(2),
                },
                Diagnostic {
                    kind: DiagnosticKind::Compile,
                    message: "second".to_string(),
                    line: None,
                },
            ],
        };
        assert_eq!(
            failure.to_string(),
            "Parsing error. first at line: 2\nCompile error. second"
        );
        assert_eq!(failure.first_line(), Some(2));
        assert_eq!(failure.lines(), vec![2]);
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = CompileError::UninitializedVariable {
            name: "a".to_string(),
            line: 1,
        };
        let _: &dyn std::error::Error = &err;
        assert_eq!(err.line(), Some(1));
    }
}
