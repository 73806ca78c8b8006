//! Structured diagnostics handed off to the reporting layer.

use std::fmt;

use serde::Serialize;

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

/// Every failure class the engine can report. Each kind carries a stable
/// code so downstream reporters can key on it without parsing messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    DuplicateComponent,
    IncompleteStateDescription,
    MissingCanonicalConstructor,
    MissingSuperConstructorCall,
    CyclicInheritance,
    ComponentFieldTypeMismatch,
    PatternArity,
}

impl DiagnosticKind {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateComponent => "CAR0001",
            DiagnosticKind::IncompleteStateDescription => "CAR0002",
            DiagnosticKind::MissingCanonicalConstructor => "CAR0003",
            DiagnosticKind::MissingSuperConstructorCall => "CAR0004",
            DiagnosticKind::CyclicInheritance => "CAR0005",
            DiagnosticKind::ComponentFieldTypeMismatch => "CAR0006",
            DiagnosticKind::PatternArity => "CAR0007",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateComponent => "duplicate component",
            DiagnosticKind::IncompleteStateDescription => "incomplete state description",
            DiagnosticKind::MissingCanonicalConstructor => "missing canonical constructor",
            DiagnosticKind::MissingSuperConstructorCall => "missing super constructor call",
            DiagnosticKind::CyclicInheritance => "cyclic inheritance",
            DiagnosticKind::ComponentFieldTypeMismatch => "component field type mismatch",
            DiagnosticKind::PatternArity => "pattern arity",
        }
    }
}

/// One structured diagnostic record: `(kind, declaration, component?)` plus a
/// rendered detail message with the conflicting signatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub declaration: String,
    pub component: Option<String>,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn error(
        kind: DiagnosticKind,
        declaration: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            declaration: declaration.into(),
            component: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {}: {}",
            self.severity.as_str(),
            self.kind.code(),
            self.declaration,
            self.message
        )?;
        if let Some(component) = &self.component {
            write!(f, " (component `{component}`)")?;
        }
        Ok(())
    }
}

/// Collection helper used to accumulate diagnostics during resolution.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl<'a> IntoIterator for &'a DiagnosticSink {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}
