//! Recoverable findings collected during one generation run.
//!
//! Nothing in the pipeline fails once the IR exists. Ambiguities and skipped
//! cross-references are recorded here, logged, and handed back to the caller
//! next to the artifacts.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Relationship or inheritance semantics had to be guessed or ignored.
    Classification,
    /// A cross-artifact reference was skipped because the accessor it needs
    /// was not predicted.
    Consistency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Classification => "classification",
            DiagnosticKind::Consistency => "consistency",
        };
        write!(f, "[{kind}]")?;
        if let Some(class_id) = &self.class_id {
            write!(f, " {class_id}")?;
            if let Some(field) = &self.field {
                write!(f, ".{field}")?;
            }
        }
        write!(f, ": {}", self.message)
    }
}

/// Insertion-ordered collector.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classification(
        &mut self,
        class_id: Option<&str>,
        field: Option<&str>,
        message: impl Into<String>,
    ) {
        self.push(Severity::Warning, DiagnosticKind::Classification, class_id, field, message.into());
    }

    pub fn consistency(&mut self, class_id: &str, field: &str, message: impl Into<String>) {
        self.push(
            Severity::Warning,
            DiagnosticKind::Consistency,
            Some(class_id),
            Some(field),
            message.into(),
        );
    }

    /// Informational classification note (a deliberate, documented skip).
    pub fn note(&mut self, class_id: &str, field: Option<&str>, message: impl Into<String>) {
        self.push(
            Severity::Info,
            DiagnosticKind::Classification,
            Some(class_id),
            field,
            message.into(),
        );
    }

    fn push(
        &mut self,
        severity: Severity,
        kind: DiagnosticKind,
        class_id: Option<&str>,
        field: Option<&str>,
        message: String,
    ) {
        let entry = Diagnostic {
            severity,
            kind,
            class_id: class_id.map(str::to_string),
            field: field.map(str::to_string),
            message,
        };
        match severity {
            Severity::Warning => tracing::warn!(
                kind = ?entry.kind,
                class = entry.class_id.as_deref().unwrap_or("-"),
                field = entry.field.as_deref().unwrap_or("-"),
                "{}",
                entry.message
            ),
            Severity::Info => tracing::info!(
                class = entry.class_id.as_deref().unwrap_or("-"),
                field = entry.field.as_deref().unwrap_or("-"),
                "{}",
                entry.message
            ),
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
