//! Human-readable diagnostics on stderr.

use classforge_codegen::{Diagnostic, DiagnosticKind, Severity};
use colored::Colorize;

pub fn warning_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count()
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let label = match diagnostic.severity {
            Severity::Warning => "warning:".yellow().bold(),
            Severity::Info => "info:".cyan().bold(),
        };
        eprintln!("{label} {diagnostic}");
    }
}

pub fn print_summary(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    let count = |kind: DiagnosticKind| diagnostics.iter().filter(|d| d.kind == kind).count();
    eprintln!(
        "{} {} classification, {} consistency ({} warning(s))",
        "diagnostics:".bold(),
        count(DiagnosticKind::Classification),
        count(DiagnosticKind::Consistency),
        warning_count(diagnostics)
    );
}
