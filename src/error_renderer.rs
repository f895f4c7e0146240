//! Error rendering using ariadne
//!
//! Compiler errors carry byte spans into the source the syntax tree was
//! parsed from. The embedder that owns that source passes it here to get
//! annotated reports.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

/// Render an error with formatting to stderr
///
/// # Example
/// ```
/// use bumpalo::Bump;
/// use ploy::{CompileOptions, ExprBuilder, TypeStore, compile_program, render_error};
///
/// let arena = Bump::new();
/// let store = TypeStore::new(&arena);
/// let b = ExprBuilder::new(&arena);
/// let program = b.program(vec![], b.body(&[], b.sym("missing")));
///
/// if let Err(e) = compile_program(store, program, CompileOptions::default()) {
///     render_error("missing", &e);
/// }
/// ```
pub fn render_error(source: &str, error: &Error) {
    render_error_to_writer(source, error, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(source: &str, error: &Error, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(source, error, writer, true)
}

/// Render an error to a String (useful for logs, editors, etc.)
pub fn render_error_to_string(source: &str, error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(source, error, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(source: &str, error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(source, error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    source: &str,
    error: &Error,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    render_diagnostic(source, &error.to_diagnostic(), writer, use_color)
}

fn render_diagnostic(
    source: &str,
    diag: &Diagnostic,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let kind = match diag.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
    };

    // Spans past the end of the source (synthetic trees) are clamped.
    let clamp = |range: &core::ops::Range<usize>| {
        let end = range.end.min(source.len());
        range.start.min(end)..end
    };

    let mut report = Report::build(kind, ("<unknown>", clamp(&diag.span.0)))
        .with_message(&diag.message)
        .with_config(ariadne::Config::default().with_color(use_color));

    if let Some(code) = &diag.code {
        report = report.with_code(code);
    }

    let color = colors.next();
    report = report.with_label(
        Label::new(("<unknown>", clamp(&diag.span.0)))
            .with_message(&diag.message)
            .with_color(color),
    );

    // Related sites become secondary labels.
    for related in &diag.related {
        let color = colors.next();
        report = report.with_label(
            Label::new(("<unknown>", clamp(&related.span.0)))
                .with_message(&related.message)
                .with_color(color),
        );
    }

    for help_msg in &diag.help {
        report = report.with_help(help_msg);
    }

    report
        .finish()
        .write(("<unknown>", Source::from(source)), &mut *writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompileOptions, ExprBuilder, TypeStore, compile_program};
    use bumpalo::Bump;

    #[test]
    fn test_render_undefined_name() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let b = ExprBuilder::new(&arena);
        // The builder numbers spans from zero, so `nope` covers byte 0..1.
        let program = b.program(vec![], b.body(&[], b.sym("nope")));

        let err = compile_program(store, program, CompileOptions::default()).unwrap_err();
        let output = render_error_to_string_no_color("nope", &err);

        assert!(output.contains("E100"));
        assert!(output.contains("undefined name `nope`"));
        assert!(output.contains("Help: Make sure the name is defined"));
    }

    #[test]
    fn test_render_to_string_is_multiline() {
        let arena = Bump::new();
        let store = TypeStore::new(&arena);
        let b = ExprBuilder::new(&arena);
        let sig = b.sig(b.sym("Int"), b.sym("Int"));
        let program = b.program(vec![], b.body(&[], sig));

        let err = compile_program(store, program, CompileOptions::default()).unwrap_err();
        let output = render_error_to_string_no_color("(Int % Int)", &err);

        assert!(!output.is_empty());
        assert!(output.lines().count() > 1);
        assert!(output.contains("cannot be used as a value"));
    }
}
