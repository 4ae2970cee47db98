use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use triage::{ErrorDetails, TriageError};

/// Format a TriageError with fancy terminal output using Ariadne
pub fn format_error(error: &TriageError) -> String {
    render(error, true)
}

fn render(error: &TriageError, color: bool) -> String {
    match error {
        TriageError::Parse(details) => format_located("Parse error", details, error, color),
        TriageError::Validation(details) => {
            format_located("Validation error", details, error, color)
        }
        TriageError::Engine(msg) => format!("Engine error: {}", msg),
        TriageError::ResourceLimitExceeded {
            limit_name,
            limit_value,
            actual_value,
            suggestion,
        } => {
            format!(
                "Resource limit exceeded: {}\n  Limit: {}\n  Actual: {}\n  {}",
                limit_name, limit_value, actual_value, suggestion
            )
        }
        TriageError::MultipleErrors(errors) => {
            let mut result = format!("{} errors occurred:\n\n", error.count());
            for error in errors {
                result.push_str(&render(error, color));
                result.push_str("\n\n");
            }
            result
        }
    }
}

fn format_located(
    kind: &str,
    details: &ErrorDetails,
    error: &TriageError,
    color: bool,
) -> String {
    let Some(span) = &details.span else {
        let mut text = format!("{}: {} (in {})", kind, details.message, details.source_id);
        if let Some(suggestion) = &details.suggestion {
            text.push_str(&format!("\n  Help: {}", suggestion));
        }
        return text;
    };

    let message = format!(
        "{}: {} (at {}:{}:{})",
        kind, details.message, details.source_id, span.line, span.col
    );

    // Spans are byte offsets, ariadne counts characters
    let text: &str = details.source_text.as_ref();
    let start = char_offset(text, span.start);
    let end = char_offset(text, span.end).max(start);

    let mut report = Report::build(ReportKind::Error, &details.source_id, start)
        .with_config(Config::default().with_color(color))
        .with_message(message)
        .with_label(
            Label::new((&details.source_id, start..end))
                .with_message("")
                .with_color(Color::Red),
        );

    if let Some(suggestion) = &details.suggestion {
        report = report.with_help(suggestion);
    }

    let mut output = Vec::new();
    match report.finish().write(
        (
            &details.source_id,
            Source::from(details.source_text.as_ref()),
        ),
        &mut output,
    ) {
        Ok(_) => String::from_utf8_lossy(&output).to_string(),
        Err(_) => error.to_string(),
    }
}

fn char_offset(text: &str, byte: usize) -> usize {
    text.char_indices().take_while(|(i, _)| *i < byte).count()
}
