//! Error rendering using ariadne
//!
//! Diagnostics that carry a span are rendered as reports over the schema
//! source they point into; the rest are written as plain lines.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

/// Character set for rendering error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharSet {
    /// Use Unicode characters for rich visual output.
    #[default]
    Unicode,
    /// Use ASCII-only characters for compatibility.
    Ascii,
}

/// Configuration for error rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig<'a> {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
    /// The filename to display in error messages. Falls back to the
    /// error's own filename, then to "<unknown>".
    pub filename: Option<&'a str>,
    /// The character set to use for rendering.
    pub charset: CharSet,
}

impl Default for RenderConfig<'_> {
    fn default() -> Self {
        RenderConfig::default()
    }
}

impl RenderConfig<'_> {
    const fn default() -> Self {
        Self {
            color: true,
            filename: None,
            charset: CharSet::Unicode,
        }
    }
}

/// Render an error to stderr using default config.
///
/// # Example
/// ```no_run
/// use avrokit::{Engine, render_error};
///
/// let engine = Engine::default();
/// if let Err(e) = engine.parse_schema(r#"{"type": "array", "items": "Missing"}"#) {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to(error, &mut std::io::stderr(), &RenderConfig::default()).ok();
}

/// Render an error to a writer with the given configuration.
///
/// # Example
/// ```
/// use avrokit::{Engine, RenderConfig, render_error_to};
///
/// let engine = Engine::default();
/// let err = engine.parse_schema(r#"{"type": "array", "items": "Missing"}"#).unwrap_err();
///
/// let mut buf = Vec::new();
/// let config = RenderConfig { color: false, ..Default::default() };
/// render_error_to(&err, &mut buf, &config).unwrap();
/// assert!(String::from_utf8_lossy(&buf).contains("Missing"));
/// ```
pub fn render_error_to(
    error: &Error,
    writer: &mut dyn Write,
    config: &RenderConfig,
) -> std::io::Result<()> {
    let filename = config
        .filename
        .or_else(|| error.filename())
        .unwrap_or("<unknown>");

    match error {
        Error::Compilation {
            diagnostics,
            source,
            ..
        } => render_diagnostics(source, diagnostics, writer, config, filename),
        Error::Runtime {
            diagnostic, source, ..
        } => render_diagnostics(source, core::slice::from_ref(diagnostic), writer, config, filename),
        Error::ResourceExceeded(msg) => {
            writeln!(writer, "Resource limit exceeded: {}", msg)
        }
        Error::Api(msg) => {
            writeln!(writer, "API error: {}", msg)
        }
    }
}

fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    config: &RenderConfig,
    filename: &str,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let Some(span) = diag.span.clone().filter(|span| span.end <= source.len()) else {
            render_plain(diag, writer)?;
            continue;
        };

        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let ariadne_charset = match config.charset {
            CharSet::Unicode => ariadne::CharSet::Unicode,
            CharSet::Ascii => ariadne::CharSet::Ascii,
        };
        let ariadne_config = ariadne::Config::default()
            .with_color(config.color)
            .with_char_set(ariadne_charset);

        let mut report = Report::build(kind, (filename, span.clone()))
            .with_message(&diag.message)
            .with_config(ariadne_config);

        if let Some(code) = &diag.code {
            report = report.with_code(code);
        }

        let color = colors.next();
        report = report.with_label(
            Label::new((filename, span))
                .with_message(&diag.message)
                .with_color(color),
        );

        for help_msg in &diag.help {
            report = report.with_help(help_msg);
        }

        report
            .finish()
            .write((filename, Source::from(source)), &mut *writer)?;
    }

    Ok(())
}

/// A diagnostic with nothing to point at, e.g. malformed data.
fn render_plain(diag: &Diagnostic, writer: &mut dyn Write) -> std::io::Result<()> {
    match &diag.code {
        Some(code) => writeln!(writer, "[{code}] {}: {}", diag.severity, diag.message)?,
        None => writeln!(writer, "{}: {}", diag.severity, diag.message)?,
    }
    for help_msg in &diag.help {
        writeln!(writer, "  help: {help_msg}")?;
    }
    Ok(())
}
