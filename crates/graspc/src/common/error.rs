//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::{self, Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream, WriteColor};
use thiserror::Error;

use crate::frontend::sema::SemanticDiagnostic;

/// Compilation failure surfaced by the driver
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("semantic analysis failed with {count} error(s)")]
    Semantic { count: usize },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

impl CompileError {
    pub fn semantic(count: usize) -> Self {
        Self::Semantic { count }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report_error(&self, error: &CompileError) {
        let diagnostic = match error {
            CompileError::Semantic { count } => Diagnostic::error()
                .with_message(format!("aborting due to {count} semantic error(s)")),

            CompileError::Backend { message } => {
                Diagnostic::error().with_message(format!("Backend error: {}", message))
            }
        };

        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }

    /// Report a semantic diagnostic against the line it was flagged on
    pub fn report_semantic(&self, file_id: usize, diagnostic: &SemanticDiagnostic) {
        let _ = self.emit_semantic(&mut self.writer.lock(), file_id, diagnostic);
    }

    /// Render a semantic diagnostic into any colour-aware writer.
    ///
    /// The primary label spans the whole source line; lines outside the file
    /// are reported without a label.
    pub fn emit_semantic(
        &self,
        writer: &mut dyn WriteColor,
        file_id: usize,
        diagnostic: &SemanticDiagnostic,
    ) -> Result<(), files::Error> {
        let line_index = diagnostic.line.saturating_sub(1) as usize;
        let labels = match self.files.line_range(file_id, line_index) {
            Ok(range) => {
                let end = trim_line_end(self.files.source(file_id)?, range.clone());
                vec![
                    Label::primary(file_id, range.start..end)
                        .with_message(format!("found near \"{}\"", diagnostic.text)),
                ]
            }
            Err(_) => Vec::new(),
        };

        let rendered = Diagnostic::error()
            .with_code(diagnostic.code.group().to_string())
            .with_message(diagnostic.code.to_string())
            .with_labels(labels);

        term::emit(writer, &self.config, &self.files, &rendered)
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_line_end(source: &str, range: std::ops::Range<usize>) -> usize {
    let line = &source[range.clone()];
    range.start + line.trim_end_matches(['\r', '\n']).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::sema::SemanticErrorCode;
    use codespan_reporting::term::termcolor::Buffer;

    #[test]
    fn test_compile_error_display() {
        assert_eq!(
            CompileError::semantic(3).to_string(),
            "semantic analysis failed with 3 error(s)"
        );
        assert_eq!(
            CompileError::backend("missing").to_string(),
            "Backend error: missing"
        );
    }

    #[test]
    fn test_emit_semantic_labels_line() {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("demo.grasp", "program p;\nbegin\n  x := 1\nend.\n");
        let diagnostic = SemanticDiagnostic::new(SemanticErrorCode::UndeclaredIdentifier, 3, "x");

        let mut buffer = Buffer::no_color();
        reporter
            .emit_semantic(&mut buffer, file_id, &diagnostic)
            .unwrap();
        let output = String::from_utf8(buffer.into_inner()).unwrap();

        assert!(output.contains("Undeclared identifier"));
        assert!(output.contains("demo.grasp:3"));
        assert!(output.contains("found near \"x\""));
    }

    #[test]
    fn test_emit_semantic_line_out_of_range() {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("short.grasp", "begin end.\n");
        let diagnostic = SemanticDiagnostic::new(SemanticErrorCode::TypeMismatch, 40, "y");

        let mut buffer = Buffer::no_color();
        reporter
            .emit_semantic(&mut buffer, file_id, &diagnostic)
            .unwrap();
        let output = String::from_utf8(buffer.into_inner()).unwrap();

        assert!(output.contains("Type mismatch"));
    }
}
