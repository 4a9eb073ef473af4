//! Semantic diagnostics
//!
//! Semantic problems never abort analysis. Each one is recorded with the
//! source line and the offending text, and the driver decides what to do
//! with the list once the traversal is over.

use std::fmt::{self, Write};

use thiserror::Error;

/// Closed taxonomy of semantic errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticErrorCode {
    #[error("Undeclared identifier")]
    UndeclaredIdentifier,
    #[error("Redeclared identifier")]
    RedeclaredIdentifier,
    #[error("Invalid variable")]
    InvalidVariable,
    #[error("Invalid type")]
    InvalidType,
    #[error("Invalid field")]
    InvalidField,
    #[error("Must be a procedure name")]
    NameMustBeProcedure,
    #[error("Must be a function name")]
    NameMustBeFunction,

    #[error("Invalid constant")]
    InvalidConstant,
    #[error("Invalid sign")]
    InvalidSign,
    #[error("Too many subscripts")]
    TooManySubscripts,
    #[error("Invalid function return type")]
    InvalidReturnType,

    #[error("Type mismatch")]
    TypeMismatch,
    #[error("Datatype must be integer")]
    TypeMustBeInteger,
    #[error("Datatype must be integer or real")]
    TypeMustBeNumeric,
    #[error("Datatype must be boolean")]
    TypeMustBeBoolean,
    #[error("Datatype must be string")]
    TypeMustBeString,
    #[error("Incompatible assignment")]
    IncompatibleAssignment,
    #[error("Incompatible comparison")]
    IncompatibleComparison,
    #[error("Invalid operator")]
    InvalidOperator,
    #[error("Invalid control variable datatype")]
    InvalidControlVariable,

    #[error("Invalid number of arguments")]
    ArgumentCountMismatch,
    #[error("Argument must be a variable")]
    ArgumentMustBeVariable,
    #[error("Reference parameter cannot be scalar")]
    InvalidReferenceParameter,

    #[error("Duplicate CASE constant")]
    DuplicateCaseConstant,

    #[error("Function is immutable - cannot write to global variable")]
    ImmutableFunction,
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorGroup {
    NameResolution,
    TypeConstruction,
    TypeChecking,
    Calls,
    CaseStatements,
    MutationDiscipline,
}

impl fmt::Display for ErrorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorGroup::NameResolution => "name-resolution",
            ErrorGroup::TypeConstruction => "type-construction",
            ErrorGroup::TypeChecking => "type-checking",
            ErrorGroup::Calls => "calls",
            ErrorGroup::CaseStatements => "case-statements",
            ErrorGroup::MutationDiscipline => "mutation-discipline",
        };
        f.write_str(name)
    }
}

impl SemanticErrorCode {
    pub fn group(self) -> ErrorGroup {
        use SemanticErrorCode::*;

        match self {
            UndeclaredIdentifier | RedeclaredIdentifier | InvalidVariable | InvalidType
            | InvalidField | NameMustBeProcedure | NameMustBeFunction => ErrorGroup::NameResolution,
            InvalidConstant | InvalidSign | TooManySubscripts | InvalidReturnType => {
                ErrorGroup::TypeConstruction
            }
            TypeMismatch | TypeMustBeInteger | TypeMustBeNumeric | TypeMustBeBoolean
            | TypeMustBeString | IncompatibleAssignment | IncompatibleComparison
            | InvalidOperator | InvalidControlVariable => ErrorGroup::TypeChecking,
            ArgumentCountMismatch | ArgumentMustBeVariable | InvalidReferenceParameter => {
                ErrorGroup::Calls
            }
            DuplicateCaseConstant => ErrorGroup::CaseStatements,
            ImmutableFunction => ErrorGroup::MutationDiscipline,
        }
    }
}

/// One flagged problem
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line:03}: {code} near \"{text}\"")]
pub struct SemanticDiagnostic {
    pub code: SemanticErrorCode,
    /// 1-based source line
    pub line: u32,
    /// Offending source text
    pub text: String,
}

impl SemanticDiagnostic {
    pub fn new(code: SemanticErrorCode, line: u32, text: impl Into<String>) -> Self {
        Self {
            code,
            line,
            text: text.into(),
        }
    }
}

/// Accumulates diagnostics in the order they are flagged
#[derive(Debug, Clone, Default)]
pub struct SemanticErrorHandler {
    diagnostics: Vec<SemanticDiagnostic>,
}

impl SemanticErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&mut self, code: SemanticErrorCode, line: u32, text: impl Into<String>) {
        let diagnostic = SemanticDiagnostic::new(code, line, text);
        log::trace!("flag {diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn count_of(&self, code: SemanticErrorCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn diagnostics(&self) -> &[SemanticDiagnostic] {
        &self.diagnostics
    }

    pub fn codes(&self) -> Vec<SemanticErrorCode> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    /// Line-numbered listing of every diagnostic
    pub fn render_table(&self) -> String {
        let mut table = String::new();
        let _ = writeln!(table, "{:<4} {:<40} {}", "Line", "Message", "Found near");
        let _ = writeln!(table, "{:<4} {:<40} {}", "----", "-------", "----------");
        for diagnostic in &self.diagnostics {
            let _ = writeln!(
                table,
                "{:03}  {:<40} \"{}\"",
                diagnostic.line,
                diagnostic.code.to_string(),
                diagnostic.text
            );
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_messages() {
        assert_eq!(
            SemanticErrorCode::TypeMustBeNumeric.to_string(),
            "Datatype must be integer or real"
        );
        assert_eq!(
            SemanticErrorCode::DuplicateCaseConstant.to_string(),
            "Duplicate CASE constant"
        );
    }

    #[test]
    fn test_groups() {
        assert_eq!(
            SemanticErrorCode::InvalidField.group(),
            ErrorGroup::NameResolution
        );
        assert_eq!(SemanticErrorCode::InvalidSign.group(), ErrorGroup::TypeConstruction);
        assert_eq!(
            SemanticErrorCode::ArgumentMustBeVariable.group(),
            ErrorGroup::Calls
        );
        assert_eq!(
            SemanticErrorCode::ImmutableFunction.group(),
            ErrorGroup::MutationDiscipline
        );
    }

    #[test]
    fn test_flag_and_count() {
        let mut handler = SemanticErrorHandler::new();
        handler.flag(SemanticErrorCode::UndeclaredIdentifier, 3, "y");
        handler.flag(SemanticErrorCode::TypeMismatch, 5, "'a'");
        handler.flag(SemanticErrorCode::UndeclaredIdentifier, 9, "z");

        assert_eq!(handler.count(), 3);
        assert_eq!(handler.count_of(SemanticErrorCode::UndeclaredIdentifier), 2);
        assert_eq!(handler.diagnostics()[1].line, 5);
    }

    #[test]
    fn test_render_table() {
        let mut handler = SemanticErrorHandler::new();
        handler.flag(SemanticErrorCode::IncompatibleAssignment, 7, "3.5");

        let expected = format!(
            "Line {:<40} Found near\n---- {:<40} ----------\n007  {:<40} \"3.5\"\n",
            "Message", "-------", "Incompatible assignment"
        );
        assert_eq!(handler.render_table(), expected);
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = SemanticDiagnostic::new(SemanticErrorCode::InvalidField, 12, "r.g");
        assert_eq!(
            diagnostic.to_string(),
            "line 012: Invalid field near \"r.g\""
        );
    }
}
