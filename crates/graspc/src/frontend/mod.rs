//! Grasp frontend
//!
//! The frontend is responsible for:
//! 1. Defining the syntax tree handed over by the parser
//! 2. Performing semantic analysis over that tree
//!
//! Lexing and parsing live outside this crate.

pub mod ast;
pub mod sema;

use std::fmt;
use std::str::FromStr;

use crate::common::DiagnosticReporter;

/// Compilation mode selected by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Execute the program directly
    #[default]
    Interpret,
    /// Convert to another source language
    Transpile,
    /// Compile to bytecode
    Compile,
}

impl Mode {
    /// Only the interpreter can pass scalars by reference
    pub fn allows_scalar_reference_parameters(self) -> bool {
        matches!(self, Mode::Interpret)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Interpret => f.write_str("interpret"),
            Mode::Transpile => f.write_str("transpile"),
            Mode::Compile => f.write_str("compile"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "interpret" | "execute" => Ok(Mode::Interpret),
            "transpile" | "convert" => Ok(Mode::Transpile),
            "compile" => Ok(Mode::Compile),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Configuration options passed to the frontend
#[derive(Debug, Clone, Default)]
pub struct FrontendConfig {
    pub mode: Mode,
    /// Log the cross-reference listing after analysis
    pub dump_symbols: bool,
}

/// Compilation context providing access to diagnostics and file info
pub struct CompileContext<'a> {
    pub filename: String,
    pub file_id: usize,
    pub reporter: &'a DiagnosticReporter,
}

impl<'a> CompileContext<'a> {
    pub fn new(filename: String, file_id: usize, reporter: &'a DiagnosticReporter) -> Self {
        Self { filename, file_id, reporter }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_default_and_parse() {
        assert_eq!(Mode::default(), Mode::Interpret);
        assert_eq!("convert".parse::<Mode>(), Ok(Mode::Transpile));
        assert_eq!("COMPILE".parse::<Mode>(), Ok(Mode::Compile));
        assert!("assemble".parse::<Mode>().is_err());
    }

    #[test]
    fn test_scalar_reference_parameters() {
        assert!(Mode::Interpret.allows_scalar_reference_parameters());
        assert!(!Mode::Transpile.allows_scalar_reference_parameters());
        assert!(!Mode::Compile.allows_scalar_reference_parameters());
    }
}
