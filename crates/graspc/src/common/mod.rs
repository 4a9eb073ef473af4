//! Common infrastructure shared by the frontend and the driver

mod error;

pub use error::{CompileError, CompileResult, DiagnosticReporter};
