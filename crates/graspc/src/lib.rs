//! Grasp Compiler - semantic analysis core for the Grasp language
//!
//! Grasp is a small Pascal-like language. This library takes a parsed
//! program, resolves every identifier, builds the nominal type system and
//! type checks the whole program before any backend may run.
//!
//! ## Architecture
//!
//! The compiler is organized into:
//! - **Frontend** (`frontend/`): syntax tree and semantic analysis
//! - **Types** (`types/`): type descriptors and the type arena
//! - **Driver** (`driver/`): pipeline that gates backends on a clean analysis
//! - **Common** (`common/`): shared infrastructure (errors, reporting)

pub mod common;
pub mod types;
pub mod frontend;
pub mod driver;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter};
pub use driver::{Backend, BackendRegistry, Pipeline};
pub use frontend::{CompileContext, FrontendConfig, Mode};
pub use frontend::sema::{Analysis, SemanticAnalyzer, SemanticErrorCode};
