//! Semantic analysis
//!
//! Binds every declaration into nested symbol tables, builds the nominal
//! type system and type checks statements and expressions. Results are
//! returned as an [`Analysis`]; the syntax tree itself is never modified.

mod analyzer;
mod diagnostics;
mod predefined;
mod scope;
mod symbol;
mod types;
mod xref;


pub use analyzer::SemanticAnalyzer;
pub use diagnostics::{ErrorGroup, SemanticDiagnostic, SemanticErrorCode, SemanticErrorHandler};
pub use predefined::Predefined;
pub use scope::{ScopeId, SymTable, SymTableStack};
pub use symbol::{
    EntryId, EntryInfo, Kind, RoutineCode, RoutineInfo, SymTableEntry, UNNAMED_PREFIX, Value,
};
pub use types::TypeChecker;
pub use xref::CrossReferencer;

use crate::frontend::Mode;
use crate::frontend::ast::Annotations;
use crate::types::TypeArena;

/// Everything semantic analysis produced for one program
#[derive(Debug)]
pub struct Analysis {
    /// Entry of the program itself
    pub program_id: EntryId,
    pub symtab: SymTableStack,
    pub types: TypeArena,
    pub predefined: Predefined,
    pub annotations: Annotations,
    pub errors: SemanticErrorHandler,
    pub mode: Mode,
}

impl Analysis {
    pub fn error_count(&self) -> usize {
        self.errors.count()
    }

    /// No diagnostics were flagged; backends may run
    pub fn is_clean(&self) -> bool {
        self.errors.count() == 0
    }

    pub fn program(&self) -> &SymTableEntry {
        self.symtab.entry(self.program_id)
    }

    pub fn type_checker(&self) -> TypeChecker<'_> {
        TypeChecker::new(&self.types, &self.predefined)
    }

    pub fn cross_reference(&self) -> String {
        CrossReferencer::new(&self.symtab, &self.types).render(self.program_id)
    }
}
