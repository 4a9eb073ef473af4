//! Compilation driver and pipeline orchestration

use log::{debug, info};

use crate::common::{CompileError, CompileResult};
use crate::frontend::ast::Program;
use crate::frontend::sema::{Analysis, SemanticAnalyzer};
use crate::frontend::{CompileContext, FrontendConfig};

/// Trait for code generation backends
///
/// A backend consumes a fully annotated tree. It is only invoked when
/// analysis flagged nothing.
pub trait Backend: Send + Sync {
    /// The name of this backend (e.g., "interpreter", "java")
    fn name(&self) -> &'static str;

    /// Generate output for an analyzed program
    fn generate(&self, program: &Program, analysis: &Analysis) -> CompileResult<String>;
}

/// Registry of available backends
pub struct BackendRegistry {
    backends: Vec<Box<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self { backends: Vec::new() }
    }

    pub fn register(&mut self, backend: Box<dyn Backend>) {
        self.backends.push(backend);
    }

    pub fn find_by_name(&self, name: &str) -> Option<&dyn Backend> {
        self.backends.iter()
            .find(|b| b.name() == name)
            .map(|b| b.as_ref())
    }

    pub fn list(&self) -> impl Iterator<Item = &dyn Backend> {
        self.backends.iter().map(|b| b.as_ref())
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Compilation pipeline that gates backends on a clean analysis
pub struct Pipeline {
    config: FrontendConfig,
    backends: BackendRegistry,
}

impl Pipeline {
    pub fn new(config: FrontendConfig) -> Self {
        Self {
            config,
            backends: BackendRegistry::new(),
        }
    }

    pub fn register_backend(&mut self, backend: Box<dyn Backend>) {
        self.backends.register(backend);
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    /// Run semantic analysis, whatever it finds
    pub fn analyze(&self, program: &Program) -> Analysis {
        debug!("analyzing '{}' in {} mode", program.name, self.config.mode);
        let analysis = SemanticAnalyzer::new(self.config.mode).analyze(program);

        if self.config.dump_symbols {
            debug!("{}", analysis.cross_reference());
        }
        analysis
    }

    /// Analyze and report every diagnostic; fails when any were flagged
    pub fn check(&self, program: &Program, ctx: &CompileContext) -> CompileResult<Analysis> {
        let analysis = self.analyze(program);
        let count = analysis.error_count();
        if count == 0 {
            return Ok(analysis);
        }

        for diagnostic in analysis.errors.diagnostics() {
            ctx.reporter.report_semantic(ctx.file_id, diagnostic);
        }
        let error = CompileError::semantic(count);
        ctx.reporter.report_error(&error);
        info!("{}: {}", ctx.filename, error);
        Err(error)
    }

    /// Analyze, then hand the program to the named backend
    pub fn compile(
        &self,
        program: &Program,
        backend_name: &str,
        ctx: &CompileContext,
    ) -> CompileResult<String> {
        let backend = self.backends.find_by_name(backend_name).ok_or_else(|| {
            CompileError::backend(format!("backend not found: {}", backend_name))
        })?;

        let analysis = self.check(program, ctx)?;
        debug!("running backend '{}'", backend.name());
        backend.generate(program, &analysis)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(FrontendConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DiagnosticReporter;
    use crate::frontend::ast::{AstBuilder, Declarations};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts invocations and echoes the program name
    struct RecordingBackend {
        calls: Arc<AtomicUsize>,
    }

    impl Backend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn generate(&self, program: &Program, analysis: &Analysis) -> CompileResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{} ({} errors)", program.name, analysis.error_count()))
        }
    }

    fn program_assigning(value_is_real: bool) -> Program {
        let mut ast = AstBuilder::new();
        let integer = ast.named_type(2, "integer");
        let x = ast.var_decl(2, &["x"], integer);
        let target = ast.variable(4, "x");
        let value = if value_is_real { ast.real(4, 3.5) } else { ast.int(4, 3) };
        let assign = ast.assign(4, target, value);
        let block = ast.block(3, Declarations::new().variable(x), vec![assign]);
        ast.program(1, "demo", &[], block)
    }

    fn pipeline_with_backend() -> (Pipeline, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pipeline = Pipeline::default();
        pipeline.register_backend(Box::new(RecordingBackend {
            calls: Arc::clone(&calls),
        }));
        (pipeline, calls)
    }

    #[test]
    fn test_clean_program_reaches_backend() {
        let (pipeline, calls) = pipeline_with_backend();
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("demo.grasp", "");
        let ctx = CompileContext::new("demo.grasp".to_string(), file_id, &reporter);

        let output = pipeline.compile(&program_assigning(false), "recording", &ctx).unwrap();

        assert_eq!(output, "demo (0 errors)");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_semantic_errors_block_backend() {
        let (pipeline, calls) = pipeline_with_backend();
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("demo.grasp", "");
        let ctx = CompileContext::new("demo.grasp".to_string(), file_id, &reporter);

        let result = pipeline.compile(&program_assigning(true), "recording", &ctx);

        assert!(matches!(result, Err(CompileError::Semantic { count: 1 })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_backend() {
        let pipeline = Pipeline::default();
        let reporter = DiagnosticReporter::new();
        let ctx = CompileContext::new("demo.grasp".to_string(), 0, &reporter);

        let result = pipeline.compile(&program_assigning(false), "missing", &ctx);

        assert!(matches!(result, Err(CompileError::Backend { .. })));
    }

    #[test]
    fn test_analyze_reports_without_failing() {
        let pipeline = Pipeline::new(FrontendConfig {
            dump_symbols: true,
            ..FrontendConfig::default()
        });

        let analysis = pipeline.analyze(&program_assigning(true));

        assert_eq!(analysis.error_count(), 1);
        assert!(!analysis.is_clean());
        assert_eq!(pipeline.backends().list().count(), 0);
    }
}
