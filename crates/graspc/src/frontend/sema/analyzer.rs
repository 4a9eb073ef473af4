//! Semantic analyzer - declaration binding and type checking
//!
//! One depth-first, left-to-right walk over the tree. Every problem is
//! flagged and replaced by a fallback (almost always `integer`) so the walk
//! always reaches the end and every expression, variable and type node ends
//! up with a type annotation.

use std::collections::HashSet;

use log::{debug, info, trace};

use crate::frontend::Mode;
use crate::frontend::ast::*;
use crate::types::{Form, TypeArena, TypeId, TypeKind, Typespec};

use super::Analysis;
use super::diagnostics::{SemanticErrorCode, SemanticErrorHandler};
use super::predefined::Predefined;
use super::scope::SymTableStack;
use super::symbol::{EntryId, Kind, RoutineCode, Value};
use super::types::TypeChecker;

/// Case label identity for duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CaseKey {
    Ordinal(i64),
    Text(String),
}

impl CaseKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(CaseKey::Text(text.clone())),
            other => other.ordinal().map(CaseKey::Ordinal),
        }
    }
}

/// Semantic analyzer for one program
pub struct SemanticAnalyzer {
    stack: SymTableStack,
    types: TypeArena,
    predefined: Predefined,
    annotations: Annotations,
    errors: SemanticErrorHandler,
    mode: Mode,
    /// Procedures and functions whose bodies are open, innermost last
    routines: Vec<EntryId>,
}

impl SemanticAnalyzer {
    pub fn new(mode: Mode) -> Self {
        let mut stack = SymTableStack::new();
        let mut types = TypeArena::new();
        let predefined = Predefined::initialize(&mut stack, &mut types);

        Self {
            stack,
            types,
            predefined,
            annotations: Annotations::new(),
            errors: SemanticErrorHandler::new(),
            mode,
            routines: Vec::new(),
        }
    }

    /// Analyze a program and hand back everything learned about it
    pub fn analyze(mut self, program: &Program) -> Analysis {
        let program_id = self.visit_program(program);
        info!(
            "semantic analysis of '{}' finished with {} error(s)",
            program.name,
            self.errors.count()
        );

        Analysis {
            program_id,
            symtab: self.stack,
            types: self.types,
            predefined: self.predefined,
            annotations: self.annotations,
            errors: self.errors,
            mode: self.mode,
        }
    }

    // Helpers

    fn checker(&self) -> TypeChecker<'_> {
        TypeChecker::new(&self.types, &self.predefined)
    }

    fn flag(&mut self, code: SemanticErrorCode, line: u32, text: impl ToString) {
        self.errors.flag(code, line, text.to_string());
    }

    fn integer(&self) -> TypeId {
        self.predefined.integer_type
    }

    fn base(&self, ty: TypeId) -> TypeId {
        self.types.base_type(ty)
    }

    /// Form after resolving subranges
    fn base_form(&self, ty: TypeId) -> Form {
        self.types.form(self.base(ty))
    }

    fn entry_type(&self, id: EntryId) -> TypeId {
        self.stack.entry(id).ty.unwrap_or(self.predefined.integer_type)
    }

    fn annotate(&mut self, id: NodeId, entry: Option<EntryId>, ty: TypeId) {
        if let Some(entry) = entry {
            self.annotations.set_entry(id, entry);
        }
        self.annotations.set_type(id, ty);
    }

    /// Give a fresh local a storage slot when it lives in a routine frame
    fn assign_slot(&mut self, id: EntryId) {
        let table = self.stack.local_table();
        let owned_by_routine = table
            .owner()
            .is_some_and(|owner| self.stack.entry(owner).kind.is_routine());
        if table.nesting_level() > 1 && owned_by_routine {
            let slot = self.stack.local_table_mut().next_slot_number();
            self.stack.entry_mut(id).slot = Some(slot);
        }
    }

    // Program structure

    fn visit_program(&mut self, program: &Program) -> EntryId {
        // A clash with a predefined name keeps the predefined binding
        let program_id = if self.stack.lookup_local(&program.name.name).is_some() {
            self.flag(SemanticErrorCode::RedeclaredIdentifier, program.name.line, &program.name);
            self.stack.create_detached(&program.name.name, Kind::Program)
        } else {
            self.stack.enter_local(&program.name.name, Kind::Program)
        };
        self.stack.set_program_id(program_id);
        self.stack.entry_mut(program_id).append_line(program.name.line);
        self.annotations.set_entry(program.name.id, program_id);

        let scope = self.stack.push();
        self.stack.table_mut(scope).set_owner(program_id);
        if let Some(routine) = self.stack.entry_mut(program_id).routine_mut() {
            routine.symtable = Some(scope);
            routine.executable = Some(program.block.body.id);
        }
        debug!("program '{}'", program.name);

        for parameter in &program.parameters {
            if let Some(existing) = self.stack.lookup_local(&parameter.name) {
                self.flag(SemanticErrorCode::RedeclaredIdentifier, parameter.line, parameter);
                self.annotations.set_entry(parameter.id, existing);
                continue;
            }
            let id = self.stack.enter_local(&parameter.name, Kind::ProgramParameter);
            self.stack.entry_mut(id).append_line(parameter.line);
            self.annotations.set_entry(parameter.id, id);
        }

        // The program scope stays open to the end of the walk
        self.visit_block(&program.block);
        program_id
    }

    fn visit_block(&mut self, block: &Block) {
        self.visit_declarations(&block.declarations);
        self.visit_stmt(&block.body);
    }

    fn visit_declarations(&mut self, declarations: &Declarations) {
        for def in &declarations.constants {
            self.visit_constant_def(def);
        }
        for def in &declarations.types {
            self.visit_type_def(def);
        }
        for decl in &declarations.variables {
            self.visit_var_decl(decl);
        }
        for def in &declarations.routines {
            self.visit_routine_def(def);
        }
    }

    // Constants

    fn visit_constant_def(&mut self, def: &ConstantDef) {
        let (ty, value) = self.visit_constant(&def.value);
        let name = &def.name;

        let id = match self.stack.lookup_local(&name.name) {
            Some(existing) => {
                self.flag(SemanticErrorCode::RedeclaredIdentifier, name.line, name);
                let ty = self.entry_type(existing);
                self.annotate(name.id, Some(existing), ty);
                existing
            }
            None => {
                let id = self.stack.enter_local(&name.name, Kind::Constant);
                let entry = self.stack.entry_mut(id);
                entry.ty = Some(ty);
                entry.set_value(value.clone());
                self.annotate(name.id, Some(id), ty);
                self.annotations.set_value(name.id, value);
                trace!("constant '{}'", name);
                id
            }
        };
        self.stack.entry_mut(id).append_line(name.line);
    }

    /// Type and folded value of a constant, annotating the node
    fn visit_constant(&mut self, constant: &Constant) -> (TypeId, Value) {
        let (ty, mut value) = match &constant.kind {
            ConstantKind::Identifier(ident) => self.visit_constant_identifier(ident),
            ConstantKind::Integer(value) => (self.predefined.integer_type, Value::Integer(*value)),
            ConstantKind::Real(value) => (self.predefined.real_type, Value::Real(*value)),
            ConstantKind::Char(value) => (self.predefined.char_type, Value::Char(*value)),
            ConstantKind::String(value) => (self.predefined.string_type, Value::String(value.clone())),
        };

        if let Some(sign) = constant.sign {
            if !self.checker().is_integer_or_real(ty) {
                self.flag(SemanticErrorCode::InvalidSign, constant.line, constant);
            } else if sign == Sign::Minus {
                value = value.negated();
            }
        }

        self.annotate(constant.id, None, ty);
        self.annotations.set_value(constant.id, value.clone());
        (ty, value)
    }

    fn visit_constant_identifier(&mut self, ident: &Ident) -> (TypeId, Value) {
        let Some(id) = self.stack.lookup(&ident.name) else {
            self.flag(SemanticErrorCode::UndeclaredIdentifier, ident.line, ident);
            return (self.integer(), Value::Integer(0));
        };
        self.stack.entry_mut(id).append_line(ident.line);

        let entry = self.stack.entry(id);
        if !matches!(entry.kind, Kind::Constant | Kind::EnumerationConstant) {
            self.flag(SemanticErrorCode::InvalidConstant, ident.line, ident);
            let ty = self.integer();
            self.annotate(ident.id, Some(id), ty);
            return (ty, Value::Integer(0));
        }

        let ty = self.entry_type(id);
        let value = entry.value().cloned().unwrap_or(Value::Integer(0));
        self.annotate(ident.id, Some(id), ty);
        (ty, value)
    }

    // Types

    fn visit_type_def(&mut self, def: &TypeDef) {
        let name = &def.name;
        let existing = self.stack.lookup_local(&name.name);

        if let (TypeSpecKind::Record(fields), None) = (&def.spec.kind, existing) {
            let (id, ty) = self.build_record_type(&def.spec, fields, Some(name));
            self.stack.entry_mut(id).append_line(name.line);
            self.annotate(name.id, Some(id), ty);
            return;
        }

        let ty = self.visit_type_spec(&def.spec);
        match existing {
            Some(existing) => {
                self.flag(SemanticErrorCode::RedeclaredIdentifier, name.line, name);
                let ty = self.entry_type(existing);
                self.stack.entry_mut(existing).append_line(name.line);
                self.annotate(name.id, Some(existing), ty);
            }
            None => {
                let id = self.stack.enter_local(&name.name, Kind::Type);
                let entry = self.stack.entry_mut(id);
                entry.ty = Some(ty);
                entry.append_line(name.line);
                // An alias keeps the link to the name that introduced the type
                let spec = self.types.get_mut(ty);
                if spec.identifier.is_none() {
                    spec.identifier = Some(id);
                }
                self.annotate(name.id, Some(id), ty);
                trace!("type '{}'", name);
            }
        }
    }

    /// Build or resolve the type a specification denotes
    fn visit_type_spec(&mut self, spec: &TypeSpec) -> TypeId {
        let ty = match &spec.kind {
            TypeSpecKind::Named(ident) => self.visit_type_identifier(ident),
            TypeSpecKind::Enumeration(names) => self.build_enumeration_type(names),
            TypeSpecKind::Subrange { min, max } => self.build_subrange_type(min, max),
            TypeSpecKind::Array { dimensions, element } => self.build_array_type(dimensions, element),
            TypeSpecKind::Record(fields) => self.build_record_type(spec, fields, None).1,
        };
        self.annotations.set_type(spec.id, ty);
        ty
    }

    fn visit_type_identifier(&mut self, ident: &Ident) -> TypeId {
        let Some(id) = self.stack.lookup(&ident.name) else {
            self.flag(SemanticErrorCode::UndeclaredIdentifier, ident.line, ident);
            let ty = self.integer();
            self.annotate(ident.id, None, ty);
            return ty;
        };
        self.stack.entry_mut(id).append_line(ident.line);

        let ty = if self.stack.entry(id).kind == Kind::Type {
            self.entry_type(id)
        } else {
            self.flag(SemanticErrorCode::InvalidType, ident.line, ident);
            self.integer()
        };
        self.annotate(ident.id, Some(id), ty);
        ty
    }

    fn build_enumeration_type(&mut self, names: &[Ident]) -> TypeId {
        let ty = self.types.alloc(Typespec::enumeration(Vec::new()));
        let mut constants = Vec::new();

        for name in names {
            if let Some(existing) = self.stack.lookup_local(&name.name) {
                self.flag(SemanticErrorCode::RedeclaredIdentifier, name.line, name);
                self.stack.entry_mut(existing).append_line(name.line);
                self.annotate(name.id, Some(existing), ty);
                continue;
            }

            let ordinal = constants.len() as i64;
            let id = self.stack.enter_local(&name.name, Kind::EnumerationConstant);
            let entry = self.stack.entry_mut(id);
            entry.ty = Some(ty);
            entry.set_value(Value::Integer(ordinal));
            entry.append_line(name.line);
            self.annotate(name.id, Some(id), ty);
            self.annotations.set_value(name.id, Value::Integer(ordinal));
            constants.push(id);
        }

        if let TypeKind::Enumeration(info) = &mut self.types.get_mut(ty).kind {
            info.constants = constants;
        }
        ty
    }

    fn build_subrange_type(&mut self, min: &Constant, max: &Constant) -> TypeId {
        let (mut min_type, min_value) = self.visit_constant(min);
        let (max_type, max_value) = self.visit_constant(max);

        let mut min_ordinal = min_value.ordinal().unwrap_or(0);
        let min_form = self.types.form(min_type);
        let valid_base = matches!(min_form, Form::Scalar | Form::Enumeration)
            && !self.checker().is_real(min_type)
            && !self.checker().is_string(min_type);
        if !valid_base {
            self.flag(SemanticErrorCode::InvalidConstant, min.line, min);
            min_type = self.integer();
            min_ordinal = 0;
        }

        let mut max_ordinal = max_value.ordinal().unwrap_or(min_ordinal);
        if max_type != min_type || min_ordinal > max_ordinal {
            self.flag(SemanticErrorCode::InvalidConstant, max.line, max);
            max_ordinal = min_ordinal;
        }

        self.types
            .alloc(Typespec::subrange(min_type, min_ordinal, max_ordinal))
    }

    /// `array [d1, d2] of e` becomes array(d1) of array(d2) of e
    fn build_array_type(&mut self, dimensions: &[TypeSpec], element: &TypeSpec) -> TypeId {
        let mut levels = Vec::with_capacity(dimensions.len());
        for dimension in dimensions {
            let index = self.visit_type_spec(dimension);
            let count = match self.types.value_count(index) {
                Some(count) => count,
                None => {
                    self.flag(SemanticErrorCode::InvalidType, dimension.line, dimension);
                    0
                }
            };
            levels.push((index, count));
        }

        let mut ty = self.visit_type_spec(element);
        for (index, count) in levels.into_iter().rev() {
            ty = self.types.alloc(Typespec::array(index, ty, count));
        }
        ty
    }

    fn build_record_type(
        &mut self,
        spec: &TypeSpec,
        fields: &[VarDecl],
        name: Option<&Ident>,
    ) -> (EntryId, TypeId) {
        let record_id = match name {
            Some(ident) => self.stack.enter_local(&ident.name, Kind::Type),
            None => self.stack.create_unnamed(Kind::Type),
        };
        let path = self.record_type_path(record_id);

        let scope = self.stack.push();
        self.stack.table_mut(scope).set_owner(record_id);
        let ty = self
            .types
            .alloc(Typespec::record(scope, path.as_str()).with_identifier(record_id));
        self.stack.entry_mut(record_id).ty = Some(ty);
        debug!("record type '{}'", path);

        for decl in fields {
            self.visit_var_decl(decl);
        }
        self.stack.pop_as(Kind::RecordField);

        self.annotate(spec.id, Some(record_id), ty);
        (record_id, ty)
    }

    /// Owner names from the nearest routine (or the program) down to the record, `$`-joined
    fn record_type_path(&self, record_id: EntryId) -> String {
        let record = self.stack.entry(record_id);
        let mut path = record.spelling.clone();
        let mut owner = self.stack.table(record.scope).owner();

        while let Some(owner_id) = owner {
            let entry = self.stack.entry(owner_id);
            path = format!("{}${}", entry.spelling, path);

            let is_record = entry.kind == Kind::Type
                && entry
                    .ty
                    .is_some_and(|ty| self.types.form(ty) == Form::Record);
            if !is_record {
                break;
            }
            owner = self.stack.table(entry.scope).owner();
        }
        path
    }

    // Variables and routines

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        let ty = self.visit_type_spec(&decl.ty);

        for name in &decl.names {
            if let Some(existing) = self.stack.lookup_local(&name.name) {
                self.flag(SemanticErrorCode::RedeclaredIdentifier, name.line, name);
                let ty = self.entry_type(existing);
                self.stack.entry_mut(existing).append_line(name.line);
                self.annotate(name.id, Some(existing), ty);
                continue;
            }

            let id = self.stack.enter_local(&name.name, Kind::Variable);
            let entry = self.stack.entry_mut(id);
            entry.ty = Some(ty);
            entry.append_line(name.line);
            self.assign_slot(id);
            self.annotate(name.id, Some(id), ty);
        }
    }

    fn visit_routine_def(&mut self, def: &RoutineDef) {
        let name = &def.name;
        if let Some(existing) = self.stack.lookup_local(&name.name) {
            // The earlier binding stays authoritative; the body is not analyzed
            self.flag(SemanticErrorCode::RedeclaredIdentifier, name.line, name);
            self.annotations.set_entry(name.id, existing);
            return;
        }

        let kind = if def.is_function() {
            Kind::Function
        } else {
            Kind::Procedure
        };
        let routine_id = self.stack.enter_local(&name.name, kind);
        self.stack.entry_mut(routine_id).append_line(name.line);
        self.annotations.set_entry(name.id, routine_id);

        let parent = self.stack.local_table();
        let nested = parent.nesting_level() > 1;
        if let Some(owner) = parent.owner() {
            if let Some(info) = self.stack.entry_mut(owner).routine_mut() {
                info.subroutines.push(routine_id);
            }
        }

        let scope = self.stack.push();
        self.stack.table_mut(scope).set_owner(routine_id);
        if let Some(info) = self.stack.entry_mut(routine_id).routine_mut() {
            info.symtable = Some(scope);
            info.immutable = def.immutable;
            info.nested = nested;
            info.executable = Some(def.block.body.id);
        }
        debug!("{} '{}' at level {}", def.kind, name, self.stack.current_nesting_level());

        let mut parameters = Vec::new();
        for decl in &def.params {
            parameters.extend(self.visit_param_decl(decl));
        }
        if let Some(info) = self.stack.entry_mut(routine_id).routine_mut() {
            info.parameters = parameters;
        }

        if def.is_function() {
            self.bind_function_result(def, routine_id);
        }

        self.routines.push(routine_id);
        self.visit_block(&def.block);
        self.routines.pop();

        self.stack.pop();
    }

    /// Check the return type and bind the implicit result variable
    fn bind_function_result(&mut self, def: &RoutineDef, routine_id: EntryId) {
        let name = &def.name;
        let return_type = match &def.return_type {
            Some(ident) => {
                let ty = self.visit_type_identifier(ident);
                if matches!(self.types.form(ty), Form::Scalar | Form::Enumeration) {
                    ty
                } else {
                    self.flag(SemanticErrorCode::InvalidReturnType, ident.line, ident);
                    self.integer()
                }
            }
            None => {
                self.flag(SemanticErrorCode::InvalidReturnType, name.line, name);
                self.integer()
            }
        };
        self.stack.entry_mut(routine_id).ty = Some(return_type);
        self.annotations.set_type(name.id, return_type);

        if self.stack.lookup_local(&name.name).is_some() {
            self.flag(SemanticErrorCode::RedeclaredIdentifier, name.line, name);
            return;
        }
        let result_id = self.stack.enter_local(&name.name, Kind::Variable);
        self.stack.entry_mut(result_id).ty = Some(return_type);
        self.assign_slot(result_id);
    }

    fn visit_param_decl(&mut self, decl: &ParamDecl) -> Vec<EntryId> {
        let kind = if decl.by_reference {
            Kind::ReferenceParameter
        } else {
            Kind::ValueParameter
        };
        let ty = self.visit_type_identifier(&decl.ty);
        let scalar_reference = decl.by_reference && self.base_form(ty) == Form::Scalar;

        let mut bound = Vec::new();
        for name in &decl.names {
            if let Some(existing) = self.stack.lookup_local(&name.name) {
                self.flag(SemanticErrorCode::RedeclaredIdentifier, name.line, name);
                self.annotations.set_entry(name.id, existing);
                continue;
            }

            let id = self.stack.enter_local(&name.name, kind);
            let entry = self.stack.entry_mut(id);
            entry.ty = Some(ty);
            entry.append_line(name.line);
            self.assign_slot(id);
            self.annotate(name.id, Some(id), ty);

            if scalar_reference && !self.mode.allows_scalar_reference_parameters() {
                self.flag(SemanticErrorCode::InvalidReferenceParameter, name.line, name);
            }
            bound.push(id);
        }
        bound
    }

    // Statements

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Compound(stmts) => {
                for stmt in stmts {
                    self.visit_stmt(stmt);
                }
            }
            StmtKind::Assign { target, value } => self.visit_assignment(target, value),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.visit_condition(condition);
                self.visit_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(else_branch);
                }
            }
            StmtKind::Case { selector, branches } => self.visit_case(selector, branches),
            StmtKind::While { condition, body } => {
                self.visit_condition(condition);
                self.visit_stmt(body);
            }
            StmtKind::Repeat { body, condition } => {
                for stmt in body {
                    self.visit_stmt(stmt);
                }
                self.visit_condition(condition);
            }
            StmtKind::For {
                control,
                start,
                end,
                body,
                ..
            } => self.visit_for(control, start, end, body),
            StmtKind::ProcedureCall(call) => self.visit_procedure_call(call),
            StmtKind::Empty => {}
        }
    }

    fn visit_condition(&mut self, condition: &Expr) {
        let ty = self.visit_expr(condition);
        if !self.checker().is_boolean(ty) {
            self.flag(SemanticErrorCode::TypeMustBeBoolean, condition.line, condition);
        }
    }

    fn visit_assignment(&mut self, target: &Variable, value: &Expr) {
        let target_type = self.visit_variable(target);
        let value_type = self.visit_expr(value);

        if !self
            .checker()
            .are_assignment_compatible(Some(target_type), Some(value_type))
        {
            self.flag(SemanticErrorCode::IncompatibleAssignment, value.line, value);
        }
        self.check_immutable_assignment(target);
    }

    /// Immutable functions may not assign storage declared at program level
    fn check_immutable_assignment(&mut self, target: &Variable) {
        let inside_immutable = self.routines.iter().any(|id| {
            self.stack
                .entry(*id)
                .routine()
                .is_some_and(|info| info.immutable)
        });
        if !inside_immutable {
            return;
        }
        let Some(entry_id) = self.annotations.entry_of(target.name.id) else {
            return;
        };

        let entry = self.stack.entry(entry_id);
        if entry.kind.is_storage() && self.stack.table(entry.scope).nesting_level() <= 1 {
            self.flag(SemanticErrorCode::ImmutableFunction, target.line, target);
        }
    }

    fn visit_case(&mut self, selector: &Expr, branches: &[CaseBranch]) {
        let mut selector_type = self.visit_expr(selector);
        let valid_selector = matches!(
            self.types.form(selector_type),
            Form::Scalar | Form::Enumeration | Form::Subrange
        ) && !self.checker().is_real(selector_type);
        if !valid_selector {
            self.flag(SemanticErrorCode::TypeMismatch, selector.line, selector);
            selector_type = self.integer();
        }
        let selector_base = self.base(selector_type);

        // One set for the whole statement
        let mut seen = HashSet::new();
        for branch in branches {
            for constant in &branch.constants {
                let (ty, value) = self.visit_constant(constant);
                if self.base(ty) != selector_base {
                    self.flag(SemanticErrorCode::TypeMismatch, constant.line, constant);
                    continue;
                }
                if let Some(key) = CaseKey::from_value(&value) {
                    if !seen.insert(key) {
                        self.flag(SemanticErrorCode::DuplicateCaseConstant, constant.line, constant);
                    }
                }
            }
            if let Some(body) = &branch.body {
                self.visit_stmt(body);
            }
        }
    }

    fn visit_for(&mut self, control: &Variable, start: &Expr, end: &Expr, body: &Stmt) {
        let declared_type = self.visit_variable(control);
        let mut control_type = self.integer();

        if let Some(entry_id) = self.annotations.entry_of(control.name.id) {
            let valid = self.stack.entry(entry_id).kind.is_storage()
                && control.modifiers.is_empty()
                && self.types.form(declared_type) == Form::Scalar
                && !self.checker().is_real(declared_type)
                && !self.checker().is_string(declared_type);
            if valid {
                control_type = declared_type;
            } else {
                self.flag(SemanticErrorCode::InvalidControlVariable, control.line, control);
            }
        }

        let control_base = self.base(control_type);
        for bound in [start, end] {
            let ty = self.visit_expr(bound);
            if self.base(ty) != control_base {
                self.flag(SemanticErrorCode::TypeMismatch, bound.line, bound);
            }
        }

        self.visit_stmt(body);
    }

    // Calls

    /// Resolve a routine name, seeing through a function's own result variable
    fn resolve_routine(&self, name: &str) -> Option<EntryId> {
        let id = self.stack.lookup(name)?;
        let entry = self.stack.entry(id);
        if entry.kind == Kind::Variable {
            if let Some(owner) = self.stack.table(entry.scope).owner() {
                let owner_entry = self.stack.entry(owner);
                if owner_entry.kind == Kind::Function && owner_entry.name == entry.name {
                    return Some(owner);
                }
            }
        }
        Some(id)
    }

    fn visit_arguments(&mut self, args: &[Expr]) -> Vec<TypeId> {
        args.iter().map(|arg| self.visit_expr(arg)).collect()
    }

    fn visit_procedure_call(&mut self, call: &Call) {
        let Some(id) = self.resolve_routine(&call.name.name) else {
            self.flag(SemanticErrorCode::UndeclaredIdentifier, call.name.line, &call.name);
            self.visit_arguments(&call.args);
            return;
        };
        self.stack.entry_mut(id).append_line(call.name.line);
        self.annotations.set_entry(call.name.id, id);
        self.annotations.set_entry(call.id, id);

        if self.stack.entry(id).kind != Kind::Procedure {
            self.flag(SemanticErrorCode::NameMustBeProcedure, call.name.line, &call.name);
            self.visit_arguments(&call.args);
            return;
        }
        self.check_call(id, call);
    }

    fn visit_function_call(&mut self, call: &Call) -> TypeId {
        let Some(id) = self.resolve_routine(&call.name.name) else {
            self.flag(SemanticErrorCode::UndeclaredIdentifier, call.name.line, &call.name);
            self.visit_arguments(&call.args);
            return self.integer();
        };
        self.stack.entry_mut(id).append_line(call.name.line);
        self.annotations.set_entry(call.name.id, id);
        self.annotations.set_entry(call.id, id);

        if self.stack.entry(id).kind != Kind::Function {
            self.flag(SemanticErrorCode::NameMustBeFunction, call.name.line, &call.name);
            self.visit_arguments(&call.args);
            return self.integer();
        }

        let ty = self.check_call(id, call).unwrap_or_else(|| self.entry_type(id));
        self.annotations.set_type(call.id, ty);
        ty
    }

    /// Check actual arguments; standard functions report their result type
    fn check_call(&mut self, routine_id: EntryId, call: &Call) -> Option<TypeId> {
        let entry = self.stack.entry(routine_id);
        let code = entry.routine_code().unwrap_or(RoutineCode::Declared);
        if code.is_standard() {
            return self.check_standard_call(code, call);
        }
        let parameters = entry
            .routine()
            .map(|info| info.parameters.clone())
            .unwrap_or_default();

        if parameters.len() != call.args.len() {
            self.flag(SemanticErrorCode::ArgumentCountMismatch, call.line, call);
            self.visit_arguments(&call.args);
            return None;
        }

        for (arg, parameter) in call.args.iter().zip(parameters) {
            let arg_type = self.visit_expr(arg);
            let param = self.stack.entry(parameter);
            let param_type = param.ty;

            if param.kind == Kind::ReferenceParameter {
                if !self.is_variable_argument(arg) {
                    self.flag(SemanticErrorCode::ArgumentMustBeVariable, arg.line, arg);
                } else if param_type != Some(arg_type) {
                    self.flag(SemanticErrorCode::TypeMismatch, arg.line, arg);
                }
            } else if !self
                .checker()
                .are_assignment_compatible(param_type, Some(arg_type))
            {
                let code = self.value_parameter_mismatch(param_type);
                self.flag(code, arg.line, arg);
            }
        }
        None
    }

    /// The most specific code the declared parameter type allows
    fn value_parameter_mismatch(&self, param_type: Option<TypeId>) -> SemanticErrorCode {
        let Some(ty) = param_type else {
            return SemanticErrorCode::TypeMismatch;
        };
        let checker = self.checker();
        if checker.is_integer(ty) {
            SemanticErrorCode::TypeMustBeInteger
        } else if checker.is_real(ty) {
            SemanticErrorCode::TypeMustBeNumeric
        } else if checker.is_boolean(ty) {
            SemanticErrorCode::TypeMustBeBoolean
        } else if checker.is_string(ty) {
            SemanticErrorCode::TypeMustBeString
        } else {
            SemanticErrorCode::TypeMismatch
        }
    }

    /// A bare reference to storage, modifiers allowed
    fn is_variable_argument(&self, arg: &Expr) -> bool {
        arg.as_variable()
            .and_then(|variable| self.annotations.entry_of(variable.name.id))
            .is_some_and(|id| self.stack.entry(id).kind.is_storage())
    }

    fn check_standard_call(&mut self, code: RoutineCode, call: &Call) -> Option<TypeId> {
        let arg_types = self.visit_arguments(&call.args);

        match code {
            RoutineCode::Read | RoutineCode::Readln => {
                if code == RoutineCode::Read && call.args.is_empty() {
                    self.flag(SemanticErrorCode::ArgumentCountMismatch, call.line, call);
                }
                for arg in &call.args {
                    if !self.is_variable_argument(arg) {
                        self.flag(SemanticErrorCode::ArgumentMustBeVariable, arg.line, arg);
                    }
                }
                None
            }
            RoutineCode::Write | RoutineCode::Writeln => {
                if code == RoutineCode::Write && call.args.is_empty() {
                    self.flag(SemanticErrorCode::ArgumentCountMismatch, call.line, call);
                }
                for (arg, ty) in call.args.iter().zip(&arg_types) {
                    if self.checker().is_structured(*ty) {
                        self.flag(SemanticErrorCode::TypeMismatch, arg.line, arg);
                    }
                }
                None
            }
            RoutineCode::Eof | RoutineCode::Eoln => {
                if !call.args.is_empty() {
                    self.flag(SemanticErrorCode::ArgumentCountMismatch, call.line, call);
                }
                Some(self.predefined.boolean_type)
            }
            _ => {
                if arg_types.len() != 1 {
                    self.flag(SemanticErrorCode::ArgumentCountMismatch, call.line, call);
                    return Some(self.standard_fallback_type(code));
                }
                Some(self.check_standard_argument(code, &call.args[0], arg_types[0]))
            }
        }
    }

    /// Result type of a one-argument standard function
    fn check_standard_argument(&mut self, code: RoutineCode, arg: &Expr, ty: TypeId) -> TypeId {
        let p = self.predefined;
        let checker = self.checker();

        let (valid, result, mismatch) = match code {
            RoutineCode::Abs | RoutineCode::Sqr => {
                let result = if checker.is_real(ty) { p.real_type } else { p.integer_type };
                (checker.is_integer_or_real(ty), result, SemanticErrorCode::TypeMustBeNumeric)
            }
            RoutineCode::Arctan
            | RoutineCode::Cos
            | RoutineCode::Exp
            | RoutineCode::Ln
            | RoutineCode::Sin
            | RoutineCode::Sqrt => (
                checker.is_integer_or_real(ty),
                p.real_type,
                SemanticErrorCode::TypeMustBeNumeric,
            ),
            RoutineCode::Chr => (checker.is_integer(ty), p.char_type, SemanticErrorCode::TypeMustBeInteger),
            RoutineCode::Odd => (
                checker.is_integer(ty),
                p.boolean_type,
                SemanticErrorCode::TypeMustBeInteger,
            ),
            RoutineCode::Ord => (checker.is_ordinal(ty), p.integer_type, SemanticErrorCode::TypeMismatch),
            RoutineCode::Pred | RoutineCode::Succ => {
                let valid = checker.is_integer(ty) || self.base_form(ty) == Form::Enumeration;
                let result = if valid { self.base(ty) } else { p.integer_type };
                (valid, result, SemanticErrorCode::TypeMismatch)
            }
            RoutineCode::Round | RoutineCode::Trunc => (
                checker.is_integer_or_real(ty),
                p.integer_type,
                SemanticErrorCode::TypeMustBeNumeric,
            ),
            _ => (true, self.standard_fallback_type(code), SemanticErrorCode::TypeMismatch),
        };

        if !valid {
            self.flag(mismatch, arg.line, arg);
        }
        result
    }

    fn standard_fallback_type(&self, code: RoutineCode) -> TypeId {
        let p = &self.predefined;
        match code {
            RoutineCode::Arctan
            | RoutineCode::Cos
            | RoutineCode::Exp
            | RoutineCode::Ln
            | RoutineCode::Sin
            | RoutineCode::Sqrt => p.real_type,
            RoutineCode::Chr => p.char_type,
            RoutineCode::Odd | RoutineCode::Eof | RoutineCode::Eoln => p.boolean_type,
            _ => p.integer_type,
        }
    }

    // Expressions

    fn visit_expr(&mut self, expr: &Expr) -> TypeId {
        let p = self.predefined;
        let ty = match &expr.kind {
            ExprKind::Integer(value) => {
                self.annotations.set_value(expr.id, Value::Integer(*value));
                p.integer_type
            }
            ExprKind::Real(value) => {
                self.annotations.set_value(expr.id, Value::Real(*value));
                p.real_type
            }
            ExprKind::Char(value) => {
                self.annotations.set_value(expr.id, Value::Char(*value));
                p.char_type
            }
            ExprKind::String(value) => {
                self.annotations.set_value(expr.id, Value::String(value.clone()));
                p.string_type
            }
            ExprKind::Variable(variable) => {
                let ty = self.visit_variable(variable);
                self.fold_constant_reference(expr.id, variable);
                ty
            }
            ExprKind::Call(call) => self.visit_function_call(call),
            ExprKind::Paren(inner) => self.visit_expr(inner),
            ExprKind::Unary { op, operand } => self.visit_unary(expr, *op, operand),
            ExprKind::Binary { op, left, right } => self.visit_binary(expr, *op, left, right),
        };
        self.annotations.set_type(expr.id, ty);
        ty
    }

    /// Copy the value of a referenced constant onto the expression
    fn fold_constant_reference(&mut self, expr_id: NodeId, variable: &Variable) {
        if !variable.modifiers.is_empty() {
            return;
        }
        let Some(id) = self.annotations.entry_of(variable.name.id) else {
            return;
        };
        let entry = self.stack.entry(id);
        if matches!(entry.kind, Kind::Constant | Kind::EnumerationConstant) {
            if let Some(value) = entry.value().cloned() {
                self.annotations.set_value(expr_id, value);
            }
        }
    }

    fn visit_unary(&mut self, expr: &Expr, op: UnaryOp, operand: &Expr) -> TypeId {
        let ty = self.visit_expr(operand);
        match op {
            UnaryOp::Not => {
                if !self.checker().is_boolean(ty) {
                    self.flag(SemanticErrorCode::TypeMustBeBoolean, operand.line, operand);
                }
                self.predefined.boolean_type
            }
            UnaryOp::Plus | UnaryOp::Minus => {
                let checker = self.checker();
                if checker.is_integer(ty) {
                    self.predefined.integer_type
                } else if checker.is_real(ty) {
                    self.predefined.real_type
                } else {
                    self.flag(SemanticErrorCode::InvalidSign, expr.line, expr);
                    self.integer()
                }
            }
        }
    }

    fn visit_binary(&mut self, expr: &Expr, op: BinaryOp, left: &Expr, right: &Expr) -> TypeId {
        let lt = self.visit_expr(left);
        let rt = self.visit_expr(right);
        let p = self.predefined;

        if op.is_relational() {
            let checker = self.checker();
            if checker.is_structured(lt) || checker.is_structured(rt) {
                self.flag(SemanticErrorCode::InvalidOperator, expr.line, expr);
            } else if !checker.are_comparison_compatible(Some(lt), Some(rt)) {
                self.flag(SemanticErrorCode::IncompatibleComparison, expr.line, expr);
            }
            return p.boolean_type;
        }

        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
                let checker = self.checker();
                if checker.are_both_integer(lt, rt) {
                    p.integer_type
                } else if checker.is_at_least_one_real(lt, rt) {
                    p.real_type
                } else if op == BinaryOp::Add && checker.are_both_string(lt, rt) {
                    p.string_type
                } else {
                    self.flag_unless(SemanticErrorCode::TypeMustBeNumeric, left, lt);
                    self.flag_unless(SemanticErrorCode::TypeMustBeNumeric, right, rt);
                    p.integer_type
                }
            }
            BinaryOp::Divide => {
                let checker = self.checker();
                if checker.are_both_integer(lt, rt) || checker.is_at_least_one_real(lt, rt) {
                    p.real_type
                } else {
                    self.flag_unless(SemanticErrorCode::TypeMustBeNumeric, left, lt);
                    self.flag_unless(SemanticErrorCode::TypeMustBeNumeric, right, rt);
                    p.integer_type
                }
            }
            BinaryOp::Div | BinaryOp::Mod => {
                self.flag_unless(SemanticErrorCode::TypeMustBeInteger, left, lt);
                self.flag_unless(SemanticErrorCode::TypeMustBeInteger, right, rt);
                p.integer_type
            }
            BinaryOp::And | BinaryOp::Or => {
                self.flag_unless(SemanticErrorCode::TypeMustBeBoolean, left, lt);
                self.flag_unless(SemanticErrorCode::TypeMustBeBoolean, right, rt);
                p.boolean_type
            }
            _ => p.boolean_type,
        }
    }

    /// Flag an operand whose type does not belong to the class `code` demands
    fn flag_unless(&mut self, code: SemanticErrorCode, operand: &Expr, ty: TypeId) {
        let checker = self.checker();
        let ok = match code {
            SemanticErrorCode::TypeMustBeNumeric => checker.is_integer_or_real(ty),
            SemanticErrorCode::TypeMustBeInteger => checker.is_integer(ty),
            SemanticErrorCode::TypeMustBeBoolean => checker.is_boolean(ty),
            SemanticErrorCode::TypeMustBeString => checker.is_string(ty),
            _ => true,
        };
        if !ok {
            self.flag(code, operand.line, operand);
        }
    }

    /// Resolve a variable and apply its modifiers left to right
    fn visit_variable(&mut self, variable: &Variable) -> TypeId {
        let name = &variable.name;
        let mut ty = match self.stack.lookup(&name.name) {
            Some(id) => {
                self.stack.entry_mut(id).append_line(name.line);
                if matches!(
                    self.stack.entry(id).kind,
                    Kind::Type | Kind::Program | Kind::ProgramParameter | Kind::Procedure | Kind::Undefined
                ) {
                    self.flag(SemanticErrorCode::InvalidVariable, name.line, name);
                }
                let ty = self.entry_type(id);
                self.annotate(name.id, Some(id), ty);
                self.annotations.set_entry(variable.id, id);
                ty
            }
            None => {
                self.flag(SemanticErrorCode::UndeclaredIdentifier, name.line, name);
                let ty = self.integer();
                self.annotations.set_type(name.id, ty);
                ty
            }
        };

        for modifier in &variable.modifiers {
            match &modifier.kind {
                ModifierKind::Index(indices) => {
                    for index in indices {
                        let array = self.types.get(ty).as_array().copied();
                        let index_type = self.visit_expr(index);
                        match array {
                            Some(info) => {
                                if self.base(info.index) != self.base(index_type) {
                                    self.flag(SemanticErrorCode::TypeMismatch, index.line, index);
                                }
                                ty = info.element;
                            }
                            None => {
                                self.flag(SemanticErrorCode::TooManySubscripts, index.line, index);
                            }
                        }
                    }
                }
                ModifierKind::Field(field) => {
                    let scope = self.types.get(ty).as_record().map(|info| info.scope);
                    let field_id = scope
                        .and_then(|scope| self.stack.lookup_in(scope, &field.name))
                        .filter(|id| self.stack.entry(*id).kind == Kind::RecordField);
                    match field_id {
                        Some(field_id) => {
                            self.stack.entry_mut(field_id).append_line(field.line);
                            ty = self.entry_type(field_id);
                            self.annotate(field.id, Some(field_id), ty);
                        }
                        None => {
                            self.flag(SemanticErrorCode::InvalidField, field.line, field);
                            ty = self.integer();
                            self.annotations.set_type(field.id, ty);
                        }
                    }
                }
            }
            self.annotations.set_type(modifier.id, ty);
        }

        self.annotations.set_type(variable.id, ty);
        ty
    }
}
