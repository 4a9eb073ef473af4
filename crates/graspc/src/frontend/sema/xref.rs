//! Cross-reference listing of every scope

use std::fmt::Write;

use crate::types::{TypeArena, TypeId, TypeKind};

use super::scope::{ScopeId, SymTableStack};
use super::symbol::{EntryId, Kind, SymTableEntry};

const NAME_WIDTH: usize = 16;
const INDENT: &str = "                 ";

/// Renders the symbol tables of a program, routine by routine
pub struct CrossReferencer<'a> {
    symtab: &'a SymTableStack,
    types: &'a TypeArena,
}

impl<'a> CrossReferencer<'a> {
    pub fn new(symtab: &'a SymTableStack, types: &'a TypeArena) -> Self {
        Self { symtab, types }
    }

    /// Listing for the program and, recursively, all of its routines
    pub fn render(&self, program_id: EntryId) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "===== CROSS-REFERENCE TABLE =====");
        self.render_routine(&mut out, program_id);
        out
    }

    fn render_routine(&self, out: &mut String, routine_id: EntryId) {
        let entry = self.symtab.entry(routine_id);
        let Some(info) = entry.routine() else {
            return;
        };

        let _ = writeln!(
            out,
            "\n*** {} {} ***",
            entry.kind.to_string().to_uppercase(),
            entry.spelling
        );
        if let Some(scope) = info.symtable {
            self.render_table(out, scope);
        }

        for subroutine in &info.subroutines {
            self.render_routine(out, *subroutine);
        }
    }

    fn render_table(&self, out: &mut String, scope: ScopeId) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<NAME_WIDTH$} {:<15} {}", "Identifier", "Line numbers", "Type specification");
        let _ = writeln!(out, "{:<NAME_WIDTH$} {:<15} {}", "----------", "------------", "------------------");

        let mut entries: Vec<EntryId> = self.symtab.table(scope).entries().to_vec();
        entries.sort_by(|a, b| self.symtab.entry(*a).name.cmp(&self.symtab.entry(*b).name));

        let mut records = Vec::new();
        for id in entries {
            let entry = self.symtab.entry(id);
            let _ = write!(out, "{:<NAME_WIDTH$}", entry.spelling);
            for line in &entry.line_numbers {
                let _ = write!(out, " {line:03}");
            }
            let _ = writeln!(out);
            self.render_entry(out, entry, &mut records);
        }

        for record in records {
            if let TypeKind::Record(info) = &self.types.get(record).kind {
                let _ = writeln!(out, "\n{INDENT}--- RECORD {} ---", info.path);
                self.render_table(out, info.scope);
            }
        }
    }

    fn render_entry(&self, out: &mut String, entry: &SymTableEntry, records: &mut Vec<TypeId>) {
        let level = self.symtab.table(entry.scope).nesting_level();
        let _ = writeln!(out, "{INDENT}Defined as: {}", entry.kind);
        let _ = writeln!(out, "{INDENT}Scope nesting level: {level}");
        if let Some(slot) = entry.slot {
            let _ = writeln!(out, "{INDENT}Slot number: {slot}");
        }
        if entry.kind == Kind::Constant {
            if let Some(value) = entry.value() {
                let _ = writeln!(out, "{INDENT}Value = {value}");
            }
        }

        let Some(ty) = entry.ty else {
            return;
        };
        self.render_type(out, ty);

        // Fields are listed once, under the entry that introduced the record
        let spec = self.types.get(ty);
        if matches!(spec.kind, TypeKind::Record(_)) {
            let introduced_here = spec.identifier.is_some_and(|identifier| {
                let owner = self.symtab.entry(identifier);
                owner.is_unnamed() || (entry.kind == Kind::Type && owner.name == entry.name)
            });
            if introduced_here && !records.contains(&ty) {
                records.push(ty);
            }
        }
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.types
            .get(ty)
            .identifier
            .map_or_else(|| "<unnamed>".to_string(), |id| self.symtab.entry(id).spelling.clone())
    }

    fn render_type(&self, out: &mut String, ty: TypeId) {
        let spec = self.types.get(ty);
        let _ = writeln!(
            out,
            "{INDENT}Type form = {}, Type id = {}",
            spec.form(),
            self.type_name(ty)
        );

        match &spec.kind {
            TypeKind::Enumeration(info) => {
                let _ = writeln!(out, "{INDENT}--- Enumeration constants ---");
                for constant in &info.constants {
                    let entry = self.symtab.entry(*constant);
                    let value = entry.value().map(ToString::to_string).unwrap_or_default();
                    let _ = writeln!(out, "{INDENT}{:<NAME_WIDTH$} = {value}", entry.spelling);
                }
            }
            TypeKind::Subrange(info) => {
                let _ = writeln!(out, "{INDENT}Base type = {}", self.type_name(info.base));
                let _ = writeln!(out, "{INDENT}Range = {}..{}", info.min, info.max);
            }
            TypeKind::Array(info) => {
                let _ = writeln!(out, "{INDENT}Index type = {}", self.type_name(info.index));
                let _ = writeln!(out, "{INDENT}Element count = {}", info.count);
                let _ = writeln!(out, "{INDENT}Element type = {}", self.type_name(info.element));
            }
            TypeKind::Record(info) => {
                let _ = writeln!(out, "{INDENT}Type path = {}", info.path);
            }
            _ => {}
        }
    }
}
