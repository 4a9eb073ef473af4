//! Symbol tables and the scope stack

use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};
use string_interner::{DefaultStringInterner, DefaultSymbol};

use super::symbol::{EntryId, Kind, SymTableEntry, UNNAMED_PREFIX};

/// Stable index of a symbol table inside a [`SymTableStack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(super) u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One lexical scope
#[derive(Debug)]
pub struct SymTable {
    level: usize,
    owner: Option<EntryId>,
    names: HashMap<DefaultSymbol, EntryId>,
    /// Insertion order
    order: Vec<EntryId>,
    slot_count: u32,
}

impl SymTable {
    fn new(level: usize) -> Self {
        Self {
            level,
            owner: None,
            names: HashMap::new(),
            order: Vec::new(),
            slot_count: 0,
        }
    }

    pub fn nesting_level(&self) -> usize {
        self.level
    }

    /// Program, routine or record type entry the scope belongs to
    pub fn owner(&self) -> Option<EntryId> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: EntryId) {
        self.owner = Some(owner);
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[EntryId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Hand out the next local storage slot, starting at 0
    pub fn next_slot_number(&mut self) -> u32 {
        let slot = self.slot_count;
        self.slot_count += 1;
        slot
    }

    /// Highest slot handed out so far
    pub fn max_slot_number(&self) -> Option<u32> {
        self.slot_count.checked_sub(1)
    }
}

/// Every scope and entry of one analysis, plus the stack of open scopes
///
/// Scopes and entries are never freed: closing a scope only removes it from
/// the stack, so later phases still reach it through its owner.
pub struct SymTableStack {
    tables: Vec<SymTable>,
    entries: Vec<SymTableEntry>,
    stack: Vec<ScopeId>,
    interner: DefaultStringInterner,
    program_id: Option<EntryId>,
    unnamed_index: u32,
}

impl SymTableStack {
    /// Create a stack holding only the global scope (level 0)
    pub fn new() -> Self {
        Self {
            tables: vec![SymTable::new(0)],
            entries: Vec::new(),
            stack: vec![ScopeId(0)],
            interner: DefaultStringInterner::new(),
            program_id: None,
            unnamed_index: 0,
        }
    }

    pub fn current_nesting_level(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn local_scope(&self) -> ScopeId {
        self.stack[self.stack.len() - 1]
    }

    pub fn local_table(&self) -> &SymTable {
        self.table(self.local_scope())
    }

    pub fn local_table_mut(&mut self) -> &mut SymTable {
        let scope = self.local_scope();
        self.table_mut(scope)
    }

    pub fn table(&self, scope: ScopeId) -> &SymTable {
        &self.tables[scope.index()]
    }

    pub fn table_mut(&mut self, scope: ScopeId) -> &mut SymTable {
        &mut self.tables[scope.index()]
    }

    pub fn entry(&self, id: EntryId) -> &SymTableEntry {
        &self.entries[id.index()]
    }

    pub fn entry_mut(&mut self, id: EntryId) -> &mut SymTableEntry {
        &mut self.entries[id.index()]
    }

    pub fn program_id(&self) -> Option<EntryId> {
        self.program_id
    }

    pub fn set_program_id(&mut self, id: EntryId) {
        self.program_id = Some(id);
    }

    /// Create an entry in the innermost scope.
    ///
    /// Callers check [`lookup_local`](Self::lookup_local) first; an existing
    /// binding of the same name would be shadowed.
    pub fn enter_local(&mut self, name: &str, kind: Kind) -> EntryId {
        let scope = self.local_scope();
        let id = self.alloc_entry(name, kind, scope);
        let key = self.interner.get_or_intern(self.entries[id.index()].name.as_str());
        let table = self.table_mut(scope);
        table.names.insert(key, id);
        table.order.push(id);
        trace!("enter {} '{}' at level {}", kind, name, self.current_nesting_level());
        id
    }

    /// Create an entry owned by the innermost scope but not visible to lookup
    pub fn create_detached(&mut self, name: &str, kind: Kind) -> EntryId {
        let scope = self.local_scope();
        self.alloc_entry(name, kind, scope)
    }

    /// Detached entry with a fresh `_unnamed_NNN` name
    pub fn create_unnamed(&mut self, kind: Kind) -> EntryId {
        self.unnamed_index += 1;
        let name = format!("{UNNAMED_PREFIX}{:03}", self.unnamed_index);
        self.create_detached(&name, kind)
    }

    fn alloc_entry(&mut self, name: &str, kind: Kind, scope: ScopeId) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(SymTableEntry::new(name, kind, scope));
        id
    }

    fn key(&self, name: &str) -> Option<DefaultSymbol> {
        self.interner.get(name.to_lowercase().as_str())
    }

    /// Search one specific scope, e.g. a record's field table
    pub fn lookup_in(&self, scope: ScopeId, name: &str) -> Option<EntryId> {
        let key = self.key(name)?;
        self.table(scope).names.get(&key).copied()
    }

    /// Search the innermost scope only
    pub fn lookup_local(&self, name: &str) -> Option<EntryId> {
        self.lookup_in(self.local_scope(), name)
    }

    /// Search from the innermost scope outward; the first match wins
    pub fn lookup(&self, name: &str) -> Option<EntryId> {
        let key = self.key(name)?;
        self.stack
            .iter()
            .rev()
            .find_map(|scope| self.table(*scope).names.get(&key).copied())
    }

    /// Open a nested scope
    pub fn push(&mut self) -> ScopeId {
        let id = ScopeId(self.tables.len() as u32);
        self.tables.push(SymTable::new(self.stack.len()));
        self.stack.push(id);
        debug!("push scope {} (level {})", id.index(), self.current_nesting_level());
        id
    }

    /// Close the innermost scope; the global scope is never closed
    pub fn pop(&mut self) -> Option<ScopeId> {
        if self.stack.len() <= 1 {
            return None;
        }
        let id = self.stack.pop()?;
        debug!("pop scope {} (level {})", id.index(), self.table(id).level);
        Some(id)
    }

    /// Close the innermost scope, retagging its variables as `kind`
    pub fn pop_as(&mut self, kind: Kind) -> Option<ScopeId> {
        let id = self.pop()?;
        let retag: Vec<EntryId> = self.table(id).order.clone();
        for entry_id in retag {
            let entry = self.entry_mut(entry_id);
            if entry.kind == Kind::Variable {
                entry.set_kind(kind);
            }
        }
        Some(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &SymTableEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (EntryId(i as u32), entry))
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for SymTableStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymTableStack")
            .field("tables", &self.tables)
            .field("entries", &self.entries)
            .field("stack", &self.stack)
            .field("program_id", &self.program_id)
            .finish_non_exhaustive()
    }
}

impl Default for SymTableStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut stack = SymTableStack::new();
        let id = stack.enter_local("Counter", Kind::Variable);

        assert_eq!(stack.lookup("COUNTER"), Some(id));
        assert_eq!(stack.lookup_local("counter"), Some(id));
        assert_eq!(stack.entry(id).spelling, "Counter");
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let stack = SymTableStack::new();
        assert_eq!(stack.lookup("missing"), None);
        assert_eq!(stack.interner.len(), 0);
    }

    #[test]
    fn test_nested_scopes_and_shadowing() {
        let mut stack = SymTableStack::new();
        let outer = stack.enter_local("x", Kind::Variable);
        let global = stack.enter_local("g", Kind::Variable);

        stack.push();
        assert_eq!(stack.current_nesting_level(), 1);
        let inner = stack.enter_local("x", Kind::Constant);

        assert_eq!(stack.lookup("x"), Some(inner));
        assert_eq!(stack.lookup("g"), Some(global));
        assert_eq!(stack.lookup_local("g"), None);

        stack.pop();
        assert_eq!(stack.lookup("x"), Some(outer));
        assert_eq!(stack.current_nesting_level(), 0);
    }

    #[test]
    fn test_popped_names_are_unreachable() {
        let mut stack = SymTableStack::new();
        let scope = stack.push();
        let local = stack.enter_local("temp", Kind::Variable);
        stack.pop();

        assert_eq!(stack.lookup("temp"), None);
        assert_eq!(stack.lookup_in(scope, "temp"), Some(local));
    }

    #[test]
    fn test_global_scope_never_popped() {
        let mut stack = SymTableStack::new();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.current_nesting_level(), 0);
    }

    #[test]
    fn test_pop_as_retags_variables() {
        let mut stack = SymTableStack::new();
        stack.push();
        let field = stack.enter_local("f", Kind::Variable);
        let constant = stack.enter_local("c", Kind::Constant);
        stack.pop_as(Kind::RecordField);

        assert_eq!(stack.entry(field).kind, Kind::RecordField);
        assert_eq!(stack.entry(constant).kind, Kind::Constant);
    }

    #[test]
    fn test_slot_numbers() {
        let mut stack = SymTableStack::new();
        stack.push();
        let table = stack.local_table_mut();
        assert_eq!(table.max_slot_number(), None);
        assert_eq!(table.next_slot_number(), 0);
        assert_eq!(table.next_slot_number(), 1);
        assert_eq!(table.max_slot_number(), Some(1));
    }

    #[test]
    fn test_unnamed_entries_are_hidden() {
        let mut stack = SymTableStack::new();
        let id = stack.create_unnamed(Kind::Type);

        assert!(stack.entry(id).is_unnamed());
        assert_eq!(stack.entry(id).name, "_unnamed_001");
        assert!(stack.local_table().is_empty());
        assert_eq!(stack.lookup("_unnamed_001"), None);
    }

    #[test]
    fn test_detached_entry_leaves_binding_alone() {
        let mut stack = SymTableStack::new();
        let original = stack.enter_local("write", Kind::Procedure);
        let detached = stack.create_detached("Write", Kind::Program);

        assert_eq!(stack.lookup("write"), Some(original));
        assert_eq!(stack.entry(detached).spelling, "Write");
        assert_eq!(stack.entry(detached).scope, stack.local_scope());
        assert_eq!(stack.local_table().len(), 1);
    }
}
