//! Type compatibility predicates
//!
//! All checks compare base types by identity against the predefined types;
//! none of them mutate anything.

use crate::types::{Form, TypeArena, TypeId};

use super::predefined::Predefined;

/// Pure type predicates over one analysis's arena
pub struct TypeChecker<'a> {
    types: &'a TypeArena,
    predefined: &'a Predefined,
}

impl<'a> TypeChecker<'a> {
    pub fn new(types: &'a TypeArena, predefined: &'a Predefined) -> Self {
        Self { types, predefined }
    }

    fn base(&self, ty: TypeId) -> TypeId {
        self.types.base_type(ty)
    }

    pub fn is_integer(&self, ty: TypeId) -> bool {
        self.base(ty) == self.predefined.integer_type
    }

    pub fn is_real(&self, ty: TypeId) -> bool {
        self.base(ty) == self.predefined.real_type
    }

    pub fn is_boolean(&self, ty: TypeId) -> bool {
        self.base(ty) == self.predefined.boolean_type
    }

    pub fn is_char(&self, ty: TypeId) -> bool {
        self.base(ty) == self.predefined.char_type
    }

    pub fn is_string(&self, ty: TypeId) -> bool {
        self.base(ty) == self.predefined.string_type
    }

    pub fn is_integer_or_real(&self, ty: TypeId) -> bool {
        self.is_integer(ty) || self.is_real(ty)
    }

    pub fn are_both_integer(&self, a: TypeId, b: TypeId) -> bool {
        self.is_integer(a) && self.is_integer(b)
    }

    /// Both numeric with at least one real
    pub fn is_at_least_one_real(&self, a: TypeId, b: TypeId) -> bool {
        (self.is_real(a) && self.is_real(b))
            || (self.is_real(a) && self.is_integer(b))
            || (self.is_integer(a) && self.is_real(b))
    }

    pub fn are_both_string(&self, a: TypeId, b: TypeId) -> bool {
        self.is_string(a) && self.is_string(b)
    }

    pub fn are_both_boolean(&self, a: TypeId, b: TypeId) -> bool {
        self.is_boolean(a) && self.is_boolean(b)
    }

    /// Integer, char, or any enumeration (boolean included)
    pub fn is_ordinal(&self, ty: TypeId) -> bool {
        let base = self.base(ty);
        self.is_integer(base) || self.is_char(base) || self.types.form(base) == Form::Enumeration
    }

    pub fn is_structured(&self, ty: TypeId) -> bool {
        self.types.get(ty).is_structured()
    }

    /// Can a value of type `value` be stored into `target`?
    pub fn are_assignment_compatible(&self, target: Option<TypeId>, value: Option<TypeId>) -> bool {
        let (Some(target), Some(value)) = (target, value) else {
            return false;
        };
        let target = self.base(target);
        let value = self.base(value);

        target == value || (self.is_real(target) && self.is_integer(value))
    }

    /// Can the two operands meet in a relational operator?
    pub fn are_comparison_compatible(&self, a: Option<TypeId>, b: Option<TypeId>) -> bool {
        let (Some(a), Some(b)) = (a, b) else {
            return false;
        };
        let a = self.base(a);
        let b = self.base(b);

        if self.is_string(a) || self.is_string(b) {
            return false;
        }

        let a_form = self.types.form(a);
        let b_form = self.types.form(b);
        match (a_form == Form::Enumeration, b_form == Form::Enumeration) {
            (true, true) => a == b,
            (false, false) => {
                a_form == Form::Scalar
                    && b_form == Form::Scalar
                    && (a == b || self.is_at_least_one_real(a, b))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::sema::SymTableStack;
    use crate::types::Typespec;

    fn environment() -> (TypeArena, Predefined) {
        let mut stack = SymTableStack::new();
        let mut types = TypeArena::new();
        let predefined = Predefined::initialize(&mut stack, &mut types);
        (types, predefined)
    }

    #[test]
    fn test_assignment_widening() {
        let (types, p) = environment();
        let checker = TypeChecker::new(&types, &p);

        assert!(checker.are_assignment_compatible(Some(p.real_type), Some(p.integer_type)));
        assert!(!checker.are_assignment_compatible(Some(p.integer_type), Some(p.real_type)));
        assert!(!checker.are_assignment_compatible(None, Some(p.integer_type)));
        assert!(!checker.are_assignment_compatible(Some(p.integer_type), None));
    }

    #[test]
    fn test_assignment_identity_for_predefined() {
        let (types, p) = environment();
        let checker = TypeChecker::new(&types, &p);

        for ty in [p.integer_type, p.real_type, p.boolean_type, p.char_type, p.string_type] {
            assert!(checker.are_assignment_compatible(Some(ty), Some(ty)));
        }
        assert!(!checker.are_assignment_compatible(Some(p.char_type), Some(p.string_type)));
    }

    #[test]
    fn test_subrange_resolves_to_base() {
        let (mut types, p) = environment();
        let digits = types.alloc(Typespec::subrange(p.integer_type, 0, 9));
        let checker = TypeChecker::new(&types, &p);

        assert!(checker.is_integer(digits));
        assert!(checker.are_assignment_compatible(Some(digits), Some(p.integer_type)));
        assert!(checker.are_assignment_compatible(Some(p.real_type), Some(digits)));
    }

    #[test]
    fn test_structurally_equal_types_are_distinct() {
        let (mut types, p) = environment();
        let a = types.alloc(Typespec::scalar());
        let b = types.alloc(Typespec::scalar());
        let checker = TypeChecker::new(&types, &p);

        assert!(!checker.are_assignment_compatible(Some(a), Some(b)));
        assert!(!checker.are_comparison_compatible(Some(a), Some(b)));
    }

    #[test]
    fn test_comparison_rules() {
        let (mut types, p) = environment();
        let color = types.alloc(Typespec::enumeration(Vec::new()));
        let shade = types.alloc(Typespec::enumeration(Vec::new()));
        let checker = TypeChecker::new(&types, &p);

        assert!(checker.are_comparison_compatible(Some(p.integer_type), Some(p.real_type)));
        assert!(checker.are_comparison_compatible(Some(p.char_type), Some(p.char_type)));
        assert!(checker.are_comparison_compatible(Some(color), Some(color)));
        assert!(checker.are_comparison_compatible(Some(p.boolean_type), Some(p.boolean_type)));
        assert!(!checker.are_comparison_compatible(Some(color), Some(shade)));
        assert!(!checker.are_comparison_compatible(Some(color), Some(p.integer_type)));
        assert!(!checker.are_comparison_compatible(Some(p.string_type), Some(p.string_type)));
        assert!(!checker.are_comparison_compatible(Some(p.char_type), Some(p.integer_type)));
    }

    #[test]
    fn test_numeric_classification() {
        let (types, p) = environment();
        let checker = TypeChecker::new(&types, &p);

        assert!(checker.are_both_integer(p.integer_type, p.integer_type));
        assert!(checker.is_at_least_one_real(p.integer_type, p.real_type));
        assert!(!checker.is_at_least_one_real(p.integer_type, p.integer_type));
        assert!(!checker.is_at_least_one_real(p.real_type, p.char_type));
        assert!(checker.are_both_string(p.string_type, p.string_type));
        assert!(checker.are_both_boolean(p.boolean_type, p.boolean_type));
        assert!(checker.is_ordinal(p.char_type));
        assert!(checker.is_ordinal(p.boolean_type));
        assert!(!checker.is_ordinal(p.real_type));
    }
}
