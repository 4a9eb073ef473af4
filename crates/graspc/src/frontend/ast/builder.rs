//! Id-allocating constructors for syntax tree nodes

use super::*;

/// Builds tree nodes with fresh [`NodeId`]s
///
/// A parser owns one builder per tree so that ids never collide.
#[derive(Debug, Default)]
pub struct AstBuilder {
    next_id: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn ident(&mut self, line: u32, name: &str) -> Ident {
        Ident {
            id: self.next_id(),
            line,
            name: name.to_string(),
        }
    }

    // Program structure

    pub fn program(&mut self, line: u32, name: &str, parameters: &[&str], block: Block) -> Program {
        let name = self.ident(line, name);
        let parameters = parameters.iter().map(|p| self.ident(line, p)).collect();
        Program {
            id: self.next_id(),
            line,
            name,
            parameters,
            block,
        }
    }

    pub fn block(&mut self, line: u32, declarations: Declarations, body: Vec<Stmt>) -> Block {
        let body = self.compound(line, body);
        Block {
            id: self.next_id(),
            declarations,
            body,
        }
    }

    // Declarations

    pub fn constant_def(&mut self, line: u32, name: &str, value: Constant) -> ConstantDef {
        ConstantDef {
            id: self.next_id(),
            line,
            name: self.ident(line, name),
            value,
        }
    }

    fn constant(&mut self, line: u32, kind: ConstantKind) -> Constant {
        Constant {
            id: self.next_id(),
            line,
            sign: None,
            kind,
        }
    }

    pub fn int_const(&mut self, line: u32, value: i64) -> Constant {
        self.constant(line, ConstantKind::Integer(value))
    }

    pub fn real_const(&mut self, line: u32, value: f64) -> Constant {
        self.constant(line, ConstantKind::Real(value))
    }

    pub fn char_const(&mut self, line: u32, value: char) -> Constant {
        self.constant(line, ConstantKind::Char(value))
    }

    pub fn string_const(&mut self, line: u32, value: &str) -> Constant {
        self.constant(line, ConstantKind::String(value.to_string()))
    }

    pub fn ident_const(&mut self, line: u32, name: &str) -> Constant {
        let ident = self.ident(line, name);
        self.constant(line, ConstantKind::Identifier(ident))
    }

    pub fn type_def(&mut self, line: u32, name: &str, spec: TypeSpec) -> TypeDef {
        TypeDef {
            id: self.next_id(),
            line,
            name: self.ident(line, name),
            spec,
        }
    }

    fn type_spec(&mut self, line: u32, kind: TypeSpecKind) -> TypeSpec {
        TypeSpec {
            id: self.next_id(),
            line,
            kind,
        }
    }

    pub fn named_type(&mut self, line: u32, name: &str) -> TypeSpec {
        let ident = self.ident(line, name);
        self.type_spec(line, TypeSpecKind::Named(ident))
    }

    pub fn enum_type(&mut self, line: u32, names: &[&str]) -> TypeSpec {
        let names = names.iter().map(|n| self.ident(line, n)).collect();
        self.type_spec(line, TypeSpecKind::Enumeration(names))
    }

    pub fn subrange_type(&mut self, line: u32, min: Constant, max: Constant) -> TypeSpec {
        self.type_spec(line, TypeSpecKind::Subrange { min, max })
    }

    pub fn array_type(&mut self, line: u32, dimensions: Vec<TypeSpec>, element: TypeSpec) -> TypeSpec {
        self.type_spec(
            line,
            TypeSpecKind::Array {
                dimensions,
                element: Box::new(element),
            },
        )
    }

    pub fn record_type(&mut self, line: u32, fields: Vec<VarDecl>) -> TypeSpec {
        self.type_spec(line, TypeSpecKind::Record(fields))
    }

    pub fn var_decl(&mut self, line: u32, names: &[&str], ty: TypeSpec) -> VarDecl {
        let names = names.iter().map(|n| self.ident(line, n)).collect();
        VarDecl {
            id: self.next_id(),
            line,
            names,
            ty,
        }
    }

    pub fn procedure(&mut self, line: u32, name: &str, params: Vec<ParamDecl>, block: Block) -> RoutineDef {
        RoutineDef {
            id: self.next_id(),
            line,
            kind: RoutineKind::Procedure,
            name: self.ident(line, name),
            params,
            return_type: None,
            immutable: false,
            block,
        }
    }

    pub fn function(
        &mut self,
        line: u32,
        name: &str,
        params: Vec<ParamDecl>,
        return_type: &str,
        block: Block,
    ) -> RoutineDef {
        RoutineDef {
            id: self.next_id(),
            line,
            kind: RoutineKind::Function,
            name: self.ident(line, name),
            params,
            return_type: Some(self.ident(line, return_type)),
            immutable: false,
            block,
        }
    }

    pub fn param(&mut self, line: u32, by_reference: bool, names: &[&str], ty: &str) -> ParamDecl {
        let names = names.iter().map(|n| self.ident(line, n)).collect();
        ParamDecl {
            id: self.next_id(),
            line,
            by_reference,
            names,
            ty: self.ident(line, ty),
        }
    }

    // Statements

    fn stmt(&mut self, line: u32, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.next_id(),
            line,
            kind,
        }
    }

    pub fn compound(&mut self, line: u32, stmts: Vec<Stmt>) -> Stmt {
        self.stmt(line, StmtKind::Compound(stmts))
    }

    pub fn assign(&mut self, line: u32, target: Variable, value: Expr) -> Stmt {
        self.stmt(line, StmtKind::Assign { target, value })
    }

    pub fn if_stmt(&mut self, line: u32, condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
        self.stmt(
            line,
            StmtKind::If {
                condition,
                then_branch: Box::new(then_branch),
                else_branch: else_branch.map(Box::new),
            },
        )
    }

    pub fn case_stmt(&mut self, line: u32, selector: Expr, branches: Vec<CaseBranch>) -> Stmt {
        self.stmt(line, StmtKind::Case { selector, branches })
    }

    pub fn case_branch(&mut self, line: u32, constants: Vec<Constant>, body: Option<Stmt>) -> CaseBranch {
        CaseBranch {
            id: self.next_id(),
            line,
            constants,
            body: body.map(Box::new),
        }
    }

    pub fn while_stmt(&mut self, line: u32, condition: Expr, body: Stmt) -> Stmt {
        self.stmt(
            line,
            StmtKind::While {
                condition,
                body: Box::new(body),
            },
        )
    }

    pub fn repeat_stmt(&mut self, line: u32, body: Vec<Stmt>, condition: Expr) -> Stmt {
        self.stmt(line, StmtKind::Repeat { body, condition })
    }

    pub fn for_stmt(
        &mut self,
        line: u32,
        control: Variable,
        start: Expr,
        direction: ForDirection,
        end: Expr,
        body: Stmt,
    ) -> Stmt {
        self.stmt(
            line,
            StmtKind::For {
                control,
                start,
                end,
                direction,
                body: Box::new(body),
            },
        )
    }

    pub fn call(&mut self, line: u32, name: &str, args: Vec<Expr>) -> Call {
        Call {
            id: self.next_id(),
            line,
            name: self.ident(line, name),
            args,
        }
    }

    pub fn call_stmt(&mut self, line: u32, name: &str, args: Vec<Expr>) -> Stmt {
        let call = self.call(line, name, args);
        self.stmt(line, StmtKind::ProcedureCall(call))
    }

    pub fn empty(&mut self, line: u32) -> Stmt {
        self.stmt(line, StmtKind::Empty)
    }

    // Expressions

    fn expr(&mut self, line: u32, kind: ExprKind) -> Expr {
        Expr {
            id: self.next_id(),
            line,
            kind,
        }
    }

    pub fn int(&mut self, line: u32, value: i64) -> Expr {
        self.expr(line, ExprKind::Integer(value))
    }

    pub fn real(&mut self, line: u32, value: f64) -> Expr {
        self.expr(line, ExprKind::Real(value))
    }

    pub fn char_lit(&mut self, line: u32, value: char) -> Expr {
        self.expr(line, ExprKind::Char(value))
    }

    pub fn string_lit(&mut self, line: u32, value: &str) -> Expr {
        self.expr(line, ExprKind::String(value.to_string()))
    }

    pub fn binary(&mut self, line: u32, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        self.expr(
            line,
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    pub fn unary(&mut self, line: u32, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(
            line,
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        )
    }

    pub fn paren(&mut self, line: u32, inner: Expr) -> Expr {
        self.expr(line, ExprKind::Paren(Box::new(inner)))
    }

    pub fn call_expr(&mut self, line: u32, name: &str, args: Vec<Expr>) -> Expr {
        let call = self.call(line, name, args);
        self.expr(line, ExprKind::Call(call))
    }

    /// Bare variable reference as an expression
    pub fn var_expr(&mut self, line: u32, name: &str) -> Expr {
        let variable = self.variable(line, name);
        self.expr(line, ExprKind::Variable(variable))
    }

    /// Wrap an already built variable (with modifiers) as an expression
    pub fn variable_expr(&mut self, variable: Variable) -> Expr {
        let line = variable.line;
        self.expr(line, ExprKind::Variable(variable))
    }

    pub fn variable(&mut self, line: u32, name: &str) -> Variable {
        Variable {
            id: self.next_id(),
            line,
            name: self.ident(line, name),
            modifiers: Vec::new(),
        }
    }

    /// Append a `[indices]` modifier
    pub fn subscript(&mut self, mut variable: Variable, line: u32, indices: Vec<Expr>) -> Variable {
        variable.modifiers.push(Modifier {
            id: self.next_id(),
            line,
            kind: ModifierKind::Index(indices),
        });
        variable
    }

    /// Append a `.field` modifier
    pub fn field(&mut self, mut variable: Variable, line: u32, name: &str) -> Variable {
        let field = self.ident(line, name);
        variable.modifiers.push(Modifier {
            id: self.next_id(),
            line,
            kind: ModifierKind::Field(field),
        });
        variable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut ast = AstBuilder::new();
        let a = ast.int(1, 1);
        let b = ast.int(1, 2);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_display_offending_text() {
        let mut ast = AstBuilder::new();
        let i = ast.var_expr(4, "i");
        let a = ast.variable(4, "a");
        let a = ast.subscript(a, 4, vec![i]);
        let a = ast.field(a, 4, "f");
        assert_eq!(a.to_string(), "a[i].f");

        let left = ast.var_expr(5, "x");
        let right = ast.real(5, 3.5);
        let sum = ast.binary(5, BinaryOp::Add, left, right);
        let grouped = ast.paren(5, sum);
        let negated = ast.unary(5, UnaryOp::Minus, grouped);
        assert_eq!(negated.to_string(), "-(x + 3.5)");

        let one = ast.int(6, 1);
        let two = ast.int(6, 2);
        let call = ast.call(6, "foo", vec![one, two]);
        assert_eq!(call.to_string(), "foo(1, 2)");
    }

    #[test]
    fn test_display_type_specs() {
        let mut ast = AstBuilder::new();
        let lo = ast.int_const(1, 1);
        let hi = ast.int_const(1, 10).with_sign(Sign::Minus);
        let range = ast.subrange_type(1, lo, hi);
        assert_eq!(range.to_string(), "1..-10");

        let colors = ast.enum_type(2, &["red", "green"]);
        let element = ast.named_type(2, "integer");
        let array = ast.array_type(2, vec![colors], element);
        assert_eq!(array.to_string(), "array [(red, green)] of integer");
    }
}
