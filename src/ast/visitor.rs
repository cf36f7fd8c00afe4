use crate::ast::expressions::{Expr, FieldCacheKind, FunctionCall, RegexLiteral, VariableRef};

/// Double-dispatch over the node kinds of [`Expr`].
///
/// Every method defaults to doing nothing, so a visitor only implements the
/// kinds it cares about.
pub trait ExprVisitor {
    fn visit_literal(&mut self, _value: &str) {}
    fn visit_field(&mut self, _name: &str) {}
    fn visit_field_cache(&mut self, _kind: FieldCacheKind) {}
    fn visit_number(&mut self, _value: i64) {}
    fn visit_boolean(&mut self, _value: bool) {}
    fn visit_regex(&mut self, _regex: &RegexLiteral) {}
    fn visit_variable(&mut self, _variable: &VariableRef) {}
    fn visit_constant(&mut self, _name: &str, _value: &Expr) {}
    fn visit_function(&mut self, _call: &FunctionCall) {}
}

impl Expr {
    pub fn accept<V: ExprVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Expr::Literal(value) => visitor.visit_literal(value),
            Expr::Field(name) => visitor.visit_field(name),
            Expr::FieldCache(kind) => visitor.visit_field_cache(*kind),
            Expr::Number(n) => visitor.visit_number(*n),
            Expr::Boolean(b) => visitor.visit_boolean(*b),
            Expr::Regex(regex) => visitor.visit_regex(regex),
            Expr::Variable(variable) => visitor.visit_variable(variable),
            Expr::Constant { name, value } => visitor.visit_constant(name, value),
            Expr::Function(call) => visitor.visit_function(call),
        }
    }
}

/// Yields the function name for call nodes and nothing for the rest.
#[derive(Debug, Default)]
pub struct FunctionNameVisitor {
    name: Option<String>,
}

impl FunctionNameVisitor {
    pub fn name_of(expr: &Expr) -> Option<String> {
        let mut visitor = FunctionNameVisitor::default();
        expr.accept(&mut visitor);
        visitor.name
    }
}

impl ExprVisitor for FunctionNameVisitor {
    fn visit_function(&mut self, call: &FunctionCall) {
        self.name = Some(call.name().to_string());
    }
}

/// Coarse node classification used by structural matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Literal,
    Field,
    FieldCache,
    Number,
    Boolean,
    Regex,
    Variable,
    Constant,
    Function,
}

#[derive(Debug, Default)]
pub struct ExprTypeVisitor {
    kind: Option<ExprKind>,
}

impl ExprTypeVisitor {
    pub fn kind_of(expr: &Expr) -> ExprKind {
        let mut visitor = ExprTypeVisitor::default();
        expr.accept(&mut visitor);
        // every arm of `accept` reports exactly one kind
        visitor.kind.unwrap_or(ExprKind::Literal)
    }
}

impl ExprVisitor for ExprTypeVisitor {
    fn visit_literal(&mut self, _value: &str) {
        self.kind = Some(ExprKind::Literal);
    }

    fn visit_field(&mut self, _name: &str) {
        self.kind = Some(ExprKind::Field);
    }

    fn visit_field_cache(&mut self, _kind: FieldCacheKind) {
        self.kind = Some(ExprKind::FieldCache);
    }

    fn visit_number(&mut self, _value: i64) {
        self.kind = Some(ExprKind::Number);
    }

    fn visit_boolean(&mut self, _value: bool) {
        self.kind = Some(ExprKind::Boolean);
    }

    fn visit_regex(&mut self, _regex: &RegexLiteral) {
        self.kind = Some(ExprKind::Regex);
    }

    fn visit_variable(&mut self, _variable: &VariableRef) {
        self.kind = Some(ExprKind::Variable);
    }

    fn visit_constant(&mut self, _name: &str, _value: &Expr) {
        self.kind = Some(ExprKind::Constant);
    }

    fn visit_function(&mut self, _call: &FunctionCall) {
        self.kind = Some(ExprKind::Function);
    }
}
