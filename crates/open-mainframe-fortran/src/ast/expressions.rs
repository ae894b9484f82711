//! Expression types for the FORTRAN AST.
//!
//! The parser attaches a [`QualType`] to every leaf it produces; the
//! expression checker types interior nodes and inserts explicit
//! [`ExprKind::Convert`] nodes where the promotion and assignment rules
//! require a representation change.

use open_mainframe_lang_core::Span;

use crate::semantic::types::QualType;

/// A typed expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// What the expression is.
    pub kind: ExprKind,
    /// The expression's type.
    pub ty: QualType,
    /// Source span.
    pub span: Span,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Integer literal constant (also used for statement-label references).
    IntLiteral(u64),
    /// Real literal constant.
    RealLiteral(f64),
    /// Character literal constant.
    CharLiteral(String),
    /// Logical literal constant (`.TRUE.` / `.FALSE.`).
    LogicalLiteral(bool),
    /// `(re, im)` complex constructor.
    ComplexConstructor { re: Box<Expr>, im: Box<Expr> },
    /// Reference to a named variable.
    Var(String),
    /// Unary operation.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary operation.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Explicit conversion inserted by the checker; `ty` is the target.
    Convert { operand: Box<Expr> },
}

impl Expr {
    /// Create a new expression node.
    pub fn new(kind: ExprKind, ty: QualType, span: Span) -> Self {
        Self { kind, ty, span }
    }

    /// Wrap this expression in an explicit conversion to `target`.
    pub fn convert_to(self, target: QualType) -> Self {
        let span = self.span;
        Expr {
            kind: ExprKind::Convert {
                operand: Box::new(self),
            },
            ty: target,
            span,
        }
    }

    /// Whether this expression is a plain variable reference.
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, ExprKind::Var(_))
    }

    /// The integer value if this is an integer literal constant.
    pub fn int_value(&self) -> Option<u64> {
        match self.kind {
            ExprKind::IntLiteral(v) => Some(v),
            _ => None,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Minus,
    /// `.NOT. x`
    Not,
}

impl UnaryOp {
    /// Operator spelling for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => ".NOT.",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Eqv,
    Neqv,
}

impl BinaryOp {
    /// Arithmetic operators produce a value in the promoted numeric kind.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Power
        )
    }

    /// Relational operators compare numeric operands and produce LOGICAL.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Logical operators require LOGICAL operands.
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            BinaryOp::And | BinaryOp::Or | BinaryOp::Eqv | BinaryOp::Neqv
        )
    }

    /// Operator spelling for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "**",
            BinaryOp::Eq => ".EQ.",
            BinaryOp::Ne => ".NE.",
            BinaryOp::Lt => ".LT.",
            BinaryOp::Le => ".LE.",
            BinaryOp::Gt => ".GT.",
            BinaryOp::Ge => ".GE.",
            BinaryOp::And => ".AND.",
            BinaryOp::Or => ".OR.",
            BinaryOp::Eqv => ".EQV.",
            BinaryOp::Neqv => ".NEQV.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::types::TypeContext;

    #[test]
    fn test_convert_wraps_and_retags() {
        let ctx = TypeContext::new();
        let e = Expr::new(ExprKind::IntLiteral(3), ctx.integer, Span::main(0, 1));
        let wrapped = e.convert_to(ctx.real);
        assert_eq!(wrapped.ty, ctx.real);
        match wrapped.kind {
            ExprKind::Convert { operand } => assert_eq!(operand.ty, ctx.integer),
            other => panic!("expected Convert, got {other:?}"),
        }
    }

    #[test]
    fn test_operator_classification() {
        assert!(BinaryOp::Power.is_arithmetic());
        assert!(BinaryOp::Le.is_comparison());
        assert!(BinaryOp::Neqv.is_logical());
        assert!(!BinaryOp::Add.is_comparison());
    }

    #[test]
    fn test_int_value() {
        let ctx = TypeContext::new();
        let e = Expr::new(ExprKind::IntLiteral(100), ctx.integer, Span::dummy());
        assert_eq!(e.int_value(), Some(100));
        let v = Expr::new(ExprKind::Var("I".into()), ctx.integer, Span::dummy());
        assert_eq!(v.int_value(), None);
    }
}
