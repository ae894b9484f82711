//! Expression type checking.
//!
//! Interior expression nodes are typed here as the parser reduces them.
//! Mixed-kind arithmetic resolves through the numeric promotion order and
//! the weaker operand is wrapped in an explicit [`ExprKind::Convert`]
//! node, so later phases never re-derive conversion rules. Checking never
//! aborts the expression: an ill-typed node is reported and given a
//! best-effort type so one mistake produces one diagnostic.

use open_mainframe_lang_core::Span;

use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::error::DiagnosticKind;
use crate::semantic::types::QualType;

use super::Sema;

impl Sema {
    /// Render a type for a diagnostic message.
    pub(super) fn type_name(&self, ty: QualType) -> String {
        self.context.display(ty)
    }

    /// Type a binary operation, inserting conversions where the promotion
    /// rules require them.
    pub fn check_binary(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr, span: Span) -> Expr {
        if op.is_logical() {
            if !self.context.is_logical(lhs.ty) || !self.context.is_logical(rhs.ty) {
                self.report_operand_mismatch(op, &lhs, &rhs, span);
            }
            let ty = self.context.logical;
            return binary(op, lhs, rhs, ty, span);
        }

        if op.is_comparison() {
            // Character comparisons need no conversion; numeric ones
            // compare in the promoted kind.
            if self.context.is_character(lhs.ty) && self.context.is_character(rhs.ty) {
                let ty = self.context.logical;
                return binary(op, lhs, rhs, ty, span);
            }
            let ty = self.context.logical;
            return match self.context.promoted_type(lhs.ty, rhs.ty) {
                Some(common) => {
                    let lhs = convert_if_needed(lhs, common);
                    let rhs = convert_if_needed(rhs, common);
                    binary(op, lhs, rhs, ty, span)
                }
                None => {
                    self.report_operand_mismatch(op, &lhs, &rhs, span);
                    binary(op, lhs, rhs, ty, span)
                }
            };
        }

        // Arithmetic: both operands promote to the stronger numeric kind,
        // which is also the result kind.
        match self.context.promoted_type(lhs.ty, rhs.ty) {
            Some(common) => {
                let lhs = convert_if_needed(lhs, common);
                let rhs = convert_if_needed(rhs, common);
                binary(op, lhs, rhs, common, span)
            }
            None => {
                self.report_operand_mismatch(op, &lhs, &rhs, span);
                let ty = lhs.ty;
                binary(op, lhs, rhs, ty, span)
            }
        }
    }

    /// Type a unary operation.
    pub fn check_unary(&mut self, op: UnaryOp, operand: Expr, span: Span) -> Expr {
        let ty = match op {
            UnaryOp::Plus | UnaryOp::Minus => {
                if !self.context.is_numeric(operand.ty) {
                    let operand_name = self.type_name(operand.ty);
                    self.report(
                        span,
                        DiagnosticKind::InvalidUnaryOperandType {
                            op: op.as_str().to_string(),
                            operand: operand_name,
                        },
                    );
                }
                operand.ty
            }
            UnaryOp::Not => {
                if !self.context.is_logical(operand.ty) {
                    let operand_name = self.type_name(operand.ty);
                    self.report(
                        span,
                        DiagnosticKind::InvalidUnaryOperandType {
                            op: op.as_str().to_string(),
                            operand: operand_name,
                        },
                    );
                }
                self.context.logical
            }
        };
        Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
            span,
        )
    }

    /// Type a `(re, im)` complex constructor. Integer parts convert to
    /// default REAL; mixed-kind parts promote to the stronger of the two.
    pub fn check_complex_constructor(&mut self, re: Expr, im: Expr, span: Span) -> Expr {
        let re = self.realize_complex_part(re);
        let im = self.realize_complex_part(im);
        let element = match self.context.promoted_type(re.ty, im.ty) {
            Some(t) => t,
            None => self.context.real,
        };
        let re = convert_if_needed(re, element);
        let im = convert_if_needed(im, element);
        let ty = if self.context.is_real(element) {
            self.context.complex_of(element)
        } else {
            self.context.complex
        };
        Expr::new(
            ExprKind::ComplexConstructor {
                re: Box::new(re),
                im: Box::new(im),
            },
            ty,
            span,
        )
    }

    fn realize_complex_part(&mut self, part: Expr) -> Expr {
        if self.context.is_real(part.ty) {
            return part;
        }
        if self.context.is_integer(part.ty) {
            let real = self.context.real;
            return part.convert_to(real);
        }
        let found = self.type_name(part.ty);
        self.report(part.span, DiagnosticKind::ExpectedNumericExpression { found });
        part
    }

    /// Adjust `value` to the type of an assignment target.
    ///
    /// Numeric kinds convert both ways (widening and narrowing are both
    /// legal assignments); character-to-character length adjustment is a
    /// runtime concern and gets no node. Anything else is reported and
    /// the value is returned untouched, so a bad assignment never grows a
    /// conversion node.
    pub fn typecheck_assignment(&mut self, target: QualType, value: Expr) -> Expr {
        if value.ty == target {
            return value;
        }
        if self.context.is_numeric(target) && self.context.is_numeric(value.ty) {
            return value.convert_to(target);
        }
        if self.context.is_character(target) && self.context.is_character(value.ty) {
            return value;
        }
        if self.context.is_logical(target) && self.context.is_logical(value.ty) {
            return value;
        }
        let target_name = self.type_name(target);
        let value_name = self.type_name(value.ty);
        self.report(
            value.span,
            DiagnosticKind::IncompatibleAssignmentType {
                target: target_name,
                value: value_name,
            },
        );
        value
    }

    /// Require a LOGICAL expression (IF, ELSE IF, DO WHILE conditions).
    pub(super) fn expect_logical(&mut self, expr: &Expr) -> bool {
        if self.context.is_logical(expr.ty) {
            return true;
        }
        let found = self.type_name(expr.ty);
        self.report(expr.span, DiagnosticKind::ExpectedLogicalExpression { found });
        false
    }

    /// Require an INTEGER expression (computed-GOTO selector).
    pub(super) fn expect_integer_expr(&mut self, expr: &Expr) -> bool {
        if self.context.is_integer(expr.ty) {
            return true;
        }
        let found = self.type_name(expr.ty);
        self.report(expr.span, DiagnosticKind::ExpectedIntegerExpression { found });
        false
    }

    /// Require an INTEGER variable (ASSIGN target, assigned-GOTO variable).
    pub(super) fn expect_integer_var(&mut self, expr: &Expr) -> bool {
        if expr.is_variable() && self.context.is_integer(expr.ty) {
            return true;
        }
        let found = if expr.is_variable() {
            self.type_name(expr.ty)
        } else {
            "an expression".to_string()
        };
        self.report(expr.span, DiagnosticKind::ExpectedIntegerVariable { found });
        false
    }

    /// Require a scalar numeric expression (DO control expressions).
    pub(super) fn expect_scalar_numeric(&mut self, expr: &Expr) -> bool {
        if self.context.is_numeric(expr.ty) && !self.context.is_complex(expr.ty) {
            return true;
        }
        let found = self.type_name(expr.ty);
        self.report(expr.span, DiagnosticKind::ExpectedNumericExpression { found });
        false
    }

    fn report_operand_mismatch(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, span: Span) {
        let lhs_name = self.type_name(lhs.ty);
        let rhs_name = self.type_name(rhs.ty);
        self.report(
            span,
            DiagnosticKind::InvalidOperandType {
                op: op.as_str().to_string(),
                lhs: lhs_name,
                rhs: rhs_name,
            },
        );
    }
}

fn convert_if_needed(expr: Expr, target: QualType) -> Expr {
    if expr.ty == target {
        expr
    } else {
        expr.convert_to(target)
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, ty: QualType, span: Span) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        ty,
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::Sema;

    fn int_lit(sema: &Sema, v: u64) -> Expr {
        Expr::new(ExprKind::IntLiteral(v), sema.context.integer, Span::dummy())
    }

    fn real_var(sema: &Sema, name: &str) -> Expr {
        Expr::new(ExprKind::Var(name.into()), sema.context.real, Span::dummy())
    }

    #[test]
    fn test_mixed_arithmetic_promotes_and_converts_weaker() {
        let mut sema = Sema::default();
        let lhs = int_lit(&sema, 2);
        let rhs = real_var(&sema, "X");
        let e = sema.check_binary(BinaryOp::Add, lhs, rhs, Span::dummy());
        assert_eq!(e.ty, sema.context.real);
        match e.kind {
            ExprKind::Binary { lhs, rhs, .. } => {
                assert!(matches!(lhs.kind, ExprKind::Convert { .. }));
                assert_eq!(lhs.ty, sema.context.real);
                assert!(matches!(rhs.kind, ExprKind::Var(_)));
            }
            other => panic!("expected Binary, got {other:?}"),
        }
        assert!(!sema.diags.has_errors());
    }

    #[test]
    fn test_same_kind_arithmetic_inserts_nothing() {
        let mut sema = Sema::default();
        let e = sema.check_binary(
            BinaryOp::Multiply,
            int_lit(&sema, 2),
            int_lit(&sema, 3),
            Span::dummy(),
        );
        assert_eq!(e.ty, sema.context.integer);
        match e.kind {
            ExprKind::Binary { lhs, rhs, .. } => {
                assert!(matches!(lhs.kind, ExprKind::IntLiteral(2)));
                assert!(matches!(rhs.kind, ExprKind::IntLiteral(3)));
            }
            other => panic!("expected Binary, got {other:?}"),
        }
    }

    #[test]
    fn test_logical_operand_in_arithmetic_is_reported() {
        let mut sema = Sema::default();
        let bad = Expr::new(
            ExprKind::LogicalLiteral(true),
            sema.context.logical,
            Span::dummy(),
        );
        let e = sema.check_binary(BinaryOp::Add, int_lit(&sema, 1), bad, Span::dummy());
        assert_eq!(sema.diags.error_count(), 1);
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E301");
        // Best-effort type keeps checking the enclosing expression useful.
        assert_eq!(e.ty, sema.context.integer);
    }

    #[test]
    fn test_comparison_yields_logical() {
        let mut sema = Sema::default();
        let e = sema.check_binary(
            BinaryOp::Lt,
            int_lit(&sema, 1),
            real_var(&sema, "X"),
            Span::dummy(),
        );
        assert_eq!(e.ty, sema.context.logical);
        assert!(!sema.diags.has_errors());
    }

    #[test]
    fn test_not_requires_logical() {
        let mut sema = Sema::default();
        let e = sema.check_unary(UnaryOp::Not, int_lit(&sema, 1), Span::dummy());
        assert_eq!(e.ty, sema.context.logical);
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E303");
    }

    #[test]
    fn test_assignment_narrowing_gets_conversion_node() {
        let mut sema = Sema::default();
        let target = sema.context.integer;
        let value = real_var(&sema, "X");
        let adjusted = sema.typecheck_assignment(target, value);
        assert_eq!(adjusted.ty, sema.context.integer);
        assert!(matches!(adjusted.kind, ExprKind::Convert { .. }));
        assert!(!sema.diags.has_errors());
    }

    #[test]
    fn test_assignment_without_conversion_path_is_untouched() {
        let mut sema = Sema::default();
        let target = sema.context.integer;
        let value = Expr::new(
            ExprKind::LogicalLiteral(false),
            sema.context.logical,
            Span::dummy(),
        );
        let adjusted = sema.typecheck_assignment(target, value);
        assert!(matches!(adjusted.kind, ExprKind::LogicalLiteral(false)));
        assert_eq!(adjusted.ty, sema.context.logical);
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E302");
    }

    #[test]
    fn test_complex_constructor_promotes_parts() {
        let mut sema = Sema::default();
        let re = Expr::new(
            ExprKind::RealLiteral(1.0),
            sema.context.double_precision,
            Span::dummy(),
        );
        let im = int_lit(&sema, 2);
        let e = sema.check_complex_constructor(re, im, Span::dummy());
        assert_eq!(e.ty, sema.context.double_complex);
        match e.kind {
            ExprKind::ComplexConstructor { im, .. } => {
                assert_eq!(im.ty, sema.context.double_precision);
            }
            other => panic!("expected ComplexConstructor, got {other:?}"),
        }
    }
}
