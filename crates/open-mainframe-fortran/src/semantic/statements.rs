//! Statement action routines.
//!
//! The parser calls one routine here per reduced statement. Each routine
//! checks its operands, allocates the statement node, appends it to the
//! innermost open body, declares the statement's own label (which may
//! close labeled DO loops waiting for it), and registers any label
//! references it carries.

use open_mainframe_lang_core::Span;

use crate::ast::{
    ConstructName, ConstructPart, Expr, FormatSpec, LabelRef, Stmt, StmtId, StmtKind,
};
use crate::error::{DiagnosticKind, StmtError};

use super::labels::{stmt_label_value, ForwardRef};
use super::types::QualType;
use super::{Sema, StmtResult, Symbol, SymbolKind};

/// How a label reference uses its target, for the declaration's usage
/// flags.
#[derive(Debug, Clone, Copy)]
enum LabelUse {
    Goto,
    Assign,
    Format,
}

impl Sema {
    /// Allocate, append, and label a finished statement node.
    fn produce(&mut self, kind: StmtKind, stmt_label: Option<Expr>, span: Span) -> StmtId {
        let value = stmt_label.as_ref().and_then(stmt_label_value);
        let id = self.body.alloc(Stmt {
            kind,
            label: value,
            span,
        });
        self.body.append(id);
        if let (Some(value), Some(expr)) = (value, stmt_label) {
            self.declare_statement_label(value, expr.span, id);
        }
        id
    }

    /// A label operand must be an integer literal in the label range.
    fn label_operand(&mut self, expr: &Expr) -> Result<u32, StmtError> {
        match stmt_label_value(expr) {
            Some(value) => Ok(value),
            None => {
                let found = self.type_name(expr.ty);
                self.report(
                    expr.span,
                    DiagnosticKind::ExpectedIntegerExpression { found },
                );
                Err(StmtError)
            }
        }
    }

    /// Connect a label reference carried by statement `id`: patch it in
    /// place when the label is already declared, otherwise leave it for
    /// the patch-up pass that runs on declaration.
    fn register_label_ref(
        &mut self,
        value: u32,
        id: StmtId,
        operand: Option<usize>,
        span: Span,
        usage: LabelUse,
    ) {
        let target = match self.labels.resolve_mut(value) {
            Some(declaration) => {
                match usage {
                    LabelUse::Goto => declaration.used_as_goto_target = true,
                    LabelUse::Assign => declaration.used_as_assign_target = true,
                    LabelUse::Format => {}
                }
                Some(declaration.stmt)
            }
            None => {
                self.labels.declare_forward_reference(ForwardRef {
                    label: value,
                    stmt: id,
                    operand,
                    span,
                });
                None
            }
        };
        if let Some(target) = target {
            patch_label_ref(&mut self.body.get_mut(id).kind, value, operand, target);
        }
    }

    /// Coerce a DO control expression to the loop variable's kind.
    fn coerce_control(&self, var_ty: QualType, expr: Expr) -> Expr {
        if self.context.is_numeric(var_ty)
            && self.context.is_numeric(expr.ty)
            && expr.ty != var_ty
        {
            expr.convert_to(var_ty)
        } else {
            expr
        }
    }

    // ── Simple statements ──────────────────────────────────────────────

    pub fn act_on_assignment(
        &mut self,
        stmt_label: Option<Expr>,
        target: Expr,
        value: Expr,
        span: Span,
    ) -> StmtResult {
        let value = self.typecheck_assignment(target.ty, value);
        Ok(self.produce(StmtKind::Assignment { target, value }, stmt_label, span))
    }

    pub fn act_on_assign(
        &mut self,
        stmt_label: Option<Expr>,
        label: Expr,
        var: Expr,
        span: Span,
    ) -> StmtResult {
        self.expect_integer_var(&var);
        let value = self.label_operand(&label)?;
        let address = LabelRef::unresolved(value, label.span);
        let id = self.produce(StmtKind::Assign { address, var }, stmt_label, span);
        self.register_label_ref(value, id, None, label.span, LabelUse::Assign);
        Ok(id)
    }

    pub fn act_on_goto(
        &mut self,
        stmt_label: Option<Expr>,
        destination: Expr,
        span: Span,
    ) -> StmtResult {
        let value = self.label_operand(&destination)?;
        let reference = LabelRef::unresolved(value, destination.span);
        let id = self.produce(
            StmtKind::Goto {
                destination: reference,
            },
            stmt_label,
            span,
        );
        self.register_label_ref(value, id, None, destination.span, LabelUse::Goto);
        Ok(id)
    }

    pub fn act_on_assigned_goto(
        &mut self,
        stmt_label: Option<Expr>,
        var: Expr,
        allowed: Vec<Expr>,
        span: Span,
    ) -> StmtResult {
        self.expect_integer_var(&var);
        let mut values = Vec::with_capacity(allowed.len());
        let mut refs = Vec::with_capacity(allowed.len());
        for target in &allowed {
            let value = self.label_operand(target)?;
            values.push((value, target.span));
            refs.push(LabelRef::unresolved(value, target.span));
        }
        let id = self.produce(
            StmtKind::AssignedGoto { var, allowed: refs },
            stmt_label,
            span,
        );
        for (idx, (value, target_span)) in values.into_iter().enumerate() {
            self.register_label_ref(value, id, Some(idx), target_span, LabelUse::Goto);
        }
        Ok(id)
    }

    pub fn act_on_computed_goto(
        &mut self,
        stmt_label: Option<Expr>,
        targets: Vec<Expr>,
        selector: Expr,
        span: Span,
    ) -> StmtResult {
        self.expect_integer_expr(&selector);
        if self.dialect_warnings() {
            self.report(span, DiagnosticKind::DeprecatedComputedGoto);
        }
        let mut values = Vec::with_capacity(targets.len());
        let mut refs = Vec::with_capacity(targets.len());
        for target in &targets {
            let value = self.label_operand(target)?;
            values.push((value, target.span));
            refs.push(LabelRef::unresolved(value, target.span));
        }
        let id = self.produce(
            StmtKind::ComputedGoto {
                targets: refs,
                selector,
            },
            stmt_label,
            span,
        );
        for (idx, (value, target_span)) in values.into_iter().enumerate() {
            self.register_label_ref(value, id, Some(idx), target_span, LabelUse::Goto);
        }
        Ok(id)
    }

    pub fn act_on_continue(&mut self, stmt_label: Option<Expr>, span: Span) -> StmtResult {
        Ok(self.produce(StmtKind::Continue, stmt_label, span))
    }

    pub fn act_on_stop(
        &mut self,
        stmt_label: Option<Expr>,
        code: Option<Expr>,
        span: Span,
    ) -> StmtResult {
        if let Some(code) = &code {
            if !self.context.is_integer(code.ty) && !self.context.is_character(code.ty) {
                let found = self.type_name(code.ty);
                self.report(
                    code.span,
                    DiagnosticKind::ExpectedIntegerExpression { found },
                );
            }
        }
        Ok(self.produce(StmtKind::Stop { code }, stmt_label, span))
    }

    pub fn act_on_return(
        &mut self,
        stmt_label: Option<Expr>,
        value: Option<Expr>,
        span: Span,
    ) -> StmtResult {
        if !self.in_procedure() {
            self.report(span, DiagnosticKind::ReturnOutsideProcedure);
            return Err(StmtError);
        }
        if let Some(alternate) = &value {
            self.expect_integer_expr(alternate);
        }
        Ok(self.produce(StmtKind::Return { value }, stmt_label, span))
    }

    pub fn act_on_call(
        &mut self,
        stmt_label: Option<Expr>,
        name: String,
        args: Vec<Expr>,
        span: Span,
    ) -> StmtResult {
        match self.lookup_symbol(&name) {
            None => {
                // First reference: implicitly an external subroutine;
                // later calls check against this arity.
                self.declare_symbol(
                    name.clone(),
                    Symbol {
                        kind: SymbolKind::Subroutine,
                        arg_count: Some(args.len()),
                    },
                );
            }
            Some(Symbol {
                kind: SymbolKind::Subroutine,
                arg_count,
            }) => {
                if let Some(expected) = arg_count {
                    if expected != args.len() {
                        self.report(
                            span,
                            DiagnosticKind::WrongArgumentCount {
                                name: name.clone(),
                                expected,
                                found: args.len(),
                            },
                        );
                    }
                }
            }
            Some(Symbol { kind, .. }) => {
                self.report(
                    span,
                    DiagnosticKind::CallRequiresSubroutine {
                        name: name.clone(),
                        actual: kind.describe(),
                    },
                );
                return Err(StmtError);
            }
        }
        Ok(self.produce(StmtKind::Call { name, args }, stmt_label, span))
    }

    /// PRINT with a `*` format when `format` is `None`, otherwise a
    /// FORMAT statement label which may still be forward.
    pub fn act_on_print(
        &mut self,
        stmt_label: Option<Expr>,
        format: Option<Expr>,
        items: Vec<Expr>,
        span: Span,
    ) -> StmtResult {
        let format_label = match &format {
            None => None,
            Some(expr) => Some((self.label_operand(expr)?, expr.span)),
        };
        let format = match format_label {
            None => FormatSpec::Star,
            Some((value, label_span)) => FormatSpec::Label(LabelRef::unresolved(value, label_span)),
        };
        let id = self.produce(StmtKind::Print { format, items }, stmt_label, span);
        if let Some((value, label_span)) = format_label {
            self.register_label_ref(value, id, None, label_span, LabelUse::Format);
        }
        Ok(id)
    }

    // ── IF constructs ──────────────────────────────────────────────────

    pub fn act_on_if(
        &mut self,
        stmt_label: Option<Expr>,
        condition: Expr,
        name: ConstructName,
        span: Span,
    ) -> StmtResult {
        self.expect_logical(&condition);
        let id = self.produce(
            StmtKind::If {
                condition,
                name,
                then_body: Vec::new(),
                else_body: None,
            },
            stmt_label,
            span,
        );
        self.body.enter(id, None);
        Ok(id)
    }

    /// Logical IF: the controlled statement was already produced by its
    /// own action routine; it moves from the open body into the IF node.
    pub fn act_on_logical_if(
        &mut self,
        stmt_label: Option<Expr>,
        condition: Expr,
        controlled: StmtId,
        span: Span,
    ) -> StmtResult {
        self.expect_logical(&condition);
        self.body.retract(controlled);
        let id = self.produce(
            StmtKind::If {
                condition,
                name: ConstructName::none(span),
                then_body: vec![controlled],
                else_body: None,
            },
            stmt_label,
            span,
        );
        Ok(id)
    }

    pub fn act_on_else_if(
        &mut self,
        stmt_label: Option<Expr>,
        condition: Expr,
        name: ConstructName,
        span: Span,
    ) -> StmtResult {
        self.expect_logical(&condition);
        let opener = self.leave_blocks_until_if();
        let in_else = self.body.last_entry().is_some_and(|e| e.in_else);
        let opener = match opener {
            Some(opener) if !in_else => opener,
            _ => {
                // No THEN arm to extend; keep the statement as a fresh
                // IF so its body and eventual END IF still nest.
                self.report(span, DiagnosticKind::StmtNotInIf { keyword: "ELSE IF" });
                let id = self.produce(
                    StmtKind::If {
                        condition,
                        name,
                        then_body: Vec::new(),
                        else_body: None,
                    },
                    stmt_label,
                    span,
                );
                self.body.enter(id, None);
                return Ok(id);
            }
        };
        self.check_construct_name_match(&name, opener);

        // The ELSE IF arm is a fresh IF nested as the opener's whole
        // ELSE body; it inherits the opener's construct name so the
        // eventual END IF matches the chain.
        let inherited = self
            .body
            .get(opener)
            .construct_name()
            .cloned()
            .unwrap_or_else(|| ConstructName::none(span));
        let value = stmt_label.as_ref().and_then(stmt_label_value);
        let id = self.body.alloc(Stmt {
            kind: StmtKind::If {
                condition,
                name: inherited,
                then_body: Vec::new(),
                else_body: None,
            },
            label: value,
            span,
        });
        self.body.leave();
        if let StmtKind::If { else_body, .. } = &mut self.body.get_mut(opener).kind {
            *else_body = Some(vec![id]);
        }
        self.body.enter(id, None);
        if let (Some(value), Some(expr)) = (value, stmt_label) {
            self.declare_statement_label(value, expr.span, id);
        }
        Ok(id)
    }

    pub fn act_on_else(
        &mut self,
        stmt_label: Option<Expr>,
        name: ConstructName,
        span: Span,
    ) -> StmtResult {
        let opener = self.leave_blocks_until_if();
        let misplaced =
            opener.is_none() || self.body.last_entry().is_some_and(|e| e.in_else);
        if misplaced {
            self.report(span, DiagnosticKind::StmtNotInIf { keyword: "ELSE" });
        }
        let id = self.produce(
            StmtKind::Part {
                part: ConstructPart::Else,
                name: name.clone(),
            },
            stmt_label,
            span,
        );
        if let (Some(opener), false) = (opener, misplaced) {
            self.check_construct_name_match(&name, opener);
            self.body.leave_if_then();
        }
        Ok(id)
    }

    pub fn act_on_end_if(
        &mut self,
        stmt_label: Option<Expr>,
        name: ConstructName,
        span: Span,
    ) -> StmtResult {
        let opener = self.leave_blocks_until_if();
        if opener.is_none() {
            self.report(span, DiagnosticKind::StmtNotInIf { keyword: "END IF" });
        }
        let id = self.produce(
            StmtKind::Part {
                part: ConstructPart::EndIf,
                name: name.clone(),
            },
            stmt_label,
            span,
        );
        if let Some(opener) = opener {
            self.check_construct_name_match(&name, opener);
            self.body.leave();
        }
        Ok(id)
    }

    // ── DO constructs ──────────────────────────────────────────────────

    pub fn act_on_do(
        &mut self,
        stmt_label: Option<Expr>,
        terminal_label: Option<Expr>,
        var: Expr,
        init: Expr,
        limit: Expr,
        step: Option<Expr>,
        name: ConstructName,
        span: Span,
    ) -> StmtResult {
        if !var.is_variable() {
            self.report(
                var.span,
                DiagnosticKind::ExpectedIntegerVariable {
                    found: "an expression".to_string(),
                },
            );
        } else {
            self.expect_scalar_numeric(&var);
        }
        self.expect_scalar_numeric(&init);
        self.expect_scalar_numeric(&limit);
        if let Some(step) = &step {
            self.expect_scalar_numeric(step);
        }
        let var_ty = var.ty;
        let init = self.coerce_control(var_ty, init);
        let limit = self.coerce_control(var_ty, limit);
        let step = step.map(|s| self.coerce_control(var_ty, s));

        let terminal = match terminal_label {
            None => None,
            Some(expr) => {
                let value = self.label_operand(&expr)?;
                if let Some(previous) = self.labels.resolve(value) {
                    let previous_span = previous.span;
                    self.report_with_note(
                        expr.span,
                        DiagnosticKind::StmtLabelMustDeclareAfter {
                            label: value,
                            keyword: "DO",
                        },
                        previous_span,
                        "previous definition here",
                    );
                    return Err(StmtError);
                }
                Some((value, expr.span))
            }
        };

        let id = self.produce(
            StmtKind::Do {
                var,
                init,
                limit,
                step,
                terminal: terminal.map(|(value, s)| LabelRef::unresolved(value, s)),
                name,
                body: Vec::new(),
            },
            stmt_label,
            span,
        );
        if let Some((value, label_span)) = terminal {
            self.labels.declare_forward_reference(ForwardRef {
                label: value,
                stmt: id,
                operand: None,
                span: label_span,
            });
        }
        self.body.enter(id, terminal.map(|(value, _)| value));
        Ok(id)
    }

    pub fn act_on_do_while(
        &mut self,
        stmt_label: Option<Expr>,
        condition: Expr,
        name: ConstructName,
        span: Span,
    ) -> StmtResult {
        self.expect_logical(&condition);
        let id = self.produce(
            StmtKind::DoWhile {
                condition,
                name,
                body: Vec::new(),
            },
            stmt_label,
            span,
        );
        self.body.enter(id, None);
        Ok(id)
    }

    pub fn act_on_end_do(
        &mut self,
        stmt_label: Option<Expr>,
        name: ConstructName,
        span: Span,
    ) -> StmtResult {
        let label_value = stmt_label.as_ref().and_then(stmt_label_value);
        let labeled_opener = label_value.filter(|&v| self.is_in_labeled_do(v)).and_then(|v| {
            self.body
                .entries()
                .iter()
                .rev()
                .find(|e| e.expected_end_do_label == Some(v))
                .map(|e| e.stmt)
        });
        if let Some(opener) = labeled_opener {
            // Declaring the label closes the loop(s) waiting for it;
            // only the construct name remains to check.
            let id = self.produce(
                StmtKind::Part {
                    part: ConstructPart::EndDo,
                    name: name.clone(),
                },
                stmt_label,
                span,
            );
            self.check_construct_name_match(&name, opener);
            return Ok(id);
        }

        // A plain END DO binds to the nearest block DO; label-terminated
        // loops on the way are force-closed as unterminated.
        let opener = self.leave_blocks_until_do();
        if opener.is_none() {
            self.report(span, DiagnosticKind::EndDoWithoutDo);
        }
        let id = self.produce(
            StmtKind::Part {
                part: ConstructPart::EndDo,
                name: name.clone(),
            },
            stmt_label,
            span,
        );
        if let Some(opener) = opener {
            self.check_construct_name_match(&name, opener);
            self.body.leave();
        }
        Ok(id)
    }

    pub fn act_on_cycle(
        &mut self,
        stmt_label: Option<Expr>,
        name: ConstructName,
        span: Span,
    ) -> StmtResult {
        let target = self.loop_exit_target("CYCLE", &name, span);
        Ok(self.produce(
            StmtKind::Cycle {
                name,
                loop_stmt: target,
            },
            stmt_label,
            span,
        ))
    }

    pub fn act_on_exit(
        &mut self,
        stmt_label: Option<Expr>,
        name: ConstructName,
        span: Span,
    ) -> StmtResult {
        let target = self.loop_exit_target("EXIT", &name, span);
        Ok(self.produce(
            StmtKind::Exit {
                name,
                loop_stmt: target,
            },
            stmt_label,
            span,
        ))
    }

    /// Resolve the loop a CYCLE or EXIT refers to; the statement is kept
    /// with no target when there is none.
    fn loop_exit_target(
        &mut self,
        keyword: &'static str,
        name: &ConstructName,
        span: Span,
    ) -> Option<StmtId> {
        let target = self.find_enclosing_loop(name);
        if target.is_none() {
            let kind = match &name.name {
                Some(wanted) => DiagnosticKind::StmtNotInNamedLoop {
                    keyword,
                    name: wanted.clone(),
                },
                None => DiagnosticKind::StmtNotInLoop { keyword },
            };
            self.report(span, kind);
        }
        target
    }
}

fn patch_label_ref(kind: &mut StmtKind, value: u32, operand: Option<usize>, target: StmtId) {
    match kind {
        StmtKind::Goto { destination } if destination.label == value => {
            destination.target = Some(target);
        }
        StmtKind::Assign { address, .. } if address.label == value => {
            address.target = Some(target);
        }
        StmtKind::AssignedGoto { allowed, .. } => {
            if let Some(r) = operand.and_then(|i| allowed.get_mut(i)) {
                if r.label == value {
                    r.target = Some(target);
                }
            }
        }
        StmtKind::ComputedGoto { targets, .. } => {
            if let Some(r) = operand.and_then(|i| targets.get_mut(i)) {
                if r.label == value {
                    r.target = Some(target);
                }
            }
        }
        StmtKind::Print {
            format: FormatSpec::Label(r),
            ..
        } if r.label == value => {
            r.target = Some(target);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprKind;
    use crate::semantic::{ProgramUnitKind, Sema};

    fn main_unit() -> Sema {
        let mut sema = Sema::default();
        sema.enter_program_unit(ProgramUnitKind::MainProgram);
        sema
    }

    fn logical(sema: &Sema, v: bool) -> Expr {
        Expr::new(ExprKind::LogicalLiteral(v), sema.context.logical, Span::dummy())
    }

    fn int_lit(sema: &Sema, v: u64) -> Expr {
        Expr::new(ExprKind::IntLiteral(v), sema.context.integer, Span::dummy())
    }

    fn int_var(sema: &Sema, name: &str) -> Expr {
        Expr::new(ExprKind::Var(name.into()), sema.context.integer, Span::dummy())
    }

    fn unnamed() -> ConstructName {
        ConstructName::none(Span::dummy())
    }

    #[test]
    fn test_if_else_end_if_builds_both_arms() {
        let mut sema = main_unit();
        let cond = logical(&sema, true);
        let opener = sema.act_on_if(None, cond, unnamed(), Span::dummy()).expect("if");
        let a = sema
            .act_on_assignment(None, int_var(&sema, "I"), int_lit(&sema, 1), Span::dummy())
            .expect("assignment");
        sema.act_on_else(None, unnamed(), Span::dummy()).expect("else");
        let b = sema
            .act_on_assignment(None, int_var(&sema, "I"), int_lit(&sema, 2), Span::dummy())
            .expect("assignment");
        sema.act_on_end_if(None, unnamed(), Span::dummy()).expect("end if");
        let unit = sema.finish_program_unit();

        assert!(!sema.diags.has_errors());
        match &unit.stmt(opener).kind {
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => {
                assert!(then_body.contains(&a));
                assert!(else_body.as_ref().is_some_and(|e| e.contains(&b)));
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn test_else_without_if_keeps_statement() {
        let mut sema = main_unit();
        let id = sema.act_on_else(None, unnamed(), Span::dummy()).expect("else");
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E201");
        let unit = sema.finish_program_unit();
        assert_eq!(unit.body, vec![id]);
        assert!(matches!(
            unit.stmt(id).kind,
            StmtKind::Part {
                part: ConstructPart::Else,
                ..
            }
        ));
    }

    #[test]
    fn test_else_after_else() {
        let mut sema = main_unit();
        let cond = logical(&sema, true);
        sema.act_on_if(None, cond, unnamed(), Span::dummy()).expect("if");
        sema.act_on_else(None, unnamed(), Span::dummy()).expect("else");
        sema.act_on_else(None, unnamed(), Span::dummy()).expect("else");
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E201");
    }

    #[test]
    fn test_else_if_chain_nests_in_else_body() {
        let mut sema = main_unit();
        let first = sema
            .act_on_if(None, logical(&sema, true), unnamed(), Span::dummy())
            .expect("if");
        let second = sema
            .act_on_else_if(None, logical(&sema, false), unnamed(), Span::dummy())
            .expect("else if");
        sema.act_on_end_if(None, unnamed(), Span::dummy()).expect("end if");
        let unit = sema.finish_program_unit();

        assert!(!sema.diags.has_errors());
        match &unit.stmt(first).kind {
            StmtKind::If { else_body, .. } => {
                assert_eq!(else_body.as_deref(), Some(&[second][..]));
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn test_end_if_name_mismatch() {
        let mut sema = main_unit();
        sema.act_on_if(
            None,
            logical(&sema, true),
            ConstructName::named("OUTER", Span::dummy()),
            Span::dummy(),
        )
        .expect("if");
        sema.act_on_end_if(None, ConstructName::named("INNER", Span::dummy()), Span::dummy())
            .expect("end if");
        let diagnostic = &sema.diags.diagnostics()[0];
        assert_eq!(diagnostic.code, "F-E203");
        assert_eq!(diagnostic.notes[0].message, "matching construct here");
    }

    #[test]
    fn test_end_if_may_omit_construct_name() {
        let mut sema = main_unit();
        sema.act_on_if(
            None,
            logical(&sema, true),
            ConstructName::named("OUTER", Span::dummy()),
            Span::dummy(),
        )
        .expect("if");
        sema.act_on_end_if(None, unnamed(), Span::dummy()).expect("end if");
        assert!(sema.diags.diagnostics().is_empty());
    }

    #[test]
    fn test_end_do_without_do_keeps_statement() {
        let mut sema = main_unit();
        let id = sema.act_on_end_do(None, unnamed(), Span::dummy()).expect("end do");
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E202");
        let unit = sema.finish_program_unit();
        assert_eq!(unit.body, vec![id]);
        assert!(matches!(
            unit.stmt(id).kind,
            StmtKind::Part {
                part: ConstructPart::EndDo,
                ..
            }
        ));
    }

    #[test]
    fn test_plain_end_do_skips_label_terminated_do() {
        let mut sema = main_unit();
        let block = sema
            .act_on_do(
                None,
                None,
                int_var(&sema, "I"),
                int_lit(&sema, 1),
                int_lit(&sema, 10),
                None,
                unnamed(),
                Span::dummy(),
            )
            .expect("do");
        sema.act_on_do(
            None,
            Some(int_lit(&sema, 10)),
            int_var(&sema, "J"),
            int_lit(&sema, 1),
            int_lit(&sema, 5),
            None,
            unnamed(),
            Span::dummy(),
        )
        .expect("do");
        // The inner label-terminated loop is not an END DO candidate; it
        // is force-closed and the closer binds to the outer block DO.
        sema.act_on_end_do(None, unnamed(), Span::dummy()).expect("end do");
        let unit = sema.finish_program_unit();
        let codes: Vec<_> = sema
            .diags
            .diagnostics()
            .iter()
            .map(|d| d.code.as_str())
            .collect();
        assert_eq!(codes, vec!["F-E205", "F-E102"]);
        assert!(matches!(unit.stmt(block).kind, StmtKind::Do { .. }));
        assert_eq!(unit.body, vec![block]);
    }

    #[test]
    fn test_block_do_closed_by_end_do() {
        let mut sema = main_unit();
        let opener = sema
            .act_on_do(
                None,
                None,
                int_var(&sema, "I"),
                int_lit(&sema, 1),
                int_lit(&sema, 10),
                None,
                unnamed(),
                Span::dummy(),
            )
            .expect("do");
        let inner = sema.act_on_continue(None, Span::dummy()).expect("continue");
        sema.act_on_end_do(None, unnamed(), Span::dummy()).expect("end do");
        let unit = sema.finish_program_unit();

        assert!(!sema.diags.has_errors());
        match &unit.stmt(opener).kind {
            StmtKind::Do { body, .. } => assert!(body.contains(&inner)),
            other => panic!("expected Do, got {other:?}"),
        }
    }

    #[test]
    fn test_do_terminal_label_already_declared() {
        let mut sema = main_unit();
        let label = int_lit(&sema, 10);
        sema.act_on_continue(Some(label), Span::dummy()).expect("continue");
        let r = sema.act_on_do(
            None,
            Some(int_lit(&sema, 10)),
            int_var(&sema, "I"),
            int_lit(&sema, 1),
            int_lit(&sema, 5),
            None,
            unnamed(),
            Span::dummy(),
        );
        assert_eq!(r, Err(StmtError));
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E103");
    }

    #[test]
    fn test_do_control_expressions_coerce_to_variable_kind() {
        let mut sema = main_unit();
        let real_var = Expr::new(ExprKind::Var("X".into()), sema.context.real, Span::dummy());
        let opener = sema
            .act_on_do(
                None,
                None,
                real_var,
                int_lit(&sema, 1),
                int_lit(&sema, 10),
                None,
                unnamed(),
                Span::dummy(),
            )
            .expect("do");
        sema.act_on_end_do(None, unnamed(), Span::dummy()).expect("end do");
        assert!(!sema.diags.has_errors());
        match &sema.statement(opener).kind {
            StmtKind::Do { init, limit, .. } => {
                assert_eq!(init.ty, sema.context.real);
                assert!(matches!(init.kind, ExprKind::Convert { .. }));
                assert_eq!(limit.ty, sema.context.real);
            }
            other => panic!("expected Do, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_outside_loop_keeps_statement() {
        let mut sema = main_unit();
        let id = sema.act_on_cycle(None, unnamed(), Span::dummy()).expect("cycle");
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E404");
        match &sema.statement(id).kind {
            StmtKind::Cycle { loop_stmt, .. } => assert_eq!(*loop_stmt, None),
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_exit_names_outer_loop() {
        let mut sema = main_unit();
        let outer = sema
            .act_on_do_while(
                None,
                logical(&sema, true),
                ConstructName::named("OUTER", Span::dummy()),
                Span::dummy(),
            )
            .expect("do while");
        sema.act_on_do_while(None, logical(&sema, true), unnamed(), Span::dummy())
            .expect("do while");
        let exit = sema
            .act_on_exit(None, ConstructName::named("OUTER", Span::dummy()), Span::dummy())
            .expect("exit");
        match &sema.statement(exit).kind {
            StmtKind::Exit { loop_stmt, .. } => assert_eq!(*loop_stmt, Some(outer)),
            other => panic!("expected Exit, got {other:?}"),
        }
    }

    #[test]
    fn test_exit_named_loop_missing() {
        let mut sema = main_unit();
        sema.act_on_do_while(None, logical(&sema, true), unnamed(), Span::dummy())
            .expect("do while");
        let id = sema
            .act_on_exit(None, ConstructName::named("NOPE", Span::dummy()), Span::dummy())
            .expect("exit");
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E405");
        match &sema.statement(id).kind {
            StmtKind::Exit { loop_stmt, .. } => assert_eq!(*loop_stmt, None),
            other => panic!("expected Exit, got {other:?}"),
        }
    }

    #[test]
    fn test_return_outside_procedure() {
        let mut sema = main_unit();
        let r = sema.act_on_return(None, None, Span::dummy());
        assert_eq!(r, Err(StmtError));
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E401");
    }

    #[test]
    fn test_call_unknown_name_becomes_subroutine() {
        let mut sema = main_unit();
        sema.act_on_call(None, "SUB".into(), vec![int_lit(&sema, 1)], Span::dummy())
            .expect("call");
        // Second call with a different arity checks against the implicit
        // declaration.
        sema.act_on_call(None, "SUB".into(), Vec::new(), Span::dummy())
            .expect("call");
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E403");
    }

    #[test]
    fn test_call_of_variable_is_rejected() {
        let mut sema = main_unit();
        sema.declare_symbol(
            "X",
            Symbol {
                kind: SymbolKind::Variable,
                arg_count: None,
            },
        );
        let r = sema.act_on_call(None, "X".into(), Vec::new(), Span::dummy());
        assert_eq!(r, Err(StmtError));
        assert_eq!(sema.diags.diagnostics()[0].code, "F-E402");
    }

    #[test]
    fn test_computed_goto_warns_outside_f77() {
        let mut sema = main_unit();
        sema.act_on_computed_goto(
            None,
            vec![int_lit(&sema, 10), int_lit(&sema, 20)],
            int_var(&sema, "I"),
            Span::dummy(),
        )
        .expect("computed goto");
        let warnings: Vec<_> = sema
            .diags
            .diagnostics()
            .iter()
            .filter(|d| d.code == "F-W901")
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(!sema.diags.has_errors());
    }

    #[test]
    fn test_computed_goto_silent_in_f77() {
        use crate::semantic::LangOptions;
        let mut sema = Sema::new(LangOptions { fortran77: true });
        sema.enter_program_unit(ProgramUnitKind::MainProgram);
        sema.act_on_computed_goto(
            None,
            vec![int_lit(&sema, 10)],
            int_var(&sema, "I"),
            Span::dummy(),
        )
        .expect("computed goto");
        assert!(sema.diags.diagnostics().is_empty());
    }

    #[test]
    fn test_print_with_forward_format_label() {
        let mut sema = main_unit();
        let print = sema
            .act_on_print(
                None,
                Some(int_lit(&sema, 200)),
                vec![int_var(&sema, "I")],
                Span::dummy(),
            )
            .expect("print");
        let fmt = sema.act_on_continue(Some(int_lit(&sema, 200)), Span::dummy()).expect("format");
        match &sema.statement(print).kind {
            StmtKind::Print {
                format: FormatSpec::Label(r),
                ..
            } => assert_eq!(r.target, Some(fmt)),
            other => panic!("expected Print, got {other:?}"),
        }
    }

    #[test]
    fn test_backward_goto_resolves_immediately() {
        let mut sema = main_unit();
        let target = sema
            .act_on_continue(Some(int_lit(&sema, 10)), Span::dummy())
            .expect("continue");
        let goto = sema
            .act_on_goto(None, int_lit(&sema, 10), Span::dummy())
            .expect("goto");
        match &sema.statement(goto).kind {
            StmtKind::Goto { destination } => assert_eq!(destination.target, Some(target)),
            other => panic!("expected Goto, got {other:?}"),
        }
    }

    #[test]
    fn test_logical_if_owns_its_statement() {
        let mut sema = main_unit();
        let controlled = sema.act_on_continue(None, Span::dummy()).expect("continue");
        let wrapper = sema
            .act_on_logical_if(None, logical(&sema, true), controlled, Span::dummy())
            .expect("logical if");
        let unit = sema.finish_program_unit();
        assert_eq!(unit.body, vec![wrapper]);
        match &unit.stmt(wrapper).kind {
            StmtKind::If { then_body, .. } => assert_eq!(*then_body, vec![controlled]),
            other => panic!("expected If, got {other:?}"),
        }
    }
}
