//! Statement-label table for one lexical scope.
//!
//! Labels may be referenced before they are declared (a GOTO jumping
//! forward, a DO naming its terminal label). References to labels not yet
//! declared are recorded as forward references and resolved by a single
//! patch-up pass when the declaring statement arrives; whatever is still
//! pending when the scope closes is an undeclared-label error.

use std::collections::HashMap;

use open_mainframe_lang_core::Span;

use crate::ast::{Expr, StmtId};

/// Largest legal statement label (five digits in the classic label field).
pub const MAX_STMT_LABEL: u32 = 99_999;

/// Extract the label value from a label-reference expression.
///
/// The parser hands label references over as integer literal constants;
/// anything else, or a value outside `1..=99999`, is not a usable label.
pub fn stmt_label_value(expr: &Expr) -> Option<u32> {
    let v = expr.int_value()?;
    if v == 0 || v > u64::from(MAX_STMT_LABEL) {
        return None;
    }
    Some(v as u32)
}

/// One declared statement label.
#[derive(Debug, Clone, PartialEq)]
pub struct StmtLabelDecl {
    /// The label value.
    pub label: u32,
    /// The statement carrying the label.
    pub stmt: StmtId,
    /// Where the label is written.
    pub span: Span,
    /// Referenced as a GOTO (or computed-GOTO) target.
    pub used_as_goto_target: bool,
    /// Referenced as an ASSIGN target.
    pub used_as_assign_target: bool,
    /// Terminates a labeled DO loop.
    pub used_as_end_do_target: bool,
}

impl StmtLabelDecl {
    fn new(label: u32, stmt: StmtId, span: Span) -> Self {
        Self {
            label,
            stmt,
            span,
            used_as_goto_target: false,
            used_as_assign_target: false,
            used_as_end_do_target: false,
        }
    }
}

/// A pending reference to a label that has not been declared yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRef {
    /// The referenced label value.
    pub label: u32,
    /// The statement holding the reference.
    pub stmt: StmtId,
    /// Index into the statement's target list, for computed/assigned GOTO.
    pub operand: Option<usize>,
    /// Where the reference appears.
    pub span: Span,
}

/// Label table and pending forward references for one lexical scope.
#[derive(Debug, Default)]
pub struct StmtLabelScope {
    decls: HashMap<u32, StmtLabelDecl>,
    forward: Vec<ForwardRef>,
}

impl StmtLabelScope {
    /// Declare a label.
    ///
    /// Does not dedupe: the statement builder checks [`resolve`] first and
    /// reports `DuplicateLabel` before ever calling this.
    ///
    /// [`resolve`]: Self::resolve
    pub fn declare(&mut self, label: u32, stmt: StmtId, span: Span) {
        self.decls.insert(label, StmtLabelDecl::new(label, stmt, span));
    }

    /// Look up a label declaration.
    pub fn resolve(&self, label: u32) -> Option<&StmtLabelDecl> {
        self.decls.get(&label)
    }

    /// Look up a label declaration for flag updates.
    pub fn resolve_mut(&mut self, label: u32) -> Option<&mut StmtLabelDecl> {
        self.decls.get_mut(&label)
    }

    /// Record a reference to a label that is not declared yet. Multiple
    /// pending references may target the same label.
    pub fn declare_forward_reference(&mut self, reference: ForwardRef) {
        self.forward.push(reference);
    }

    /// Remove and return every pending reference to `label`, preserving
    /// declaration order.
    pub fn take_matching_forward_references(&mut self, label: u32) -> Vec<ForwardRef> {
        let mut matched = Vec::new();
        self.forward.retain(|r| {
            if r.label == label {
                matched.push(r.clone());
                false
            } else {
                true
            }
        });
        matched
    }

    /// Drop every pending reference originating from `stmt`.
    ///
    /// Used when a labeled DO is closed through the control-flow stack,
    /// which patches its terminal reference directly.
    pub fn remove_forward_references(&mut self, stmt: StmtId) {
        self.forward.retain(|r| r.stmt != stmt);
    }

    /// Drain all pending references (end of scope).
    pub fn take_pending(&mut self) -> Vec<ForwardRef> {
        std::mem::take(&mut self.forward)
    }

    /// Clear both tables; invoked on entry to a new procedure scope.
    pub fn reset(&mut self) {
        self.decls.clear();
        self.forward.clear();
    }
}
