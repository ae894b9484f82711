//! FORTRAN semantic analysis.
//!
//! [`Sema`] is the action-routine interface the parser drives: one call
//! per reduced statement, in source order. Each call type-checks the
//! statement's expressions, resolves statement-label and construct
//! references, and places a finished node in the program-unit arena.
//! Malformed statements are reported through the diagnostic sink and
//! analysis continues; only statements that cannot produce a usable node
//! return [`StmtError`].

mod blocks;
mod expr;
mod labels;
mod statements;
pub mod types;

use std::collections::HashMap;

use open_mainframe_lang_core::{Diagnostic, DiagnosticSink, Severity, Span};

use crate::ast::{FormatSpec, ProgramUnit, Stmt, StmtId, StmtKind};
use crate::error::{DiagnosticKind, StmtError};

use blocks::BlockBuilder;
use labels::StmtLabelScope;
use types::TypeContext;

pub use labels::MAX_STMT_LABEL;

/// Result of an action routine: the produced statement's handle, or a
/// marker that the statement was discarded after a reported error.
pub type StmtResult = Result<StmtId, StmtError>;

/// Dialect switches affecting analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct LangOptions {
    /// Accept strict FORTRAN 77 source; disables the deprecation
    /// warnings that later dialects attach to legacy control flow.
    pub fortran77: bool,
}

/// The kind of program unit being analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramUnitKind {
    MainProgram,
    Subroutine,
    Function,
}

/// What a name in the current unit refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Subroutine,
    Function,
    StatementFunction,
    Intrinsic,
}

impl SymbolKind {
    /// Noun phrase for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Subroutine => "subroutine",
            SymbolKind::Function => "function",
            SymbolKind::StatementFunction => "statement function",
            SymbolKind::Intrinsic => "intrinsic function",
        }
    }
}

/// A declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Declared argument count, for callable symbols whose interface is
    /// known.
    pub arg_count: Option<usize>,
}

/// Semantic analyzer state for one compilation session.
///
/// The type context persists across program units; labels, the block
/// builder, and the symbol table reset on [`enter_program_unit`].
///
/// [`enter_program_unit`]: Self::enter_program_unit
#[derive(Debug, Default)]
pub struct Sema {
    /// Session-wide type interning context.
    pub context: TypeContext,
    /// Destination for every reported diagnostic.
    pub diags: DiagnosticSink,
    labels: StmtLabelScope,
    body: BlockBuilder,
    symbols: HashMap<String, Symbol>,
    unit: Option<ProgramUnitKind>,
    options: LangOptions,
}

impl Sema {
    pub fn new(options: LangOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Borrow a statement produced earlier in the current unit.
    pub fn statement(&self, id: StmtId) -> &Stmt {
        self.body.get(id)
    }

    /// Record what a name refers to (entry declarations, specification
    /// statements, intrinsics).
    pub fn declare_symbol(&mut self, name: impl Into<String>, symbol: Symbol) {
        self.symbols.insert(name.into(), symbol);
    }

    pub(crate) fn lookup_symbol(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    pub(crate) fn in_procedure(&self) -> bool {
        matches!(
            self.unit,
            Some(ProgramUnitKind::Subroutine | ProgramUnitKind::Function)
        )
    }

    pub(crate) fn dialect_warnings(&self) -> bool {
        !self.options.fortran77
    }

    /// Start a new program unit, discarding all per-unit state.
    pub fn enter_program_unit(&mut self, kind: ProgramUnitKind) {
        self.labels.reset();
        self.body = BlockBuilder::new();
        self.symbols.clear();
        self.unit = Some(kind);
    }

    /// Close the current program unit and hand back its body.
    ///
    /// Constructs still open are reported as unterminated and closed,
    /// innermost first; label references never satisfied are reported at
    /// the site of each reference.
    pub fn finish_program_unit(&mut self) -> ProgramUnit {
        while self.body.has_entered() {
            self.report_unterminated_last();
            self.body.leave();
        }
        for unresolved in self.labels.take_pending() {
            self.report(
                unresolved.span,
                DiagnosticKind::UndeclaredStatementLabel {
                    label: unresolved.label,
                },
            );
        }
        self.unit = None;
        let (stmts, body) = self.body.finish();
        ProgramUnit { stmts, body }
    }

    /// Render a structured kind into the sink.
    pub(crate) fn report(&mut self, span: Span, kind: DiagnosticKind) {
        let diagnostic = match kind.severity() {
            Severity::Warning => Diagnostic::warning(kind.code(), kind.to_string(), span),
            _ => Diagnostic::error(kind.code(), kind.to_string(), span),
        };
        self.diags.report(diagnostic);
    }

    pub(crate) fn report_with_note(
        &mut self,
        span: Span,
        kind: DiagnosticKind,
        note_span: Span,
        note: &str,
    ) {
        let diagnostic = match kind.severity() {
            Severity::Warning => Diagnostic::warning(kind.code(), kind.to_string(), span),
            _ => Diagnostic::error(kind.code(), kind.to_string(), span),
        };
        self.diags.report(diagnostic.with_note(note_span, note));
    }

    /// Declare statement label `value` on the statement `id`.
    ///
    /// Ordering matters: duplicate detection first, then labeled-DO
    /// termination (the declaring statement may close loops waiting for
    /// this label), then the declaration itself, then the patch-up of
    /// every forward reference that was waiting for it.
    pub(crate) fn declare_statement_label(&mut self, value: u32, span: Span, id: StmtId) {
        if let Some(previous) = self.labels.resolve(value) {
            let previous_span = previous.span;
            self.report_with_note(
                span,
                DiagnosticKind::DuplicateLabel { label: value },
                previous_span,
                "previous definition here",
            );
            return;
        }

        let terminated_do = self.check_statement_label_end_do(value, id, span);
        self.labels.declare(value, id, span);

        let waiting = self.labels.take_matching_forward_references(value);
        let mut used_as_goto = false;
        let mut used_as_assign = false;
        for reference in waiting {
            match &mut self.body.get_mut(reference.stmt).kind {
                StmtKind::Goto { destination } => {
                    if destination.label == value {
                        destination.target = Some(id);
                    }
                    used_as_goto = true;
                }
                StmtKind::Assign { address, .. } => {
                    if address.label == value {
                        address.target = Some(id);
                    }
                    used_as_assign = true;
                }
                StmtKind::AssignedGoto { allowed, .. } => {
                    if let Some(r) = reference.operand.and_then(|i| allowed.get_mut(i)) {
                        if r.label == value {
                            r.target = Some(id);
                        }
                    }
                    used_as_goto = true;
                }
                StmtKind::ComputedGoto { targets, .. } => {
                    if let Some(r) = reference.operand.and_then(|i| targets.get_mut(i)) {
                        if r.label == value {
                            r.target = Some(id);
                        }
                    }
                    used_as_goto = true;
                }
                // A DO force-closed before its terminal arrived still
                // holds a pending terminal reference; patch it late.
                StmtKind::Do {
                    terminal: Some(t), ..
                } => {
                    if t.label == value {
                        t.target = Some(id);
                    }
                }
                StmtKind::Print {
                    format: FormatSpec::Label(r),
                    ..
                } => {
                    if r.label == value {
                        r.target = Some(id);
                    }
                }
                _ => {}
            }
        }

        if let Some(declaration) = self.labels.resolve_mut(value) {
            declaration.used_as_goto_target |= used_as_goto;
            declaration.used_as_assign_target |= used_as_assign;
            declaration.used_as_end_do_target |= terminated_do;
        }
    }
}
