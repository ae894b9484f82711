//! Statement types for the FORTRAN AST.
//!
//! Statements live in a per-program-unit arena and refer to each other
//! through [`StmtId`] handles. Cross-statement links (a GOTO's target, a
//! DO's terminating statement) are [`LabelRef`]s: the label value is
//! recorded immediately, the target handle is patched in when the labeled
//! statement is declared.

use open_mainframe_lang_core::Span;

use super::expressions::Expr;

/// Handle to a statement in the program-unit arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId(pub u32);

/// A reference to a statement label.
///
/// `target` is `None` while the reference is still forward (the labeled
/// statement has not been seen yet); resolution patches it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRef {
    /// The referenced label value.
    pub label: u32,
    /// The referenced statement, once declared.
    pub target: Option<StmtId>,
    /// Where the reference appears.
    pub span: Span,
}

impl LabelRef {
    /// Create an unresolved reference to `label`.
    pub fn unresolved(label: u32, span: Span) -> Self {
        Self {
            label,
            target: None,
            span,
        }
    }

    /// Create a reference already resolved to `target`.
    pub fn resolved(label: u32, target: StmtId, span: Span) -> Self {
        Self {
            label,
            target: Some(target),
            span,
        }
    }
}

/// Optional identifier naming a block construct.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructName {
    /// The name, if one was written.
    pub name: Option<String>,
    /// Where the name (or the statement, if unnamed) appears.
    pub span: Span,
}

impl ConstructName {
    /// An absent construct name.
    pub fn none(span: Span) -> Self {
        Self { name: None, span }
    }

    /// A present construct name.
    pub fn named(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: Some(name.into()),
            span,
        }
    }

    /// Whether a name was written.
    pub fn is_usable(&self) -> bool {
        self.name.is_some()
    }
}

/// The closing part of a block construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructPart {
    Else,
    EndIf,
    EndDo,
}

impl ConstructPart {
    /// Keyword spelling for diagnostics.
    pub fn keyword(&self) -> &'static str {
        match self {
            ConstructPart::Else => "ELSE",
            ConstructPart::EndIf => "END IF",
            ConstructPart::EndDo => "END DO",
        }
    }
}

/// PRINT format specifier.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatSpec {
    /// List-directed, `PRINT *`.
    Star,
    /// A FORMAT statement label; participates in label resolution.
    Label(LabelRef),
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// What the statement is.
    pub kind: StmtKind,
    /// The statement's own label, if it carries one.
    pub label: Option<u32>,
    /// Source span.
    pub span: Span,
}

/// The closed set of statement kinds this core builds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `variable = expr`
    Assignment { target: Expr, value: Expr },
    /// `ASSIGN label TO var`
    Assign { address: LabelRef, var: Expr },
    /// `GO TO label`
    Goto { destination: LabelRef },
    /// `GO TO var (label-list)`
    AssignedGoto { var: Expr, allowed: Vec<LabelRef> },
    /// `GO TO (label-list) selector`
    ComputedGoto {
        targets: Vec<LabelRef>,
        selector: Expr,
    },
    /// Block IF (also carries the nested representation of ELSE IF: the
    /// ELSE-IF arm is a fresh `If` stored as the sole statement of
    /// `else_body`).
    If {
        condition: Expr,
        name: ConstructName,
        then_body: Vec<StmtId>,
        else_body: Option<Vec<StmtId>>,
    },
    /// `DO [label] var = init, limit [, step]`
    Do {
        var: Expr,
        init: Expr,
        limit: Expr,
        step: Option<Expr>,
        /// Terminal label of a label-terminated DO.
        terminal: Option<LabelRef>,
        name: ConstructName,
        body: Vec<StmtId>,
    },
    /// `DO WHILE (condition)`
    DoWhile {
        condition: Expr,
        name: ConstructName,
        body: Vec<StmtId>,
    },
    /// ELSE / END IF / END DO marker statement.
    Part {
        part: ConstructPart,
        name: ConstructName,
    },
    /// `CONTINUE`
    Continue,
    /// `STOP [code]`
    Stop { code: Option<Expr> },
    /// `RETURN [expr]`
    Return { value: Option<Expr> },
    /// `CALL name (args)`
    Call { name: String, args: Vec<Expr> },
    /// `CYCLE [name]`
    Cycle {
        name: ConstructName,
        /// The loop being cycled, resolved against the open-construct stack.
        loop_stmt: Option<StmtId>,
    },
    /// `EXIT [name]`
    Exit {
        name: ConstructName,
        loop_stmt: Option<StmtId>,
    },
    /// `PRINT format [, items]`
    Print {
        format: FormatSpec,
        items: Vec<Expr>,
    },
}

impl Stmt {
    /// The construct name, for kinds that can open a named block.
    pub fn construct_name(&self) -> Option<&ConstructName> {
        match &self.kind {
            StmtKind::If { name, .. }
            | StmtKind::Do { name, .. }
            | StmtKind::DoWhile { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether this statement opens a loop construct.
    pub fn is_loop(&self) -> bool {
        matches!(self.kind, StmtKind::Do { .. } | StmtKind::DoWhile { .. })
    }
}
