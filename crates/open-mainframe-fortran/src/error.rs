//! FORTRAN semantic diagnostic kinds.
//!
//! The semantic core never formats message text ad hoc: every condition it
//! can report is a variant here, with structured arguments. The `thiserror`
//! display attribute is the message catalog; the stable code accompanies
//! the rendered text into the diagnostic sink.

use open_mainframe_lang_core::Severity;
use thiserror::Error;

/// Everything the semantic analyzer can report.
///
/// Grouped by family: label errors (F-E1xx), block-structure errors
/// (F-E2xx), type errors (F-E3xx), statement-context errors (F-E4xx),
/// and dialect warnings (F-W9xx).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosticKind {
    // ── Statement labels ───────────────────────────────────────────────
    /// The same label value declared twice in one program unit.
    #[error("duplicate statement label {label}")]
    DuplicateLabel { label: u32 },

    /// A label referenced (GOTO, ASSIGN, DO terminal, format) but never
    /// declared before the program unit ended.
    #[error("use of undeclared statement label {label}")]
    UndeclaredStatementLabel { label: u32 },

    /// A DO's terminal label was already declared above the DO statement.
    #[error("statement label {label} must be declared after the {keyword} statement")]
    StmtLabelMustDeclareAfter { label: u32, keyword: &'static str },

    // ── Block structure ────────────────────────────────────────────────
    /// ELSE IF / ELSE / END IF with no open IF construct.
    #[error("'{keyword}' statement is not inside an IF construct")]
    StmtNotInIf { keyword: &'static str },

    /// END DO with no open block-terminated DO.
    #[error("END DO without a matching DO")]
    EndDoWithoutDo,

    /// A closer supplied a name differing from the opener's.
    #[error("expected construct name '{expected}'")]
    ConstructNameMismatch { expected: String },

    /// A closer supplied a name but the opener is unnamed.
    #[error("construct name '{found}' used on an unnamed construct")]
    InvalidConstructName { found: String },

    /// The statement closing a labeled DO is not a legal loop terminator.
    #[error("invalid terminating statement for a DO loop")]
    InvalidDoTerminatingStmt,

    /// A construct was forcibly closed before its terminator appeared.
    #[error("expected '{keyword}' to terminate this construct")]
    UnterminatedConstruct { keyword: &'static str },

    /// A labeled DO was forcibly closed before its terminal label appeared.
    #[error("expected statement label {label} to terminate the DO loop")]
    UnterminatedLabeledDo { label: u32 },

    // ── Types ──────────────────────────────────────────────────────────
    /// Operand kinds outside the arithmetic lattice for this operator.
    #[error("invalid operands to '{op}' ({lhs} and {rhs})")]
    InvalidOperandType { op: String, lhs: String, rhs: String },

    /// Assignment between kinds with no conversion path.
    #[error("cannot assign a value of type {value} to a variable of type {target}")]
    IncompatibleAssignmentType { target: String, value: String },

    /// Unary operator applied to Character or Logical.
    #[error("invalid operand to unary '{op}' ({operand})")]
    InvalidUnaryOperandType { op: String, operand: String },

    /// IF / ELSE IF / DO WHILE condition that is not Logical.
    #[error("expected a logical expression, found {found}")]
    ExpectedLogicalExpression { found: String },

    /// Computed-GOTO selector that is not Integer.
    #[error("expected an integer expression, found {found}")]
    ExpectedIntegerExpression { found: String },

    /// ASSIGN / assigned-GOTO variable that is not Integer.
    #[error("expected an integer variable, found {found}")]
    ExpectedIntegerVariable { found: String },

    /// DO control expression that is not scalar numeric.
    #[error("expected a scalar numeric expression, found {found}")]
    ExpectedNumericExpression { found: String },

    // ── Statement context ──────────────────────────────────────────────
    /// RETURN outside a function or subroutine body.
    #[error("RETURN statement is only allowed inside a function or subroutine")]
    ReturnOutsideProcedure,

    /// CALL of something that is not a subroutine.
    #[error("CALL requires a subroutine name; '{name}' is a {actual}")]
    CallRequiresSubroutine { name: String, actual: &'static str },

    /// CALL with an argument count differing from the declaration.
    #[error("'{name}' expects {expected} argument(s), found {found}")]
    WrongArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    /// CYCLE / EXIT with no enclosing DO or DO WHILE.
    #[error("'{keyword}' statement is not within a loop")]
    StmtNotInLoop { keyword: &'static str },

    /// CYCLE / EXIT naming a construct that is not an enclosing loop.
    #[error("'{keyword}' statement is not within the loop named '{name}'")]
    StmtNotInNamedLoop { keyword: &'static str, name: String },

    // ── Dialect warnings ───────────────────────────────────────────────
    /// Computed GO TO in a post-FORTRAN-77 dialect.
    #[error("computed GO TO statement is deprecated")]
    DeprecatedComputedGoto,
}

impl DiagnosticKind {
    /// The stable diagnostic code for this kind.
    pub fn code(&self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            DuplicateLabel { .. } => "F-E101",
            UndeclaredStatementLabel { .. } => "F-E102",
            StmtLabelMustDeclareAfter { .. } => "F-E103",
            StmtNotInIf { .. } => "F-E201",
            EndDoWithoutDo => "F-E202",
            ConstructNameMismatch { .. } | InvalidConstructName { .. } => "F-E203",
            InvalidDoTerminatingStmt => "F-E204",
            UnterminatedConstruct { .. } | UnterminatedLabeledDo { .. } => "F-E205",
            InvalidOperandType { .. } => "F-E301",
            IncompatibleAssignmentType { .. } => "F-E302",
            InvalidUnaryOperandType { .. } => "F-E303",
            ExpectedLogicalExpression { .. } => "F-E304",
            ExpectedIntegerExpression { .. } => "F-E305",
            ExpectedIntegerVariable { .. } => "F-E306",
            ExpectedNumericExpression { .. } => "F-E307",
            ReturnOutsideProcedure => "F-E401",
            CallRequiresSubroutine { .. } => "F-E402",
            WrongArgumentCount { .. } => "F-E403",
            StmtNotInLoop { .. } => "F-E404",
            StmtNotInNamedLoop { .. } => "F-E405",
            DeprecatedComputedGoto => "F-W901",
        }
    }

    /// The severity this kind reports at.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::DeprecatedComputedGoto => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Marker returned by an action routine when the current statement could
/// not produce a usable node.
///
/// The diagnostic describing *why* has already been reported through the
/// sink; the caller (the parser) discards the remaining tokens of the
/// statement and moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("statement discarded due to a previous error")]
pub struct StmtError;
