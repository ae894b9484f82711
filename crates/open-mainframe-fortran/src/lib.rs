//! FORTRAN semantic analysis for the OpenMainframe project.
//!
//! This crate provides the statement-level semantic core a FORTRAN
//! front end drives while parsing:
//!
//! - **AST construction** — typed expression trees and an arena of
//!   statement nodes built one action-routine call at a time
//! - **Statement labels** — declaration, duplicate detection, and
//!   forward-reference patch-up for GOTO, ASSIGN, DO terminals, and
//!   FORMAT references
//! - **Control flow** — block IF / ELSE IF / ELSE / END IF and DO /
//!   DO WHILE / END DO matching, including label-terminated DO loops
//!   and forced closes of unterminated constructs
//! - **Types** — an interned scalar type lattice with FORTRAN numeric
//!   promotion and explicit conversion nodes
//!
//! Diagnostics use the shared `open-mainframe-lang-core` types so the
//! driver renders FORTRAN findings the same way as every other
//! language's.

pub mod ast;
pub mod error;
pub mod semantic;

pub use ast::{Expr, ExprKind, ProgramUnit, Stmt, StmtId, StmtKind};
pub use error::{DiagnosticKind, StmtError};
pub use semantic::{
    LangOptions, ProgramUnitKind, Sema, StmtResult, Symbol, SymbolKind, MAX_STMT_LABEL,
};
