//! FORTRAN abstract syntax tree.
//!
//! Expressions are owned trees (every node typed); statements live in a
//! per-program-unit arena addressed by [`StmtId`] handles so that
//! forward label references can be patched without aliasing node
//! pointers.

mod expressions;
mod statements;

pub use expressions::{BinaryOp, Expr, ExprKind, UnaryOp};
pub use statements::{
    ConstructName, ConstructPart, FormatSpec, LabelRef, Stmt, StmtId, StmtKind,
};

/// A completed program-unit body.
///
/// `stmts` is the arena; `body` lists the top-level statement handles in
/// source order. Nested bodies (IF branches, DO bodies) are handle lists
/// inside their owning statements.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramUnit {
    /// Every statement of the unit, in creation order.
    pub stmts: Vec<Stmt>,
    /// Top-level statements, in source order.
    pub body: Vec<StmtId>,
}

impl ProgramUnit {
    /// Borrow a statement by handle.
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }
}
