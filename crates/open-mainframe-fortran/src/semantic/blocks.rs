//! Control-flow block construction.
//!
//! [`BlockBuilder`] owns the statement arena for the current program unit
//! and a stack of open block constructs (block IF, DO, DO WHILE). Every
//! produced statement is appended to the body of the innermost open
//! construct; closing a construct attaches the collected body to its
//! opener node in the arena.
//!
//! The `Sema` methods here implement the forced-close discipline: when a
//! closer arrives that matches an outer construct, every inner construct
//! still open is reported as unterminated and closed first, innermost
//! first, so one malformed nesting yields one diagnostic per construct.

use open_mainframe_lang_core::Span;

use crate::ast::{ConstructName, Stmt, StmtId, StmtKind};
use crate::error::DiagnosticKind;

use super::Sema;

/// One open block construct.
#[derive(Debug)]
pub struct ControlFlowEntry {
    /// The opener statement (an IF, DO, or DO WHILE node).
    pub stmt: StmtId,
    /// For a label-terminated DO, the terminal label it is waiting for.
    pub expected_end_do_label: Option<u32>,
    /// Statements collected for the currently open body.
    pub body: Vec<StmtId>,
    /// For an IF entry: the ELSE arm is being collected.
    pub in_else: bool,
}

/// Statement arena plus the open-construct stack for one program unit.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    stmts: Vec<Stmt>,
    top_level: Vec<StmtId>,
    stack: Vec<ControlFlowEntry>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a statement in the arena and return its handle.
    pub fn alloc(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    /// Append a statement handle to the innermost open body.
    pub fn append(&mut self, id: StmtId) {
        match self.stack.last_mut() {
            Some(entry) => entry.body.push(id),
            None => self.top_level.push(id),
        }
    }

    /// Open a block construct rooted at `stmt`.
    pub fn enter(&mut self, stmt: StmtId, expected_end_do_label: Option<u32>) {
        self.stack.push(ControlFlowEntry {
            stmt,
            expected_end_do_label,
            body: Vec::new(),
            in_else: false,
        });
    }

    /// Close the innermost construct, attaching its collected body to the
    /// opener node.
    pub fn leave(&mut self) {
        let entry = match self.stack.pop() {
            Some(entry) => entry,
            None => return,
        };
        match &mut self.stmts[entry.stmt.0 as usize].kind {
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => {
                if entry.in_else {
                    *else_body = Some(entry.body);
                } else {
                    *then_body = entry.body;
                }
            }
            StmtKind::Do { body, .. } | StmtKind::DoWhile { body, .. } => {
                *body = entry.body;
            }
            _ => {}
        }
    }

    /// Seal the THEN arm of the innermost IF and start collecting its
    /// ELSE arm.
    pub fn leave_if_then(&mut self) {
        let entry = match self.stack.last_mut() {
            Some(entry) => entry,
            None => return,
        };
        let body = std::mem::take(&mut entry.body);
        entry.in_else = true;
        if let StmtKind::If { then_body, .. } = &mut self.stmts[entry.stmt.0 as usize].kind {
            *then_body = body;
        }
    }

    /// Remove `id` from the innermost open body, if it was the most
    /// recently appended statement. Used when a just-produced statement
    /// turns out to be owned by an enclosing node (logical IF).
    pub fn retract(&mut self, id: StmtId) {
        let body = match self.stack.last_mut() {
            Some(entry) => &mut entry.body,
            None => &mut self.top_level,
        };
        if body.last() == Some(&id) {
            body.pop();
        }
    }

    /// Whether any construct is open.
    pub fn has_entered(&self) -> bool {
        !self.stack.is_empty()
    }

    /// The innermost open construct.
    pub fn last_entry(&self) -> Option<&ControlFlowEntry> {
        self.stack.last()
    }

    /// All open constructs, outermost first.
    pub fn entries(&self) -> &[ControlFlowEntry] {
        &self.stack
    }

    /// Borrow an arena statement.
    pub fn get(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    /// Borrow an arena statement for patching.
    pub fn get_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.0 as usize]
    }

    /// Take the completed arena and top-level body, leaving the builder
    /// empty for the next unit.
    pub fn finish(&mut self) -> (Vec<Stmt>, Vec<StmtId>) {
        self.stack.clear();
        (
            std::mem::take(&mut self.stmts),
            std::mem::take(&mut self.top_level),
        )
    }
}

impl Sema {
    /// Report the innermost open construct as unterminated.
    pub(super) fn report_unterminated_last(&mut self) {
        let (opener, expected_label) = match self.body.last_entry() {
            Some(entry) => (entry.stmt, entry.expected_end_do_label),
            None => return,
        };
        let stmt = self.body.get(opener);
        let span = stmt.span;
        let kind = match (&stmt.kind, expected_label) {
            (StmtKind::Do { .. }, Some(label)) => DiagnosticKind::UnterminatedLabeledDo { label },
            (StmtKind::Do { .. } | StmtKind::DoWhile { .. }, _) => {
                DiagnosticKind::UnterminatedConstruct { keyword: "END DO" }
            }
            _ => DiagnosticKind::UnterminatedConstruct { keyword: "END IF" },
        };
        self.report(span, kind);
    }

    /// Close inner constructs until an IF entry is innermost; each one
    /// closed on the way is reported as unterminated. Returns the IF's
    /// opener handle without closing it.
    pub(super) fn leave_blocks_until_if(&mut self) -> Option<StmtId> {
        loop {
            let entry = self.body.last_entry()?;
            let opener = entry.stmt;
            if matches!(self.body.get(opener).kind, StmtKind::If { .. }) {
                return Some(opener);
            }
            self.report_unterminated_last();
            self.body.leave();
        }
    }

    /// Close inner constructs until a block DO or DO WHILE entry is
    /// innermost. Label-terminated DO entries are never END DO
    /// candidates; any encountered on the way are force-closed as
    /// unterminated.
    pub(super) fn leave_blocks_until_do(&mut self) -> Option<StmtId> {
        loop {
            let entry = self.body.last_entry()?;
            let opener = entry.stmt;
            if entry.expected_end_do_label.is_none() && self.body.get(opener).is_loop() {
                return Some(opener);
            }
            self.report_unterminated_last();
            self.body.leave();
        }
    }

    /// Close inner constructs until the labeled DO waiting for `label` is
    /// innermost.
    fn leave_blocks_until_labeled_do(&mut self, label: u32) -> Option<StmtId> {
        loop {
            let entry = self.body.last_entry()?;
            if entry.expected_end_do_label == Some(label) {
                return Some(entry.stmt);
            }
            self.report_unterminated_last();
            self.body.leave();
        }
    }

    /// Whether any open construct is a labeled DO waiting for `label`.
    pub(super) fn is_in_labeled_do(&self, label: u32) -> bool {
        self.body
            .entries()
            .iter()
            .any(|e| e.expected_end_do_label == Some(label))
    }

    /// Find the loop a CYCLE or EXIT refers to: the innermost open loop,
    /// or the innermost open loop carrying `name` when one is given.
    pub(super) fn find_enclosing_loop(&self, name: &ConstructName) -> Option<StmtId> {
        self.body
            .entries()
            .iter()
            .rev()
            .map(|e| e.stmt)
            .find(|&id| {
                let stmt = self.body.get(id);
                if !stmt.is_loop() {
                    return false;
                }
                match &name.name {
                    Some(wanted) => stmt
                        .construct_name()
                        .and_then(|n| n.name.as_deref())
                        .is_some_and(|n| n == wanted),
                    None => true,
                }
            })
    }

    /// Check a closer's construct name against the opener it closes.
    ///
    /// A closer may always omit the name, even when the opener carries
    /// one; a name it does supply must match the opener's exactly.
    pub(super) fn check_construct_name_match(&mut self, given: &ConstructName, opener: StmtId) {
        let found = match &given.name {
            Some(found) => found.clone(),
            None => return,
        };
        let opener_stmt = self.body.get(opener);
        let opener_name_span = opener_stmt
            .construct_name()
            .map(|n| n.span)
            .unwrap_or(opener_stmt.span);
        match opener_stmt.construct_name().and_then(|n| n.name.clone()) {
            Some(expected) if found == expected => {}
            Some(expected) => self.report_with_note(
                given.span,
                DiagnosticKind::ConstructNameMismatch { expected },
                opener_name_span,
                "matching construct here",
            ),
            None => self.report_with_note(
                given.span,
                DiagnosticKind::InvalidConstructName { found },
                opener_name_span,
                "matching construct here",
            ),
        }
    }

    /// Whether the statement may legally terminate a labeled DO loop.
    ///
    /// Control transfers, STOP, RETURN, block openers, and the IF-side
    /// closers cannot end a loop; END DO can. A logical IF can too, as
    /// long as its controlled statement could itself end one.
    pub(super) fn is_valid_do_terminator(&self, id: StmtId) -> bool {
        use crate::ast::ConstructPart;
        match &self.body.get(id).kind {
            StmtKind::Part {
                part: ConstructPart::EndDo,
                ..
            } => true,
            StmtKind::Goto { .. }
            | StmtKind::AssignedGoto { .. }
            | StmtKind::Stop { .. }
            | StmtKind::Return { .. }
            | StmtKind::Do { .. }
            | StmtKind::DoWhile { .. }
            | StmtKind::Part { .. } => false,
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => {
                if else_body.is_some() {
                    return false;
                }
                match then_body.first() {
                    Some(&inner) => !matches!(
                        self.body.get(inner).kind,
                        StmtKind::Do { .. }
                            | StmtKind::DoWhile { .. }
                            | StmtKind::If { .. }
                            | StmtKind::Part { .. }
                    ),
                    None => false,
                }
            }
            _ => true,
        }
    }

    /// Close every labeled DO waiting for `label`, using the statement
    /// being declared as their shared terminal.
    ///
    /// Nested loops sharing one terminal label all close here, innermost
    /// outward; terminator legality is checked once for the group.
    /// Returns whether any loop was closed.
    pub(super) fn check_statement_label_end_do(
        &mut self,
        label: u32,
        terminal: StmtId,
        span: Span,
    ) -> bool {
        if !self.body.has_entered() {
            return false;
        }
        let mut closed = false;
        while self.is_in_labeled_do(label) {
            let do_id = match self.leave_blocks_until_labeled_do(label) {
                Some(id) => id,
                None => break,
            };
            // The DO's own terminal reference is patched directly; the
            // generic forward-reference pass must not touch it again.
            self.labels.remove_forward_references(do_id);
            if !closed {
                if !self.is_valid_do_terminator(terminal) {
                    self.report(span, DiagnosticKind::InvalidDoTerminatingStmt);
                }
                closed = true;
            }
            if let StmtKind::Do {
                terminal: Some(t), ..
            } = &mut self.body.get_mut(do_id).kind
            {
                t.target = Some(terminal);
            }
            self.body.leave();
        }
        closed
    }
}
