//! Shared types for OpenMainframe language compilers.
//!
//! This crate provides the foundational building blocks that the language
//! compiler crates in the OpenMainframe workspace share:
//!
//! - **Source location tracking**: [`Span`], [`FileId`]
//! - **Diagnostics**: [`Diagnostic`], [`Severity`], [`Note`], [`DiagnosticSink`]
//!
//! # Design Principles
//!
//! - **Zero dependencies**: This crate has no external dependencies. It
//!   contains only plain Rust types. Language crates add `thiserror` on top
//!   for their structured diagnostic kinds.
//! - **Structured, not formatted**: a semantic analyzer selects a diagnostic
//!   kind and supplies arguments; the rendered message and any secondary
//!   notes ("previous definition here") travel through [`Diagnostic`] so
//!   front-end tooling can display them with source context.

mod diagnostic;
mod span;

pub use diagnostic::{Diagnostic, DiagnosticSink, Note, Severity};
pub use span::{FileId, Span};
