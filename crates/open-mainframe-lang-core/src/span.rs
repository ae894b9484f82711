//! Source location tracking for error reporting.
//!
//! Every token and AST node carries a [`Span`] locating it in the source.
//! Spans flow from the lexer through the parser into semantic analysis, so
//! that every diagnostic can point at the exact construct it describes.

/// Unique identifier for a source file.
///
/// Distinguishes tokens from different files (main source vs. includes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileId(pub u32);

impl FileId {
    /// The file ID of the main source file.
    pub const MAIN: FileId = FileId(0);
}

/// A contiguous byte range in one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The source file this span belongs to.
    pub file: FileId,
    /// Byte offset of the start of this span (0-indexed).
    pub start: u32,
    /// Byte offset of the end of this span (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// Create a span in the main source file.
    pub fn main(start: u32, end: u32) -> Self {
        Self::new(FileId::MAIN, start, end)
    }

    /// Create an empty span marking a single position.
    pub fn point(file: FileId, pos: u32) -> Self {
        Self::new(file, pos, pos)
    }

    /// Create a dummy span for synthesized nodes.
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Length of this span in bytes.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Whether this span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The smallest span covering both `self` and `other`.
    pub fn extend(self, other: Span) -> Self {
        debug_assert_eq!(self.file, other.file, "cannot extend span across files");
        Self {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
