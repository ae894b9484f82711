//! FORTRAN scalar type lattice and interning context.
//!
//! Types are interned: two requests describing the same base kind and
//! qualifiers yield the same [`QualType`] handle, so handle equality is
//! type identity. The [`TypeContext`] lives for the whole compilation
//! session and is never reset between program units.

use std::collections::HashMap;
use std::fmt;

/// Base scalar kind of a FORTRAN type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    /// INTEGER.
    Integer,
    /// REAL (single precision by default).
    Real,
    /// COMPLEX.
    Complex,
    /// CHARACTER.
    Character,
    /// LOGICAL.
    Logical,
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinKind::Integer => write!(f, "INTEGER"),
            BuiltinKind::Real => write!(f, "REAL"),
            BuiltinKind::Complex => write!(f, "COMPLEX"),
            BuiltinKind::Character => write!(f, "CHARACTER"),
            BuiltinKind::Logical => write!(f, "LOGICAL"),
        }
    }
}

/// CHARACTER length selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharLen {
    /// Default length (1).
    Default,
    /// Fixed declared length.
    Fixed(u32),
    /// Assumed length, `CHARACTER*(*)`.
    Assumed,
}

/// Extended qualifiers layered over a base kind.
///
/// A type with no qualifiers is its own canonical form; qualified forms
/// record the canonical handle they extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtQuals {
    /// Kind selector: byte width (1/2/4/8 for INTEGER, 4/8/16 for
    /// REAL/COMPLEX). `None` means the default kind.
    pub kind_width: Option<u8>,
    /// Spelled DOUBLE PRECISION (REAL with kind 8 and this flag set).
    pub double_precision: bool,
    /// Length selector, CHARACTER only.
    pub char_len: CharLen,
}

impl ExtQuals {
    /// Qualifiers selecting only a kind width.
    pub fn width(width: u8) -> Self {
        Self {
            kind_width: Some(width),
            double_precision: false,
            char_len: CharLen::Default,
        }
    }
}

/// Interned handle to a type.
///
/// Copyable and comparable; two handles are equal exactly when they
/// denote the same interned type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualType(u32);

#[derive(Debug)]
struct TypeRecord {
    base: BuiltinKind,
    ext: Option<ExtQuals>,
    /// The unqualified form of this type (itself, if unqualified).
    canonical: QualType,
}

/// Session-scoped type interning table.
///
/// Owns every type created during a compilation session. The default
/// (canonical) form of each builtin kind is created eagerly; qualified
/// forms are created on demand and memoized by structural identity.
#[derive(Debug)]
pub struct TypeContext {
    records: Vec<TypeRecord>,
    interned: HashMap<(BuiltinKind, Option<ExtQuals>), QualType>,

    /// Default INTEGER.
    pub integer: QualType,
    /// Default REAL.
    pub real: QualType,
    /// DOUBLE PRECISION (REAL kind 8, double-precision spelling).
    pub double_precision: QualType,
    /// Default COMPLEX.
    pub complex: QualType,
    /// DOUBLE COMPLEX (COMPLEX kind 8).
    pub double_complex: QualType,
    /// Default CHARACTER.
    pub character: QualType,
    /// Default LOGICAL.
    pub logical: QualType,
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeContext {
    /// Create a fresh context with the builtin defaults interned.
    pub fn new() -> Self {
        let mut ctx = Self {
            records: Vec::new(),
            interned: HashMap::new(),
            integer: QualType(0),
            real: QualType(0),
            double_precision: QualType(0),
            complex: QualType(0),
            double_complex: QualType(0),
            character: QualType(0),
            logical: QualType(0),
        };
        ctx.integer = ctx.get_builtin(BuiltinKind::Integer);
        ctx.real = ctx.get_builtin(BuiltinKind::Real);
        ctx.double_precision = ctx.get_ext(
            BuiltinKind::Real,
            ExtQuals {
                kind_width: Some(8),
                double_precision: true,
                char_len: CharLen::Default,
            },
        );
        ctx.complex = ctx.get_builtin(BuiltinKind::Complex);
        ctx.double_complex = ctx.get_ext(BuiltinKind::Complex, ExtQuals::width(8));
        ctx.character = ctx.get_builtin(BuiltinKind::Character);
        ctx.logical = ctx.get_builtin(BuiltinKind::Logical);
        ctx
    }

    fn intern(&mut self, base: BuiltinKind, ext: Option<ExtQuals>) -> QualType {
        if let Some(&ty) = self.interned.get(&(base, ext)) {
            return ty;
        }
        // Qualified forms point back at the canonical unqualified form,
        // which is created first when missing.
        let canonical = match ext {
            None => QualType(self.records.len() as u32),
            Some(_) => self.intern(base, None),
        };
        let ty = QualType(self.records.len() as u32);
        self.records.push(TypeRecord {
            base,
            ext,
            canonical,
        });
        self.interned.insert((base, ext), ty);
        ty
    }

    /// The canonical (unqualified) type for a base kind.
    pub fn get_builtin(&mut self, base: BuiltinKind) -> QualType {
        self.intern(base, None)
    }

    /// The interned type for a base kind with extended qualifiers.
    pub fn get_ext(&mut self, base: BuiltinKind, ext: ExtQuals) -> QualType {
        self.intern(base, Some(ext))
    }

    /// A CHARACTER type with the given length selector.
    pub fn get_character(&mut self, len: CharLen) -> QualType {
        match len {
            CharLen::Default => self.character,
            _ => self.get_ext(
                BuiltinKind::Character,
                ExtQuals {
                    kind_width: None,
                    double_precision: false,
                    char_len: len,
                },
            ),
        }
    }

    /// Base kind of a type.
    pub fn base_kind(&self, ty: QualType) -> BuiltinKind {
        self.records[ty.0 as usize].base
    }

    /// Extended qualifiers of a type, if any.
    pub fn ext_quals(&self, ty: QualType) -> Option<ExtQuals> {
        self.records[ty.0 as usize].ext
    }

    /// The canonical unqualified form of a type.
    pub fn canonical(&self, ty: QualType) -> QualType {
        self.records[ty.0 as usize].canonical
    }

    /// Effective kind width in bytes (default widths: INTEGER 4, REAL 4,
    /// COMPLEX 4, LOGICAL 4, CHARACTER 1).
    pub fn kind_width(&self, ty: QualType) -> u8 {
        let rec = &self.records[ty.0 as usize];
        if let Some(ext) = rec.ext {
            if let Some(w) = ext.kind_width {
                return w;
            }
        }
        match rec.base {
            BuiltinKind::Character => 1,
            _ => 4,
        }
    }

    pub fn is_integer(&self, ty: QualType) -> bool {
        self.base_kind(ty) == BuiltinKind::Integer
    }

    pub fn is_real(&self, ty: QualType) -> bool {
        self.base_kind(ty) == BuiltinKind::Real
    }

    pub fn is_complex(&self, ty: QualType) -> bool {
        self.base_kind(ty) == BuiltinKind::Complex
    }

    pub fn is_character(&self, ty: QualType) -> bool {
        self.base_kind(ty) == BuiltinKind::Character
    }

    pub fn is_logical(&self, ty: QualType) -> bool {
        self.base_kind(ty) == BuiltinKind::Logical
    }

    /// Whether the type participates in arithmetic promotion.
    pub fn is_numeric(&self, ty: QualType) -> bool {
        matches!(
            self.base_kind(ty),
            BuiltinKind::Integer | BuiltinKind::Real | BuiltinKind::Complex
        )
    }

    /// Position of a numeric type in the promotion order, weakest first:
    /// INTEGER < REAL < DOUBLE PRECISION < REAL(16) < COMPLEX <
    /// DOUBLE COMPLEX < COMPLEX(16). `None` for non-numeric types.
    pub fn promotion_rank(&self, ty: QualType) -> Option<u8> {
        let width_step = match self.kind_width(ty) {
            w if w <= 4 => 0,
            8 => 1,
            _ => 2,
        };
        match self.base_kind(ty) {
            BuiltinKind::Integer => Some(0),
            BuiltinKind::Real => Some(1 + width_step),
            BuiltinKind::Complex => Some(4 + width_step),
            BuiltinKind::Character | BuiltinKind::Logical => None,
        }
    }

    /// The stronger of two numeric types per the promotion order.
    ///
    /// Equal ranks prefer the left-hand type. `None` if either side does
    /// not participate in arithmetic.
    pub fn promoted_type(&self, a: QualType, b: QualType) -> Option<QualType> {
        let ra = self.promotion_rank(a)?;
        let rb = self.promotion_rank(b)?;
        Some(if rb > ra { b } else { a })
    }

    /// The COMPLEX type whose parts have the kind of `element`.
    ///
    /// Mirrors the element-type relationship both ways: the default REAL
    /// maps to the default COMPLEX, REAL kind 8 to DOUBLE COMPLEX, and so
    /// on.
    pub fn complex_of(&mut self, element: QualType) -> QualType {
        debug_assert!(self.is_real(element));
        match self.kind_width(element) {
            w if w <= 4 => self.complex,
            8 => self.double_complex,
            _ => self.get_ext(BuiltinKind::Complex, ExtQuals::width(16)),
        }
    }

    /// Render a type for diagnostics, e.g. `REAL(8)` or `CHARACTER*(*)`.
    pub fn display(&self, ty: QualType) -> String {
        let base = self.base_kind(ty);
        match self.ext_quals(ty) {
            None => base.to_string(),
            Some(ext) => {
                if ext.double_precision {
                    return "DOUBLE PRECISION".to_string();
                }
                if base == BuiltinKind::Character {
                    return match ext.char_len {
                        CharLen::Default => base.to_string(),
                        CharLen::Fixed(n) => format!("CHARACTER*{n}"),
                        CharLen::Assumed => "CHARACTER*(*)".to_string(),
                    };
                }
                match ext.kind_width {
                    Some(w) => format!("{base}({w})"),
                    None => base.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_returns_identical_handles() {
        let mut ctx = TypeContext::new();
        let a = ctx.get_ext(BuiltinKind::Real, ExtQuals::width(8));
        let b = ctx.get_ext(BuiltinKind::Real, ExtQuals::width(8));
        assert_eq!(a, b);
        assert_ne!(a, ctx.real);
    }

    #[test]
    fn test_canonical_form_exists() {
        let mut ctx = TypeContext::new();
        let wide = ctx.get_ext(BuiltinKind::Integer, ExtQuals::width(8));
        assert_eq!(ctx.canonical(wide), ctx.integer);
        assert_eq!(ctx.canonical(ctx.integer), ctx.integer);
    }

    #[test]
    fn test_promotion_order() {
        let ctx = TypeContext::new();
        let ranks: Vec<_> = [ctx.integer, ctx.real, ctx.double_precision, ctx.complex, ctx.double_complex]
            .iter()
            .map(|&t| ctx.promotion_rank(t).unwrap())
            .collect();
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ranks, sorted, "promotion order must be strictly increasing");
    }

    #[test]
    fn test_logical_and_character_have_no_rank() {
        let ctx = TypeContext::new();
        assert_eq!(ctx.promotion_rank(ctx.logical), None);
        assert_eq!(ctx.promotion_rank(ctx.character), None);
        assert_eq!(ctx.promoted_type(ctx.integer, ctx.logical), None);
    }

    #[test]
    fn test_promoted_type_picks_stronger() {
        let ctx = TypeContext::new();
        assert_eq!(
            ctx.promoted_type(ctx.integer, ctx.double_precision),
            Some(ctx.double_precision)
        );
        assert_eq!(
            ctx.promoted_type(ctx.double_complex, ctx.real),
            Some(ctx.double_complex)
        );
    }

    #[test]
    fn test_complex_of_element_kind() {
        let mut ctx = TypeContext::new();
        assert_eq!(ctx.complex_of(ctx.real), ctx.complex);
        assert_eq!(ctx.complex_of(ctx.double_precision), ctx.double_complex);
    }

    #[test]
    fn test_display() {
        let mut ctx = TypeContext::new();
        assert_eq!(ctx.display(ctx.integer), "INTEGER");
        assert_eq!(ctx.display(ctx.double_precision), "DOUBLE PRECISION");
        let c10 = ctx.get_character(CharLen::Fixed(10));
        assert_eq!(ctx.display(c10), "CHARACTER*10");
        let i8 = ctx.get_ext(BuiltinKind::Integer, ExtQuals::width(8));
        assert_eq!(ctx.display(i8), "INTEGER(8)");
    }
}
