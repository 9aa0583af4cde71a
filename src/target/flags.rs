//! Flag bits understood by the embedded interpreter
//!
//! Values match the classic interpreter constants so that flag integers
//! passed through from host code keep their meaning.

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign};

/// Bit set of evaluation, variable-access and trace flags
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(i32);

impl Flags {
    pub const NONE: Self = Self(0);
    pub const GLOBAL_ONLY: Self = Self(1);
    pub const NAMESPACE_ONLY: Self = Self(2);
    pub const APPEND_VALUE: Self = Self(4);
    pub const LIST_ELEMENT: Self = Self(8);
    pub const TRACE_READS: Self = Self(0x10);
    pub const TRACE_WRITES: Self = Self(0x20);
    pub const TRACE_UNSETS: Self = Self(0x40);
    pub const TRACE_DESTROYED: Self = Self(0x80);
    pub const INTERP_DESTROYED: Self = Self(0x100);
    pub const LEAVE_ERR_MSG: Self = Self(0x200);
    pub const TRACE_ARRAY: Self = Self(0x800);
    pub const TRACE_RESULT_DYNAMIC: Self = Self(0x8000);
    pub const EVAL_GLOBAL: Self = Self(0x20000);
    pub const EVAL_DIRECT: Self = Self(0x40000);

    /// Trace operations a registration can ask for
    pub const TRACE_OPS: Self = Self(0x10 | 0x20 | 0x40 | 0x800);

    /// Scope bits that survive into trace callbacks
    const SCOPE: Self = Self(1 | 2);

    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> i32 {
        self.0
    }

    /// True when every bit of `other` is set in `self`
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set in `self`
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub(crate) const fn scope(self) -> Self {
        Self(self.0 & Self::SCOPE.0)
    }
}

impl BitOr for Flags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for Flags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Flags {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl From<i32> for Flags {
    fn from(bits: i32) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[(Flags, &str)] = &[
            (Flags::GLOBAL_ONLY, "GLOBAL_ONLY"),
            (Flags::NAMESPACE_ONLY, "NAMESPACE_ONLY"),
            (Flags::APPEND_VALUE, "APPEND_VALUE"),
            (Flags::LIST_ELEMENT, "LIST_ELEMENT"),
            (Flags::TRACE_READS, "TRACE_READS"),
            (Flags::TRACE_WRITES, "TRACE_WRITES"),
            (Flags::TRACE_UNSETS, "TRACE_UNSETS"),
            (Flags::TRACE_DESTROYED, "TRACE_DESTROYED"),
            (Flags::INTERP_DESTROYED, "INTERP_DESTROYED"),
            (Flags::LEAVE_ERR_MSG, "LEAVE_ERR_MSG"),
            (Flags::TRACE_ARRAY, "TRACE_ARRAY"),
            (Flags::TRACE_RESULT_DYNAMIC, "TRACE_RESULT_DYNAMIC"),
            (Flags::EVAL_GLOBAL, "EVAL_GLOBAL"),
            (Flags::EVAL_DIRECT, "EVAL_DIRECT"),
        ];

        if self.is_empty() {
            return write!(f, "Flags(NONE)");
        }
        let mut rest = *self;
        let mut first = true;
        write!(f, "Flags(")?;
        for (flag, name) in NAMES {
            if self.contains(*flag) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{}", name)?;
                rest = rest.without(*flag);
                first = false;
            }
        }
        if !rest.is_empty() {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{:#x}", rest.0)?;
        }
        write!(f, ")")
    }
}
