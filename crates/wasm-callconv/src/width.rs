use std::fmt;

/// Bit width of a value or of the part of a register a value occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
    W128,
}

impl Width {
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 => 4,
            Width::W64 => 8,
            Width::W128 => 16,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bytes() * 8
    }

    /// Width of a value occupying `bytes` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is not 1, 2, 4, 8 or 16. Sizes come from the
    /// classifier, so any other value is an internal bug.
    #[must_use]
    pub fn for_bytes(bytes: u32) -> Width {
        match bytes {
            1 => Width::W8,
            2 => Width::W16,
            4 => Width::W32,
            8 => Width::W64,
            16 => Width::W128,
            _ => panic!("no width for a {bytes}-byte value"),
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.bits())
    }
}
