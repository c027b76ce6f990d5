//! Identifier interning for the syntax tree.
//!
//! Every `SyntaxTree` owns one `NameInterner`; there is no process-wide
//! table, so trees built on different threads never contend.

use string_interner::{StringInterner, DefaultSymbol, backend::StringBackend, Symbol as SymbolTrait};
use std::fmt;
use serde::{Serialize, Deserialize};

type Backend = StringBackend<DefaultSymbol>;

/// An interned identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name(u32);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Interner mapping identifier text to `Name`s.
#[derive(Debug, Clone)]
pub struct NameInterner {
    interner: StringInterner<Backend>,
}

impl Default for NameInterner {
    fn default() -> Self { Self::new() }
}

impl NameInterner {
    pub fn new() -> Self {
        Self { interner: StringInterner::new() }
    }

    pub fn intern(&mut self, s: &str) -> Name {
        let sym = self.interner.get_or_intern(s);
        Name(sym.to_usize() as u32)
    }

    /// Resolve a name; names from another interner resolve to `None` or garbage.
    pub fn resolve(&self, name: Name) -> Option<&str> {
        let internal = DefaultSymbol::try_from_usize(name.0 as usize)?;
        self.interner.resolve(internal)
    }

    pub fn get(&self, s: &str) -> Option<Name> {
        self.interner.get(s).map(|sym| Name(sym.to_usize() as u32))
    }

    pub fn len(&self) -> usize { self.interner.len() }
    pub fn is_empty(&self) -> bool { self.interner.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interner() {
        let mut interner = NameInterner::new();
        let a = interner.intern("in");
        let b = interner.intern("out");
        let c = interner.intern("in");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(interner.resolve(a), Some("in"));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_get_without_interning() {
        let mut interner = NameInterner::new();
        assert_eq!(interner.get("tmax"), None);
        let t = interner.intern("tmax");
        assert_eq!(interner.get("tmax"), Some(t));
    }
}
