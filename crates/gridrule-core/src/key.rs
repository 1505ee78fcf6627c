//! Cell and entity-type keys.
//!
//! A [`CellKey`] names both a level cell value and an entity type: a level
//! cell whose value matches a registered rulesheet's key spawns an entity of
//! that type. Keys are either numeric or symbolic so that levels authored as
//! character maps and levels authored as number grids share one type.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// CellKey
// ---------------------------------------------------------------------------

/// A level cell value / entity type key.
///
/// Serializes untagged: numbers map to [`CellKey::Num`], strings to
/// [`CellKey::Sym`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellKey {
    /// Numeric key (e.g. tile ids from a number grid).
    Num(i64),
    /// Symbolic key (e.g. `"#"` from a character map).
    Sym(String),
}

impl CellKey {
    /// Build a symbolic key.
    pub fn sym(name: impl Into<String>) -> Self {
        CellKey::Sym(name.into())
    }

    /// The symbol, if this is a symbolic key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellKey::Sym(s) => Some(s),
            CellKey::Num(_) => None,
        }
    }

    /// The number, if this is a numeric key.
    pub fn as_num(&self) -> Option<i64> {
        match self {
            CellKey::Num(n) => Some(*n),
            CellKey::Sym(_) => None,
        }
    }
}

impl From<char> for CellKey {
    fn from(c: char) -> Self {
        CellKey::Sym(c.to_string())
    }
}

impl From<&str> for CellKey {
    fn from(s: &str) -> Self {
        CellKey::Sym(s.to_owned())
    }
}

impl From<String> for CellKey {
    fn from(s: String) -> Self {
        CellKey::Sym(s)
    }
}

impl From<i64> for CellKey {
    fn from(n: i64) -> Self {
        CellKey::Num(n)
    }
}

impl From<i32> for CellKey {
    fn from(n: i32) -> Self {
        CellKey::Num(i64::from(n))
    }
}

impl fmt::Debug for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKey::Num(n) => write!(f, "{n}"),
            CellKey::Sym(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKey::Num(n) => write!(f, "{n}"),
            CellKey::Sym(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_and_str_keys_are_equal() {
        assert_eq!(CellKey::from('#'), CellKey::from("#"));
        assert_ne!(CellKey::from('1'), CellKey::from(1));
    }

    #[test]
    fn untagged_serde() {
        let keys: Vec<CellKey> = serde_json::from_str(r##"[1, "#", -3]"##).unwrap();
        assert_eq!(
            keys,
            vec![CellKey::Num(1), CellKey::sym("#"), CellKey::Num(-3)]
        );
        assert_eq!(serde_json::to_string(&CellKey::sym("@")).unwrap(), r#""@""#);
    }

    #[test]
    fn display_is_bare() {
        assert_eq!(CellKey::from('#').to_string(), "#");
        assert_eq!(CellKey::from(42).to_string(), "42");
        assert_eq!(format!("{:?}", CellKey::from('#')), "\"#\"");
    }
}
