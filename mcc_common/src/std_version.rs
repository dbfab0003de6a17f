//! The configured C standard, shared by the preprocessor (`__STDC_VERSION__`,
//! predefined macros) and the parser (feature gating).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CStd {
    C89,
    C99,
    C11,
    C17,
    C23,
}

impl CStd {
    /// The integer `__STDC_VERSION__` expands to (C89 predates the macro
    /// and leaves it undefined; callers should check for that case).
    pub fn stdc_version(self) -> Option<&'static str> {
        match self {
            CStd::C89 => None,
            CStd::C99 => Some("199901L"),
            CStd::C11 => Some("201112L"),
            CStd::C17 => Some("201710L"),
            CStd::C23 => Some("202311L"),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "c89" | "c90" | "ansi" => CStd::C89,
            "c99" => CStd::C99,
            "c11" => CStd::C11,
            "c17" | "c18" => CStd::C17,
            "c23" => CStd::C23,
            _ => return None,
        })
    }

    pub fn at_least(self, other: CStd) -> bool {
        self >= other
    }
}

impl fmt::Display for CStd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CStd::C89 => "c89",
            CStd::C99 => "c99",
            CStd::C11 => "c11",
            CStd::C17 => "c17",
            CStd::C23 => "c23",
        };
        write!(f, "{s}")
    }
}

impl Default for CStd {
    fn default() -> Self {
        CStd::C17
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_reflects_standard_age() {
        assert!(CStd::C23.at_least(CStd::C11));
        assert!(!CStd::C89.at_least(CStd::C99));
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(CStd::parse("c17"), Some(CStd::C17));
        assert_eq!(CStd::parse("c18"), Some(CStd::C17));
        assert_eq!(CStd::parse("bogus"), None);
    }
}
