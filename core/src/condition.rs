//! Dependency-expression compilation and compiled guards.
//!
//! Registry `depends` attributes use bare identifiers joined by `,` (any of)
//! and `+` (all of). [`compile`] rewrites such an expression into a C
//! preprocessor condition, wrapping every identifier in `defined(...)`:
//!
//! ```
//! use vk_loadgen_core::compile;
//!
//! let guard = compile("VK_KHR_surface,VK_VERSION_1_1+VK_KHR_swapchain");
//! assert_eq!(
//!     guard.as_str(),
//!     "defined(VK_KHR_surface) || defined(VK_VERSION_1_1) && defined(VK_KHR_swapchain)"
//! );
//! assert!(compile("").is_always());
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("static regex must compile"));

/// A compiled availability condition.
///
/// The empty guard means "always available" and compares unequal to every
/// compiled expression, so it forms its own emission region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guard(String);

impl Guard {
    /// The unconditional guard.
    pub fn always() -> Self {
        Self(String::new())
    }

    /// Guard on a single flag being defined, e.g. `defined(VK_VERSION_1_0)`.
    pub fn defined(flag: &str) -> Self {
        Self(format!("defined({flag})"))
    }

    /// Returns `true` for the unconditional guard.
    pub fn is_always(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Combines two guards as `(self) || (other)`.
    ///
    /// An empty `self` counts as "not yet required" rather than "always", so
    /// the result is just `other`. This is the accumulation rule used when
    /// several features and extensions name the same command.
    ///
    /// ```
    /// use vk_loadgen_core::Guard;
    ///
    /// let first = Guard::always().or(&Guard::defined("E1"));
    /// assert_eq!(first.as_str(), "defined(E1)");
    ///
    /// let merged = first.or(&Guard::defined("E2"));
    /// assert_eq!(merged.as_str(), "(defined(E1)) || (defined(E2))");
    /// ```
    pub fn or(&self, other: &Guard) -> Guard {
        if self.is_always() {
            return other.clone();
        }
        Guard(format!("({}) || ({})", self.0, other.0))
    }

    /// Combines two guards as `(self) && (other)`; an empty side drops out.
    pub fn and(&self, other: &Guard) -> Guard {
        match (self.is_always(), other.is_always()) {
            (_, true) => self.clone(),
            (true, false) => other.clone(),
            (false, false) => Guard(format!("({}) && ({})", self.0, other.0)),
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Guard {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Guard {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Compiles a raw dependency expression into a [`Guard`].
///
/// Identifiers keep their left-to-right order; `,` becomes `||` and `+`
/// becomes `&&`. Parentheses already present in the expression pass through
/// untouched, and C operator precedence gives `+` the tighter binding.
pub fn compile(expr: &str) -> Guard {
    let expr = expr.trim();
    if expr.is_empty() {
        return Guard::always();
    }

    let wrapped = IDENTIFIER_RE.replace_all(expr, "defined($0)");
    Guard(wrapped.replace(',', " || ").replace('+', " && "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_single_identifier() {
        assert_eq!(compile("VK_KHR_surface").as_str(), "defined(VK_KHR_surface)");
    }

    #[test]
    fn test_compile_or_and_keeps_identifier_order() {
        assert_eq!(
            compile("A,B+C").as_str(),
            "defined(A) || defined(B) && defined(C)"
        );
    }

    #[test]
    fn test_compile_passes_parentheses_through() {
        assert_eq!(
            compile("(VK_KHR_get_physical_device_properties2,VK_VERSION_1_1)+VK_KHR_surface")
                .as_str(),
            "(defined(VK_KHR_get_physical_device_properties2) || defined(VK_VERSION_1_1)) && defined(VK_KHR_surface)"
        );
    }

    #[test]
    fn test_and_skips_empty_side() {
        let ext = Guard::defined("E");
        assert_eq!(ext.and(&Guard::always()), ext);
        assert_eq!(Guard::always().and(&ext), ext);
        assert_eq!(ext.and(&compile("D")).as_str(), "(defined(E)) && (defined(D))");
    }

    #[test]
    fn test_compile_empty_is_always() {
        assert!(compile("").is_always());
        assert!(compile("   ").is_always());
        assert_eq!(compile(""), Guard::always());
    }

    #[test]
    fn test_or_on_unassigned_takes_other() {
        let guard = Guard::always().or(&Guard::defined("VK_VERSION_1_1"));
        assert_eq!(guard, Guard::defined("VK_VERSION_1_1"));
    }

    #[test]
    fn test_or_wraps_both_sides() {
        let guard = Guard::defined("VK_VERSION_1_1").or(&Guard::from("defined(A) && (defined(B))"));
        assert_eq!(
            guard.as_str(),
            "(defined(VK_VERSION_1_1)) || (defined(A) && (defined(B)))"
        );
    }

    #[test]
    fn test_always_differs_from_compiled() {
        assert_ne!(Guard::always(), Guard::defined("X"));
        assert_eq!(Guard::always().to_string(), "");
    }
}
