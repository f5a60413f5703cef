//! Type table and parent-link descent queries.

use std::collections::{HashMap, HashSet};

use crate::types::{TypeDecl, api_matches};

/// Known types keyed by name, each with its declared parents.
///
/// # Examples
///
/// ```
/// use vk_loadgen_core::{TypeDecl, TypeTable};
///
/// let types = TypeTable::from_decls(
///     &[
///         TypeDecl::new("VkInstance"),
///         TypeDecl::new("VkPhysicalDevice").with_parent("VkInstance"),
///         TypeDecl::new("VkDevice").with_parent("VkPhysicalDevice"),
///         TypeDecl::new("VkQueue").with_parent("VkDevice"),
///     ],
///     "vulkan",
/// );
/// assert!(types.is_descendant("VkQueue", "VkDevice"));
/// assert!(!types.is_descendant("VkPhysicalDevice", "VkDevice"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: HashMap<String, Vec<String>>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from declarations admitted by `api`. A later
    /// declaration of the same name replaces an earlier one.
    pub fn from_decls<'a>(decls: impl IntoIterator<Item = &'a TypeDecl>, api: &str) -> Self {
        let mut table = Self::new();
        for decl in decls {
            if api_matches(decl.api.as_deref(), api) {
                table.insert(decl);
            }
        }
        table
    }

    pub fn insert(&mut self, decl: &TypeDecl) {
        self.types.insert(decl.name.clone(), decl.parents.clone());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn parents(&self, name: &str) -> Option<&[String]> {
        self.types.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns `true` if `name` is `base` or reaches it through parent links.
    ///
    /// Unknown names are unrelated to everything except themselves. Each
    /// type is visited at most once per query, so malformed registries with
    /// parent cycles still terminate.
    pub fn is_descendant(&self, name: &str, base: &str) -> bool {
        let mut visited = HashSet::new();
        self.descends(name, base, &mut visited)
    }

    fn descends<'a>(&'a self, name: &'a str, base: &str, visited: &mut HashSet<&'a str>) -> bool {
        if name == base {
            return true;
        }
        if !visited.insert(name) {
            return false;
        }
        let Some(parents) = self.types.get(name) else {
            return false;
        };
        parents
            .iter()
            .any(|parent| self.descends(parent, base, visited))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(decls: &[TypeDecl]) -> TypeTable {
        TypeTable::from_decls(decls, "vulkan")
    }

    #[test]
    fn test_type_is_its_own_descendant() {
        let types = table(&[TypeDecl::new("VkDevice")]);
        assert!(types.is_descendant("VkDevice", "VkDevice"));
        assert!(types.is_descendant("NotDeclared", "NotDeclared"));
    }

    #[test]
    fn test_root_type_is_not_descendant_of_other() {
        let types = table(&[TypeDecl::new("VkInstance"), TypeDecl::new("VkDevice")]);
        assert!(!types.is_descendant("VkInstance", "VkDevice"));
    }

    #[test]
    fn test_unknown_type_is_not_descendant() {
        let types = table(&[TypeDecl::new("VkDevice")]);
        assert!(!types.is_descendant("uint32_t", "VkDevice"));
    }

    #[test]
    fn test_diamond_inheritance() {
        let types = table(&[
            TypeDecl::new("D"),
            TypeDecl::new("B").with_parent("D"),
            TypeDecl::new("C"),
            TypeDecl::new("A").with_parent("B").with_parent("C"),
        ]);
        assert!(types.is_descendant("A", "D"));
        assert!(types.is_descendant("A", "C"));
        assert!(!types.is_descendant("C", "D"));
    }

    #[test]
    fn test_cycle_terminates() {
        let types = table(&[
            TypeDecl::new("A").with_parent("B"),
            TypeDecl::new("B").with_parent("A"),
        ]);
        assert!(!types.is_descendant("A", "VkDevice"));
        assert!(types.is_descendant("A", "B"));
    }

    #[test]
    fn test_missing_parent_is_not_related() {
        let types = table(&[TypeDecl::new("VkSwapchainKHR").with_parent("VkMissing")]);
        assert!(!types.is_descendant("VkSwapchainKHR", "VkDevice"));
    }

    #[test]
    fn test_foreign_api_types_are_skipped() {
        let types = table(&[
            TypeDecl::new("VkDevice"),
            TypeDecl::new("VkScOnly").with_parent("VkDevice").with_api("vulkansc"),
        ]);
        assert!(!types.contains("VkScOnly"));
        assert_eq!(types.len(), 1);
    }
}
