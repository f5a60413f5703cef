//! Command table construction and alias resolution.
//!
//! Aliases are resolved after every declaration has been indexed, so an alias
//! may appear before its original in the document and may point at another
//! alias. An alias copies its original's signature; when the two names carry
//! different vendor tags the signature is retagged:
//!
//! 1. **Tag introduction** (`vkFoo` → `vkFooKHR`): each type `T` whose
//!    `T<tag>` is a known type becomes `T<tag>`.
//! 2. **Tag substitution** (`vkFooEXT` → `vkFooKHR`, or to no tag at all):
//!    the old tag is swapped for the new one, once per field, when the
//!    resulting type is known.
//! 3. **Same tag**: the signature is copied verbatim.
//!
//! A retagged type that does not exist in the type table is never emitted;
//! the field keeps its original type instead.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::ResolveError;
use crate::hierarchy::TypeTable;
use crate::types::{Command, CommandDecl, api_matches};

/// Vendor tags in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the first declared tag that `name` ends with.
    ///
    /// # Examples
    ///
    /// ```
    /// use vk_loadgen_core::TagSet;
    ///
    /// let tags = TagSet::new(["KHR", "EXT"]);
    /// assert_eq!(tags.suffix_of("vkCreateSwapchainKHR"), Some("KHR"));
    /// assert_eq!(tags.suffix_of("vkCreateDevice"), None);
    /// ```
    pub fn suffix_of(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .map(String::as_str)
            .find(|tag| !tag.is_empty() && name.ends_with(tag))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Working set of commands: by-name lookup with registry iteration order.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    commands: IndexMap<String, Command>,
    declared: HashSet<String>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a command. A command with the same name keeps its position
    /// and takes the new value.
    pub fn insert(&mut self, command: Command) {
        self.declared.insert(command.name.clone());
        self.commands.insert(command.name.clone(), command);
    }

    /// Records a name as declared by the registry without adding a command,
    /// e.g. a definition scoped to a foreign API.
    pub fn declare(&mut self, name: &str) {
        if !self.declared.contains(name) {
            self.declared.insert(name.to_string());
        }
    }

    /// Removes a command, preserving the order of the remaining entries.
    pub fn remove(&mut self, name: &str) -> Option<Command> {
        self.commands.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.commands.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Returns `true` if the registry declared `name` at any point, even if
    /// it has since been filtered or removed.
    pub fn was_declared(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Command> {
        self.commands.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

/// Builds the command table from declarations, resolving every alias.
///
/// Declarations whose API filter excludes `api` are skipped (but their names
/// still count as declared). Output order is the order in which names first
/// appear in `decls`.
///
/// # Errors
///
/// [`ResolveError::UnknownAliasTarget`] if an alias chain reaches a name
/// with no admitted declaration, [`ResolveError::AliasCycle`] if it loops.
///
/// # Examples
///
/// ```
/// use vk_loadgen_core::*;
///
/// let decls = vec![
///     CommandDecl::from(CommandAlias::new("vkTrimCommandPoolKHR", "vkTrimCommandPool")),
///     CommandDecl::from(
///         CommandDefinition::new("vkTrimCommandPool", "void").with_param("VkDevice", "device"),
///     ),
/// ];
/// let table = resolve_commands(&decls, &TagSet::new(["KHR"]), &TypeTable::new(), "vulkan").unwrap();
/// let names: Vec<_> = table.names().collect();
/// assert_eq!(names, ["vkTrimCommandPoolKHR", "vkTrimCommandPool"]);
/// assert_eq!(table.get("vkTrimCommandPoolKHR").unwrap().canonical_name(), "vkTrimCommandPool");
/// ```
pub fn resolve_commands(
    decls: &[CommandDecl],
    tags: &TagSet,
    types: &TypeTable,
    api: &str,
) -> Result<CommandTable, ResolveError> {
    let mut table = CommandTable::new();
    let mut latest: HashMap<&str, &CommandDecl> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for decl in decls {
        table.declare(decl.name());
        if !api_matches(decl.api(), api) {
            continue;
        }
        if latest.insert(decl.name(), decl).is_none() {
            order.push(decl.name());
        }
    }

    let mut resolver = AliasResolver {
        decls: latest,
        tags,
        types,
        api,
        resolved: HashMap::new(),
    };

    let mut aliases = 0usize;
    for name in order {
        let command = resolver.resolve_name(name, &mut Vec::new())?;
        if command.is_alias() {
            aliases += 1;
        }
        table.insert(command);
    }

    debug!(commands = table.len(), aliases, "Resolved command declarations");
    Ok(table)
}

struct AliasResolver<'a> {
    decls: HashMap<&'a str, &'a CommandDecl>,
    tags: &'a TagSet,
    types: &'a TypeTable,
    api: &'a str,
    resolved: HashMap<&'a str, Command>,
}

impl<'a> AliasResolver<'a> {
    fn resolve_name(
        &mut self,
        name: &'a str,
        stack: &mut Vec<&'a str>,
    ) -> Result<Command, ResolveError> {
        if let Some(command) = self.resolved.get(name) {
            return Ok(command.clone());
        }

        let decl = self.decls.get(name).copied();
        let command = match decl {
            Some(CommandDecl::Definition(def)) => Command::from_definition(def, self.api),
            Some(CommandDecl::Alias(alias)) => {
                if stack.contains(&name) {
                    return Err(ResolveError::AliasCycle {
                        alias: name.to_string(),
                    });
                }
                if !self.decls.contains_key(alias.alias_of.as_str()) {
                    return Err(ResolveError::UnknownAliasTarget {
                        alias: alias.name.clone(),
                        target: alias.alias_of.clone(),
                    });
                }

                stack.push(name);
                let original = self.resolve_name(alias.alias_of.as_str(), stack)?;
                stack.pop();
                self.derive_alias(name, &original)
            }
            None => {
                return Err(ResolveError::UnknownAliasTarget {
                    alias: stack.last().copied().unwrap_or(name).to_string(),
                    target: name.to_string(),
                });
            }
        };

        self.resolved.insert(name, command.clone());
        Ok(command)
    }

    fn derive_alias(&self, name: &str, original: &Command) -> Command {
        let mut command = Command::new(name, original.return_type.clone(), original.params.clone());
        command.alias_chain = std::iter::once(original.name.clone())
            .chain(original.alias_chain.iter().cloned())
            .collect();

        let original_tag = self.tags.suffix_of(&original.name);
        let alias_tag = self.tags.suffix_of(name);
        match (original_tag, alias_tag) {
            (None, Some(tag)) => introduce_tag(&mut command, tag, self.types),
            (Some(from), Some(to)) if from != to => substitute_tag(&mut command, from, to, self.types),
            (Some(from), None) => substitute_tag(&mut command, from, "", self.types),
            _ => {}
        }
        command
    }
}

fn introduce_tag(command: &mut Command, tag: &str, types: &TypeTable) {
    let tagged = format!("{}{tag}", command.return_type);
    if types.contains(&tagged) {
        command.return_type = tagged;
    }

    for param in &mut command.params {
        let tagged = format!("{}{tag}", param.type_name);
        if types.contains(&tagged) {
            param.retype(tagged);
        }
    }
}

fn substitute_tag(command: &mut Command, from: &str, to: &str, types: &TypeTable) {
    if let Some(swapped) = swap_tag(&command.return_type, from, to, types) {
        command.return_type = swapped;
    }

    for param in &mut command.params {
        if let Some(swapped) = swap_tag(&param.type_name, from, to, types) {
            param.retype(swapped);
        }
    }
}

fn swap_tag(type_name: &str, from: &str, to: &str, types: &TypeTable) -> Option<String> {
    if !type_name.contains(from) {
        return None;
    }
    let swapped = type_name.replacen(from, to, 1);
    types.contains(&swapped).then_some(swapped)
}
