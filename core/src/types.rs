//! Registry model types.
//!
//! Two layers live here. The declaration types ([`RegistryDocument`],
//! [`TypeDecl`], [`CommandDecl`], [`FeatureBlock`], [`ExtensionBlock`]) are what
//! a registry source hands to the pipeline: raw entries in document order,
//! still carrying their API filters. The resolved types ([`Command`],
//! [`Param`]) are what the pipeline produces and annotates with a guard and a
//! loading tier.
//!
//! All types serialize with [`serde`], so a parsed registry can be dumped and
//! reloaded as JSON for fixtures.

use serde::{Deserialize, Serialize};

use crate::condition::Guard;

/// Return type that suppresses the `return` keyword in emitted trampolines.
pub const VOID_TYPE: &str = "void";

/// Returns `true` if an optional comma-separated API filter admits `api`.
///
/// A missing filter admits every API.
///
/// # Examples
///
/// ```
/// use vk_loadgen_core::api_matches;
///
/// assert!(api_matches(None, "vulkan"));
/// assert!(api_matches(Some("vulkan,vulkansc"), "vulkan"));
/// assert!(!api_matches(Some("vulkansc"), "vulkan"));
/// ```
pub fn api_matches(filter: Option<&str>, api: &str) -> bool {
    match filter {
        None => true,
        Some(list) => list.split(',').any(|entry| entry.trim() == api),
    }
}

/// A type declaration with its directly declared parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            api: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = Some(api.into());
        self
    }
}

/// A resolved command parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter identifier (e.g. `pCreateInfo`).
    pub name: String,
    /// Declared type name (e.g. `VkInstanceCreateInfo`).
    #[serde(rename = "type")]
    pub type_name: String,
    /// Full declaration text (e.g. `const VkInstanceCreateInfo* pCreateInfo`).
    pub full_name: String,
}

impl Param {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            full_name: full_name.into(),
        }
    }

    /// Changes the declared type, rewriting its first occurrence in the full
    /// declaration text as well.
    pub(crate) fn retype(&mut self, new_type: String) {
        self.full_name = self.full_name.replacen(&self.type_name, &new_type, 1);
        self.type_name = new_type;
    }
}

/// A parameter as declared, with its optional API filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    #[serde(flatten)]
    pub param: Param,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
}

impl From<Param> for ParamDecl {
    fn from(param: Param) -> Self {
        Self { param, api: None }
    }
}

/// A full command definition (`<proto>` plus `<param>`s).
///
/// # Examples
///
/// ```
/// use vk_loadgen_core::CommandDefinition;
///
/// let def = CommandDefinition::new("vkDestroyDevice", "void")
///     .with_param("VkDevice", "device")
///     .with_param("const VkAllocationCallbacks*", "pAllocator");
/// assert_eq!(def.params.len(), 2);
/// assert_eq!(def.params[1].param.type_name, "VkAllocationCallbacks");
/// assert_eq!(def.params[1].param.full_name, "const VkAllocationCallbacks* pAllocator");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    pub return_type: String,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            params: Vec::new(),
            api: None,
        }
    }

    /// Appends a parameter written as `<declaration> <name>`.
    ///
    /// The bare type is the declaration with `const` and pointer stars
    /// stripped, which covers the shapes used in test fixtures. Use
    /// [`with_param_decl`](Self::with_param_decl) for anything else.
    pub fn with_param(mut self, declaration: &str, name: &str) -> Self {
        let type_name = declaration
            .split_whitespace()
            .filter(|word| *word != "const" && *word != "struct")
            .map(|word| word.trim_end_matches('*'))
            .find(|word| !word.is_empty())
            .unwrap_or(declaration)
            .to_string();
        self.params.push(ParamDecl::from(Param::new(
            name,
            type_name,
            format!("{declaration} {name}"),
        )));
        self
    }

    pub fn with_param_decl(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = Some(api.into());
        self
    }
}

/// A command declared as another name for an existing command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAlias {
    pub name: String,
    pub alias_of: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
}

impl CommandAlias {
    pub fn new(name: impl Into<String>, alias_of: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias_of: alias_of.into(),
            api: None,
        }
    }
}

/// One entry of the registry's command list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandDecl {
    Definition(CommandDefinition),
    Alias(CommandAlias),
}

impl CommandDecl {
    pub fn name(&self) -> &str {
        match self {
            CommandDecl::Definition(def) => &def.name,
            CommandDecl::Alias(alias) => &alias.name,
        }
    }

    pub fn api(&self) -> Option<&str> {
        match self {
            CommandDecl::Definition(def) => def.api.as_deref(),
            CommandDecl::Alias(alias) => alias.api.as_deref(),
        }
    }
}

impl From<CommandDefinition> for CommandDecl {
    fn from(def: CommandDefinition) -> Self {
        CommandDecl::Definition(def)
    }
}

impl From<CommandAlias> for CommandDecl {
    fn from(alias: CommandAlias) -> Self {
        CommandDecl::Alias(alias)
    }
}

/// A versioned feature block (e.g. `VK_VERSION_1_1`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureBlock {
    pub name: String,
    /// Comma-separated APIs this feature belongs to; `None` means all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    /// Declared version number (e.g. `"1.1"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Commands listed in `<require>` blocks, in document order.
    #[serde(default)]
    pub require: Vec<String>,
    /// Commands listed in `<remove>` blocks, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

impl FeatureBlock {
    pub fn new(name: impl Into<String>, api: Option<&str>) -> Self {
        Self {
            name: name.into(),
            api: api.map(String::from),
            ..Self::default()
        }
    }

    pub fn with_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require.extend(commands.into_iter().map(Into::into));
        self
    }
}

/// A `<require>` block inside an extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequireBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    #[serde(default)]
    pub commands: Vec<String>,
}

impl RequireBlock {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            depends: None,
            api: None,
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_depends(mut self, depends: impl Into<String>) -> Self {
        self.depends = Some(depends.into());
        self
    }
}

/// An extension block (e.g. `VK_KHR_swapchain`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionBlock {
    pub name: String,
    /// Extension type: `"instance"` or `"device"`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ext_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends: Option<String>,
    /// Comma-separated `supported` list (`vulkan`, `vulkansc`, `disabled`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported: Option<String>,
    #[serde(default)]
    pub requires: Vec<RequireBlock>,
}

impl ExtensionBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, ext_type: impl Into<String>) -> Self {
        self.ext_type = Some(ext_type.into());
        self
    }

    pub fn with_depends(mut self, depends: impl Into<String>) -> Self {
        self.depends = Some(depends.into());
        self
    }

    pub fn with_require(mut self, block: RequireBlock) -> Self {
        self.requires.push(block);
        self
    }

    /// Returns `true` for extensions of type `instance`.
    pub fn is_instance(&self) -> bool {
        self.ext_type.as_deref() == Some("instance")
    }

    /// Returns `false` only when `supported` lists real APIs and none of
    /// them is `api`. Disabled extensions still count as supported: their
    /// guards name macros that are never defined.
    pub fn is_supported(&self, api: &str) -> bool {
        match self.supported.as_deref() {
            None => true,
            Some(list) => {
                let mut apis = list.split(',').map(str::trim);
                apis.clone().any(|entry| entry == "disabled") || apis.any(|entry| entry == api)
            }
        }
    }
}

/// Everything a registry source supplies, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub commands: Vec<CommandDecl>,
    #[serde(default)]
    pub features: Vec<FeatureBlock>,
    #[serde(default)]
    pub extensions: Vec<ExtensionBlock>,
}

/// Which handle a non-core command is loaded through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Instance,
    Device,
}

/// Runtime tier that loads a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Resolved once from the dynamic library.
    Core,
    /// Resolved from an instance handle.
    Instance,
    /// Resolved from a device handle.
    Device,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Core => "core",
            Tier::Instance => "instance",
            Tier::Device => "device",
        }
    }
}

/// A resolved command with its availability guard and loading tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub return_type: String,
    pub params: Vec<Param>,
    /// Compiled availability guard; empty until a feature or extension
    /// names the command.
    pub requirements: Guard,
    /// `true` iff `requirements` is exactly the base-version guard.
    pub core: bool,
    /// Handle the command is loaded through, from the first parameter's type.
    pub scope: Scope,
    /// Named by at least one instance-type extension.
    ///
    /// Informational only: `scope` alone decides how the command is loaded.
    /// Reported by `inspect` in the JSON and YAML formats.
    pub instance_hint: bool,
    /// Originals this command aliases, nearest first; empty for definitions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias_chain: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            params,
            requirements: Guard::always(),
            core: false,
            scope: Scope::Instance,
            instance_hint: false,
            alias_chain: Vec::new(),
        }
    }

    /// Builds the resolved form of a definition, dropping params whose API
    /// filter excludes `api`.
    pub fn from_definition(def: &CommandDefinition, api: &str) -> Self {
        let params = def
            .params
            .iter()
            .filter(|decl| api_matches(decl.api.as_deref(), api))
            .map(|decl| decl.param.clone())
            .collect();
        Self::new(def.name.clone(), def.return_type.clone(), params)
    }

    /// Type of the first parameter, the tier discriminant.
    pub fn first_param_type(&self) -> Option<&str> {
        self.params.first().map(|param| param.type_name.as_str())
    }

    pub fn returns_void(&self) -> bool {
        self.return_type == VOID_TYPE
    }

    /// The definition this command ultimately renames, or its own name.
    pub fn canonical_name(&self) -> &str {
        self.alias_chain.last().map_or(self.name.as_str(), String::as_str)
    }

    pub fn is_alias(&self) -> bool {
        !self.alias_chain.is_empty()
    }

    pub fn tier(&self) -> Tier {
        match (self.core, self.scope) {
            (true, _) => Tier::Core,
            (false, Scope::Instance) => Tier::Instance,
            (false, Scope::Device) => Tier::Device,
        }
    }
}

/// Order-preserving selection of commands for one emission pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandFilter {
    #[default]
    All,
    /// Commands guarded by exactly the base version.
    Core,
    /// Every command not loaded through a device handle, core included.
    Instance,
    /// Commands loaded through a device handle.
    Device,
}

impl CommandFilter {
    pub fn matches(&self, command: &Command) -> bool {
        match self {
            CommandFilter::All => true,
            CommandFilter::Core => command.core,
            CommandFilter::Instance => command.scope == Scope::Instance,
            CommandFilter::Device => command.scope == Scope::Device,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_param_extracts_bare_type() {
        let def = CommandDefinition::new("vkCreateInstance", "VkResult")
            .with_param("const VkInstanceCreateInfo*", "pCreateInfo")
            .with_param("VkInstance*", "pInstance");
        assert_eq!(def.params[0].param.type_name, "VkInstanceCreateInfo");
        assert_eq!(def.params[1].param.type_name, "VkInstance");
        assert_eq!(def.params[1].param.full_name, "VkInstance* pInstance");
    }

    #[test]
    fn test_from_definition_filters_params_by_api() {
        let def = CommandDefinition::new("vkFoo", "void")
            .with_param("VkDevice", "device")
            .with_param_decl(ParamDecl {
                param: Param::new("pScOnly", "uint32_t", "uint32_t pScOnly"),
                api: Some("vulkansc".into()),
            });
        let command = Command::from_definition(&def, "vulkan");
        assert_eq!(command.params.len(), 1);
        assert_eq!(command.first_param_type(), Some("VkDevice"));
    }

    #[test]
    fn test_extension_supported() {
        let mut ext = ExtensionBlock::new("VK_KHR_surface");
        assert!(ext.is_supported("vulkan"));
        ext.supported = Some("vulkan,vulkansc".into());
        assert!(ext.is_supported("vulkan"));
        ext.supported = Some("vulkansc".into());
        assert!(!ext.is_supported("vulkan"));
        ext.supported = Some("disabled".into());
        assert!(ext.is_supported("vulkan"));
    }

    #[test]
    fn test_tier_prefers_core() {
        let mut command = Command::new("vkDestroyDevice", "void", Vec::new());
        command.scope = Scope::Device;
        assert_eq!(command.tier(), Tier::Device);
        command.core = true;
        assert_eq!(command.tier(), Tier::Core);
    }

    #[test]
    fn test_command_decl_json_shape() {
        let decl = CommandDecl::from(CommandAlias::new("vkFooKHR", "vkFoo"));
        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["kind"], "alias");
        assert_eq!(json["alias_of"], "vkFoo");
        let back: CommandDecl = serde_json::from_value(json).unwrap();
        assert_eq!(back.name(), "vkFooKHR");
    }
}
