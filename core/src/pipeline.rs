//! End-to-end resolution of a registry document.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::alias::{CommandTable, TagSet, resolve_commands};
use crate::condition::Guard;
use crate::error::{ResolveError, ResolveWarning};
use crate::hierarchy::TypeTable;
use crate::requirements::{apply_extensions, apply_features, finalize_tiers};
use crate::types::{Command, CommandFilter, RegistryDocument, Tier};

/// Default target API identifier.
pub const DEFAULT_API: &str = "vulkan";
/// Default base-version feature whose commands are core.
pub const DEFAULT_BASE_VERSION: &str = "VK_VERSION_1_0";
/// Default device handle type.
pub const DEFAULT_DEVICE_HANDLE: &str = "VkDevice";

/// Knobs for one resolution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Target API for every `api`/`supported` filter.
    pub api: String,
    /// Feature whose guard marks core commands.
    pub base_version: String,
    /// Type whose descendants are loaded through a device handle.
    pub device_handle: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            api: DEFAULT_API.to_string(),
            base_version: DEFAULT_BASE_VERSION.to_string(),
            device_handle: DEFAULT_DEVICE_HANDLE.to_string(),
        }
    }
}

/// Per-tier command counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub core: usize,
    pub instance: usize,
    pub device: usize,
}

/// The annotated command set produced by [`resolve`].
#[derive(Debug, Clone)]
pub struct ResolvedRegistry {
    commands: CommandTable,
    types: TypeTable,
    warnings: Vec<ResolveWarning>,
}

impl ResolvedRegistry {
    /// Commands in registry order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Commands matching `filter`, in registry order.
    pub fn filter(&self, filter: CommandFilter) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(move |command| filter.matches(command))
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    /// Counts commands by [`Tier`].
    pub fn tier_counts(&self) -> TierCounts {
        let mut counts = TierCounts::default();
        for command in self.commands.iter() {
            match command.tier() {
                Tier::Core => counts.core += 1,
                Tier::Instance => counts.instance += 1,
                Tier::Device => counts.device += 1,
            }
        }
        counts
    }
}

/// Resolves a registry document into guarded, tiered commands.
///
/// Runs the stages in order: type table, command/alias resolution, features,
/// extensions, tier finalization.
///
/// # Errors
///
/// Any [`ResolveError`]; the run stops at the first one.
///
/// # Examples
///
/// ```
/// use vk_loadgen_core::*;
///
/// let doc = RegistryDocument {
///     types: vec![TypeDecl::new("VkInstance"), TypeDecl::new("VkDevice")],
///     tags: vec!["KHR".into()],
///     commands: vec![
///         CommandDefinition::new("vkDestroyInstance", "void")
///             .with_param("VkInstance", "instance")
///             .into(),
///         CommandDefinition::new("vkDeviceWaitIdle", "VkResult")
///             .with_param("VkDevice", "device")
///             .into(),
///     ],
///     features: vec![FeatureBlock::new("VK_VERSION_1_0", Some("vulkan"))
///         .with_commands(["vkDestroyInstance", "vkDeviceWaitIdle"])],
///     extensions: vec![],
/// };
///
/// let resolved = resolve(&doc, &ResolveOptions::default()).unwrap();
/// let wait = resolved.get("vkDeviceWaitIdle").unwrap();
/// assert_eq!(wait.requirements.as_str(), "defined(VK_VERSION_1_0)");
/// assert!(wait.core);
/// assert_eq!(wait.scope, Scope::Device);
/// ```
pub fn resolve(
    doc: &RegistryDocument,
    options: &ResolveOptions,
) -> Result<ResolvedRegistry, ResolveError> {
    let types = TypeTable::from_decls(&doc.types, &options.api);
    let tags = TagSet::new(doc.tags.iter().cloned());

    let mut commands = resolve_commands(&doc.commands, &tags, &types, &options.api)?;
    let mut warnings = apply_features(&mut commands, &doc.features, &options.api)?;
    warnings.extend(apply_extensions(&mut commands, &doc.extensions, &options.api)?);

    let base = Guard::defined(&options.base_version);
    warnings.extend(finalize_tiers(&mut commands, &base, &options.device_handle, &types));

    let resolved = ResolvedRegistry {
        commands,
        types,
        warnings,
    };
    let counts = resolved.tier_counts();
    info!(
        api = %options.api,
        commands = resolved.len(),
        core = counts.core,
        instance = counts.instance,
        device = counts.device,
        "Resolved registry"
    );
    let degenerate = resolved
        .warnings
        .iter()
        .filter(|w| matches!(w, ResolveWarning::DegenerateCommand { .. }))
        .count();
    if degenerate > 0 {
        warn!(degenerate, "Some commands could not be tier-classified");
    }
    Ok(resolved)
}
