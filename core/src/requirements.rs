//! Requirement accumulation and tier finalization.
//!
//! Features are applied first: an applicable feature sets `defined(<name>)`
//! on every command it requires (overwriting, so the latest version wins),
//! and a feature for a foreign API strips its commands from the working set.
//! Extensions are applied next, OR-ing their guards onto whatever the command
//! already carries. A command that only extensions for another API name is
//! stripped the same way. Tiers are decided last, once every guard is final.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::alias::CommandTable;
use crate::condition::{Guard, compile};
use crate::error::{ResolveError, ResolveWarning};
use crate::hierarchy::TypeTable;
use crate::types::{ExtensionBlock, FeatureBlock, Scope, api_matches};

/// Applies feature blocks in order.
///
/// # Errors
///
/// [`ResolveError::UnknownFeatureCommand`] when a feature names a command
/// the registry never declared. Commands that were declared but already
/// removed (or scoped to a foreign API) are skipped and reported as
/// [`ResolveWarning::UnavailableCommand`].
pub fn apply_features(
    table: &mut CommandTable,
    features: &[FeatureBlock],
    api: &str,
) -> Result<Vec<ResolveWarning>, ResolveError> {
    let mut warnings = Vec::new();
    for feature in features {
        if !api_matches(feature.api.as_deref(), api) {
            let mut removed = 0usize;
            for name in &feature.require {
                if remove_command(table, feature, name)? {
                    removed += 1;
                }
            }
            debug!(feature = %feature.name, removed, "Stripped commands of foreign feature");
            continue;
        }

        let guard = Guard::defined(&feature.name);
        for name in &feature.require {
            if let Some(command) = table.get_mut(name) {
                command.requirements = guard.clone();
                continue;
            }
            if !table.was_declared(name) {
                return Err(ResolveError::UnknownFeatureCommand {
                    feature: feature.name.clone(),
                    command: name.clone(),
                });
            }
            warnings.push(unavailable(&feature.name, name));
        }

        for name in &feature.remove {
            remove_command(table, feature, name)?;
        }
        debug!(feature = %feature.name, commands = feature.require.len(), "Applied feature");
    }
    Ok(warnings)
}

fn unavailable(requirer: &str, command: &str) -> ResolveWarning {
    warn!(requirer, command, "Skipping command outside the working set");
    ResolveWarning::UnavailableCommand {
        requirer: requirer.to_string(),
        command: command.to_string(),
    }
}

fn remove_command(
    table: &mut CommandTable,
    feature: &FeatureBlock,
    name: &str,
) -> Result<bool, ResolveError> {
    if table.remove(name).is_some() {
        return Ok(true);
    }
    if table.was_declared(name) {
        return Ok(false);
    }
    Err(ResolveError::UnknownFeatureCommand {
        feature: feature.name.clone(),
        command: name.to_string(),
    })
}

/// Guard for an extension as a whole: `defined(<name>)`, AND-ed with its
/// compiled `depends` expression when it has one.
///
/// ```
/// use vk_loadgen_core::{ExtensionBlock, extension_guard};
///
/// let ext = ExtensionBlock::new("VK_KHR_swapchain").with_depends("VK_KHR_surface");
/// assert_eq!(
///     extension_guard(&ext).as_str(),
///     "defined(VK_KHR_swapchain) && (defined(VK_KHR_surface))"
/// );
/// ```
pub fn extension_guard(extension: &ExtensionBlock) -> Guard {
    let depends = compile(extension.depends.as_deref().unwrap_or_default());
    if depends.is_always() {
        Guard::defined(&extension.name)
    } else {
        Guard::from(format!("defined({}) && ({depends})", extension.name))
    }
}

fn block_guard(extension_guard: &Guard, depends: Option<&str>) -> Guard {
    extension_guard.and(&compile(depends.unwrap_or_default()))
}

/// Applies extension blocks in order.
///
/// Extensions that do not support `api`, and require blocks whose `api`
/// excludes it, contribute no guard. Commands they name that end the pass
/// still unguarded exist only for another API and are removed.
///
/// # Errors
///
/// [`ResolveError::UnknownExtensionCommand`] when an extension names a
/// command the registry never declared.
pub fn apply_extensions(
    table: &mut CommandTable,
    extensions: &[ExtensionBlock],
    api: &str,
) -> Result<Vec<ResolveWarning>, ResolveError> {
    let mut warnings = Vec::new();
    let mut foreign: HashSet<&str> = HashSet::new();

    for extension in extensions {
        if !extension.is_supported(api) {
            debug!(extension = %extension.name, "Skipping extension for another API");
            foreign.extend(extension.requires.iter().flat_map(|b| b.commands.iter().map(String::as_str)));
            continue;
        }

        let ext_guard = extension_guard(extension);
        for block in &extension.requires {
            if !api_matches(block.api.as_deref(), api) {
                foreign.extend(block.commands.iter().map(String::as_str));
                continue;
            }

            let guard = block_guard(&ext_guard, block.depends.as_deref());
            for name in &block.commands {
                if let Some(command) = table.get_mut(name) {
                    command.requirements = command.requirements.or(&guard);
                    command.instance_hint |= extension.is_instance();
                    continue;
                }
                if !table.was_declared(name) {
                    return Err(ResolveError::UnknownExtensionCommand {
                        extension: extension.name.clone(),
                        command: name.clone(),
                    });
                }
                warnings.push(unavailable(&extension.name, name));
            }
        }
    }

    let mut stripped = 0usize;
    for name in foreign {
        if table.get(name).is_some_and(|command| command.requirements.is_always()) {
            table.remove(name);
            stripped += 1;
        }
    }
    if stripped > 0 {
        debug!(stripped, "Stripped commands required only for another API");
    }
    Ok(warnings)
}

/// Decides `core` and the loading scope of every command.
///
/// `core` holds when the guard equals `base`. The scope is
/// [`Scope::Device`] when the first parameter's type descends from
/// `device_handle`, otherwise [`Scope::Instance`]. Commands without
/// parameters fall back to the instance scope.
pub fn finalize_tiers(
    table: &mut CommandTable,
    base: &Guard,
    device_handle: &str,
    types: &TypeTable,
) -> Vec<ResolveWarning> {
    let mut warnings = Vec::new();

    for command in table.iter_mut() {
        command.core = command.requirements == *base;
        command.scope = match command.first_param_type() {
            Some(first) if types.is_descendant(first, device_handle) => Scope::Device,
            Some(_) => Scope::Instance,
            None => {
                warn!(command = %command.name, "Command has no parameters; using instance scope");
                warnings.push(ResolveWarning::DegenerateCommand {
                    command: command.name.clone(),
                });
                Scope::Instance
            }
        };

        if command.requirements.is_always() {
            debug!(command = %command.name, "Command is not required by any feature or extension");
            warnings.push(ResolveWarning::UnrequiredCommand {
                command: command.name.clone(),
            });
        }
    }

    warnings
}
