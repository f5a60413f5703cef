//! Output formatting for resolved commands and resolution summaries.

use serde::Serialize;
use vk_loadgen_core::{Command, ResolvedRegistry, Tier};

use crate::loader::signature;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

#[derive(Serialize)]
struct CommandEntry<'a> {
    tier: Tier,
    #[serde(flatten)]
    command: &'a Command,
}

/// Formats resolved commands in the requested output format.
///
/// Each entry carries the command's condition, tier and definition.
pub fn format_commands(commands: &[&Command], format: OutputFormat) -> Result<String, String> {
    let entries: Vec<CommandEntry<'_>> = commands
        .iter()
        .map(|&command| CommandEntry {
            tier: command.tier(),
            command,
        })
        .collect();

    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&entries)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&entries).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(commands_to_markdown(commands)),
        OutputFormat::Table => Ok(commands_to_table(commands)),
    }
}

fn condition(command: &Command) -> &str {
    if command.requirements.is_always() {
        "(always)"
    } else {
        command.requirements.as_str()
    }
}

fn commands_to_markdown(commands: &[&Command]) -> String {
    let mut out = String::new();

    out.push_str("# Vulkan commands\n\n");
    out.push_str("| Command | Tier | Condition | Definition |\n");
    out.push_str("|---------|------|-----------|------------|\n");
    for command in commands {
        out.push_str(&format!(
            "| `{}` | {} | `{}` | `{}` |\n",
            command.name,
            command.tier().as_str(),
            condition(command).replace('|', "\\|"),
            signature(command)
        ));
    }

    let aliases: Vec<_> = commands.iter().filter(|c| c.is_alias()).collect();
    if !aliases.is_empty() {
        out.push_str("\n## Aliases\n\n");
        out.push_str("| Alias | Canonical |\n");
        out.push_str("|-------|-----------|\n");
        for alias in aliases {
            out.push_str(&format!("| `{}` | `{}` |\n", alias.name, alias.canonical_name()));
        }
    }

    out
}

fn commands_to_table(commands: &[&Command]) -> String {
    let mut out = String::new();

    let max_name = commands.iter().map(|c| c.name.len()).max().unwrap_or(7).max(7);
    out.push_str(&format!("{:<max_name$}  {:<8}  CONDITION\n", "COMMAND", "TIER"));
    for command in commands {
        out.push_str(&format!(
            "{:<max_name$}  {:<8}  {}\n",
            command.name,
            command.tier().as_str(),
            condition(command)
        ));
    }

    out
}

/// Plain-text summary of a resolution: tier counts and every warning.
///
/// # Examples
///
/// ```
/// use vk_loadgen_codegen::format_summary;
/// use vk_loadgen_core::{RegistryDocument, ResolveOptions, resolve};
///
/// let resolved = resolve(&RegistryDocument::default(), &ResolveOptions::default()).unwrap();
/// let summary = format_summary(&resolved);
/// assert!(summary.starts_with("Commands: 0"));
/// ```
pub fn format_summary(resolved: &ResolvedRegistry) -> String {
    let counts = resolved.tier_counts();
    let mut out = String::new();

    out.push_str(&format!(
        "Commands: {}  (core: {}, instance: {}, device: {})\n",
        resolved.len(),
        counts.core,
        counts.instance,
        counts.device
    ));

    let aliases = resolved.commands().filter(|c| c.is_alias()).count();
    out.push_str(&format!("Aliases: {aliases}\n"));

    let warnings = resolved.warnings();
    if warnings.is_empty() {
        out.push_str("Warnings: none\n");
    } else {
        out.push_str(&format!("Warnings: {}\n", warnings.len()));
        for warning in warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }

    out
}
