//! Resolution errors and warnings.
//!
//! [`ResolveError`] covers malformed registries: every variant aborts the run
//! and names the entry that broke it. [`ResolveWarning`] collects recoverable
//! findings that are reported alongside a successful resolution.

use serde::Serialize;
use thiserror::Error;

/// Fatal malformed-reference errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// An alias names a command that is not declared.
    #[error("command alias {alias} refers to unknown command {target}")]
    UnknownAliasTarget { alias: String, target: String },
    /// Following alias links leads back to a command already on the chain.
    #[error("command alias cycle through {alias}")]
    AliasCycle { alias: String },
    /// A feature block lists a command that was never declared.
    #[error("feature {feature} references unknown command {command}")]
    UnknownFeatureCommand { feature: String, command: String },
    /// An extension lists a command that was never declared.
    #[error("extension {extension} references unknown command {command}")]
    UnknownExtensionCommand { extension: String, command: String },
}

/// Recoverable findings surfaced with the resolved registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveWarning {
    /// The command has no parameters and was placed in the instance tier.
    #[error("command {command} has no parameters; loading it through the instance")]
    DegenerateCommand { command: String },
    /// No applicable feature or extension requires the command.
    #[error("command {command} is not required by any feature or extension")]
    UnrequiredCommand { command: String },
    /// An applicable feature or extension names a command that was declared
    /// but removed or scoped to another API.
    #[error("{requirer} names command {command}, which is not available for the target API")]
    UnavailableCommand { requirer: String, command: String },
}

impl ResolveWarning {
    pub fn command(&self) -> &str {
        match self {
            ResolveWarning::DegenerateCommand { command }
            | ResolveWarning::UnrequiredCommand { command }
            | ResolveWarning::UnavailableCommand { command, .. } => command,
        }
    }
}
