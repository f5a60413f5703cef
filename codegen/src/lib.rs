//! Rendering for resolved Vulkan registries.
//!
//! [`render_loader`] turns a [`ResolvedRegistry`](vk_loadgen_core::ResolvedRegistry)
//! into a C++ header and source pair, wrapping every command in the
//! preprocessor region of its availability guard. [`format_commands`] and
//! [`format_summary`] back the `inspect` and `check` commands of the CLI.

mod loader;
mod output;
mod sink;

pub use loader::{GeneratedFile, render_loader, signature};
pub use output::{OutputFormat, format_commands, format_summary};
pub use sink::PreprocessorSink;
