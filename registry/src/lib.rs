//! Registry loading, generator configuration and generation manifests.
//!
//! This crate is the I/O side of the loader generator. It parses a
//! `vk.xml`-shaped registry into the core's [`RegistryDocument`], loads the
//! YAML [`GeneratorConfig`], and tracks generated files with a
//! [`GenerationManifest`].
//!
//! # Quick start
//!
//! ```no_run
//! use vk_loadgen_registry::{GeneratorConfig, load_and_resolve};
//!
//! let config = GeneratorConfig::load("vk-loadgen.yml").unwrap();
//! let resolved = load_and_resolve("vk.xml", &config).unwrap();
//! println!("{} commands", resolved.len());
//! ```

mod config;
mod error;
mod manifest;
mod xml;

use std::path::Path;

use vk_loadgen_core::{RegistryDocument, ResolvedRegistry, resolve};

pub use config::{GeneratorConfig, LibraryNames, LoaderStyle};
pub use error::{RegistryError, Result};
pub use manifest::{GenerationManifest, MANIFEST_FILE_NAME, MANIFEST_FORMAT_VERSION, checksum_bytes};
pub use xml::{load_registry, parse_registry};

/// Parses the registry at `path` and resolves it with `config`'s options.
///
/// # Errors
///
/// Any [`RegistryError`]; resolution failures arrive as
/// [`RegistryError::Resolve`].
pub fn load_and_resolve(path: impl AsRef<Path>, config: &GeneratorConfig) -> Result<ResolvedRegistry> {
    let document: RegistryDocument = load_registry(path)?;
    Ok(resolve(&document, &config.resolve_options())?)
}
