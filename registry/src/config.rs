//! Generator configuration.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! api: vulkan
//! base_version: VK_VERSION_1_0
//! device_handle: VkDevice
//! style: class
//! namespace: vkl
//! class_name: VulkanLoader
//! header_name: VulkanLoader.hpp
//! source_name: VulkanLoader.cpp
//! library:
//!   windows: vulkan-1.dll
//!   linux: libvulkan.so.1
//!   macos: libvulkan.1.dylib
//! ```

use std::fmt;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vk_loadgen_core::{DEFAULT_API, DEFAULT_BASE_VERSION, DEFAULT_DEVICE_HANDLE, ResolveOptions};

use crate::error::Result;

/// Shape of the generated loader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderStyle {
    /// A loader class with per-instance function pointers.
    #[default]
    Class,
    /// Free `LoadVulkan*Functions` entry points over global pointers.
    Functions,
}

impl LoaderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderStyle::Class => "class",
            LoaderStyle::Functions => "functions",
        }
    }
}

impl fmt::Display for LoaderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoaderStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "class" => Ok(LoaderStyle::Class),
            "functions" => Ok(LoaderStyle::Functions),
            other => Err(format!("unknown loader style '{other}' (expected class or functions)")),
        }
    }
}

/// Dynamic library file names per platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryNames {
    pub windows: String,
    pub linux: String,
    pub macos: String,
}

impl Default for LibraryNames {
    fn default() -> Self {
        Self {
            windows: "vulkan-1.dll".to_string(),
            linux: "libvulkan.so.1".to_string(),
            macos: "libvulkan.1.dylib".to_string(),
        }
    }
}

/// Settings for one generation run.
///
/// # Examples
///
/// ```
/// use vk_loadgen_registry::{GeneratorConfig, LoaderStyle};
///
/// let config: GeneratorConfig = serde_yaml::from_str("style: functions\nnamespace: gfx\n").unwrap();
/// assert_eq!(config.style, LoaderStyle::Functions);
/// assert_eq!(config.namespace, "gfx");
/// assert_eq!(config.api, "vulkan");
/// assert_eq!(config.library.linux, "libvulkan.so.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Target API for every `api`/`supported` filter.
    pub api: String,
    /// Feature whose guard marks core commands.
    pub base_version: String,
    /// Distinguished device handle type.
    pub device_handle: String,
    pub style: LoaderStyle,
    /// C++ namespace of the generated code.
    pub namespace: String,
    /// Loader class name (class style only).
    pub class_name: String,
    pub header_name: String,
    pub source_name: String,
    pub library: LibraryNames,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api: DEFAULT_API.to_string(),
            base_version: DEFAULT_BASE_VERSION.to_string(),
            device_handle: DEFAULT_DEVICE_HANDLE.to_string(),
            style: LoaderStyle::default(),
            namespace: "vkl".to_string(),
            class_name: "VulkanLoader".to_string(),
            header_name: "VulkanLoader.hpp".to_string(),
            source_name: "VulkanLoader.cpp".to_string(),
            library: LibraryNames::default(),
        }
    }
}

impl GeneratorConfig {
    /// Loads configuration from a YAML file.
    ///
    /// An empty file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::RegistryError::Io) if the file cannot be read,
    /// or [`Yaml`](crate::RegistryError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_yaml::from_str(&text)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::RegistryError::Io) if the file cannot be
    /// written, or [`Yaml`](crate::RegistryError::Yaml) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Resolution knobs carried by this configuration.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            api: self.api.clone(),
            base_version: self.base_version.clone(),
            device_handle: self.device_handle.clone(),
        }
    }

    /// SHA-256 of the canonical YAML form, used to detect configuration
    /// changes between generation runs.
    ///
    /// # Errors
    ///
    /// Returns [`Yaml`](crate::RegistryError::Yaml) if serialization fails.
    pub fn fingerprint(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(format!("{:x}", Sha256::digest(yaml.as_bytes())))
    }
}
