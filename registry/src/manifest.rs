//! Manifest tracking the state of a generation run.
//!
//! The manifest sits next to the generated files and lets `generate` skip
//! work when nothing changed. A run is considered current when all of the
//! following still match:
//!
//! - **Tool version**: the generator that wrote the files.
//! - **Registry**: SHA-256 of the registry file.
//! - **Config**: fingerprint of the generator configuration.
//! - **Outputs**: every generated file still hashes to its recorded SHA-256
//!   (manual edits and deletions are detected).
//!
//! # Examples
//!
//! ```no_run
//! use vk_loadgen_core::TierCounts;
//! use vk_loadgen_registry::{GenerationManifest, checksum_bytes};
//!
//! let mut manifest = GenerationManifest::new(
//!     "0.1.0".into(),
//!     checksum_bytes(b"<registry/>"),
//!     "config-fingerprint".into(),
//!     TierCounts::default(),
//! );
//! manifest.record_output("VulkanLoader.hpp", b"#pragma once\n");
//! manifest.save("out/vk-loadgen.manifest.json").unwrap();
//!
//! let loaded = GenerationManifest::load("out/vk-loadgen.manifest.json").unwrap();
//! assert!(loaded.contains("VulkanLoader.hpp"));
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use vk_loadgen_core::TierCounts;

use crate::error::Result;

/// File name of the manifest inside an output directory.
pub const MANIFEST_FILE_NAME: &str = "vk-loadgen.manifest.json";

/// Manifest format version.
pub const MANIFEST_FORMAT_VERSION: &str = "1.0";

/// SHA-256 hex digest of `bytes`.
pub fn checksum_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Record of one generation run.
///
/// Persisted as pretty-printed JSON. Output checksums are keyed by file name
/// relative to the output directory and kept sorted so the manifest itself
/// diffs cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationManifest {
    /// Manifest format version (e.g., `"1.0"`).
    pub version: String,
    /// Version of the generator that produced the outputs.
    pub tool_version: String,
    /// SHA-256 of the registry file.
    pub registry_checksum: String,
    /// Fingerprint of the generator configuration.
    pub config_fingerprint: String,
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    /// Commands per tier in the resolved registry.
    pub counts: TierCounts,
    /// SHA-256 of every generated file, keyed by file name.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

impl GenerationManifest {
    /// Creates a manifest with no recorded outputs, stamped with the current
    /// time.
    pub fn new(
        tool_version: String,
        registry_checksum: String,
        config_fingerprint: String,
        counts: TierCounts,
    ) -> Self {
        Self {
            version: MANIFEST_FORMAT_VERSION.to_string(),
            tool_version,
            registry_checksum,
            config_fingerprint,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            counts,
            outputs: BTreeMap::new(),
        }
    }

    /// Loads a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::RegistryError::Io) if the file cannot be read,
    /// or [`Json`](crate::RegistryError::Json) if the content is not valid
    /// manifest JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest = serde_json::from_reader(reader)?;
        Ok(manifest)
    }

    /// Saves the manifest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::RegistryError::Io) if the file cannot be
    /// written, or [`Json`](crate::RegistryError::Json) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Records the checksum of an output file's contents.
    pub fn record_output(&mut self, file_name: impl Into<String>, contents: &[u8]) {
        self.outputs.insert(file_name.into(), checksum_bytes(contents));
    }

    /// Computes the SHA-256 hex digest of a file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::RegistryError::Io) if the file cannot be read.
    pub fn calculate_checksum(path: impl AsRef<Path>) -> Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(checksum_bytes(&bytes))
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.outputs.contains_key(file_name)
    }

    /// Returns the recorded outputs under `dir` that are missing or whose
    /// contents no longer match.
    pub fn stale_outputs(&self, dir: impl AsRef<Path>) -> Vec<String> {
        let dir = dir.as_ref();
        self.outputs
            .iter()
            .filter(|(name, expected)| {
                match Self::calculate_checksum(dir.join(name)) {
                    Ok(actual) => actual != **expected,
                    Err(_) => true,
                }
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Returns `true` if a run with `current` inputs would reproduce the
    /// files already in `dir`.
    ///
    /// Inputs are compared on tool version, registry checksum, config
    /// fingerprint and the set of output names; timestamps are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use vk_loadgen_core::TierCounts;
    /// use vk_loadgen_registry::GenerationManifest;
    ///
    /// let old = GenerationManifest::new("0.1.0".into(), "abc".into(), "cfg".into(), TierCounts::default());
    /// let mut new = old.clone();
    /// assert!(old.is_current(&new, std::env::temp_dir()));
    ///
    /// new.registry_checksum = "def".into();
    /// assert!(!old.is_current(&new, std::env::temp_dir()));
    /// ```
    pub fn is_current(&self, current: &GenerationManifest, dir: impl AsRef<Path>) -> bool {
        if self.tool_version != current.tool_version
            || self.registry_checksum != current.registry_checksum
            || self.config_fingerprint != current.config_fingerprint
        {
            debug!("Generation inputs changed");
            return false;
        }
        if !current.outputs.keys().eq(self.outputs.keys()) {
            debug!("Generated file set changed");
            return false;
        }

        let stale = self.stale_outputs(dir);
        if !stale.is_empty() {
            debug!(?stale, "Generated files were modified or removed");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> GenerationManifest {
        GenerationManifest::new(
            "0.1.0".into(),
            checksum_bytes(b"<registry/>"),
            "cfg".into(),
            TierCounts {
                core: 2,
                instance: 1,
                device: 3,
            },
        )
    }

    #[test]
    fn test_checksum_bytes() {
        assert_eq!(
            checksum_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_generated_at_is_rfc3339() {
        let m = manifest();
        assert!(chrono::DateTime::parse_from_rfc3339(&m.generated_at).is_ok());
        assert!(m.generated_at.ends_with('Z'));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);
        let mut m = manifest();
        m.record_output("VulkanLoader.hpp", b"header");
        m.save(&path).unwrap();

        let loaded = GenerationManifest::load(&path).unwrap();
        assert_eq!(loaded, m);
        assert_eq!(loaded.counts.device, 3);
        assert!(loaded.contains("VulkanLoader.hpp"));
    }

    #[test]
    fn test_is_current_detects_edited_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("VulkanLoader.hpp"), "header").unwrap();

        let mut m = manifest();
        m.record_output("VulkanLoader.hpp", b"header");
        assert!(m.is_current(&m.clone(), dir.path()));

        std::fs::write(dir.path().join("VulkanLoader.hpp"), "edited").unwrap();
        assert!(!m.is_current(&m.clone(), dir.path()));
        assert_eq!(m.stale_outputs(dir.path()), vec!["VulkanLoader.hpp".to_string()]);
    }

    #[test]
    fn test_is_current_detects_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = manifest();
        m.record_output("VulkanLoader.cpp", b"source");
        assert!(!m.is_current(&m.clone(), dir.path()));
    }

    #[test]
    fn test_is_current_detects_input_changes() {
        let dir = tempfile::tempdir().unwrap();
        let old = manifest();

        let mut tool = old.clone();
        tool.tool_version = "0.2.0".into();
        assert!(!old.is_current(&tool, dir.path()));

        let mut config = old.clone();
        config.config_fingerprint = "other".into();
        assert!(!old.is_current(&config, dir.path()));

        let mut later = old.clone();
        later.generated_at = "2030-01-01T00:00:00Z".into();
        assert!(old.is_current(&later, dir.path()));
    }
}
