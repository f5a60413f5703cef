//! Registry resolution and guarded-region emission for Vulkan loader
//! generation.
//!
//! Given a parsed API registry, this crate derives for every command:
//!
//! - the exact preprocessor condition under which it exists ([`Guard`]),
//! - the tier that loads it ([`Tier`]: core from the library, instance, or
//!   device),
//! - its canonical definition when it is a renamed alias.
//!
//! The pipeline is a sequence of independently usable stages:
//!
//! - [`TypeTable`] answers descent queries over declared parent links.
//! - [`resolve_commands`] builds the ordered [`CommandTable`], resolving
//!   aliases and vendor-tag retagging.
//! - [`apply_features`] and [`apply_extensions`] accumulate guards.
//! - [`finalize_tiers`] decides core/instance/device.
//! - [`RegionEmitter`] and [`emit_commands`] write commands to a
//!   [`TextSink`], grouping adjacent commands with equal guards.
//!
//! [`resolve`] runs the whole pipeline.
//!
//! # Example
//!
//! ```
//! use vk_loadgen_core::*;
//!
//! let doc = RegistryDocument {
//!     types: vec![TypeDecl::new("VkInstance"), TypeDecl::new("VkDevice")],
//!     tags: vec!["KHR".into()],
//!     commands: vec![
//!         CommandDefinition::new("vkCreateDevice", "VkResult")
//!             .with_param("VkPhysicalDevice", "physicalDevice")
//!             .into(),
//!         CommandDefinition::new("vkQueuePresentKHR", "VkResult")
//!             .with_param("VkDevice", "device")
//!             .into(),
//!     ],
//!     features: vec![FeatureBlock::new("VK_VERSION_1_0", Some("vulkan"))
//!         .with_commands(["vkCreateDevice"])],
//!     extensions: vec![ExtensionBlock::new("VK_KHR_swapchain")
//!         .with_type("device")
//!         .with_require(RequireBlock::new(["vkQueuePresentKHR"]))],
//! };
//!
//! let resolved = resolve(&doc, &ResolveOptions::default()).unwrap();
//!
//! let mut events: Vec<SinkEvent> = Vec::new();
//! let regions = emit_commands(resolved.commands(), CommandFilter::All, &mut events, |cmd, sink| {
//!     sink.fragment(&cmd.name)
//! });
//! assert_eq!(regions, 2);
//! assert_eq!(resolved.get("vkQueuePresentKHR").unwrap().tier(), Tier::Device);
//! ```

mod alias;
mod condition;
mod error;
mod hierarchy;
mod pipeline;
mod region;
mod requirements;
mod types;

pub use alias::{CommandTable, TagSet, resolve_commands};
pub use condition::{Guard, compile};
pub use error::{ResolveError, ResolveWarning};
pub use hierarchy::TypeTable;
pub use pipeline::{
    DEFAULT_API, DEFAULT_BASE_VERSION, DEFAULT_DEVICE_HANDLE, ResolveOptions, ResolvedRegistry,
    TierCounts, resolve,
};
pub use region::{RegionEmitter, SinkEvent, TextSink, emit_commands};
pub use requirements::{apply_extensions, apply_features, extension_guard, finalize_tiers};
pub use types::*;
