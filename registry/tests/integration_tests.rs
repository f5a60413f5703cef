use std::path::PathBuf;

use vk_loadgen_core::{Scope, Tier, resolve};
use vk_loadgen_registry::{
    GenerationManifest, GeneratorConfig, MANIFEST_FILE_NAME, RegistryError, load_and_resolve,
    load_registry, parse_registry,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/vk_subset.xml")
}

fn sc_config() -> GeneratorConfig {
    GeneratorConfig {
        api: "vulkansc".into(),
        ..GeneratorConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn test_load_fixture_sections() {
    let doc = load_registry(fixture()).unwrap();
    assert_eq!(doc.tags, ["KHR", "EXT"]);
    assert_eq!(doc.commands.len(), 10);
    assert_eq!(doc.features.len(), 3);
    assert_eq!(doc.extensions.len(), 4);
    assert!(doc.types.iter().any(|t| t.name == "VkBool32"));
}

#[test]
fn test_missing_registry_file_is_io_error() {
    let err = load_registry("/nonexistent/vk.xml").unwrap_err();
    assert!(matches!(err, RegistryError::Io(_)));
}

// ---------------------------------------------------------------------------
// Resolution over the parsed fixture
// ---------------------------------------------------------------------------

#[test]
fn test_resolve_fixture() {
    let resolved = load_and_resolve(fixture(), &GeneratorConfig::default()).unwrap();
    let names: Vec<&str> = resolved.commands().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "vkCreateInstance",
            "vkGetInstanceProcAddr",
            "vkGetDeviceProcAddr",
            "vkGetPhysicalDeviceProperties2",
            "vkGetPhysicalDeviceProperties2KHR",
            "vkDestroyDevice",
            "vkCmdDraw",
            "vkDestroySurfaceKHR",
            "vkQueuePresentKHR",
        ]
    );

    let counts = resolved.tier_counts();
    assert_eq!((counts.core, counts.instance, counts.device), (5, 3, 1));
    assert!(resolved.warnings().is_empty());
}

#[test]
fn test_fixture_guards() {
    let resolved = load_and_resolve(fixture(), &GeneratorConfig::default()).unwrap();
    let guard = |name: &str| resolved.get(name).unwrap().requirements.to_string();

    assert_eq!(guard("vkCmdDraw"), "defined(VK_VERSION_1_0)");
    assert_eq!(guard("vkGetPhysicalDeviceProperties2"), "defined(VK_VERSION_1_1)");
    assert_eq!(
        guard("vkQueuePresentKHR"),
        "defined(VK_KHR_swapchain) && (defined(VK_KHR_surface))"
    );
    assert_eq!(
        guard("vkDestroySurfaceKHR"),
        "(defined(VK_KHR_surface)) || (defined(VK_EXT_disabled_example))"
    );
}

#[test]
fn test_fixture_alias_and_scopes() {
    let resolved = load_and_resolve(fixture(), &GeneratorConfig::default()).unwrap();

    let alias = resolved.get("vkGetPhysicalDeviceProperties2KHR").unwrap();
    assert_eq!(alias.params[1].type_name, "VkPhysicalDeviceProperties2KHR");
    assert_eq!(alias.params[1].full_name, "VkPhysicalDeviceProperties2KHR* pProperties");
    assert_eq!(alias.params[0].type_name, "VkPhysicalDevice");
    assert!(alias.instance_hint);
    assert_eq!(alias.tier(), Tier::Instance);

    assert_eq!(resolved.get("vkGetDeviceProcAddr").unwrap().scope, Scope::Device);
    assert_eq!(resolved.get("vkCmdDraw").unwrap().scope, Scope::Device);
    assert_eq!(
        resolved.get("vkGetPhysicalDeviceProperties2").unwrap().scope,
        Scope::Instance
    );
    assert_eq!(resolved.get("vkQueuePresentKHR").unwrap().tier(), Tier::Device);
}

#[test]
fn test_fixture_for_other_api() {
    let resolved = load_and_resolve(fixture(), &sc_config()).unwrap();
    assert!(resolved.get("vkGetFaultData").is_some());
    // extension supported only by vulkan
    assert!(resolved.get("vkGetPhysicalDeviceProperties2KHR").is_none());
    assert!(resolved.get("vkGetPhysicalDeviceProperties2").is_some());
    assert!(resolved.commands().all(|c| !c.requirements.is_always()));
    assert!(resolved.types().contains("VkFaultData"));
}

#[test]
fn test_unknown_alias_target_surfaces_as_resolve_error() {
    let xml = r#"<registry><commands>
        <command name="vkFooKHR" alias="vkFoo"/>
    </commands></registry>"#;
    let doc = parse_registry(xml).unwrap();
    let err = resolve(&doc, &GeneratorConfig::default().resolve_options()).unwrap_err();
    let err = RegistryError::from(err);
    assert_eq!(err.to_string(), "command alias vkFooKHR refers to unknown command vkFoo");
}

#[test]
fn test_resolution_is_idempotent() {
    let first = load_and_resolve(fixture(), &GeneratorConfig::default()).unwrap();
    let second = load_and_resolve(fixture(), &GeneratorConfig::default()).unwrap();
    let a: Vec<_> = first.commands().cloned().collect();
    let b: Vec<_> = second.commands().cloned().collect();
    assert_eq!(a, b);
}

// ---------------------------------------------------------------------------
// Config + manifest on disk
// ---------------------------------------------------------------------------

#[test]
fn test_config_and_manifest_roundtrip() {
    let dir = tempfile::tempdir().unwrap();

    let config_path = dir.path().join("vk-loadgen.yml");
    sc_config().save(&config_path).unwrap();
    let config = GeneratorConfig::load(&config_path).unwrap();
    assert_eq!(config.api, "vulkansc");

    let resolved = load_and_resolve(fixture(), &config).unwrap();
    let mut manifest = GenerationManifest::new(
        "0.1.0".into(),
        GenerationManifest::calculate_checksum(fixture()).unwrap(),
        config.fingerprint().unwrap(),
        resolved.tier_counts(),
    );
    std::fs::write(dir.path().join("VulkanLoader.hpp"), "header").unwrap();
    manifest.record_output("VulkanLoader.hpp", b"header");
    manifest.save(dir.path().join(MANIFEST_FILE_NAME)).unwrap();

    let loaded = GenerationManifest::load(dir.path().join(MANIFEST_FILE_NAME)).unwrap();
    assert!(loaded.is_current(&manifest, dir.path()));
    assert_eq!(loaded.counts, resolved.tier_counts());
}
