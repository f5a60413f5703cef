use std::fs;
use std::path::PathBuf;
use std::process::Output;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("vk_loadgen_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../registry/tests/fixtures/vk_subset.xml")
}

fn run(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_vk-loadgen"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run vk-loadgen")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn generate(out: &TempDir, extra: &[&str]) -> Output {
    let registry = fixture();
    let mut args = vec![
        "generate",
        "--registry",
        registry.to_str().unwrap(),
        "--output",
        out.path().to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    run(&args)
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

#[test]
fn generate_writes_loader_and_manifest() {
    let out = TempDir::new("generate_writes");
    let output = generate(&out, &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("for 9 command(s) (core: 5, instance: 3, device: 1)"));

    let header = fs::read_to_string(out.join("VulkanLoader.hpp")).unwrap();
    let source = fs::read_to_string(out.join("VulkanLoader.cpp")).unwrap();
    assert!(header.contains("#if defined(VK_KHR_swapchain) && (defined(VK_KHR_surface))"));
    assert!(source.contains("staticPfn_vkCmdDraw"));
    assert!(!source.contains("vkGetFaultData"));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("vk-loadgen.manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["counts"]["core"], 5);
    assert!(manifest["outputs"]["VulkanLoader.hpp"].is_string());
    assert!(manifest["outputs"]["VulkanLoader.cpp"].is_string());
}

#[test]
fn generate_skips_when_outputs_are_current() {
    let out = TempDir::new("generate_skips");
    assert!(generate(&out, &[]).status.success());
    let first = fs::read_to_string(out.join("VulkanLoader.hpp")).unwrap();

    let second = generate(&out, &[]);
    assert!(second.status.success());
    assert!(stdout(&second).contains("is up to date"));
    assert_eq!(fs::read_to_string(out.join("VulkanLoader.hpp")).unwrap(), first);

    let forced = generate(&out, &["--force"]);
    assert!(forced.status.success());
    assert!(stdout(&forced).contains("Generated 2 file(s)"));
    assert_eq!(fs::read_to_string(out.join("VulkanLoader.hpp")).unwrap(), first);
}

#[test]
fn generate_restores_edited_output() {
    let out = TempDir::new("generate_edited");
    assert!(generate(&out, &[]).status.success());
    let original = fs::read_to_string(out.join("VulkanLoader.cpp")).unwrap();

    fs::write(out.join("VulkanLoader.cpp"), "// hand edit\n").unwrap();
    let output = generate(&out, &[]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Generated 2 file(s)"));
    assert_eq!(fs::read_to_string(out.join("VulkanLoader.cpp")).unwrap(), original);
}

#[test]
fn generate_regenerates_when_style_changes() {
    let out = TempDir::new("generate_style");
    assert!(generate(&out, &[]).status.success());

    let output = generate(&out, &["--style", "functions"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Generated 2 file(s)"));
    let header = fs::read_to_string(out.join("VulkanLoader.hpp")).unwrap();
    assert!(header.contains("LoadVulkanCoreFunctions"));
}

#[test]
fn generate_rejects_unknown_style() {
    let out = TempDir::new("generate_bad_style");
    let output = generate(&out, &["--style", "template"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown loader style 'template' (expected class or functions)"));
    assert!(!out.join("VulkanLoader.hpp").exists());
}

#[test]
fn generate_uses_config_file() {
    let dir = TempDir::new("generate_config");
    let out = TempDir::new("generate_config_out");
    let config = dir.join("vk-loadgen.yml");
    fs::write(
        &config,
        "namespace: gfx\nheader_name: Loader.hpp\nsource_name: Loader.cpp\n",
    )
    .unwrap();

    let output = generate(&out, &["--config", config.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let header = fs::read_to_string(out.join("Loader.hpp")).unwrap();
    assert!(header.contains("namespace gfx {"));
    assert!(out.join("Loader.cpp").exists());
    assert!(!out.join("VulkanLoader.hpp").exists());
}

#[test]
fn generate_fails_without_writing_on_bad_registry() {
    let dir = TempDir::new("generate_bad");
    let registry = dir.join("vk.xml");
    fs::write(
        &registry,
        r#"<registry><commands><command name="vkFooKHR" alias="vkFoo"/></commands></registry>"#,
    )
    .unwrap();
    let out = dir.join("out");

    let output = run(&[
        "generate",
        "--registry",
        registry.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.starts_with("error: "), "stderr: {err}");
    assert!(err.contains("command alias vkFooKHR refers to unknown command vkFoo"));
    assert!(!out.exists());
}

#[test]
fn generate_fails_on_missing_registry() {
    let out = TempDir::new("generate_missing");
    let output = run(&[
        "generate",
        "--registry",
        "/nonexistent/vk.xml",
        "--output",
        out.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read registry"));
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[test]
fn inspect_single_command_as_json() {
    let registry = fixture();
    let output = run(&[
        "inspect",
        "--registry",
        registry.to_str().unwrap(),
        "--command",
        "vkQueuePresentKHR",
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value[0]["name"], "vkQueuePresentKHR");
    assert_eq!(value[0]["tier"], "device");
    assert_eq!(
        value[0]["requirements"],
        "defined(VK_KHR_swapchain) && (defined(VK_KHR_surface))"
    );
}

#[test]
fn inspect_filters_by_tier() {
    let registry = fixture();
    let output = run(&[
        "inspect",
        "--registry",
        registry.to_str().unwrap(),
        "--tier",
        "device",
    ]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("COMMAND"));
    assert!(text.contains("vkCmdDraw"));
    assert!(text.contains("vkQueuePresentKHR"));
    assert!(!text.contains("vkCreateInstance"));
}

#[test]
fn inspect_other_api() {
    let registry = fixture();
    let output = run(&[
        "inspect",
        "--registry",
        registry.to_str().unwrap(),
        "--api",
        "vulkansc",
        "--format",
        "markdown",
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("`vkGetFaultData`"));
}

#[test]
fn inspect_unknown_command_fails() {
    let registry = fixture();
    let output = run(&[
        "inspect",
        "--registry",
        registry.to_str().unwrap(),
        "--command",
        "vkNotARealCommand",
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("vkNotARealCommand"));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_prints_summary() {
    let registry = fixture();
    let output = run(&["check", "--registry", registry.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Commands: 9  (core: 5, instance: 3, device: 1)"));
    assert!(text.contains("Aliases: 1"));
    assert!(text.contains("Warnings: none"));
}

#[test]
fn check_reports_warnings() {
    let dir = TempDir::new("check_warnings");
    let registry = dir.join("vk.xml");
    fs::write(
        &registry,
        r#"<registry>
  <commands>
    <command><proto><type>void</type> <name>vkOrphan</name></proto></command>
  </commands>
</registry>"#,
    )
    .unwrap();

    let output = run(&["check", "--registry", registry.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Warnings: 2"));
    assert!(text.contains("vkOrphan"));
}
