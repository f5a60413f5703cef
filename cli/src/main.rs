use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use vk_loadgen_codegen::{OutputFormat, format_commands, format_summary, render_loader};
use vk_loadgen_core::{Command as VkCommand, CommandFilter, ResolvedRegistry};
use vk_loadgen_registry::{
    GenerationManifest, GeneratorConfig, LoaderStyle, MANIFEST_FILE_NAME, load_and_resolve,
};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tier selection for `inspect`.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliTier {
    All,
    Core,
    Instance,
    Device,
}

impl From<CliTier> for CommandFilter {
    fn from(tier: CliTier) -> Self {
        match tier {
            CliTier::All => Self::All,
            CliTier::Core => Self::Core,
            CliTier::Instance => Self::Instance,
            CliTier::Device => Self::Device,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "vk-loadgen")]
#[command(about = "Generate C++ Vulkan function loaders from the API registry")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the loader header, source and manifest into a directory.
    Generate(GenerateArgs),
    /// Print resolved commands with their condition, tier and definition.
    Inspect(InspectArgs),
    /// Resolve the registry and report tier counts and warnings.
    Check(RegistryArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
struct RegistryArgs {
    /// Path to vk.xml.
    #[arg(long)]
    registry: PathBuf,
    /// Generator configuration (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Target API, overriding the configuration (e.g. vulkan, vulkansc).
    #[arg(long)]
    api: Option<String>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(flatten)]
    registry: RegistryArgs,
    /// Output directory for the generated files.
    #[arg(long)]
    output: PathBuf,
    /// Loader style (class or functions), overriding the configuration.
    #[arg(long, value_parser = LoaderStyle::from_str)]
    style: Option<LoaderStyle>,
    /// Regenerate even when the manifest says the outputs are current.
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Args)]
struct InspectArgs {
    #[command(flatten)]
    registry: RegistryArgs,
    /// Restrict output to one tier.
    #[arg(long, default_value = "all")]
    tier: CliTier,
    /// Show a single command by name.
    #[arg(long)]
    command: Option<String>,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Inspect(args) => run_inspect(args),
        Command::Check(args) => run_check(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ---------------------------------------------------------------------------
// Shared loading
// ---------------------------------------------------------------------------

fn load_config(args: &RegistryArgs) -> Result<GeneratorConfig, String> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    if let Some(api) = &args.api {
        config.api = api.clone();
    }
    Ok(config)
}

fn resolve_registry(path: &Path, config: &GeneratorConfig) -> Result<ResolvedRegistry, String> {
    load_and_resolve(path, config)
        .map_err(|e| format!("Failed to resolve registry '{}': {e}", path.display()))
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    let mut config = load_config(&args.registry)?;
    if let Some(style) = args.style {
        config.style = style;
    }

    let registry_path = &args.registry.registry;
    let registry_checksum = GenerationManifest::calculate_checksum(registry_path)
        .map_err(|e| format!("Failed to read registry '{}': {e}", registry_path.display()))?;
    let config_fingerprint = config
        .fingerprint()
        .map_err(|e| format!("Failed to fingerprint config: {e}"))?;

    let resolved = resolve_registry(registry_path, &config)?;
    let files = render_loader(&resolved, &config);

    let mut manifest = GenerationManifest::new(
        PACKAGE_VERSION.to_string(),
        registry_checksum,
        config_fingerprint,
        resolved.tier_counts(),
    );
    for file in &files {
        manifest.record_output(file.name.clone(), file.contents.as_bytes());
    }

    let manifest_path = args.output.join(MANIFEST_FILE_NAME);
    if !args.force && manifest_path.exists() {
        match GenerationManifest::load(&manifest_path) {
            Ok(previous) if previous.is_current(&manifest, &args.output) => {
                println!(
                    "Loader in '{}' is up to date ({} command(s)).",
                    args.output.display(),
                    resolved.len()
                );
                return Ok(());
            }
            Ok(_) => debug!("Manifest is stale, regenerating"),
            Err(err) => debug!(%err, "Ignoring unreadable manifest"),
        }
    }

    fs::create_dir_all(&args.output).map_err(|err| {
        format!(
            "Failed to create output directory '{}': {err}",
            args.output.display()
        )
    })?;

    for file in &files {
        let path = args.output.join(&file.name);
        fs::write(&path, &file.contents)
            .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;
        info!(path = %path.display(), bytes = file.contents.len(), "Wrote generated file");
    }
    manifest
        .save(&manifest_path)
        .map_err(|err| format!("Failed to write '{}': {err}", manifest_path.display()))?;

    let counts = resolved.tier_counts();
    println!(
        "Generated {} file(s) for {} command(s) (core: {}, instance: {}, device: {}).",
        files.len(),
        resolved.len(),
        counts.core,
        counts.instance,
        counts.device
    );
    if !resolved.warnings().is_empty() {
        eprintln!(
            "{} warning(s) emitted during resolution.",
            resolved.warnings().len()
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

fn run_inspect(args: InspectArgs) -> Result<(), String> {
    let config = load_config(&args.registry)?;
    let resolved = resolve_registry(&args.registry.registry, &config)?;

    let selected: Vec<&VkCommand> = match &args.command {
        Some(name) => {
            let command = resolved
                .get(name)
                .ok_or_else(|| format!("Command '{name}' is not in the resolved registry"))?;
            vec![command]
        }
        None => resolved.filter(args.tier.into()).collect(),
    };

    let output = format_commands(&selected, args.format)?;
    if output.ends_with('\n') {
        print!("{output}");
    } else {
        println!("{output}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn run_check(args: RegistryArgs) -> Result<(), String> {
    let config = load_config(&args)?;
    let resolved = resolve_registry(&args.registry, &config)?;
    print!("{}", format_summary(&resolved));
    Ok(())
}
