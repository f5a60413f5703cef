//! C++ loader templates.
//!
//! Both styles produce a header and a source file. Every per-command list
//! (declarations, pointer variables, loads, trampolines) goes through
//! [`emit_commands`], so each command sits inside the region of its guard and
//! lists are always in registry order.

use tracing::debug;
use vk_loadgen_core::{Command, CommandFilter, ResolvedRegistry, TextSink, emit_commands};
use vk_loadgen_registry::{GeneratorConfig, LibraryNames, LoaderStyle};

use crate::sink::PreprocessorSink;

const GENERATED_BANNER: &str = "// Generated by vk-loadgen from the Vulkan API registry. Do not edit.\n";

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name relative to the output directory.
    pub name: String,
    pub contents: String,
}

/// Renders the header and source for `config.style`.
///
/// # Examples
///
/// ```
/// use vk_loadgen_codegen::render_loader;
/// use vk_loadgen_core::*;
/// use vk_loadgen_registry::GeneratorConfig;
///
/// let doc = RegistryDocument {
///     commands: vec![CommandDefinition::new("vkCreateInstance", "VkResult")
///         .with_param("const VkInstanceCreateInfo*", "pCreateInfo")
///         .into()],
///     features: vec![FeatureBlock::new("VK_VERSION_1_0", Some("vulkan"))
///         .with_commands(["vkCreateInstance"])],
///     ..RegistryDocument::default()
/// };
/// let resolved = resolve(&doc, &ResolveOptions::default()).unwrap();
/// let files = render_loader(&resolved, &GeneratorConfig::default());
///
/// assert_eq!(files[0].name, "VulkanLoader.hpp");
/// assert!(files[0].contents.contains("#if defined(VK_VERSION_1_0)"));
/// assert!(files[1].contents.contains("staticPfn_vkCreateInstance"));
/// ```
pub fn render_loader(resolved: &ResolvedRegistry, config: &GeneratorConfig) -> Vec<GeneratedFile> {
    let (header, source) = match config.style {
        LoaderStyle::Class => (class_header(resolved, config), class_source(resolved, config)),
        LoaderStyle::Functions => (
            functions_header(config),
            functions_source(resolved, config),
        ),
    };
    debug!(
        style = %config.style,
        header_bytes = header.len(),
        source_bytes = source.len(),
        "Rendered loader"
    );
    vec![
        GeneratedFile {
            name: config.header_name.clone(),
            contents: header,
        },
        GeneratedFile {
            name: config.source_name.clone(),
            contents: source,
        },
    ]
}

/// `R name(params)` as written in the registry.
pub fn signature(command: &Command) -> String {
    format!("{} {}({})", command.return_type, command.name, param_list(command))
}

fn param_list(command: &Command) -> String {
    command
        .params
        .iter()
        .map(|param| param.full_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn arg_list(command: &Command) -> String {
    command
        .params
        .iter()
        .map(|param| param.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn return_keyword(command: &Command) -> &'static str {
    if command.returns_void() { "" } else { "return " }
}

fn each(
    resolved: &ResolvedRegistry,
    filter: CommandFilter,
    sink: &mut PreprocessorSink,
    mut line: impl FnMut(&Command) -> String,
) {
    emit_commands(resolved.commands(), filter, sink, |command, sink| {
        sink.fragment(&line(command))
    });
}

fn platform_includes(sink: &mut PreprocessorSink) {
    sink.fragment(
        "#if defined(_WIN32)\n\
         #define WIN32_LEAN_AND_MEAN\n\
         #include <windows.h>\n\
         #else\n\
         #include <dlfcn.h>\n\
         #endif\n",
    );
}

/// Anonymous-namespace helpers that open, query and close the Vulkan library.
fn library_helpers(sink: &mut PreprocessorSink, library: &LibraryNames, indent: &str) {
    let body = format!(
        "namespace {{\n\
         #if defined(_WIN32)\n\
         \tHMODULE vulkanLib = nullptr;\n\
         \n\
         \tbool OpenVulkanLibrary() {{\n\
         \t\tvulkanLib = LoadLibraryA(\"{windows}\");\n\
         \t\treturn vulkanLib != nullptr;\n\
         \t}}\n\
         \tPFN_vkVoidFunction LoadVulkanSymbol(const char* name) {{\n\
         \t\treturn reinterpret_cast<PFN_vkVoidFunction>(GetProcAddress(vulkanLib, name));\n\
         \t}}\n\
         \tvoid CloseVulkanLibrary() {{\n\
         \t\tif(vulkanLib)\n\
         \t\t\tFreeLibrary(vulkanLib);\n\
         \t\tvulkanLib = nullptr;\n\
         \t}}\n\
         #else\n\
         \tvoid* vulkanLib = nullptr;\n\
         \n\
         \tbool OpenVulkanLibrary() {{\n\
         #if defined(__APPLE__)\n\
         \t\tvulkanLib = dlopen(\"{macos}\", RTLD_NOW | RTLD_LOCAL);\n\
         #else\n\
         \t\tvulkanLib = dlopen(\"{linux}\", RTLD_NOW | RTLD_LOCAL);\n\
         #endif\n\
         \t\treturn vulkanLib != nullptr;\n\
         \t}}\n\
         \tPFN_vkVoidFunction LoadVulkanSymbol(const char* name) {{\n\
         \t\treturn reinterpret_cast<PFN_vkVoidFunction>(dlsym(vulkanLib, name));\n\
         \t}}\n\
         \tvoid CloseVulkanLibrary() {{\n\
         \t\tif(vulkanLib)\n\
         \t\t\tdlclose(vulkanLib);\n\
         \t\tvulkanLib = nullptr;\n\
         \t}}\n\
         #endif\n\
         }}\n",
        windows = library.windows,
        linux = library.linux,
        macos = library.macos,
    );
    for line in body.lines() {
        if line.is_empty() || line.starts_with('#') {
            sink.fragment(line);
        } else {
            sink.fragment(indent);
            sink.fragment(line);
        }
        sink.fragment("\n");
    }
}

fn class_header(resolved: &ResolvedRegistry, config: &GeneratorConfig) -> String {
    let class = &config.class_name;
    let mut sink = PreprocessorSink::new();

    sink.fragment(GENERATED_BANNER);
    sink.fragment("#pragma once\n\n#include <vulkan/vulkan.h>\n\n");
    sink.fragment(&format!(
        "namespace {ns} {{\n\
         \t/// Function pointers for every Vulkan command available at compile time.\n\
         \tclass {class} {{\n\
         \tpublic:\n\
         \t\t/// Loads the core commands from the Vulkan library on first use.\n\
         \t\t{class}();\n\
         \t\t{class}(const {class}&) = delete;\n\
         \t\t{class}({class}&&) noexcept = delete;\n\
         \n\
         \t\t{class}& operator=(const {class}&) = delete;\n\
         \t\t{class}& operator=({class}&&) = delete;\n\
         \n\
         \t\t/// Releases the Vulkan library when the last loader is destroyed.\n\
         \t\t~{class}();\n\
         \n\
         \t\t/// Returns false if the Vulkan library could not be opened.\n\
         \t\tbool IsLoaded() const;\n\
         \t\t/// Loads every non-device command through the instance.\n\
         \t\tvoid LoadInstanceFunctions(VkInstance instance);\n\
         \t\t/// Loads every device command through the device.\n\
         \t\tvoid LoadDeviceFunctions(VkDevice device);\n\
         \n",
        ns = config.namespace,
    ));

    each(resolved, CommandFilter::All, &mut sink, |command| {
        format!(
            "\t\tVKAPI_ATTR {} VKAPI_CALL {}({}) const;\n",
            command.return_type,
            command.name,
            param_list(command)
        )
    });

    sink.fragment("\tprivate:\n\t\tbool loaded;\n\n");
    each(resolved, CommandFilter::All, &mut sink, |command| {
        format!("\t\tPFN_{0} pfn_{0};\n", command.name)
    });
    sink.fragment("\t};\n}\n");
    sink.into_string()
}

fn class_source(resolved: &ResolvedRegistry, config: &GeneratorConfig) -> String {
    let ns = &config.namespace;
    let class = &config.class_name;
    let mut sink = PreprocessorSink::new();

    sink.fragment(GENERATED_BANNER);
    sink.fragment(&format!("#include \"{}\"\n\n#include <atomic>\n#include <cstddef>\n\n", config.header_name));
    platform_includes(&mut sink);
    sink.fragment(&format!("\nnamespace {ns} {{\n"));
    library_helpers(&mut sink, &config.library, "\t");
    sink.fragment(
        "\n\tstatic std::atomic<std::size_t> loaderCount{0};\n\
         \tstatic std::atomic<bool> libraryLoaded{false};\n\
         \n\
         \t// Process-wide function pointers\n",
    );
    each(resolved, CommandFilter::All, &mut sink, |command| {
        format!("\tstatic PFN_{0} staticPfn_{0};\n", command.name)
    });

    sink.fragment(
        "\n\tstatic bool LoadStaticFunctionPointers() {\n\
         \t\tif(!OpenVulkanLibrary())\n\
         \t\t\treturn false;\n\
         \n",
    );
    each(resolved, CommandFilter::All, &mut sink, |command| {
        format!(
            "\t\tstaticPfn_{0} = reinterpret_cast<PFN_{0}>(LoadVulkanSymbol(\"{0}\"));\n",
            command.name
        )
    });
    sink.fragment("\t\treturn true;\n\t}\n\n");

    sink.fragment(&format!(
        "\t{class}::{class}() {{\n\
         \t\tif(!loaderCount++)\n\
         \t\t\tlibraryLoaded = LoadStaticFunctionPointers();\n\
         \t\tloaded = libraryLoaded;\n\
         \n"
    ));
    each(resolved, CommandFilter::All, &mut sink, |command| {
        format!("\t\tpfn_{0} = staticPfn_{0};\n", command.name)
    });
    sink.fragment(&format!(
        "\t}}\n\n\
         \t{class}::~{class}() {{\n\
         \t\tif(!--loaderCount) {{\n\
         \t\t\tCloseVulkanLibrary();\n\
         \t\t\tlibraryLoaded = false;\n\
         \t\t}}\n\
         \t}}\n\n\
         \tbool {class}::IsLoaded() const {{\n\
         \t\treturn loaded;\n\
         \t}}\n\n\
         \tvoid {class}::LoadInstanceFunctions(VkInstance instance) {{\n"
    ));
    each(resolved, CommandFilter::Instance, &mut sink, |command| {
        format!(
            "\t\tpfn_{0} = reinterpret_cast<PFN_{0}>(vkGetInstanceProcAddr(instance, \"{0}\"));\n",
            command.name
        )
    });
    sink.fragment(&format!(
        "\t}}\n\n\tvoid {class}::LoadDeviceFunctions(VkDevice device) {{\n"
    ));
    each(resolved, CommandFilter::Device, &mut sink, |command| {
        format!(
            "\t\tpfn_{0} = reinterpret_cast<PFN_{0}>(vkGetDeviceProcAddr(device, \"{0}\"));\n",
            command.name
        )
    });
    sink.fragment("\t}\n\n");

    each(resolved, CommandFilter::All, &mut sink, |command| {
        let ret = return_keyword(command);
        let args = arg_list(command);
        let fallback = if command.returns_void() {
            format!("\t\t\tstaticPfn_{}({args});\n\t\t\treturn;\n", command.name)
        } else {
            format!("\t\t\treturn staticPfn_{}({args});\n", command.name)
        };
        format!(
            "\tVKAPI_ATTR {rt} VKAPI_CALL {class}::{name}({params}) const {{\n\
             \t\tif(!pfn_{name}) {{\n\
             {fallback}\
             \t\t}}\n\
             \t\t{ret}pfn_{name}({args});\n\
             \t}}\n",
            rt = command.return_type,
            name = command.name,
            params = param_list(command),
        )
    });
    sink.fragment("}\n\n");

    each(resolved, CommandFilter::All, &mut sink, |command| {
        format!(
            "VKAPI_ATTR {rt} VKAPI_CALL {name}({params}) {{\n\
             \t{ret}{ns}::staticPfn_{name}({args});\n\
             }}\n",
            rt = command.return_type,
            name = command.name,
            params = param_list(command),
            ret = return_keyword(command),
            args = arg_list(command),
        )
    });
    sink.into_string()
}

fn functions_header(config: &GeneratorConfig) -> String {
    format!(
        "{GENERATED_BANNER}\
         #pragma once\n\
         \n\
         #include <vulkan/vulkan.h>\n\
         \n\
         namespace {ns} {{\n\
         \t/// Opens the Vulkan library and loads every core command.\n\
         \t/// Returns false if the library or any core command is missing.\n\
         \tbool LoadVulkanCoreFunctions();\n\
         \t/// Loads every non-device command through the instance.\n\
         \tvoid LoadVulkanInstanceFunctions(VkInstance instance);\n\
         \t/// Loads every device command through the device.\n\
         \tvoid LoadVulkanDeviceFunctions(VkDevice device);\n\
         \t/// Closes the Vulkan library.\n\
         \tvoid FreeVulkanFunctions();\n\
         }}\n",
        ns = config.namespace,
    )
}

fn functions_source(resolved: &ResolvedRegistry, config: &GeneratorConfig) -> String {
    let mut sink = PreprocessorSink::new();

    sink.fragment(GENERATED_BANNER);
    sink.fragment(&format!("#include \"{}\"\n\n", config.header_name));
    platform_includes(&mut sink);
    sink.fragment("\n");

    each(resolved, CommandFilter::All, &mut sink, |command| {
        format!("static PFN_{0} pfn_{0};\n", command.name)
    });
    sink.fragment("\n");

    each(resolved, CommandFilter::All, &mut sink, |command| {
        format!(
            "VKAPI_ATTR {rt} VKAPI_CALL {name}({params}) {{\n\
             \t{ret}pfn_{name}({args});\n\
             }}\n",
            rt = command.return_type,
            name = command.name,
            params = param_list(command),
            ret = return_keyword(command),
            args = arg_list(command),
        )
    });

    sink.fragment(&format!("\nnamespace {} {{\n", config.namespace));
    library_helpers(&mut sink, &config.library, "\t");
    sink.fragment(
        "\n\tbool LoadVulkanCoreFunctions() {\n\
         \t\tif(!OpenVulkanLibrary())\n\
         \t\t\treturn false;\n\
         \n",
    );
    each(resolved, CommandFilter::Core, &mut sink, |command| {
        format!(
            "\t\tpfn_{0} = reinterpret_cast<PFN_{0}>(LoadVulkanSymbol(\"{0}\"));\n\
             \t\tif(!pfn_{0}) {{\n\
             \t\t\tCloseVulkanLibrary();\n\
             \t\t\treturn false;\n\
             \t\t}}\n",
            command.name
        )
    });
    sink.fragment("\t\treturn true;\n\t}\n\n\tvoid LoadVulkanInstanceFunctions(VkInstance instance) {\n");
    each(resolved, CommandFilter::Instance, &mut sink, |command| {
        format!(
            "\t\tpfn_{0} = reinterpret_cast<PFN_{0}>(vkGetInstanceProcAddr(instance, \"{0}\"));\n",
            command.name
        )
    });
    sink.fragment("\t}\n\n\tvoid LoadVulkanDeviceFunctions(VkDevice device) {\n");
    each(resolved, CommandFilter::Device, &mut sink, |command| {
        format!(
            "\t\tpfn_{0} = reinterpret_cast<PFN_{0}>(vkGetDeviceProcAddr(device, \"{0}\"));\n",
            command.name
        )
    });
    sink.fragment(
        "\t}\n\n\
         \tvoid FreeVulkanFunctions() {\n\
         \t\tCloseVulkanLibrary();\n\
         \t}\n\
         }\n",
    );
    sink.into_string()
}
