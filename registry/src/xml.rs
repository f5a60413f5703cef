//! `vk.xml`-shaped registry parsing.
//!
//! Only the sections the resolution pipeline consumes are read: `types`,
//! `tags`, `commands`, `feature` and `extensions`. Everything else (enums,
//! formats, spirv tables, ...) is ignored. API filters are kept verbatim on
//! the parsed entries; filtering happens during resolution.

use std::path::Path;

use roxmltree::{Document, Node};
use tracing::debug;
use vk_loadgen_core::{
    CommandAlias, CommandDecl, CommandDefinition, ExtensionBlock, FeatureBlock, Param, ParamDecl,
    RegistryDocument, RequireBlock, TypeDecl,
};

use crate::error::{RegistryError, Result};

/// Reads and parses a registry file.
///
/// # Errors
///
/// [`RegistryError::Io`] if the file cannot be read, otherwise the errors of
/// [`parse_registry`].
pub fn load_registry(path: impl AsRef<Path>) -> Result<RegistryDocument> {
    let text = std::fs::read_to_string(path)?;
    parse_registry(&text)
}

/// Parses registry XML into a [`RegistryDocument`].
///
/// # Errors
///
/// [`RegistryError::Xml`] for malformed XML and
/// [`RegistryError::MissingElement`] for a command definition without
/// `<proto>`, `<proto>/<type>` or `<proto>/<name>`.
///
/// # Examples
///
/// ```
/// use vk_loadgen_registry::parse_registry;
///
/// let doc = parse_registry(r#"
/// <registry>
///   <types><type category="handle" parent="VkInstance"><type>VK_DEFINE_HANDLE</type>(<name>VkDevice</name>)</type></types>
///   <commands>
///     <command><proto><type>void</type> <name>vkDestroyDevice</name></proto>
///       <param><type>VkDevice</type> <name>device</name></param></command>
///   </commands>
/// </registry>"#).unwrap();
///
/// assert_eq!(doc.types[0].name, "VkDevice");
/// assert_eq!(doc.types[0].parents, ["VkInstance"]);
/// assert_eq!(doc.commands[0].name(), "vkDestroyDevice");
/// ```
pub fn parse_registry(xml: &str) -> Result<RegistryDocument> {
    let document = Document::parse(xml)?;
    let mut registry = RegistryDocument::default();

    for section in document.root_element().children().filter(Node::is_element) {
        match section.tag_name().name() {
            "types" => registry
                .types
                .extend(elements(section, "type").filter_map(parse_type)),
            "tags" => registry.tags.extend(
                elements(section, "tag").filter_map(|tag| tag.attribute("name").map(String::from)),
            ),
            "commands" => {
                for command in elements(section, "command") {
                    registry.commands.push(parse_command(command)?);
                }
            }
            "feature" => registry.features.push(parse_feature(section)),
            "extensions" => registry
                .extensions
                .extend(elements(section, "extension").map(parse_extension)),
            _ => {}
        }
    }

    debug!(
        types = registry.types.len(),
        tags = registry.tags.len(),
        commands = registry.commands.len(),
        features = registry.features.len(),
        extensions = registry.extensions.len(),
        "Parsed registry"
    );
    Ok(registry)
}

fn elements<'a, 'input>(
    parent: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    parent.children().filter(move |node| node.has_tag_name(tag))
}

fn child<'a, 'input>(parent: Node<'a, 'input>, tag: &'static str) -> Option<Node<'a, 'input>> {
    elements(parent, tag).next()
}

fn child_text<'a>(parent: Node<'a, '_>, tag: &'static str) -> Option<&'a str> {
    child(parent, tag).and_then(|node| node.text()).map(str::trim)
}

fn split_list(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
}

fn parse_type(node: Node) -> Option<TypeDecl> {
    let name = node
        .attribute("name")
        .or_else(|| child_text(node, "name"))
        .filter(|name| !name.is_empty())?;

    let mut decl = TypeDecl::new(name);
    if let Some(alias) = node.attribute("alias") {
        decl = decl.with_parent(alias);
    } else if let Some(parents) = node.attribute("parent").or_else(|| node.attribute("parents")) {
        decl.parents.extend(split_list(parents));
    }
    if let Some(api) = node.attribute("api") {
        decl = decl.with_api(api);
    }
    Some(decl)
}

fn parse_command(node: Node) -> Result<CommandDecl> {
    let api = node.attribute("api").map(String::from);

    if let (Some(name), Some(alias_of)) = (node.attribute("name"), node.attribute("alias")) {
        let mut alias = CommandAlias::new(name, alias_of);
        alias.api = api;
        return Ok(alias.into());
    }

    let proto = child(node, "proto").ok_or_else(|| missing("command", "proto"))?;
    let name = child_text(proto, "name").ok_or_else(|| missing("command", "proto/name"))?;
    let return_type = child_text(proto, "type")
        .ok_or_else(|| missing(&format!("command {name}"), "proto/type"))?;

    let mut definition = CommandDefinition::new(name, return_type);
    definition.api = api;
    for param in elements(node, "param") {
        if let Some(decl) = parse_param(param) {
            definition = definition.with_param_decl(decl);
        }
    }
    Ok(definition.into())
}

fn parse_param(node: Node) -> Option<ParamDecl> {
    let name = child_text(node, "name")?;
    let type_name = child_text(node, "type")?;
    Some(ParamDecl {
        param: Param::new(name, type_name, declaration_text(node)),
        api: node.attribute("api").map(String::from),
    })
}

/// Full declaration text of a `<param>`, comments excluded, whitespace
/// collapsed.
fn declaration_text(node: Node) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: Node, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            out.push_str(child.text().unwrap_or_default());
        } else if child.is_element() && !child.has_tag_name("comment") {
            collect_text(child, out);
        }
    }
}

fn command_names(block: Node) -> impl Iterator<Item = String> {
    elements(block, "command").filter_map(|command| command.attribute("name").map(String::from))
}

fn parse_feature(node: Node) -> FeatureBlock {
    let mut feature = FeatureBlock::new(node.attribute("name").unwrap_or_default(), node.attribute("api"));
    feature.number = node.attribute("number").map(String::from);
    for block in elements(node, "require") {
        feature.require.extend(command_names(block));
    }
    for block in elements(node, "remove") {
        feature.remove.extend(command_names(block));
    }
    feature
}

fn parse_extension(node: Node) -> ExtensionBlock {
    let mut extension = ExtensionBlock::new(node.attribute("name").unwrap_or_default());
    extension.ext_type = node.attribute("type").map(String::from);
    extension.depends = node.attribute("depends").map(String::from);
    extension.supported = node.attribute("supported").map(String::from);

    for block in elements(node, "require") {
        let mut require = RequireBlock::new(command_names(block));
        require.depends = require_depends(block);
        require.api = block.attribute("api").map(String::from);
        extension.requires.push(require);
    }
    extension
}

/// `depends`, or the older `feature`/`extension` pair joined as an AND.
fn require_depends(block: Node) -> Option<String> {
    if let Some(depends) = block.attribute("depends") {
        return Some(depends.to_string());
    }
    let legacy: Vec<&str> = [block.attribute("feature"), block.attribute("extension")]
        .into_iter()
        .flatten()
        .collect();
    (!legacy.is_empty()).then(|| legacy.join("+"))
}

fn missing(context: &str, element: &str) -> RegistryError {
    RegistryError::MissingElement {
        context: context.to_string(),
        element: element.to_string(),
    }
}
