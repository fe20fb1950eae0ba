//! XML encoding of the package manifest.
//!
//! The document has a fixed shape:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <xcfg-package-manifest>
//!   <file-version>1</file-version>
//!   <package types="system-configuration">
//!     <package-version>1</package-version>
//!     <node name="ECU_A"/>
//!   </package>
//! </xcfg-package-manifest>
//! ```
//!
//! Parsing builds a small element tree with `quick-xml` and validates it in
//! a second pass, so each rejection maps to exactly one [`ManifestError`].

use crate::manifest::{
    FILE_FORMAT_VERSION, Manifest, ManifestCodec, ManifestError, PackageType, ROOT_TAG,
};
use log::debug;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs;
use std::path::Path;

const FILE_VERSION_TAG: &str = "file-version";
const PACKAGE_TAG: &str = "package";
const PACKAGE_VERSION_TAG: &str = "package-version";
const NODE_TAG: &str = "node";
const TYPES_ATTR: &str = "types";
const NAME_ATTR: &str = "name";

/// Reads and writes manifests as XML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlManifestCodec;

impl ManifestCodec for XmlManifestCodec {
    fn load(&self, path: &Path) -> Result<Manifest, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let unreadable = |reason: String| ManifestError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };
        let xml = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        let root = parse_document(&xml).map_err(unreadable)?;
        let manifest = manifest_from_document(&root)?;
        debug!(
            "read manifest {} for node {}",
            path.display(),
            manifest.node_name()
        );
        Ok(manifest)
    }

    fn save(&self, manifest: &Manifest, path: &Path) -> Result<(), ManifestError> {
        let write_failure = |reason: String| ManifestError::WriteFailure {
            path: path.to_path_buf(),
            reason,
        };
        let document = render(manifest).map_err(write_failure)?;
        fs::write(path, document).map_err(|e| write_failure(e.to_string()))
    }
}

/// Minimal element tree produced by [`parse_document`].
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

fn parse_document(xml: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => close_element(open_element(&start)?, &mut stack, &mut root)?,
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "unbalanced closing tag".to_owned())?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(|e| e.to_string())?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&value),
                    None if value.trim().is_empty() => {}
                    None => return Err("text outside the root element".to_owned()),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("document ends inside an element".to_owned());
    }
    root.ok_or_else(|| "document has no root element".to_owned())
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| e.to_string())?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err("document has more than one root element".to_owned());
    }
    *root = Some(element);
    Ok(())
}

fn manifest_from_document(root: &Element) -> Result<Manifest, ManifestError> {
    if root.name != ROOT_TAG {
        return Err(ManifestError::WrongRoot {
            found: root.name.clone(),
        });
    }

    let file_version = integer_child(root, FILE_VERSION_TAG)?;
    if file_version != FILE_FORMAT_VERSION {
        return Err(ManifestError::VersionMismatch {
            found: file_version,
            expected: FILE_FORMAT_VERSION,
        });
    }

    let package = root
        .child(PACKAGE_TAG)
        .ok_or_else(|| ManifestError::malformed(format!("missing <{PACKAGE_TAG}> element")))?;
    match package.attribute(TYPES_ATTR) {
        Some(types) if PackageType::from_literal(types).is_some() => {}
        Some(types) => {
            return Err(ManifestError::malformed(format!(
                "unexpected package type \"{types}\""
            )));
        }
        None => {
            return Err(ManifestError::malformed(format!(
                "<{PACKAGE_TAG}> has no {TYPES_ATTR} attribute"
            )));
        }
    }

    let package_version = integer_child(package, PACKAGE_VERSION_TAG)?;
    let node_name = package
        .child(NODE_TAG)
        .and_then(|node| node.attribute(NAME_ATTR))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ManifestError::malformed("node name attribute is missing"))?;

    Ok(Manifest::new(node_name).with_package_schema_version(package_version))
}

fn integer_child(parent: &Element, tag: &str) -> Result<u32, ManifestError> {
    let text = parent
        .child(tag)
        .map(|child| child.text.trim())
        .ok_or_else(|| ManifestError::malformed(format!("missing <{tag}> element")))?;
    text.parse()
        .map_err(|_| ManifestError::malformed(format!("<{tag}> is not an integer: \"{text}\"")))
}

fn render(manifest: &Manifest) -> Result<Vec<u8>, String> {
    let file_version = manifest.file_format_version().to_string();
    let package_version = manifest.package_schema_version().to_string();

    let mut package = BytesStart::new(PACKAGE_TAG);
    package.push_attribute((TYPES_ATTR, manifest.package_type().as_str()));
    let mut node = BytesStart::new(NODE_TAG);
    node.push_attribute((NAME_ATTR, manifest.node_name()));

    let events = [
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
        Event::Start(BytesStart::new(ROOT_TAG)),
        Event::Start(BytesStart::new(FILE_VERSION_TAG)),
        Event::Text(BytesText::new(&file_version)),
        Event::End(BytesEnd::new(FILE_VERSION_TAG)),
        Event::Start(package),
        Event::Start(BytesStart::new(PACKAGE_VERSION_TAG)),
        Event::Text(BytesText::new(&package_version)),
        Event::End(BytesEnd::new(PACKAGE_VERSION_TAG)),
        Event::Empty(node),
        Event::End(BytesEnd::new(PACKAGE_TAG)),
        Event::End(BytesEnd::new(ROOT_TAG)),
    ];

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    for event in events {
        writer.write_event(event).map_err(|e| e.to_string())?;
    }
    let mut document = writer.into_inner();
    document.push(b'\n');
    Ok(document)
}

#[cfg(test)]
#[path = "manifest_xml_tests.rs"]
mod tests;
