//! Reader for the KiCad XML netlist export (`kicad-cli sch export netlist
//! --format kicadxml`, or the legacy "Generate BOM" XML).

use std::path::Path;

use roxmltree::{Document, Node};
use thiserror::Error;

use crate::{Component, FIELD_DATASHEET, FIELD_DESCRIPTION, FIELD_FOOTPRINT, FIELD_VALUE};

#[derive(Debug, Error)]
pub enum NetlistError {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Expected root element 'export', found '{0}'")]
    UnexpectedRoot(String),

    #[error("Component without a 'ref' attribute")]
    MissingReference,
}

/// The parts of a KiCad netlist export the BOM needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Netlist {
    pub source: String,
    pub date: String,
    pub tool: String,
    /// Components in document order, power symbols removed.
    pub components: Vec<Component>,
}

impl Netlist {
    pub fn parse(xml: &str) -> Result<Self, NetlistError> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        if root.tag_name().name() != "export" {
            return Err(NetlistError::UnexpectedRoot(
                root.tag_name().name().to_string(),
            ));
        }

        let mut netlist = Netlist::default();
        for child in root.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "design" => netlist.parse_design(&child),
                "components" => {
                    for comp in child
                        .children()
                        .filter(|n| n.is_element() && n.has_tag_name("comp"))
                    {
                        if let Some(component) = parse_component(&comp)? {
                            netlist.components.push(component);
                        }
                    }
                }
                _ => {}
            }
        }

        log::debug!(
            "Parsed netlist {} with {} components",
            netlist.source,
            netlist.components.len()
        );
        Ok(netlist)
    }

    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, NetlistError> {
        let xml = std::fs::read_to_string(path)?;
        Self::parse(&xml)
    }

    fn parse_design(&mut self, node: &Node) {
        for child in node.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "source" => self.source = element_text(&child),
                "date" => self.date = element_text(&child),
                "tool" => self.tool = element_text(&child),
                _ => {}
            }
        }
    }
}

fn element_text(node: &Node) -> String {
    node.text().map(str::trim).unwrap_or_default().to_string()
}

/// Parse a `<comp>` element. Power symbols (`#PWR01`, `#FLG01`) yield `None`.
fn parse_component(node: &Node) -> Result<Option<Component>, NetlistError> {
    let reference = node
        .attribute("ref")
        .ok_or(NetlistError::MissingReference)?;
    if reference.starts_with('#') {
        return Ok(None);
    }

    let mut component = Component::new(reference, "", "");
    let mut lib_description = None;
    let mut element_description = None;

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "value" => {
                component
                    .fields
                    .insert(FIELD_VALUE.to_string(), element_text(&child));
            }
            "footprint" => {
                component
                    .fields
                    .insert(FIELD_FOOTPRINT.to_string(), element_text(&child));
            }
            "datasheet" => {
                component
                    .fields
                    .insert(FIELD_DATASHEET.to_string(), element_text(&child));
            }
            "description" => element_description = Some(element_text(&child)),
            "libsource" => {
                lib_description = child.attribute("description").map(str::to_string);
            }
            "fields" => {
                for field in child
                    .children()
                    .filter(|n| n.is_element() && n.has_tag_name("field"))
                {
                    let Some(name) = field.attribute("name") else {
                        continue;
                    };
                    apply_field(&mut component, name, &element_text(&field));
                }
            }
            "property" => {
                let Some(name) = child.attribute("name") else {
                    continue;
                };
                apply_property(&mut component, name, child.attribute("value"));
            }
            _ => {}
        }
    }

    if component.field(FIELD_DESCRIPTION).is_none() {
        if let Some(description) = element_description.or(lib_description) {
            component
                .fields
                .insert(FIELD_DESCRIPTION.to_string(), description);
        }
    }

    Ok(Some(component))
}

fn apply_field(component: &mut Component, name: &str, value: &str) {
    // Legacy schematics carry the flags as user fields.
    match name.to_ascii_lowercase().as_str() {
        "dnp" => component.dnp |= is_truthy(value),
        "exclude_from_bom" => component.exclude_from_bom |= is_truthy(value),
        "exclude_from_board" => component.exclude_from_board |= is_truthy(value),
        _ => {}
    }
    component.fields.insert(name.to_string(), value.to_string());
}

fn apply_property(component: &mut Component, name: &str, value: Option<&str>) {
    // A flag property is set by its presence; an explicit value can still clear it.
    let set = value.is_none_or(is_truthy);
    match name {
        "dnp" => component.dnp |= set,
        "exclude_from_bom" => component.exclude_from_bom |= set,
        "exclude_from_board" => component.exclude_from_board |= set,
        _ => {}
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && !["0", "false", "no", "n"]
            .iter()
            .any(|falsy| value.eq_ignore_ascii_case(falsy))
}
