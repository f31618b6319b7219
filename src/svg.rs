//! Wrap an inlined document into an SVG `<foreignObject>`
//!
//! Browsers render an SVG image holding XHTML in a `<foreignObject>`, which
//! is how a self-contained document gets rasterized. The markup must be
//! well-formed XML, so the tree is serialized as XHTML here instead of with
//! the HTML serializer.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};
use kuchiki::{NodeData, NodeRef};

use crate::document::Document;
use crate::utils::{SVG_NAMESPACE, XHTML_NAMESPACE};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Size of the SVG canvas and the zoom applied to the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgOptions {
    pub width: u32,
    pub height: u32,
    pub zoom: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            width: 300,
            height: 200,
            zoom: 1.0,
        }
    }
}

fn write_element(out: &mut String, node: &NodeRef) {
    let Some(element) = node.as_element() else {
        return;
    };
    let name = &*element.name.local;
    if name == "script" {
        return;
    }

    let _ = write!(out, "<{name}");
    for (attr_name, attr) in &element.attributes.borrow().map {
        let _ = write!(
            out,
            " {}=\"{}\"",
            &*attr_name.local,
            encode_double_quoted_attribute(&attr.value)
        );
    }

    if VOID_ELEMENTS.contains(&name) {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in node.children() {
        write_node(out, &child);
    }
    let _ = write!(out, "</{name}>");
}

fn write_node(out: &mut String, node: &NodeRef) {
    match node.data() {
        NodeData::Element(_) => write_element(out, node),
        NodeData::Text(text) => out.push_str(&encode_text(text.borrow().as_str())),
        NodeData::Document(_) | NodeData::DocumentFragment => {
            for child in node.children() {
                write_node(out, &child);
            }
        }
        NodeData::Comment(_) | NodeData::ProcessingInstruction(_) | NodeData::Doctype(_) => {}
    }
}

/// Children of the `<html>` element as XHTML, scripts dropped
#[must_use]
pub fn serialize_xhtml_content(doc: &Document) -> String {
    let mut out = String::new();
    match doc.root().select_first("html") {
        Ok(html) => {
            for child in html.as_node().children() {
                write_node(&mut out, &child);
            }
        }
        Err(()) => write_node(&mut out, doc.root()),
    }
    out
}

/// Render `doc` as an SVG image of the requested size
#[must_use]
pub fn document_to_svg(doc: &Document, options: SvgOptions) -> String {
    let SvgOptions {
        width,
        height,
        zoom,
    } = options;

    let foreign_object = if (zoom - 1.0).abs() > f64::EPSILON && zoom > 0.0 {
        format!(
            r#"<foreignObject x="0" y="0" width="{}" height="{}" transform="scale({zoom})" style="transform-origin: 0 0;">"#,
            f64::from(width) / zoom,
            f64::from(height) / zoom,
        )
    } else {
        format!(r#"<foreignObject x="0" y="0" width="{width}" height="{height}">"#)
    };

    format!(
        r#"<svg xmlns="{SVG_NAMESPACE}" width="{width}" height="{height}">{foreign_object}<html xmlns="{XHTML_NAMESPACE}">{}</html></foreignObject></svg>"#,
        serialize_xhtml_content(doc)
    )
}
