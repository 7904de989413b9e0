// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A minimal element tree for xUnit.net reports.

use crate::errors::TransformError;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;
use xunitnet_junit::{hardened_reader, screen_doctype};

/// An element with its attributes, child elements and text content.
///
/// Text directly inside the element (including CDATA sections) is concatenated into `text`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Element {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) children: Vec<Element>,
    pub(crate) text: String,
}

impl Element {
    pub(crate) fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub(crate) fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Follows a path of child element names, taking the first match at each step.
    pub(crate) fn descendant(&self, path: &[&str]) -> Option<&Element> {
        path.iter()
            .try_fold(self, |element, name| element.child(name))
    }
}

/// Parses a document into an element tree.
///
/// Document type declarations are screened, entities other than the predefined ones are errors,
/// and nothing outside the input is ever read.
pub(crate) fn parse_document(input: impl BufRead) -> Result<Element, TransformError> {
    let mut reader = hardened_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let position = reader.buffer_position() as u64;
        let xml_error = |error: quick_xml::Error| TransformError::Xml { position, error };

        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::DocType(doctype) => screen_doctype(&doctype)?,
            Event::Start(start) => {
                if root.is_some() {
                    return Err(TransformError::MultipleRoots);
                }
                stack.push(element_from_start(&start).map_err(xml_error)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(TransformError::MultipleRoots);
                }
                let element = element_from_start(&start).map_err(xml_error)?;
                close(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    close(element, &mut stack, &mut root);
                }
            }
            Event::Text(text) => {
                let Some(element) = stack.last_mut() else {
                    return Err(TransformError::ContentOutsideRoot);
                };
                let text = text.unescape().map_err(xml_error)?;
                element.text.push_str(&text);
            }
            Event::CData(cdata) => {
                let Some(element) = stack.last_mut() else {
                    return Err(TransformError::ContentOutsideRoot);
                };
                element
                    .text
                    .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) => {}
        }
        buf.clear();
    }

    if let Some(element) = stack.last() {
        return Err(TransformError::UnexpectedEof {
            open: element.name.clone(),
        });
    }
    root.ok_or(TransformError::NoRoot)
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, quick_xml::Error> {
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn close(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}
