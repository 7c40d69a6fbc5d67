//! XML to JSON conversion for cluster manifests
//!
//! Produces the same loose shape the management tooling has always consumed:
//!
//! - the document becomes `{ "<Root>": <element> }`
//! - attributes live under `"$"`, text under `"_"`
//! - an element with neither attributes nor children is just its text
//! - a tag seen once is a single value; repeated sibling tags become an array
//!   in document order
//!
//! Because of the last rule, readers must accept either a single element or an
//! array wherever a tag may repeat (see [`as_list`]).

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use thiserror::Error;

pub const ATTRIBUTES_KEY: &str = "$";
pub const TEXT_KEY: &str = "_";

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("unexpected element <{0}> after the root element")]
    TrailingElement(String),
    #[error("document has no root element")]
    NoRoot,
}

struct Frame {
    name: String,
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.insert(key, Value::String(value));
        }

        Ok(Frame {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn push_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }

    fn close(self) -> (String, Value) {
        let Frame {
            name,
            attributes,
            mut children,
            text,
        } = self;

        if attributes.is_empty() && children.is_empty() {
            return (name, Value::String(text));
        }

        if !attributes.is_empty() {
            children.insert(ATTRIBUTES_KEY.to_string(), Value::Object(attributes));
        }
        if !text.is_empty() {
            children.insert(TEXT_KEY.to_string(), Value::String(text));
        }

        (name, Value::Object(children))
    }
}

/// Convert an XML document into a JSON value.
pub fn to_json(xml: &str) -> Result<Value, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let closed = match reader.read_event()? {
            Event::Start(start) => {
                stack.push(Frame::open(&start)?);
                None
            }
            Event::Empty(start) => Some(Frame::open(&start)?.close()),
            Event::End(_) => stack.pop().map(Frame::close),
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text.unescape()?);
                }
                None
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data));
                }
                None
            }
            Event::Eof => break,
            _ => None,
        };

        let Some((name, value)) = closed else {
            continue;
        };

        match stack.last_mut() {
            Some(parent) => parent.push_child(name, value),
            None if root.is_some() => return Err(XmlError::TrailingElement(name)),
            None => root = Some((name, value)),
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }

    let (name, value) = root.ok_or(XmlError::NoRoot)?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

/// View a field that may hold one element or an array of them as a list.
pub fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    }
}

/// Attribute `name` of a converted element.
pub fn attribute<'a>(element: &'a Value, name: &str) -> Option<&'a str> {
    element.get(ATTRIBUTES_KEY)?.get(name)?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_json_attributes_and_children() {
        let xml = r#"<Root Version="1"><Child Name="a"/><Other>text</Other></Root>"#;

        let value = to_json(xml).unwrap();

        assert_eq!(
            value,
            json!({
                "Root": {
                    "$": { "Version": "1" },
                    "Child": { "$": { "Name": "a" } },
                    "Other": "text"
                }
            })
        );
    }

    #[test]
    fn test_to_json_repeated_siblings_become_array_in_order() {
        let xml = r#"<Root><Item Name="1"/><Item Name="2"/><Item Name="3"/></Root>"#;

        let value = to_json(xml).unwrap();
        let items = value["Root"]["Item"].as_array().unwrap();

        let names: Vec<_> = items.iter().filter_map(|i| attribute(i, "Name")).collect();
        assert_eq!(names, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_to_json_single_sibling_stays_scalar() {
        let value = to_json(r#"<Root><Item Name="only"/></Root>"#).unwrap();

        assert!(value["Root"]["Item"].is_object());
        assert_eq!(as_list(value["Root"].get("Item")).len(), 1);
    }

    #[test]
    fn test_to_json_text_with_attributes() {
        let value = to_json(r#"<Root Kind="x">  hello &amp; bye  </Root>"#).unwrap();

        assert_eq!(value["Root"]["_"], "hello & bye");
        assert_eq!(value["Root"]["$"]["Kind"], "x");
    }

    #[test]
    fn test_to_json_strips_namespaces() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<ClusterManifest xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns="http://schemas.microsoft.com/2011/01/fabric" Name="c">
  <xsi:Note>n</xsi:Note>
</ClusterManifest>"#;

        let value = to_json(xml).unwrap();

        assert_eq!(value["ClusterManifest"]["$"], json!({ "Name": "c" }));
        assert_eq!(value["ClusterManifest"]["Note"], "n");
    }

    #[test]
    fn test_to_json_empty_element_is_empty_string() {
        assert_eq!(to_json("<Root/>").unwrap(), json!({ "Root": "" }));
    }

    #[test]
    fn test_to_json_rejects_unclosed() {
        assert!(to_json("<Root><Child>").is_err());
    }

    #[test]
    fn test_to_json_rejects_mismatched_end() {
        assert!(to_json("<Root><Child></Other></Root>").is_err());
    }

    #[test]
    fn test_to_json_rejects_empty_document() {
        assert!(matches!(to_json(""), Err(XmlError::NoRoot)));
        assert!(matches!(to_json("   "), Err(XmlError::NoRoot)));
    }

    #[test]
    fn test_as_list_normalizes() {
        let single = json!({ "a": 1 });
        let many = json!([1, 2]);

        assert_eq!(as_list(Some(&single)).len(), 1);
        assert_eq!(as_list(Some(&many)).len(), 2);
        assert!(as_list(None).is_empty());
        assert!(as_list(Some(&Value::Null)).is_empty());
    }
}
