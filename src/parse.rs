//! SVG parsing from XML.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::ast::*;
use crate::error::PixvecError;

/// Parse an SVG string into an element tree rooted at the first element.
///
/// Declarations, DOCTYPEs, comments, CDATA and processing instructions are
/// skipped; the flattener has no use for them.
pub fn parse_svg(svg: &str) -> Result<Element, PixvecError> {
    let mut reader = Reader::from_str(svg);

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                return parse_element(&mut reader, &start);
            }
            Event::Empty(start) => {
                return parse_element_start(&start);
            }
            Event::Eof => break,
            _ => {
                // Skip anything before the root element.
            }
        }
    }

    Err(PixvecError::NoSvgRoot)
}

fn parse_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Element, PixvecError> {
    let mut element = parse_element_start(start)?;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                element
                    .children
                    .push(Node::Element(parse_element(reader, &start)?));
            }
            Event::Empty(start) => {
                element
                    .children
                    .push(Node::Element(parse_element_start(&start)?));
            }
            Event::End(_) => {
                break;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if !text.trim().is_empty() {
                    element.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::Eof => {
                return Err(PixvecError::NoSvgRoot);
            }
            _ => {}
        }
    }

    Ok(element)
}

fn parse_element_start(start: &BytesStart) -> Result<Element, PixvecError> {
    let name_bytes = start.name();
    let name = std::str::from_utf8(name_bytes.as_ref())?;

    let mut element = Element {
        name: QName::parse(name),
        attributes: Vec::new(),
        children: Vec::new(),
    };

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::InvalidAttr)?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?;
        element.attributes.push(Attribute {
            name: QName::parse(key),
            value: value.into_owned(),
        });
    }

    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_svg() {
        let svg = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
    <rect x="10" y="10" width="80" height="80" fill="red"/>
</svg>"#;

        let root = parse_svg(svg).unwrap();
        assert!(root.is("svg"));
        assert_eq!(root.get_attr("width"), Some("100"));
        assert_eq!(root.child_elements().count(), 1);
    }

    #[test]
    fn test_parse_skips_comments() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
    <!-- This is a comment -->
    <rect/>
</svg>"#;

        let root = parse_svg(svg).unwrap();
        assert_eq!(root.children.len(), 1);
        assert!(matches!(root.children[0], Node::Element(_)));
    }

    #[test]
    fn test_parse_nested() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
    <g transform="translate(5,5)"><circle cx="0" cy="0" r="4"/></g>
</svg>"#;

        let root = parse_svg(svg).unwrap();
        let g = root.child_elements().next().unwrap();
        assert!(g.is("g"));
        assert_eq!(g.get_attr("transform"), Some("translate(5,5)"));
        assert!(g.child_elements().next().unwrap().is("circle"));
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(matches!(parse_svg(""), Err(PixvecError::NoSvgRoot)));
        assert!(matches!(
            parse_svg("<!-- nothing -->"),
            Err(PixvecError::NoSvgRoot)
        ));
    }
}
