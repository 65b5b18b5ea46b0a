//! Drives **quick_xml** and reports the document structure to a [TokenHandler].
//!
//! The tokenizer takes care of well-formedness: proper nesting, matching end tags and complete
//! documents. Each error is tagged with the byte position at which it was detected. Text is
//! trimmed and empty elements are reported as a start followed by an end.
//!
//! ```
//! use adm::status::AdmResult;
//! use adm::xml::tokenizer::{tokenize, TokenHandler};
//!
//! #[derive(Default)]
//! struct Names(Vec<String>);
//!
//! impl TokenHandler for Names {
//!     fn element_start(&mut self, name: &str) -> AdmResult<()> {
//!         self.0.push(name.to_owned());
//!         Ok(())
//!     }
//! }
//!
//! let mut names = Names::default();
//! tokenize(r#"<a x="1"><b/><c>text</c></a>"#.as_bytes(), &mut names).unwrap();
//! assert_eq!(names.0, vec!["a", "b", "c"]);
//! ```
use std::borrow::Cow;
use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::adm_error;
use crate::status::AdmResult;

/// The element name under which the attributes of the XML declaration are reported.
pub const DECLARATION: &str = "xml";

/// Receives the structure of a document.
///
/// All callbacks default to doing nothing so that a handler only needs to implement what it
/// is interested in.
pub trait TokenHandler {
    /// Invoked when the XML declaration starts.
    fn declaration_start(&mut self) -> AdmResult<()> {
        Ok(())
    }

    /// Invoked once all attributes of the XML declaration have been reported.
    fn declaration_end(&mut self) -> AdmResult<()> {
        Ok(())
    }

    /// Invoked when an element is opened.
    fn element_start(&mut self, _name: &str) -> AdmResult<()> {
        Ok(())
    }

    /// Invoked for each attribute of the most recently opened element (or the declaration).
    fn attribute(&mut self, _element: &str, _name: &str, _value: &str) -> AdmResult<()> {
        Ok(())
    }

    /// Invoked for the (trimmed, unescaped) text content of the innermost open element.
    fn element_text(&mut self, _element: &str, _text: &str) -> AdmResult<()> {
        Ok(())
    }

    /// Invoked when an element is closed.
    fn element_end(&mut self, _name: &str) -> AdmResult<()> {
        Ok(())
    }
}

fn decode(data: Cow<[u8]>) -> AdmResult<String> {
    String::from_utf8(data.into_owned())
        .map_err(|error| adm_error!(Error, "The document is not valid UTF-8: {}", error))
}

/// Reads the given input and reports its structure to the handler.
///
/// The input must be UTF-8. Processing stops at the first error, which carries the byte
/// position at which it occurred.
pub fn tokenize<B: BufRead, H: TokenHandler>(input: B, handler: &mut H) -> AdmResult<()> {
    let mut reader = Reader::from_reader(input);
    let _ = reader
        .trim_text(true)
        .expand_empty_elements(true)
        .check_end_names(true);

    let mut buffer = Vec::new();
    let mut open_elements: Vec<String> = Vec::new();

    loop {
        let result = read_event(&mut reader, &mut buffer, &mut open_elements, handler);
        let position = reader.buffer_position();
        match result {
            Ok(true) => buffer.clear(),
            Ok(false) => return Ok(()),
            Err(error) => return Err(error.at_position(position)),
        }
    }
}

/// Processes a single event and returns `false` once the document is complete.
fn read_event<B: BufRead, H: TokenHandler>(
    reader: &mut Reader<B>,
    buffer: &mut Vec<u8>,
    open_elements: &mut Vec<String>,
    handler: &mut H,
) -> AdmResult<bool> {
    match reader.read_event(buffer)? {
        Event::Decl(declaration) => {
            handler.declaration_start()?;
            let version = decode(declaration.version()?)?;
            handler.attribute(DECLARATION, "version", &version)?;
            if let Some(encoding) = declaration.encoding() {
                handler.attribute(DECLARATION, "encoding", &decode(encoding?)?)?;
            }
            if let Some(standalone) = declaration.standalone() {
                handler.attribute(DECLARATION, "standalone", &decode(standalone?)?)?;
            }
            handler.declaration_end()?;
        }
        Event::Start(element) => {
            let name = decode(Cow::Borrowed(element.name()))?;
            handler.element_start(&name)?;
            for attribute in element.attributes() {
                let attribute = attribute?;
                let key = decode(Cow::Borrowed(attribute.key))?;
                let value = decode(attribute.unescaped_value()?)?;
                handler.attribute(&name, &key, &value)?;
            }
            open_elements.push(name);
        }
        Event::Text(text) => {
            let text = decode(text.unescaped()?)?;
            let text = text.trim();
            if text.is_empty() {
                return Ok(true);
            }
            if let Some(name) = open_elements.last() {
                handler.element_text(name, text)?;
            } else {
                return Err(adm_error!(Error, "Unexpected text outside of the root element"));
            }
        }
        Event::CData(text) => {
            if let Some(name) = open_elements.last() {
                handler.element_text(name, &decode(Cow::Borrowed(&text))?)?;
            }
        }
        Event::End(element) => {
            let name = decode(Cow::Borrowed(element.name()))?;
            match open_elements.pop() {
                Some(expected) if expected == name => handler.element_end(&name)?,
                _ => return Err(adm_error!(Error, "Unexpected closing tag: {}", name)),
            }
        }
        Event::Eof => {
            return match open_elements.last() {
                Some(name) => Err(adm_error!(
                    Error,
                    "Unexpected end of document: {} is still open",
                    name
                )),
                None => Ok(false),
            };
        }
        _ => {}
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use crate::status::{AdmResult, Status};
    use crate::xml::lines::LineBuffer;
    use crate::xml::tokenizer::{tokenize, TokenHandler};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl TokenHandler for Recorder {
        fn declaration_start(&mut self) -> AdmResult<()> {
            self.events.push("decl".to_owned());
            Ok(())
        }

        fn element_start(&mut self, name: &str) -> AdmResult<()> {
            self.events.push(format!("<{}", name));
            Ok(())
        }

        fn attribute(&mut self, element: &str, name: &str, value: &str) -> AdmResult<()> {
            self.events.push(format!("{}@{}={}", element, name, value));
            Ok(())
        }

        fn element_text(&mut self, element: &str, text: &str) -> AdmResult<()> {
            self.events.push(format!("{}:{}", element, text));
            Ok(())
        }

        fn element_end(&mut self, name: &str) -> AdmResult<()> {
            self.events.push(format!("{}>", name));
            Ok(())
        }
    }

    #[test]
    fn events_are_reported_in_document_order() {
        let mut recorder = Recorder::default();
        tokenize(
            LineBuffer::new(
                b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                  <a name=\"x &amp; y\">\n  <b/>\n  <c> text </c>\n</a>\n",
            ),
            &mut recorder,
        )
        .unwrap();

        assert_eq!(
            recorder.events,
            vec![
                "decl",
                "xml@version=1.0",
                "xml@encoding=UTF-8",
                "<a",
                "a@name=x & y",
                "<b",
                "b>",
                "<c",
                "c:text",
                "c>",
                "a>"
            ]
        );
    }

    #[test]
    fn malformed_nesting_is_an_error() {
        let mut recorder = Recorder::default();
        let error = tokenize(&b"<a>\n<b>\n</a>"[..], &mut recorder).unwrap_err();
        assert_eq!(error.status(), Status::Error);
        assert!(error.position().is_some());
    }

    #[test]
    fn truncated_documents_are_an_error() {
        let mut recorder = Recorder::default();
        let error = tokenize(&b"<a><b></b>"[..], &mut recorder).unwrap_err();
        assert_eq!(error.status(), Status::Error);
        assert!(error.to_string().contains("a is still open"));
    }
}
