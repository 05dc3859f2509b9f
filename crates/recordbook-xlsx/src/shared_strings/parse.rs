use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use thiserror::Error;

use super::SharedStrings;

#[derive(Debug, Error)]
pub enum SharedStringsError {
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("malformed sharedStrings.xml: {0}")]
    Malformed(&'static str),
}

/// Parse `xl/sharedStrings.xml` into a table indexed by document order.
///
/// Rich-text items (`<si><r><t>..</t></r>..</si>`) flatten to their concatenated visible text;
/// phonetic (`<rPh>`) runs and other subtrees are skipped.
pub fn parse_shared_strings_xml(xml: &str) -> Result<SharedStrings, SharedStringsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut items = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                items.push(read_string_item(&mut reader, b"si")?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"si" => items.push(String::new()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(SharedStrings::from_items(items))
}

/// Read the visible text of a string item (`<si>` or an inline `<is>`) up to its end tag.
pub(crate) fn read_string_item(
    reader: &mut Reader<&[u8]>,
    end_local: &[u8],
) -> Result<String, SharedStringsError> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                text.push_str(&read_text(reader, e.name().as_ref())?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"r" => {
                text.push_str(&parse_r(reader)?);
            }
            Event::Start(e) => {
                // Phonetic guide runs and extensions may contain `<t>` elements that are not part
                // of the displayed string.
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::End(e) if e.local_name().as_ref() == end_local => break,
            Event::Eof => return Err(SharedStringsError::Malformed("unexpected eof in string item")),
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

fn parse_r(reader: &mut Reader<&[u8]>) -> Result<String, SharedStringsError> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                text.push_str(&read_text(reader, e.name().as_ref())?);
            }
            Event::Start(e) => {
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"r" => break,
            Event::Eof => return Err(SharedStringsError::Malformed("unexpected eof in <r>")),
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

pub(crate) fn read_text(
    reader: &mut Reader<&[u8]>,
    end: &[u8],
) -> Result<String, SharedStringsError> {
    let end = end.to_vec();
    let mut buf = Vec::new();
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => {
                let t: Cow<'_, str> = e.unescape()?;
                text.push_str(&t);
            }
            Event::CData(e) => {
                text.push_str(std::str::from_utf8(e.as_ref())?);
            }
            Event::End(e) if e.name() == QName(end.as_slice()) => break,
            Event::Eof => return Err(SharedStringsError::Malformed("unexpected eof in <t>")),
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}
