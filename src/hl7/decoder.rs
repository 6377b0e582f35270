//! HL7v2 message decoder
//!
//! Turns raw bytes into a [`DecodedMessage`]. The decoder normalizes all
//! recognized line-ending variants (CR, LF, CRLF) to the HL7 segment
//! terminator before splitting, reads the delimiter declaration from MSH, and
//! splits fields recursively into repetitions, components, and subcomponents.
//!
//! Two structural rules are enforced and nothing more: the input must contain
//! at least one segment, and that first segment must be MSH. Everything else
//! a producer gets wrong (short segments, omitted trailing fields) decodes
//! into empty values instead of failing; rejecting those wholesale would
//! drop real traffic.

use crate::domain::errors::DecodeError;
use crate::hl7::message::{Component, DecodedMessage, Field, Repetition, Segment};
use crate::hl7::separators::Separators;

/// Decodes raw message bytes into a structured HL7 message
///
/// # Errors
///
/// Returns [`DecodeError::InvalidEncoding`] for non-UTF-8 input,
/// [`DecodeError::EmptyMessage`] for empty or whitespace-only input, and
/// [`DecodeError::MshNotFirst`] when the first segment is not MSH.
///
/// # Examples
///
/// ```
/// use census::hl7::decode;
///
/// let raw = b"MSH|^~\\&|EPIC|HOSP|LAB|HOSP|202305011030||ADT^A01|12345|P|2.3\rPID|1||PAT999\rPV1|1|I|ICU";
/// let msg = decode(raw).unwrap();
/// assert_eq!(msg.segment("PID").unwrap().field_value(3), "PAT999");
/// ```
pub fn decode(raw: &[u8]) -> Result<DecodedMessage, DecodeError> {
    let text =
        std::str::from_utf8(raw).map_err(|e| DecodeError::InvalidEncoding(e.to_string()))?;

    // Normalize CRLF and bare LF to the HL7 segment terminator
    let normalized = text.replace("\r\n", "\r").replace('\n', "\r");
    let trimmed = normalized.trim_matches(|c: char| c.is_whitespace());

    if trimmed.is_empty() {
        return Err(DecodeError::EmptyMessage);
    }

    let lines: Vec<&str> = trimmed
        .split('\r')
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();

    let first = lines.first().ok_or(DecodeError::EmptyMessage)?;
    if !first.starts_with("MSH") {
        let found: String = first.chars().take(3).collect();
        return Err(DecodeError::MshNotFirst(found));
    }

    let separators = Separators::from_msh_line(first);

    let segments = lines
        .iter()
        .map(|line| decode_segment(line, &separators))
        .collect();

    Ok(DecodedMessage::new(segments, separators))
}

fn decode_segment(line: &str, sep: &Separators) -> Segment {
    let mut parts = line.split(sep.field);
    let tag = parts.next().unwrap_or("").to_string();

    let mut fields: Vec<Field> = Vec::new();

    if tag == "MSH" {
        // The field separator itself is MSH-1 and the encoding characters are
        // MSH-2; the latter is kept literal because splitting it on the very
        // characters it declares would destroy it.
        fields.push(literal_field(&sep.field.to_string()));
        if let Some(encoding) = parts.next() {
            fields.push(literal_field(encoding));
        }
    }

    fields.extend(parts.map(|f| decode_field(f, sep)));

    Segment::new(tag, fields)
}

/// A field holding one raw value, exempt from delimiter splitting
fn literal_field(value: &str) -> Field {
    Field::new(vec![Repetition::new(vec![Component::new(vec![value
        .to_string()])])])
}

fn decode_field(input: &str, sep: &Separators) -> Field {
    let repetitions = input
        .split(sep.repetition)
        .map(|r| decode_repetition(r, sep))
        .collect();
    Field::new(repetitions)
}

fn decode_repetition(input: &str, sep: &Separators) -> Repetition {
    let components = input
        .split(sep.component)
        .map(|c| decode_component(c, sep))
        .collect();
    Repetition::new(components)
}

fn decode_component(input: &str, sep: &Separators) -> Component {
    let subcomponents = input
        .split(sep.subcomponent)
        .map(str::to_string)
        .collect();
    Component::new(subcomponents)
}
