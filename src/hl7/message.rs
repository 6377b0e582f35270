//! Decoded HL7 message structure
//!
//! The five-level hierarchy of an HL7v2 message: segments, fields,
//! repetitions, components, subcomponents. Indexing follows HL7 convention:
//! fields, repetitions, components, and subcomponents are all 1-based, and
//! field index 0 is reserved for the segment tag.
//!
//! Accessors are total: anything a producer omitted (HL7 senders routinely
//! drop trailing optional fields) reads back as an empty string rather than
//! an error or a panic.

use crate::hl7::separators::Separators;

/// A fully decoded HL7 message
///
/// Segment order is preserved exactly as received. The structure lives only
/// for one decode+extract cycle and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    segments: Vec<Segment>,
    separators: Separators,
}

impl DecodedMessage {
    pub(crate) fn new(segments: Vec<Segment>, separators: Separators) -> Self {
        Self {
            segments,
            separators,
        }
    }

    /// The message header segment
    ///
    /// The decoder guarantees MSH is present and first.
    pub fn msh(&self) -> &Segment {
        &self.segments[0]
    }

    /// First segment with the given tag, in message order
    pub fn segment(&self, tag: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.tag() == tag)
    }

    /// All segments with the given tag, in message order
    pub fn segments_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Segment> {
        self.segments.iter().filter(move |s| s.tag() == tag)
    }

    /// All segments in message order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The delimiter set the message was decoded with
    pub fn separators(&self) -> Separators {
        self.separators
    }
}

/// One segment: a tag plus its fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    tag: String,
    fields: Vec<Field>,
}

impl Segment {
    pub(crate) fn new(tag: String, fields: Vec<Field>) -> Self {
        Self { tag, fields }
    }

    /// The 3-character segment type tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Field by 1-based HL7 index
    ///
    /// Index 0 is the tag and always returns `None` here; use [`tag`](Self::tag).
    /// For MSH the decoder inserts the field separator as field 1, so MSH-9
    /// and MSH-10 land at the indexes the standard names.
    pub fn field(&self, index: usize) -> Option<&Field> {
        if index == 0 {
            return None;
        }
        self.fields.get(index - 1)
    }

    /// First primitive value of a field, or `""` when absent
    pub fn field_value(&self, index: usize) -> &str {
        self.field(index).map(Field::value).unwrap_or("")
    }

    /// Number of fields present (excluding the tag)
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// One field: an ordered sequence of repetitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    repetitions: Vec<Repetition>,
}

impl Field {
    pub(crate) fn new(repetitions: Vec<Repetition>) -> Self {
        Self { repetitions }
    }

    /// All repetitions in order
    pub fn repetitions(&self) -> &[Repetition] {
        &self.repetitions
    }

    /// Repetition by 1-based index
    pub fn repetition(&self, index: usize) -> Option<&Repetition> {
        if index == 0 {
            return None;
        }
        self.repetitions.get(index - 1)
    }

    /// Component of the first repetition by 1-based index, or `""` when absent
    pub fn component(&self, index: usize) -> &str {
        self.repetitions
            .first()
            .map(|r| r.component(index))
            .unwrap_or("")
    }

    /// First primitive value: first repetition, first component, first
    /// subcomponent. `""` when the field is empty.
    pub fn value(&self) -> &str {
        self.component(1)
    }
}

/// One repetition of a field: an ordered sequence of components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repetition {
    components: Vec<Component>,
}

impl Repetition {
    pub(crate) fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// All components in order
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Component value by 1-based index, or `""` when absent
    pub fn component(&self, index: usize) -> &str {
        if index == 0 {
            return "";
        }
        self.components
            .get(index - 1)
            .map(Component::value)
            .unwrap_or("")
    }
}

/// One component: an ordered sequence of subcomponent strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    subcomponents: Vec<String>,
}

impl Component {
    pub(crate) fn new(subcomponents: Vec<String>) -> Self {
        Self { subcomponents }
    }

    /// The first subcomponent, or `""` for an empty component
    pub fn value(&self) -> &str {
        self.subcomponents.first().map(String::as_str).unwrap_or("")
    }

    /// Subcomponent by 1-based index, or `""` when absent
    pub fn subcomponent(&self, index: usize) -> &str {
        if index == 0 {
            return "";
        }
        self.subcomponents
            .get(index - 1)
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use crate::hl7::decode;

    const SAMPLE: &str = "MSH|^~\\&|EPIC|HOSP|LAB|HOSP|202305011030||ADT^A01|12345|P|2.3\rPID|1||PAT999^^^^MRN||DOE^JOHN||19700101|M\rPV1|1|I|ICU^ROOM10^BED2";

    #[test]
    fn test_msh_field_numbering_matches_standard() {
        let msg = decode(SAMPLE.as_bytes()).unwrap();
        let msh = msg.msh();
        assert_eq!(msh.field_value(1), "|");
        assert_eq!(msh.field_value(2), "^~\\&");
        assert_eq!(msh.field_value(3), "EPIC");
        assert_eq!(msh.field_value(7), "202305011030");
        assert_eq!(msh.field(9).unwrap().component(1), "ADT");
        assert_eq!(msh.field(9).unwrap().component(2), "A01");
        assert_eq!(msh.field_value(10), "12345");
    }

    #[test]
    fn test_one_based_field_access() {
        let msg = decode(SAMPLE.as_bytes()).unwrap();
        let pid = msg.segment("PID").unwrap();
        assert_eq!(pid.tag(), "PID");
        assert_eq!(pid.field_value(1), "1");
        assert_eq!(pid.field_value(3), "PAT999");
        assert_eq!(pid.field(5).unwrap().component(1), "DOE");
        assert_eq!(pid.field(5).unwrap().component(2), "JOHN");
        assert!(pid.field(0).is_none());
    }

    #[test]
    fn test_absent_trailing_fields_read_empty() {
        let msg = decode(SAMPLE.as_bytes()).unwrap();
        let pv1 = msg.segment("PV1").unwrap();
        // PV1 has only 3 fields here; everything beyond reads empty
        assert_eq!(pv1.field_value(44), "");
        assert!(pv1.field(44).is_none());
        assert_eq!(pv1.field(3).unwrap().component(9), "");
    }

    #[test]
    fn test_repetition_access() {
        let raw = "MSH|^~\\&|A|B|C|D|202305011030||ADT^A08|M1|P|2.3\rPID|1||ENC123^^^^EN~PAT999^^^^MRN\rPV1|1";
        let msg = decode(raw.as_bytes()).unwrap();
        let pid3 = msg.segment("PID").unwrap().field(3).unwrap();
        assert_eq!(pid3.repetitions().len(), 2);
        assert_eq!(pid3.repetition(1).unwrap().component(1), "ENC123");
        assert_eq!(pid3.repetition(2).unwrap().component(1), "PAT999");
        assert_eq!(pid3.repetition(2).unwrap().component(5), "MRN");
    }

    #[test]
    fn test_subcomponent_access() {
        let raw = "MSH|^~\\&|A|B|C|D|202305011030||ADT^A01|M1|P|2.3\rPID|1||P1||X&Y^Z\rPV1|1";
        let msg = decode(raw.as_bytes()).unwrap();
        let name = msg.segment("PID").unwrap().field(5).unwrap();
        let comp = &name.repetition(1).unwrap().components()[0];
        assert_eq!(comp.subcomponent(1), "X");
        assert_eq!(comp.subcomponent(2), "Y");
        assert_eq!(comp.value(), "X");
        assert_eq!(comp.subcomponent(3), "");
    }
}
