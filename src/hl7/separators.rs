//! HL7 delimiter set
//!
//! HL7v2 declares its own delimiters in the message header: the field
//! separator is the byte immediately after `MSH`, and MSH-2 lists the
//! component, repetition, escape, and subcomponent characters in that order.
//! Nothing here is hardcoded beyond the standard defaults used when the
//! declaration is absent or truncated.

/// The delimiter set in force for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separators {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

impl Separators {
    /// Reads the declared delimiters from a raw MSH segment line
    ///
    /// Falls back to the standard defaults for any position the declaration
    /// does not cover; a malformed MSH-2 therefore degrades gracefully rather
    /// than failing the decode.
    pub fn from_msh_line(line: &str) -> Self {
        let defaults = Self::default();
        let mut chars = line.chars().skip(3);

        let field = match chars.next() {
            Some(c) => c,
            None => return defaults,
        };

        // MSH-2 runs from the 5th character to the next field separator
        let mut encoding = chars.take_while(|&c| c != field);

        Self {
            field,
            component: encoding.next().unwrap_or(defaults.component),
            repetition: encoding.next().unwrap_or(defaults.repetition),
            escape: encoding.next().unwrap_or(defaults.escape),
            subcomponent: encoding.next().unwrap_or(defaults.subcomponent),
        }
    }
}
