//! HL7v2 message decoding
//!
//! Pure, stateless parsing of pipe-and-caret HL7v2 text into the segment /
//! field / repetition / component / subcomponent hierarchy. No synchronization
//! needed; nothing here touches storage.

pub mod decoder;
pub mod message;
pub mod separators;
pub mod timestamp;

pub use decoder::decode;
pub use message::{Component, DecodedMessage, Field, Repetition, Segment};
pub use separators::Separators;
pub use timestamp::parse_hl7_timestamp;
