//! Wire codec behind the `FORMAT_BINARY` / `FORMAT_JSON` init flags.
//!
//! `FORMAT_JSON` is plain `serde_json`; `FORMAT_BINARY` is CBOR via
//! `ciborium`, tagged the same way `#[serde(tag = "t")]` tags the event and
//! decision enums. A decoder failure in either format is fatal.

use crate::decision::DecisionBatch;
use crate::event::EventBatch;
use thiserror::Error;

/// The two wire formats the ABI's init flags may select, mutually
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Binary,
    Json,
}

pub const FORMAT_BINARY: u32 = 0x1;
pub const FORMAT_JSON: u32 = 0x2;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown or conflicting format flags: {0:#x}")]
    UnknownFlags(u32),
    #[error("json decode failed: {0}")]
    JsonDecode(#[from] serde_json::Error),
    #[error("cbor decode failed: {0}")]
    CborDecode(#[from] ciborium::de::Error<std::io::Error>),
    #[error("cbor encode failed: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),
}

impl WireFormat {
    /// Resolves the init flags into exactly one format. Unknown bits, or
    /// both/neither of the two recognized bits, are a fatal init error.
    pub fn from_flags(flags: u32) -> Result<Self, CodecError> {
        match flags {
            FORMAT_BINARY => Ok(WireFormat::Binary),
            FORMAT_JSON => Ok(WireFormat::Json),
            other => Err(CodecError::UnknownFlags(other)),
        }
    }

    pub fn decode_events(&self, bytes: &[u8]) -> Result<EventBatch, CodecError> {
        match self {
            WireFormat::Json => Ok(serde_json::from_slice(bytes)?),
            WireFormat::Binary => Ok(ciborium::de::from_reader(bytes)?),
        }
    }

    pub fn encode_decisions(&self, batch: &DecisionBatch) -> Result<Vec<u8>, CodecError> {
        match self {
            WireFormat::Json => Ok(serde_json::to_vec(batch)?),
            WireFormat::Binary => {
                let mut out = Vec::new();
                ciborium::ser::into_writer(batch, &mut out)?;
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Decision;
    use crate::event::Event;

    #[test]
    fn from_flags_rejects_both_bits() {
        assert!(WireFormat::from_flags(FORMAT_BINARY | FORMAT_JSON).is_err());
    }

    #[test]
    fn from_flags_rejects_neither_bit() {
        assert!(WireFormat::from_flags(0).is_err());
    }

    #[test]
    fn from_flags_rejects_unrecognized_bit() {
        assert!(WireFormat::from_flags(0x8).is_err());
    }

    #[test]
    fn json_round_trip() {
        let fmt = WireFormat::from_flags(FORMAT_JSON).unwrap();
        let batch = EventBatch {
            now: 0.0,
            events: vec![Event::Hello],
        };
        let encoded = serde_json::to_vec(&batch).unwrap();
        let decoded = fmt.decode_events(&encoded).unwrap();
        assert_eq!(decoded, batch);
    }

    #[test]
    fn binary_round_trip() {
        let fmt = WireFormat::from_flags(FORMAT_BINARY).unwrap();
        let batch = DecisionBatch {
            now: 5.0,
            decisions: vec![Decision::RejectJob { id: "j1".into() }],
        };
        let encoded = fmt.encode_decisions(&batch).unwrap();

        let decoded: DecisionBatch = ciborium::de::from_reader(encoded.as_slice()).unwrap();
        assert_eq!(decoded, batch);
    }

    #[test]
    fn malformed_json_is_decoder_error() {
        let fmt = WireFormat::from_flags(FORMAT_JSON).unwrap();
        assert!(fmt.decode_events(b"{not json").is_err());
    }
}
