//! Wire vocabulary and codec for the EDC decision-loop ABI.
//!
//! This crate owns the event/decision adapter: the `Event`/`Decision`
//! enums, the compact allocation-string renderer, and the JSON/CBOR codec
//! selected by the ABI's init flags. It knows nothing about scheduling
//! policy — that lives in `edc-core`.

pub mod alloc_fmt;
pub mod codec;
pub mod decision;
pub mod event;

pub use codec::{CodecError, WireFormat, FORMAT_BINARY, FORMAT_JSON};
pub use decision::{Decision, DecisionBatch};
pub use event::{Event, EventBatch};
