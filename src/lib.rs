//! `edc-runtime`: the FFI-facing root crate of the energy-budget-aware
//! decision core. Exposes the three-routine decision-loop ABI
//! (`edc_init` / `edc_take_decisions` / `edc_deinit`) over the scheduling
//! core in `edc-core` and the wire vocabulary in `edc-protocol`.
//!
//! Everything behind the ABI is safe Rust; `ffi.rs` is the only module
//! that touches a raw pointer, at the handle boundary itself.

mod error;
mod ffi;
mod handle;

pub use ffi::{edc_deinit, edc_init, edc_take_decisions, EDC_ERR_DECODE, EDC_ERR_HANDLE, EDC_ERR_INIT, EDC_OK};
pub use handle::EngineState;

// Re-exported so an in-process Rust caller of this crate's `rlib` output
// can drive the core directly, without going through the raw C ABI.
pub use edc_core::{DecisionEngine, EngineConfig};
pub use edc_protocol::{Decision, DecisionBatch, Event, EventBatch, WireFormat};
