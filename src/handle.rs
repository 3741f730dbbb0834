//! `EngineState`: the single object created by `edc_init` and threaded
//! through every subsequent ABI call via an opaque handle.
//!
//! Nothing here is process-wide or `static`: the decision-loop ABI forbids
//! concurrent invocation on one handle, so `EngineState` is a plain struct
//! with no interior synchronization. `Box::into_raw`/`Box::from_raw` at the
//! FFI boundary (`ffi.rs`) are the only place a raw pointer appears.

use edc_core::{DecisionEngine, EngineConfig};
use edc_protocol::WireFormat;

/// Everything the decision loop owns between calls: the wire format
/// negotiated at init, the Decision Engine (and through it the Host Pool,
/// Job Registry and Budget Controller), and the previous call's output
/// buffer, kept alive until the next call or deinit per the ABI contract.
pub struct EngineState {
    pub format: WireFormat,
    pub engine: DecisionEngine,
    last_output: Option<Box<[u8]>>,
}

impl EngineState {
    pub fn new(format: WireFormat, config: EngineConfig) -> Self {
        Self {
            format,
            engine: DecisionEngine::new(config),
            last_output: None,
        }
    }

    /// Stores `bytes` as the buffer the caller's `out_buf`/`out_len` pair
    /// will point at, dropping whatever the previous call produced (this
    /// is what bounds the "valid until the next call or deinit" lifetime
    /// without leaking memory across many ticks). Returns a non-owning
    /// pointer/length pair into the stored buffer; `self` retains
    /// ownership and frees it on the next call or on drop.
    pub fn set_output(&mut self, bytes: Vec<u8>) -> (*mut u8, usize) {
        let boxed: Box<[u8]> = bytes.into_boxed_slice();
        self.last_output = Some(boxed);
        let slice = self.last_output.as_mut().unwrap();
        (slice.as_mut_ptr(), slice.len())
    }
}
