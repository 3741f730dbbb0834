//! FFI-boundary error type. A C ABI cannot carry a Rust `Result` across
//! the edge, so each variant here maps onto one of the small negative
//! integer codes the three exported routines return; the type exists so
//! the mapping is made once, in one place, instead of scattered `-1`/`-2`
//! literals at every call site.

use thiserror::Error;

use crate::ffi::{EDC_ERR_DECODE, EDC_ERR_HANDLE, EDC_ERR_INIT};

#[derive(Debug, Error)]
pub enum FfiError {
    #[error("invalid init parameters: {0}")]
    Init(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("decoder or engine failure: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("null or invalid handle/pointer argument")]
    Handle,
}

impl FfiError {
    pub fn code(&self) -> i32 {
        match self {
            FfiError::Init(_) => EDC_ERR_INIT,
            FfiError::Decode(_) => EDC_ERR_DECODE,
            FfiError::Handle => EDC_ERR_HANDLE,
        }
    }
}
