//! `extern "C"` wrappers around the safe core. This is the only module
//! in the crate that touches a raw pointer; everything it calls into is
//! ordinary safe Rust operating on owned values.

use std::slice;

use edc_core::EngineConfig;
use edc_protocol::{DecisionBatch, EventBatch, WireFormat};

use crate::error::FfiError;
use crate::handle::EngineState;

pub const EDC_OK: i32 = 0;
pub const EDC_ERR_INIT: i32 = -1;
pub const EDC_ERR_DECODE: i32 = -2;
pub const EDC_ERR_HANDLE: i32 = -3;

fn init_impl(params: &[u8], flags: u32) -> Result<Box<EngineState>, FfiError> {
    let format = WireFormat::from_flags(flags).map_err(|e| FfiError::Init(Box::new(e)))?;
    let config = EngineConfig::from_slice(params, format).map_err(|e| FfiError::Init(Box::new(e)))?;
    Ok(Box::new(EngineState::new(format, config)))
}

/// Creates all core state from an opaque parameter blob and a format flag
/// set, writing the resulting handle to `*out_handle`. Returns `EDC_OK` on
/// success; a negative code and an untouched `*out_handle` on failure.
///
/// # Safety
/// `params` must point to `params_len` readable bytes (or be null with
/// `params_len == 0`), and `out_handle` must point to a valid, writable
/// `*mut c_void`.
#[no_mangle]
pub unsafe extern "C" fn edc_init(
    params: *const u8,
    params_len: usize,
    flags: u32,
    out_handle: *mut *mut std::ffi::c_void,
) -> i32 {
    if out_handle.is_null() {
        return EDC_ERR_HANDLE;
    }
    let bytes: &[u8] = if params.is_null() || params_len == 0 {
        &[]
    } else {
        slice::from_raw_parts(params, params_len)
    };

    match init_impl(bytes, flags) {
        Ok(state) => {
            *out_handle = Box::into_raw(state) as *mut std::ffi::c_void;
            EDC_OK
        }
        Err(err) => {
            tracing::warn!(%err, "edc_init failed");
            err.code()
        }
    }
}

fn take_decisions_impl(state: &mut EngineState, bytes: &[u8]) -> Result<Vec<u8>, FfiError> {
    let batch: EventBatch = state
        .format
        .decode_events(bytes)
        .map_err(|e| FfiError::Decode(Box::new(e)))?;
    let now = batch.now;
    let decisions = state
        .engine
        .take_decisions(batch)
        .map_err(|e| FfiError::Decode(Box::new(e)))?;
    let out_batch = DecisionBatch { now, decisions };
    state
        .format
        .encode_decisions(&out_batch)
        .map_err(|e| FfiError::Decode(Box::new(e)))
}

/// Decodes one input event batch, runs one decision-loop tick, and encodes
/// the resulting decision batch into a core-owned output buffer written to
/// `*out_buf`/`*out_len`. That buffer remains valid until the next call on
/// this handle or `edc_deinit`.
///
/// # Safety
/// `handle` must be a live pointer returned by `edc_init` and not yet
/// passed to `edc_deinit`. `in_buf` must point to `in_len` readable bytes.
/// `out_buf`/`out_len` must point to valid, writable locations.
#[no_mangle]
pub unsafe extern "C" fn edc_take_decisions(
    handle: *mut std::ffi::c_void,
    in_buf: *const u8,
    in_len: usize,
    out_buf: *mut *mut u8,
    out_len: *mut usize,
) -> i32 {
    if handle.is_null() || out_buf.is_null() || out_len.is_null() {
        return EDC_ERR_HANDLE;
    }
    let state = &mut *(handle as *mut EngineState);

    let bytes: &[u8] = if in_buf.is_null() || in_len == 0 {
        &[]
    } else {
        slice::from_raw_parts(in_buf, in_len)
    };

    match take_decisions_impl(state, bytes) {
        Ok(encoded) => {
            let (ptr, len) = state.set_output(encoded);
            *out_buf = ptr;
            *out_len = len;
            EDC_OK
        }
        Err(err) => {
            tracing::error!(%err, "edc_take_decisions failed");
            err.code()
        }
    }
}

/// Releases all core state owned by `handle`. `handle` must not be used
/// again after this call.
///
/// # Safety
/// `handle` must be a live pointer returned by `edc_init` and not already
/// passed to `edc_deinit`.
#[no_mangle]
pub unsafe extern "C" fn edc_deinit(handle: *mut std::ffi::c_void) -> i32 {
    if handle.is_null() {
        return EDC_ERR_HANDLE;
    }
    drop(Box::from_raw(handle as *mut EngineState));
    EDC_OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use edc_protocol::FORMAT_JSON;
    use std::ptr;

    fn config_blob() -> Vec<u8> {
        br#"{"policy":"PowerCap","p_idle":100.0,"p_comp":200.0}"#.to_vec()
    }

    #[test]
    fn init_then_deinit_round_trip() {
        unsafe {
            let blob = config_blob();
            let mut handle: *mut std::ffi::c_void = ptr::null_mut();
            let rc = edc_init(blob.as_ptr(), blob.len(), FORMAT_JSON, &mut handle);
            assert_eq!(rc, EDC_OK);
            assert!(!handle.is_null());
            assert_eq!(edc_deinit(handle), EDC_OK);
        }
    }

    #[test]
    fn init_rejects_unknown_flags() {
        unsafe {
            let blob = config_blob();
            let mut handle: *mut std::ffi::c_void = ptr::null_mut();
            let rc = edc_init(blob.as_ptr(), blob.len(), 0x8, &mut handle);
            assert_eq!(rc, EDC_ERR_INIT);
            assert!(handle.is_null());
        }
    }

    #[test]
    fn take_decisions_round_trips_hello() {
        unsafe {
            let blob = config_blob();
            let mut handle: *mut std::ffi::c_void = ptr::null_mut();
            assert_eq!(edc_init(blob.as_ptr(), blob.len(), FORMAT_JSON, &mut handle), EDC_OK);

            let input = br#"{"now":0.0,"events":[{"t":"hello"}]}"#;
            let mut out_buf: *mut u8 = ptr::null_mut();
            let mut out_len: usize = 0;
            let rc = edc_take_decisions(
                handle,
                input.as_ptr(),
                input.len(),
                &mut out_buf,
                &mut out_len,
            );
            assert_eq!(rc, EDC_OK);
            assert!(!out_buf.is_null());
            let out = slice::from_raw_parts(out_buf, out_len);
            let text = std::str::from_utf8(out).unwrap();
            assert!(text.contains("edc_hello"));

            assert_eq!(edc_deinit(handle), EDC_OK);
        }
    }

    #[test]
    fn take_decisions_rejects_malformed_input() {
        unsafe {
            let blob = config_blob();
            let mut handle: *mut std::ffi::c_void = ptr::null_mut();
            assert_eq!(edc_init(blob.as_ptr(), blob.len(), FORMAT_JSON, &mut handle), EDC_OK);

            let input = b"{not json";
            let mut out_buf: *mut u8 = ptr::null_mut();
            let mut out_len: usize = 0;
            let rc = edc_take_decisions(
                handle,
                input.as_ptr(),
                input.len(),
                &mut out_buf,
                &mut out_len,
            );
            assert_eq!(rc, EDC_ERR_DECODE);

            assert_eq!(edc_deinit(handle), EDC_OK);
        }
    }
}
