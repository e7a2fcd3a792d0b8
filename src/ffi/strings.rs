//! Text marshaling across the C boundary.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use crate::bridge::require_text;
use crate::error::BulkCopyError;

/// Copies a NUL-terminated UTF-8 string into owned text.
///
/// Null pointers, malformed UTF-8, and empty or whitespace-only text are all
/// `InvalidArgument` for `argument`.
///
/// # Safety
///
/// When non-null, `ptr` must point to a NUL-terminated string that stays valid
/// for the duration of the call.
pub unsafe fn decode_text(ptr: *const c_char, argument: &'static str) -> Result<String, BulkCopyError> {
    if ptr.is_null() {
        return Err(BulkCopyError::invalid_argument(argument, "must not be null or empty"));
    }
    let text = CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| BulkCopyError::invalid_argument(argument, format!("is not valid UTF-8: {e}")))?;
    Ok(require_text(argument, text)?.to_owned())
}

/// Writes at most `max_len` bytes of `message` to `dst`, returning the bytes copied.
///
/// Longer messages are cut at the last character boundary that fits. When the
/// text is shorter than `max_len` a NUL terminator follows it; nothing is ever
/// written at or past `dst + max_len`. A null `dst` or non-positive `max_len`
/// writes nothing.
///
/// # Safety
///
/// When non-null, `dst` must be valid for writes of `max_len` bytes.
pub unsafe fn write_truncated(message: &str, dst: *mut c_char, max_len: c_int) -> usize {
    if dst.is_null() || max_len <= 0 {
        return 0;
    }
    let capacity = max_len as usize;
    let mut end = message.len().min(capacity);
    while !message.is_char_boundary(end) {
        end -= 1;
    }

    let dst = dst.cast::<u8>();
    std::ptr::copy_nonoverlapping(message.as_ptr(), dst, end);
    if end < capacity {
        *dst.add(end) = 0;
    }
    end
}
