//! Read-only, non-owning view over caller-owned memory.

use std::marker::PhantomData;
use std::os::raw::c_int;
use std::ptr::NonNull;

use crate::error::BulkCopyError;

/// A borrowed `(address, length)` region owned by the foreign caller.
///
/// The view never frees, reallocates or copies the region. There is no way to
/// turn it into an owned or `'static` buffer, it is neither `Clone`, `Send` nor
/// `Sync`, and it can only be obtained through [`with_foreign_buffer`], whose
/// closure cannot return anything that borrows from it. Together these keep
/// every reference to the region inside the call that received it.
pub struct ForeignBuffer<'call> {
    ptr: NonNull<u8>,
    len: usize,
    _borrow: PhantomData<&'call [u8]>,
    _single_thread: PhantomData<*const u8>,
}

impl<'call> ForeignBuffer<'call> {
    pub fn as_bytes(&self) -> &'call [u8] {
        // SAFETY: `with_foreign_buffer` checked the pointer is non-null and the
        // length positive; its caller guarantees the region is readable and
        // unchanged until the closure returns, which bounds `'call`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Validates `(ptr, len)` and lends a [`ForeignBuffer`] over it to `f`.
///
/// Fails with `InvalidArgument` when `ptr` is null, then when `len` is not
/// strictly positive.
///
/// # Safety
///
/// When non-null, `ptr` must point to `len` readable bytes that stay valid and
/// are not mutated until this function returns.
pub unsafe fn with_foreign_buffer<R>(
    ptr: *const u8,
    len: c_int,
    f: impl for<'call> FnOnce(ForeignBuffer<'call>) -> R,
) -> Result<R, BulkCopyError> {
    let ptr = NonNull::new(ptr.cast_mut())
        .ok_or_else(|| BulkCopyError::invalid_argument("buffer", "must not be null"))?;
    let len = usize::try_from(len).ok().filter(|len| *len > 0).ok_or_else(|| {
        BulkCopyError::invalid_argument(
            "buffer_length",
            format!("must be greater than zero, got {len}"),
        )
    })?;

    Ok(f(ForeignBuffer {
        ptr,
        len,
        _borrow: PhantomData,
        _single_thread: PhantomData,
    }))
}
