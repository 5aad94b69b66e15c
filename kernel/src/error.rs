//! Kernel errors.

pub use kbind::error::{linux_err, Error, KernelResult};

use crate::bindings;

/// Converts an integer as returned by a C kernel function to an error if
/// it's negative, and `Ok(())` otherwise.
pub fn to_result(err: core::ffi::c_int) -> KernelResult<()> {
    if err < 0 {
        Err(Error::from_errno(err))
    } else {
        Ok(())
    }
}

/// Converts a pointer-returning kernel allocation into a result,
/// translating both `ERR_PTR` encodings and NULL into errors.
pub fn from_err_ptr<T>(ptr: *mut T) -> KernelResult<*mut T> {
    let void_ptr = ptr as *const core::ffi::c_void;
    if bindings::is_err(void_ptr) {
        return Err(Error::from_errno(bindings::ptr_err(void_ptr) as core::ffi::c_int));
    }
    if ptr.is_null() {
        return Err(linux_err::ENOMEM);
    }
    Ok(ptr)
}
