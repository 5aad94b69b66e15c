#[allow(
    clippy::all,
    missing_docs,
    non_camel_case_types,
    non_upper_case_globals,
    non_snake_case,
    improper_ctypes,
    unreachable_pub,
    unsafe_op_in_unsafe_fn
)]
pub use kbind::*;

/// `IS_ERR`, expressed in Rust since the C version is an inline function
/// with no linkable symbol.
pub fn is_err(ptr: *const core::ffi::c_void) -> bool {
    ptr as usize >= -(MAX_ERRNO as isize) as usize
}

/// `PTR_ERR`.
pub fn ptr_err(ptr: *const core::ffi::c_void) -> core::ffi::c_long {
    ptr as isize as core::ffi::c_long
}
