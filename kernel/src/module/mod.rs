//! Types for loadable kernel modules, used by the [`module!`] macro
//! expansion.
//!
//! [`module!`]: kmacro::module

use crate::error::KernelResult;

/// The top level entrypoint of a kernel module.
///
/// The [`module!`] macro instantiates this on load and drops it on unload,
/// so teardown lives in a `Drop` implementation.
///
/// [`module!`]: kmacro::module
pub trait Module: Sized + Sync {
    /// Called on module load. A returned error aborts loading and is
    /// surfaced to `insmod`.
    fn init(module: &'static ThisModule) -> KernelResult<Self>;
}

/// The `struct module` of the module this code belongs to, i.e. the
/// equivalent of C's `THIS_MODULE`.
pub struct ThisModule(*mut kbind::module);

// The pointer is only passed back to kernel APIs.
unsafe impl Sync for ThisModule {}

impl ThisModule {
    /// # Safety
    ///
    /// `ptr` must be the address of this module's `struct module`, or NULL
    /// for built-in code.
    pub const unsafe fn from_ptr(ptr: *mut kbind::module) -> ThisModule {
        ThisModule(ptr)
    }

    pub fn as_ptr(&self) -> *mut kbind::module {
        self.0
    }
}
