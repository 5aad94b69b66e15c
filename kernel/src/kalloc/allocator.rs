use core::alloc::{GlobalAlloc, Layout};
use core::ffi::{c_ulong, c_void};

use crate::bindings;

const PAGE_SIZE: usize = 4096;

/// Allocates from the slab for sub-page sizes and falls back to vmalloc
/// for larger requests, where physically contiguous memory gets scarce.
pub struct KernelAllocator;

unsafe impl GlobalAlloc for KernelAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.size() < PAGE_SIZE {
            // krealloc on a NULL pointer is kmalloc.
            unsafe {
                bindings::krealloc(core::ptr::null(), layout.size(), bindings::GFP_KERNEL)
                    as *mut u8
            }
        } else {
            unsafe { bindings::vzalloc(layout.size() as c_ulong) as *mut u8 }
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if layout.size() < PAGE_SIZE {
            unsafe { bindings::kfree(ptr as *const c_void) };
        } else {
            unsafe { bindings::vfree(ptr as *const c_void) };
        }
    }
}
