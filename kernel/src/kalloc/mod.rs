//! The global allocator, backed by the kernel allocators.

mod allocator;

use allocator::KernelAllocator;

#[global_allocator]
static ALLOCATOR: KernelAllocator = KernelAllocator;
