//! Kernel types.

use core::{cell::UnsafeCell, mem::MaybeUninit};

/// Stores an opaque value owned by the C side.
///
/// `Opaque<T>` is meant to be used with FFI objects that are never
/// interpreted by Rust code, only handed out by pointer.
#[repr(transparent)]
pub struct Opaque<T>(UnsafeCell<MaybeUninit<T>>);

impl<T> Opaque<T> {
    /// Creates a new opaque value.
    pub const fn new(value: T) -> Self {
        Self(UnsafeCell::new(MaybeUninit::new(value)))
    }

    /// Creates an uninitialised value.
    pub const fn uninit() -> Self {
        Self(UnsafeCell::new(MaybeUninit::uninit()))
    }

    /// Creates a zeroed value.
    pub const fn zeroed() -> Self {
        Self(UnsafeCell::new(MaybeUninit::zeroed()))
    }

    /// Returns a raw pointer to the opaque data.
    pub fn get(&self) -> *mut T {
        UnsafeCell::get(&self.0).cast::<T>()
    }
}
