#![cfg_attr(not(any(test, feature = "mock")), no_std)]

//! Raw surface of the kernel ABI used by the tutorial modules.
//!
//! The `mock` feature replaces the extern declarations with the fake
//! kernel in [`mock`], so the safe abstractions in the `kernel` crate and
//! the tutorial modules themselves can be unit tested on the host.

mod types_c;

#[cfg(not(feature = "mock"))]
mod bindings_c;

#[cfg(feature = "mock")]
pub mod mock;

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
mod bindings {
    pub use super::types_c::*;

    #[cfg(not(feature = "mock"))]
    pub use super::bindings_c::*;

    #[cfg(feature = "mock")]
    pub use super::mock::calls::*;
}
pub use bindings::*;

pub mod error;
pub mod printk;
