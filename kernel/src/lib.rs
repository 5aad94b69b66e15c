#![cfg_attr(not(test), no_std)]
#![allow(improper_ctypes)]

extern crate alloc;

pub mod bindings;
pub mod buf;
pub mod chrdev;
pub mod error;
pub mod fs;
#[cfg(not(any(test, feature = "mock")))]
mod kalloc;
pub mod logger;
pub mod module;
pub mod print;
pub mod str;
pub mod sync;
pub mod types;

pub use error::linux_err as code;
pub use kmacro::*;
pub use module::{Module, ThisModule};

#[cfg(not(any(test, feature = "mock")))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    crate::pr_err!("Kernel panic!");
    crate::pr_err!("{:?}", info);
    loop {
        core::hint::spin_loop();
    }
}
