//! Extern declarations for the kernel symbols the tutorial modules call.
//!
//! Macros with no state behind them (`MKDEV`, `IS_ERR`, ...) are expressed
//! as plain Rust in `types_c.rs` and in the `kernel` crate. Struct-field
//! access and non-exported functions go through the `rust_helper_*` shims
//! in `helpers.c`, which kbuild compiles into the module.

use core::ffi::{c_char, c_int, c_uint, c_ulong, c_void};

use crate::types_c::*;

extern "C" {
    pub fn _printk(fmt: *const c_char, ...) -> c_int;

    pub fn _copy_to_user(to: *mut c_void, from: *const c_void, n: c_ulong) -> c_ulong;
    pub fn _copy_from_user(to: *mut c_void, from: *const c_void, n: c_ulong) -> c_ulong;

    pub fn alloc_chrdev_region(
        dev: *mut dev_t,
        baseminor: c_uint,
        count: c_uint,
        name: *const c_char,
    ) -> c_int;
    pub fn register_chrdev_region(from: dev_t, count: c_uint, name: *const c_char) -> c_int;
    pub fn unregister_chrdev_region(from: dev_t, count: c_uint);

    pub fn cdev_alloc() -> *mut cdev;
    pub fn cdev_add(p: *mut cdev, dev: dev_t, count: c_uint) -> c_int;
    pub fn cdev_del(p: *mut cdev);

    pub fn class_create(name: *const c_char) -> *mut class;
    pub fn class_destroy(cls: *mut class);
    pub fn device_create(
        cls: *mut class,
        parent: *mut device,
        devt: dev_t,
        drvdata: *mut c_void,
        fmt: *const c_char,
        ...
    ) -> *mut device;
    pub fn device_destroy(cls: *mut class, devt: dev_t);

    pub fn __mutex_init(lock: *mut mutex, name: *const c_char, key: *mut lock_class_key);
    pub fn mutex_lock(lock: *mut mutex);
    pub fn mutex_unlock(lock: *mut mutex);

    pub fn krealloc(p: *const c_void, new_size: usize, flags: gfp_t) -> *mut c_void;
    pub fn kfree(p: *const c_void);
    pub fn vzalloc(size: c_ulong) -> *mut c_void;
    pub fn vfree(p: *const c_void);

    #[link_name = "rust_helper_errname"]
    pub fn errname(err: c_int) -> *const c_char;

    #[link_name = "rust_helper_file_private_data"]
    pub fn file_private_data(file: *const file) -> *mut c_void;
    #[link_name = "rust_helper_file_set_private_data"]
    pub fn file_set_private_data(file: *mut file, data: *mut c_void);
    #[link_name = "rust_helper_file_pos"]
    pub fn file_pos(file: *const file) -> loff_t;
    #[link_name = "rust_helper_file_set_pos"]
    pub fn file_set_pos(file: *mut file, pos: loff_t);
    #[link_name = "rust_helper_file_flags"]
    pub fn file_flags(file: *const file) -> c_uint;

    #[link_name = "rust_helper_cdev_set_ops"]
    pub fn cdev_set_ops(p: *mut cdev, owner: *mut module, ops: *const file_operations);
}
