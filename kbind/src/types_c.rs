//! C ABI types shared by the real bindings and the mock backend.
//!
//! This is a checked-in snapshot of the subset of the kernel ABI the
//! tutorial modules use, pinned to v6.6 with `CONFIG_RANDSTRUCT=n`.
//! Layout rules:
//! - Structs the kernel allocates (`file`, `cdev`, ...) are opaque; their
//!   fields are reached through the `rust_helper_*` shims in `helpers.c`,
//!   so their config-dependent layout never matters here.
//! - Structs this side allocates and the kernel reads (`file_operations`)
//!   carry the complete member list of the pinned version, since the
//!   kernel indexes them by offset.
//! - `mutex` is allocated here but only ever handed out by pointer, so
//!   only its size and alignment matter, not its fields.

#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]

use core::ffi::{c_int, c_uint, c_ulong};

pub type dev_t = u32;
pub type loff_t = i64;
pub type gfp_t = u32;

pub const MAX_ERRNO: u32 = 4095;

pub const MINORBITS: u32 = 20;
pub const MINORMASK: u32 = (1 << MINORBITS) - 1;

/// `MKDEV` from `include/linux/kdev_t.h`, expressed directly since the C
/// side is a macro and cannot be bound to.
pub const fn MKDEV(major: c_uint, minor: c_uint) -> dev_t {
    (major << MINORBITS) | minor
}

pub const fn MAJOR(dev: dev_t) -> c_uint {
    dev >> MINORBITS
}

pub const fn MINOR(dev: dev_t) -> c_uint {
    dev & MINORMASK
}

// Log level prefixes from include/linux/kern_levels.h ("\001" SOH + digit).
pub const KERN_EMERG: &[u8; 3] = b"\x010\0";
pub const KERN_ALERT: &[u8; 3] = b"\x011\0";
pub const KERN_CRIT: &[u8; 3] = b"\x012\0";
pub const KERN_ERR: &[u8; 3] = b"\x013\0";
pub const KERN_WARNING: &[u8; 3] = b"\x014\0";
pub const KERN_NOTICE: &[u8; 3] = b"\x015\0";
pub const KERN_INFO: &[u8; 3] = b"\x016\0";
pub const KERN_DEBUG: &[u8; 3] = b"\x017\0";
pub const KERN_CONT: &[u8; 3] = b"\x01c\0";

// Errno values from include/uapi/asm-generic/errno-base.h and errno.h.
pub const EPERM: u32 = 1;
pub const ENOENT: u32 = 2;
pub const ESRCH: u32 = 3;
pub const EINTR: u32 = 4;
pub const EIO: u32 = 5;
pub const ENXIO: u32 = 6;
pub const E2BIG: u32 = 7;
pub const ENOEXEC: u32 = 8;
pub const EBADF: u32 = 9;
pub const ECHILD: u32 = 10;
pub const EAGAIN: u32 = 11;
pub const ENOMEM: u32 = 12;
pub const EACCES: u32 = 13;
pub const EFAULT: u32 = 14;
pub const ENOTBLK: u32 = 15;
pub const EBUSY: u32 = 16;
pub const EEXIST: u32 = 17;
pub const EXDEV: u32 = 18;
pub const ENODEV: u32 = 19;
pub const ENOTDIR: u32 = 20;
pub const EISDIR: u32 = 21;
pub const EINVAL: u32 = 22;
pub const ENFILE: u32 = 23;
pub const EMFILE: u32 = 24;
pub const ENOTTY: u32 = 25;
pub const ETXTBSY: u32 = 26;
pub const EFBIG: u32 = 27;
pub const ENOSPC: u32 = 28;
pub const ESPIPE: u32 = 29;
pub const EROFS: u32 = 30;
pub const EMLINK: u32 = 31;
pub const EPIPE: u32 = 32;
pub const EDOM: u32 = 33;
pub const ERANGE: u32 = 34;

// File open flags (x86 values, include/uapi/asm-generic/fcntl.h).
pub const O_ACCMODE: c_uint = 0o3;
pub const O_RDONLY: c_uint = 0o0;
pub const O_WRONLY: c_uint = 0o1;
pub const O_RDWR: c_uint = 0o2;
pub const O_APPEND: c_uint = 0o2000;
pub const O_NONBLOCK: c_uint = 0o4000;

// Whence values for llseek, include/uapi/linux/fs.h.
pub const SEEK_SET: c_int = 0;
pub const SEEK_CUR: c_int = 1;
pub const SEEK_END: c_int = 2;

pub const BINDINGS_GFP_KERNEL: gfp_t = 3264;
pub const GFP_KERNEL: gfp_t = BINDINGS_GFP_KERNEL;

/// `struct module`; opaque, only handled by pointer.
#[repr(C)]
pub struct module {
    _unused: [u8; 0],
}

/// `struct class`; opaque, only handled by pointer.
#[repr(C)]
pub struct class {
    _unused: [u8; 0],
}

/// `struct device`; opaque, only handled by pointer.
#[repr(C)]
pub struct device {
    _unused: [u8; 0],
}

/// `struct inode`; opaque, only handled by pointer.
#[repr(C)]
pub struct inode {
    _unused: [u8; 0],
}

/// `struct file`; opaque, kernel-allocated. Fields are accessed through
/// the `rust_helper_file_*` shims since their offsets depend on the kernel
/// config.
#[cfg(not(feature = "mock"))]
#[repr(C)]
pub struct file {
    _unused: [u8; 0],
}

/// The fake kernel's `struct file`: just the state the accessor shims
/// expose.
#[cfg(feature = "mock")]
#[repr(C)]
pub struct file {
    pub f_flags: c_uint,
    pub f_pos: loff_t,
    pub private_data: *mut core::ffi::c_void,
}

/// `struct cdev`; opaque, obtained from `cdev_alloc` and configured
/// through `rust_helper_cdev_set_ops`.
#[repr(C)]
pub struct cdev {
    _unused: [u8; 0],
}

/// `struct file_operations` from `include/linux/fs.h`, complete member
/// list of the pinned version. Operations the tutorial never implements
/// are typed as bare function pointers and always left as `None`, which
/// the kernel treats the same way as a C NULL entry.
#[repr(C)]
pub struct file_operations {
    pub owner: *mut module,
    pub llseek: Option<unsafe extern "C" fn(*mut file, loff_t, c_int) -> loff_t>,
    pub read:
        Option<unsafe extern "C" fn(*mut file, *mut core::ffi::c_char, usize, *mut loff_t) -> isize>,
    pub write: Option<
        unsafe extern "C" fn(*mut file, *const core::ffi::c_char, usize, *mut loff_t) -> isize,
    >,
    pub read_iter: Option<unsafe extern "C" fn()>,
    pub write_iter: Option<unsafe extern "C" fn()>,
    pub iopoll: Option<unsafe extern "C" fn()>,
    pub iterate_shared: Option<unsafe extern "C" fn()>,
    pub poll: Option<unsafe extern "C" fn()>,
    pub unlocked_ioctl: Option<unsafe extern "C" fn()>,
    pub compat_ioctl: Option<unsafe extern "C" fn()>,
    pub mmap: Option<unsafe extern "C" fn()>,
    pub mmap_supported_flags: c_ulong,
    pub open: Option<unsafe extern "C" fn(*mut inode, *mut file) -> c_int>,
    pub flush: Option<unsafe extern "C" fn()>,
    pub release: Option<unsafe extern "C" fn(*mut inode, *mut file) -> c_int>,
    pub fsync: Option<unsafe extern "C" fn()>,
    pub fasync: Option<unsafe extern "C" fn()>,
    pub lock: Option<unsafe extern "C" fn()>,
    pub get_unmapped_area: Option<unsafe extern "C" fn()>,
    pub check_flags: Option<unsafe extern "C" fn()>,
    pub flock: Option<unsafe extern "C" fn()>,
    pub splice_write: Option<unsafe extern "C" fn()>,
    pub splice_read: Option<unsafe extern "C" fn()>,
    pub splice_eof: Option<unsafe extern "C" fn()>,
    pub setlease: Option<unsafe extern "C" fn()>,
    pub fallocate: Option<unsafe extern "C" fn()>,
    pub show_fdinfo: Option<unsafe extern "C" fn()>,
    pub copy_file_range: Option<unsafe extern "C" fn()>,
    pub remap_file_range: Option<unsafe extern "C" fn()>,
    pub fadvise: Option<unsafe extern "C" fn()>,
    pub uring_cmd: Option<unsafe extern "C" fn()>,
    pub uring_cmd_iopoll: Option<unsafe extern "C" fn()>,
}

/// `struct mutex`; handed out by pointer only, so the blob just has to be
/// at least as large and aligned as the real struct. 64 bytes covers the
/// pinned config with mutex debugging enabled.
#[repr(C)]
pub struct mutex {
    pub data: [u64; 8],
}

/// `struct lock_class_key`; empty unless lockdep is enabled.
#[repr(C)]
pub struct lock_class_key {
    _unused: [u8; 0],
}
