//! File abstractions for character device drivers.

pub mod file_operations;

pub use file_operations::{FileOperations, ReadFn, SeekFn, WriteFn};

use crate::bindings;

bitflags::bitflags! {
    /// Flags from the `flags` field of `struct file`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FileFlags: core::ffi::c_uint {
        /// The file is opened in append mode.
        const APPEND = bindings::O_APPEND;
        /// The file was opened with `O_NONBLOCK`.
        const NONBLOCK = bindings::O_NONBLOCK;
    }
}

/// A handle on an open `struct file`, valid for the duration of one
/// callback.
pub struct File {
    ptr: *const bindings::file,
}

impl File {
    /// # Safety
    ///
    /// `ptr` must point to a live `struct file` for the whole lifetime of
    /// the returned handle.
    pub(crate) unsafe fn from_ptr(ptr: *const bindings::file) -> File {
        File { ptr }
    }

    /// The current read/write position.
    pub fn pos(&self) -> u64 {
        unsafe { bindings::file_pos(self.ptr) as u64 }
    }

    /// The flags the file was opened with.
    pub fn flags(&self) -> FileFlags {
        FileFlags::from_bits_truncate(unsafe { bindings::file_flags(self.ptr) })
    }
}

/// Where to seek to, mirroring the `whence` argument of `llseek`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekFrom {
    /// An absolute offset from the start of the file.
    Start(u64),
    /// An offset relative to the end of the file.
    End(i64),
    /// An offset relative to the current position.
    Current(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_open_flags_and_position() {
        let file = bindings::file {
            f_flags: bindings::O_RDWR | bindings::O_APPEND | bindings::O_NONBLOCK,
            f_pos: 42,
            private_data: core::ptr::null_mut(),
        };
        let handle = unsafe { File::from_ptr(&file) };
        assert_eq!(handle.pos(), 42);
        assert_eq!(handle.flags(), FileFlags::APPEND | FileFlags::NONBLOCK);
    }

    #[test]
    fn unknown_flag_bits_are_dropped() {
        let file = bindings::file {
            f_flags: bindings::O_NONBLOCK | 0o100000,
            f_pos: 0,
            private_data: core::ptr::null_mut(),
        };
        let handle = unsafe { File::from_ptr(&file) };
        assert_eq!(handle.flags(), FileFlags::NONBLOCK);
    }
}
