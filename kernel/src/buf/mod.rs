//! Userspace slices.
//!
//! Reading from or writing to an address supplied by userspace has to go
//! through `copy_from_user`/`copy_to_user`. Those primitives report how
//! many bytes were *not* transferred; the reader/writer below advance
//! their cursor by the bytes that were, so callers can account for short
//! transfers the way the C callers of these primitives do.

use alloc::{vec, vec::Vec};
use core::ffi::{c_ulong, c_void};

use crate::{
    bindings,
    error::{linux_err::EFAULT, KernelResult},
};

/// A pointer into userspace memory, carrying the length of the region it
/// refers to.
pub struct UserSlicePtr(*mut c_void, usize);

impl UserSlicePtr {
    /// Constructs a user slice from a raw pointer and a length in bytes.
    ///
    /// # Safety
    ///
    /// `ptr` must be a `__user` address handed to the driver by the kernel
    /// for the current task; the kernel has already performed the
    /// `access_ok` check when it did so.
    pub unsafe fn new(ptr: *mut c_void, length: usize) -> UserSlicePtr {
        UserSlicePtr(ptr, length)
    }

    /// Constructs a [`UserSlicePtrReader`] that can incrementally read
    /// from the user slice.
    pub fn reader(self) -> UserSlicePtrReader {
        UserSlicePtrReader(self.0, self.1)
    }

    /// Constructs a [`UserSlicePtrWriter`] that can incrementally write
    /// into the user slice.
    pub fn writer(self) -> UserSlicePtrWriter {
        UserSlicePtrWriter(self.0, self.1)
    }
}

/// Incrementally reads from a user slice.
pub struct UserSlicePtrReader(*mut c_void, usize);

impl UserSlicePtrReader {
    /// Returns the number of bytes left to be read. Note that even reading
    /// less than this number of bytes may fail.
    pub fn len(&self) -> usize {
        self.1
    }

    /// Returns `true` if no data is left in the user slice.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads exactly `out.len()` bytes from the user slice.
    ///
    /// Fails with [`EFAULT`] if the read goes out of bounds of the slice
    /// or if the copy faults. A faulting copy may still have transferred a
    /// prefix of `out`; the cursor advances by the transferred amount so
    /// the caller can observe it through [`Self::len`].
    pub fn read_slice(&mut self, out: &mut [u8]) -> KernelResult<()> {
        if out.len() > self.1 {
            return Err(EFAULT);
        }
        let not_copied = unsafe {
            bindings::_copy_from_user(out.as_mut_ptr() as *mut c_void, self.0, out.len() as c_ulong)
        } as usize;
        let copied = out.len() - not_copied;
        // `self.0` is not a pointer into our own address space, so `add`
        // and its C-style aliasing rules do not apply.
        self.0 = self.0.wrapping_add(copied);
        self.1 -= copied;
        if not_copied != 0 {
            return Err(EFAULT);
        }
        Ok(())
    }

    /// Reads all data remaining in the user slice into a `Vec`.
    pub fn read_all(&mut self) -> KernelResult<Vec<u8>> {
        let mut data = vec![0; self.1];
        self.read_slice(&mut data)?;
        Ok(data)
    }
}

/// Incrementally writes into a user slice.
pub struct UserSlicePtrWriter(*mut c_void, usize);

impl UserSlicePtrWriter {
    /// Returns the number of bytes that can still be written.
    pub fn len(&self) -> usize {
        self.1
    }

    /// Returns `true` if the user slice is full.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes `data` to the user slice.
    ///
    /// Fails with [`EFAULT`] if the write goes out of bounds of the slice
    /// or if the copy faults, with the same partial-transfer accounting as
    /// [`UserSlicePtrReader::read_slice`].
    pub fn write(&mut self, data: &[u8]) -> KernelResult<()> {
        if data.len() > self.1 {
            return Err(EFAULT);
        }
        let not_copied = unsafe {
            bindings::_copy_to_user(self.0, data.as_ptr() as *const c_void, data.len() as c_ulong)
        } as usize;
        let copied = data.len() - not_copied;
        self.0 = self.0.wrapping_add(copied);
        self.1 -= copied;
        if not_copied != 0 {
            return Err(EFAULT);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbind::mock;

    #[test]
    fn write_then_read_round_trip() {
        let _serial = mock::exclusive();
        mock::reset();

        let mut user = [0u8; 16];
        let mut writer =
            unsafe { UserSlicePtr::new(user.as_mut_ptr() as *mut c_void, user.len()) }.writer();
        writer.write(b"hello").unwrap();
        assert_eq!(writer.len(), 11);
        assert_eq!(&user[..5], b"hello");

        let mut reader =
            unsafe { UserSlicePtr::new(user.as_mut_ptr() as *mut c_void, 5) }.reader();
        assert_eq!(reader.read_all().unwrap(), b"hello");
        assert!(reader.is_empty());
    }

    #[test]
    fn out_of_bounds_is_efault() {
        let _serial = mock::exclusive();
        mock::reset();

        let mut user = [0u8; 4];
        let mut writer =
            unsafe { UserSlicePtr::new(user.as_mut_ptr() as *mut c_void, user.len()) }.writer();
        assert_eq!(writer.write(b"hello"), Err(EFAULT));
        // Nothing was transferred and the cursor did not move.
        assert_eq!(writer.len(), 4);
        assert_eq!(user, [0u8; 4]);
    }

    #[test]
    fn faulting_copy_advances_by_transferred_bytes() {
        let _serial = mock::exclusive();
        mock::reset();

        let mut user = [0u8; 8];
        let mut writer =
            unsafe { UserSlicePtr::new(user.as_mut_ptr() as *mut c_void, user.len()) }.writer();
        mock::cap_next_copy_to_user(3);
        assert_eq!(writer.write(b"hello"), Err(EFAULT));
        assert_eq!(writer.len(), 5);
        assert_eq!(&user[..3], b"hel");

        let mut out = [0u8; 5];
        let mut reader =
            unsafe { UserSlicePtr::new(user.as_mut_ptr() as *mut c_void, user.len()) }.reader();
        mock::cap_next_copy_from_user(2);
        assert_eq!(reader.read_slice(&mut out), Err(EFAULT));
        assert_eq!(reader.len(), 6);
    }
}
