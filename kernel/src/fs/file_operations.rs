//! Bridging between the kernel's `struct file_operations` callback table
//! and safe driver code.
//!
//! A driver implements [`FileOperations`]; the registration code turns the
//! implementation into a callback table with [`FileOperationsVtable`].
//! Every open file carries a boxed instance of the implementing type in
//! `file->private_data`, created in the open callback and dropped in the
//! release callback.

use alloc::boxed::Box;
use core::ffi::{c_char, c_int, c_void};

use crate::{
    bindings,
    buf::{UserSlicePtr, UserSlicePtrReader, UserSlicePtrWriter},
    error::{linux_err, KernelResult},
    fs::{File, SeekFrom},
};

/// Read handler. Receives the per-open state, the file, a writer over the
/// userspace buffer, and the file offset.
pub type ReadFn<T> = Option<fn(&T, &File, &mut UserSlicePtrWriter, u64) -> KernelResult<()>>;

/// Write handler. Receives the per-open state, a reader over the userspace
/// buffer, and the file offset.
pub type WriteFn<T> = Option<fn(&T, &mut UserSlicePtrReader, u64) -> KernelResult<()>>;

/// Seek handler. Returns the new position.
pub type SeekFn<T> = Option<fn(&T, &File, SeekFrom) -> KernelResult<u64>>;

/// Implemented by types that back an open character device file.
///
/// Handlers are associated constants rather than trait methods so that the
/// callback table can leave unimplemented operations as NULL, which lets
/// the kernel apply its defaults (e.g. `-EINVAL` for a missing write).
pub trait FileOperations: Sync + Sized {
    /// Called on each `open(2)`; the returned value becomes the per-open
    /// state and is dropped on release.
    fn open() -> KernelResult<Self>;

    const READ: ReadFn<Self> = None;
    const WRITE: WriteFn<Self> = None;
    const SEEK: SeekFn<Self> = None;
}

unsafe extern "C" fn open_callback<T: FileOperations>(
    _inode: *mut bindings::inode,
    file: *mut bindings::file,
) -> c_int {
    match T::open() {
        Ok(state) => {
            let data = Box::into_raw(Box::new(state)) as *mut c_void;
            unsafe { bindings::file_set_private_data(file, data) };
            0
        }
        Err(e) => e.to_errno(),
    }
}

unsafe extern "C" fn release_callback<T: FileOperations>(
    _inode: *mut bindings::inode,
    file: *mut bindings::file,
) -> c_int {
    let ptr = unsafe { bindings::file_private_data(file) };
    unsafe { bindings::file_set_private_data(file, core::ptr::null_mut()) };
    drop(unsafe { Box::from_raw(ptr as *mut T) });
    0
}

/// Finishes a transfer: advances the offset by what was moved and returns
/// it, or surfaces the error if nothing was.
///
/// # Safety
///
/// `offset` must be valid for reads and writes.
unsafe fn transfer_result(
    res: KernelResult<()>,
    transferred: usize,
    offset: *mut bindings::loff_t,
) -> isize {
    match res {
        Err(e) if transferred == 0 => e.to_errno() as isize,
        _ => {
            unsafe { *offset += transferred as bindings::loff_t };
            transferred as isize
        }
    }
}

unsafe extern "C" fn read_callback<T: FileOperations>(
    file: *mut bindings::file,
    buf: *mut c_char,
    len: usize,
    offset: *mut bindings::loff_t,
) -> isize {
    let read = match T::READ {
        Some(read) => read,
        None => return linux_err::EINVAL.to_errno() as isize,
    };
    let state = unsafe { &*(bindings::file_private_data(file) as *const T) };
    let handle = unsafe { File::from_ptr(file) };
    let mut writer = unsafe { UserSlicePtr::new(buf as *mut c_void, len) }.writer();
    let res = read(state, &handle, &mut writer, unsafe { *offset } as u64);
    transfer_result(res, len - writer.len(), offset)
}

unsafe extern "C" fn write_callback<T: FileOperations>(
    file: *mut bindings::file,
    buf: *const c_char,
    len: usize,
    offset: *mut bindings::loff_t,
) -> isize {
    let write = match T::WRITE {
        Some(write) => write,
        None => return linux_err::EINVAL.to_errno() as isize,
    };
    let state = unsafe { &*(bindings::file_private_data(file) as *const T) };
    let mut reader = unsafe { UserSlicePtr::new(buf as *mut c_void, len) }.reader();
    let res = write(state, &mut reader, unsafe { *offset } as u64);
    transfer_result(res, len - reader.len(), offset)
}

unsafe extern "C" fn llseek_callback<T: FileOperations>(
    file: *mut bindings::file,
    offset: bindings::loff_t,
    whence: c_int,
) -> bindings::loff_t {
    let seek = match T::SEEK {
        Some(seek) => seek,
        None => return linux_err::ESPIPE.to_errno() as bindings::loff_t,
    };
    let from = match whence {
        bindings::SEEK_SET if offset >= 0 => SeekFrom::Start(offset as u64),
        bindings::SEEK_CUR => SeekFrom::Current(offset),
        bindings::SEEK_END => SeekFrom::End(offset),
        _ => return linux_err::EINVAL.to_errno() as bindings::loff_t,
    };
    let state = unsafe { &*(bindings::file_private_data(file) as *const T) };
    let handle = unsafe { File::from_ptr(file) };
    match seek(state, &handle, from) {
        Ok(pos) => {
            unsafe { bindings::file_set_pos(file, pos as bindings::loff_t) };
            pos as bindings::loff_t
        }
        Err(e) => e.to_errno() as bindings::loff_t,
    }
}

/// A `struct file_operations` populated with the callbacks of a
/// [`FileOperations`] implementation. Entries for handlers the
/// implementation leaves as `None` stay NULL.
pub(crate) struct FileOperationsVtable(pub(crate) bindings::file_operations);

// The table only contains function pointers and a module pointer the
// kernel never mutates through us.
unsafe impl Sync for FileOperationsVtable {}

impl FileOperationsVtable {
    pub(crate) const fn new<T: FileOperations>() -> FileOperationsVtable {
        FileOperationsVtable(bindings::file_operations {
            owner: core::ptr::null_mut(),
            llseek: if T::SEEK.is_some() {
                Some(llseek_callback::<T>)
            } else {
                None
            },
            read: if T::READ.is_some() {
                Some(read_callback::<T>)
            } else {
                None
            },
            write: if T::WRITE.is_some() {
                Some(write_callback::<T>)
            } else {
                None
            },
            read_iter: None,
            write_iter: None,
            iopoll: None,
            iterate_shared: None,
            poll: None,
            unlocked_ioctl: None,
            compat_ioctl: None,
            mmap: None,
            mmap_supported_flags: 0,
            open: Some(open_callback::<T>),
            flush: None,
            release: Some(release_callback::<T>),
            fsync: None,
            fasync: None,
            lock: None,
            get_unmapped_area: None,
            check_flags: None,
            flock: None,
            splice_write: None,
            splice_read: None,
            splice_eof: None,
            setlease: None,
            fallocate: None,
            show_fdinfo: None,
            copy_file_range: None,
            remap_file_range: None,
            fadvise: None,
            uring_cmd: None,
            uring_cmd_iopoll: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use kbind::mock;

    use super::*;

    static LIVE: AtomicUsize = AtomicUsize::new(0);

    struct Echo;

    impl Echo {
        const GREETING: &'static [u8] = b"hello from echo";

        fn read(
            &self,
            _file: &File,
            buf: &mut UserSlicePtrWriter,
            offset: u64,
        ) -> KernelResult<()> {
            let data = Self::GREETING;
            let start = (offset as usize).min(data.len());
            let end = (start + buf.len()).min(data.len());
            buf.write(&data[start..end])
        }

        fn seek(&self, file: &File, from: SeekFrom) -> KernelResult<u64> {
            let len = Self::GREETING.len() as i64;
            let pos = match from {
                SeekFrom::Start(p) => p as i64,
                SeekFrom::Current(d) => file.pos() as i64 + d,
                SeekFrom::End(d) => len + d,
            };
            if pos < 0 {
                return Err(linux_err::EINVAL);
            }
            Ok(pos as u64)
        }
    }

    impl Drop for Echo {
        fn drop(&mut self) {
            LIVE.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl FileOperations for Echo {
        fn open() -> KernelResult<Echo> {
            LIVE.fetch_add(1, Ordering::SeqCst);
            Ok(Echo)
        }

        const READ: ReadFn<Echo> = Some(Echo::read);
        const SEEK: SeekFn<Echo> = Some(Echo::seek);
    }

    fn new_file() -> bindings::file {
        bindings::file {
            f_flags: 0,
            f_pos: 0,
            private_data: core::ptr::null_mut(),
        }
    }

    #[test]
    fn vtable_leaves_missing_handlers_null() {
        let vtable = FileOperationsVtable::new::<Echo>();
        assert!(vtable.0.open.is_some());
        assert!(vtable.0.release.is_some());
        assert!(vtable.0.read.is_some());
        assert!(vtable.0.llseek.is_some());
        assert!(vtable.0.write.is_none());
    }

    #[test]
    fn open_read_release_cycle() {
        let _serial = mock::exclusive();
        mock::reset();

        let vtable = FileOperationsVtable::new::<Echo>();
        let mut file = new_file();

        let open = vtable.0.open.unwrap();
        assert_eq!(unsafe { open(core::ptr::null_mut(), &mut file) }, 0);
        assert!(!file.private_data.is_null());
        assert_eq!(LIVE.load(Ordering::SeqCst), 1);

        let mut user = [0u8; 64];
        let mut offset: bindings::loff_t = 0;
        let read = vtable.0.read.unwrap();
        let n = unsafe {
            read(
                &mut file,
                user.as_mut_ptr() as *mut c_char,
                user.len(),
                &mut offset,
            )
        };
        assert_eq!(n as usize, Echo::GREETING.len());
        assert_eq!(offset as usize, Echo::GREETING.len());
        assert_eq!(&user[..n as usize], Echo::GREETING);

        // A second read starts at the advanced offset and hits EOF.
        let n = unsafe {
            read(
                &mut file,
                user.as_mut_ptr() as *mut c_char,
                user.len(),
                &mut offset,
            )
        };
        assert_eq!(n, 0);

        let release = vtable.0.release.unwrap();
        assert_eq!(unsafe { release(core::ptr::null_mut(), &mut file) }, 0);
        assert!(file.private_data.is_null());
        assert_eq!(LIVE.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn partial_copy_reports_transferred_bytes() {
        let _serial = mock::exclusive();
        mock::reset();

        let vtable = FileOperationsVtable::new::<Echo>();
        let mut file = new_file();
        let open = vtable.0.open.unwrap();
        assert_eq!(unsafe { open(core::ptr::null_mut(), &mut file) }, 0);

        let mut user = [0u8; 64];
        let mut offset: bindings::loff_t = 0;
        mock::cap_next_copy_to_user(4);
        let read = vtable.0.read.unwrap();
        let n = unsafe {
            read(
                &mut file,
                user.as_mut_ptr() as *mut c_char,
                user.len(),
                &mut offset,
            )
        };
        assert_eq!(n, 4);
        assert_eq!(offset, 4);
        assert_eq!(&user[..4], &Echo::GREETING[..4]);

        let release = vtable.0.release.unwrap();
        unsafe { release(core::ptr::null_mut(), &mut file) };
    }

    #[test]
    fn llseek_updates_file_position() {
        let _serial = mock::exclusive();
        mock::reset();

        let vtable = FileOperationsVtable::new::<Echo>();
        let mut file = new_file();
        let open = vtable.0.open.unwrap();
        assert_eq!(unsafe { open(core::ptr::null_mut(), &mut file) }, 0);

        let llseek = vtable.0.llseek.unwrap();
        assert_eq!(unsafe { llseek(&mut file, 5, bindings::SEEK_SET) }, 5);
        assert_eq!(file.f_pos, 5);
        assert_eq!(unsafe { llseek(&mut file, -2, bindings::SEEK_CUR) }, 3);
        assert_eq!(
            unsafe { llseek(&mut file, 0, bindings::SEEK_END) } as usize,
            Echo::GREETING.len()
        );
        assert_eq!(
            unsafe { llseek(&mut file, 0, 99) },
            linux_err::EINVAL.to_errno() as bindings::loff_t
        );

        let release = vtable.0.release.unwrap();
        unsafe { release(core::ptr::null_mut(), &mut file) };
    }
}
