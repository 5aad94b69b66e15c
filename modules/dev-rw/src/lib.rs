//! A read/write character device backed by a driver-global message
//! buffer. Whatever was written last can be read back, up to 255 bytes;
//! the device file appears under `/dev` via its own device class.

#![cfg_attr(not(test), no_std)]

use kernel::{
    buf::{UserSlicePtrReader, UserSlicePtrWriter},
    error::KernelResult as Result,
    fs::{File, FileOperations, ReadFn, WriteFn},
    sync::{LockClassKey, Mutex},
    *,
};

module! {
    type: DevRw,
    name: "dev_rw",
    author: "Lalitha 4 GNU/Linux",
    description: "Registers a device nr and implements some callback functions",
    license: "Dual BSD/GPL",
}

const BUFFER_SIZE: usize = 255;

/// The message buffer; `len` marks how much of `data` the last write
/// filled.
struct Buffer {
    data: [u8; BUFFER_SIZE],
    len: usize,
}

static BUFFER_KEY: LockClassKey = LockClassKey::new();
// SAFETY: initialised in `DevRw::init`, before the device is registered
// and any file operation can run.
static BUFFER: Mutex<Buffer> = unsafe {
    Mutex::new(Buffer {
        data: [0; BUFFER_SIZE],
        len: 0,
    })
};

struct DevRwFile;

impl DevRwFile {
    /// Hands out the buffered message. The file offset is ignored; a read
    /// always starts at the beginning of the buffer and is capped at what
    /// the last write left there.
    fn read(&self, _file: &File, buf: &mut UserSlicePtrWriter, _offset: u64) -> Result<()> {
        let shared = BUFFER.lock();
        let to_copy = buf.len().min(shared.len);
        buf.write(&shared.data[..to_copy])
    }

    /// Replaces the buffered message. Writes longer than the buffer are
    /// truncated to its size.
    fn write(&self, buf: &mut UserSlicePtrReader, _offset: u64) -> Result<()> {
        let mut shared = BUFFER.lock();
        let to_copy = buf.len().min(BUFFER_SIZE);
        shared.len = to_copy;
        buf.read_slice(&mut shared.data[..to_copy])
    }
}

impl FileOperations for DevRwFile {
    fn open() -> Result<DevRwFile> {
        pr_info!("dev nr open was called!\n");
        Ok(DevRwFile)
    }

    const READ: ReadFn<DevRwFile> = Some(DevRwFile::read);
    const WRITE: WriteFn<DevRwFile> = Some(DevRwFile::write);
}

impl Drop for DevRwFile {
    fn drop(&mut self) {
        pr_info!("dev nr close was called!\n");
    }
}

struct DevRw {
    _dev: chrdev::Registration,
}

impl kernel::Module for DevRw {
    fn init(_module: &'static ThisModule) -> Result<Self> {
        logger::init_logger();
        pr_info!("Hello, Kernel!\n");
        BUFFER.init(c_str!("dev_rw_buffer"), &BUFFER_KEY);

        let dev = chrdev::builder(c_str!("dummydriver"), 0..1)?
            .with_device_files(c_str!("MyModuleClass"))
            .register_device::<DevRwFile>()
            .build()?;
        pr_info!(
            "read_write - Device Number Major: {}, Minor: {} was registered!\n",
            dev.major(),
            0
        );
        Ok(DevRw { _dev: dev })
    }
}

impl Drop for DevRw {
    fn drop(&mut self) {
        pr_info!("Goodbye, Kernel!\n");
    }
}

#[cfg(test)]
mod tests {
    use core::ffi::c_char;

    use kbind::mock;
    use kernel::bindings;

    fn new_file() -> bindings::file {
        bindings::file {
            f_flags: 0,
            f_pos: 0,
            private_data: core::ptr::null_mut(),
        }
    }

    unsafe fn do_write(
        fops: &bindings::file_operations,
        file: *mut bindings::file,
        data: &[u8],
    ) -> isize {
        let mut offset: bindings::loff_t = 0;
        let write = fops.write.unwrap();
        unsafe { write(file, data.as_ptr() as *const c_char, data.len(), &mut offset) }
    }

    unsafe fn do_read(
        fops: &bindings::file_operations,
        file: *mut bindings::file,
        out: &mut [u8],
    ) -> isize {
        let mut offset: bindings::loff_t = 0;
        let read = fops.read.unwrap();
        unsafe { read(file, out.as_mut_ptr() as *mut c_char, out.len(), &mut offset) }
    }

    #[test]
    fn write_then_read_round_trip() {
        let _serial = mock::exclusive();
        mock::reset();
        assert_eq!(crate::__dev_rw_init(), 0);

        let ops = mock::installed_ops();
        assert_eq!(ops.len(), 1);
        let fops = unsafe { &*ops[0].1 };
        let mut file = new_file();
        let open = fops.open.unwrap();
        assert_eq!(unsafe { open(core::ptr::null_mut(), &mut file) }, 0);

        assert_eq!(unsafe { do_write(fops, &mut file, b"ping") }, 4);
        let mut out = [0u8; 16];
        assert_eq!(unsafe { do_read(fops, &mut file, &mut out) }, 4);
        assert_eq!(&out[..4], b"ping");

        // A short read hands out only the leading bytes.
        let mut small = [0u8; 2];
        assert_eq!(unsafe { do_read(fops, &mut file, &mut small) }, 2);
        assert_eq!(&small, b"pi");

        let release = fops.release.unwrap();
        assert_eq!(unsafe { release(core::ptr::null_mut(), &mut file) }, 0);

        crate::__dev_rw_exit();
        assert!(mock::counters().balanced());
    }

    #[test]
    fn oversized_write_is_truncated() {
        let _serial = mock::exclusive();
        mock::reset();
        assert_eq!(crate::__dev_rw_init(), 0);

        let fops = unsafe { &*mock::installed_ops()[0].1 };
        let mut file = new_file();
        let open = fops.open.unwrap();
        assert_eq!(unsafe { open(core::ptr::null_mut(), &mut file) }, 0);

        let big = [b'x'; 300];
        assert_eq!(unsafe { do_write(fops, &mut file, &big) }, 255);
        let mut out = [0u8; 300];
        assert_eq!(unsafe { do_read(fops, &mut file, &mut out) }, 255);
        assert_eq!(&out[..255], &big[..255]);

        let release = fops.release.unwrap();
        unsafe { release(core::ptr::null_mut(), &mut file) };
        crate::__dev_rw_exit();
        assert!(mock::counters().balanced());
    }

    #[test]
    fn creates_class_and_device_file() {
        let _serial = mock::exclusive();
        mock::reset();
        assert_eq!(crate::__dev_rw_init(), 0);

        assert_eq!(mock::class_names(), ["MyModuleClass"]);
        assert_eq!(mock::device_names(), ["dummydriver"]);

        crate::__dev_rw_exit();
        assert!(mock::counters().balanced());
        assert!(mock::class_names().is_empty());
        assert!(mock::device_names().is_empty());
    }

    #[test]
    fn failed_device_file_creation_unwinds_the_load() {
        let _serial = mock::exclusive();
        mock::reset();
        mock::fail_once(mock::FailPoint::DeviceCreate);

        assert!(crate::__dev_rw_init() < 0);
        assert!(mock::counters().balanced());
        assert!(mock::regions().is_empty());
    }
}
