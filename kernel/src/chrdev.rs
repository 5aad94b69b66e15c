//! Character device registration.
//!
//! Mirrors the C sequence for bringing up a character device: reserve a
//! device number region, optionally create a class with a device file per
//! minor, then add one cdev per registered [`FileOperations`] type. The
//! returned [`Registration`] releases everything in reverse order on drop,
//! and a failure partway through unwinds whatever was already acquired the
//! same way.

use alloc::{boxed::Box, vec::Vec};
use core::ffi::c_uint;
use core::ops::Range;

use crate::{
    bindings,
    error::{from_err_ptr, linux_err, to_result, KernelResult},
    fs::{file_operations::FileOperationsVtable, FileOperations},
    str::CStr,
};

/// Starts the registration of a character device covering the given minor
/// numbers.
pub fn builder(name: &'static CStr, minors: Range<u16>) -> KernelResult<Builder> {
    if minors.is_empty() {
        return Err(linux_err::EINVAL);
    }
    Ok(Builder {
        name,
        minors,
        major: None,
        class_name: None,
        fops: Vec::new(),
    })
}

/// A character device registration in progress.
pub struct Builder {
    name: &'static CStr,
    minors: Range<u16>,
    major: Option<u32>,
    class_name: Option<&'static CStr>,
    fops: Vec<Box<FileOperationsVtable>>,
}

impl Builder {
    /// Requests a fixed major number instead of a dynamically allocated
    /// one. Fails at [`build`](Self::build) time if the region is taken.
    pub fn major(mut self, major: u32) -> Builder {
        self.major = Some(major);
        self
    }

    /// Creates a device class with the given name and, under it, a device
    /// file per registered device. With udev running this makes the
    /// devices show up under `/dev`.
    pub fn with_device_files(mut self, class_name: &'static CStr) -> Builder {
        self.class_name = Some(class_name);
        self
    }

    /// Registers the file operations of `T` for the next minor number.
    pub fn register_device<T: FileOperations>(mut self) -> Builder {
        self.fops.push(Box::new(FileOperationsVtable::new::<T>()));
        self
    }

    /// Acquires the kernel resources. On error, anything acquired up to
    /// the failing step has already been released again.
    pub fn build(self) -> KernelResult<Registration> {
        if self.fops.len() > self.minors.len() {
            return Err(linux_err::EINVAL);
        }

        let count = self.minors.len() as c_uint;
        let base = self.minors.start as c_uint;
        let dev = match self.major {
            Some(major) => {
                let dev = bindings::MKDEV(major, base);
                to_result(unsafe {
                    bindings::register_chrdev_region(dev, count, self.name.as_char_ptr())
                })?;
                dev
            }
            None => {
                let mut dev = 0;
                to_result(unsafe {
                    bindings::alloc_chrdev_region(&mut dev, base, count, self.name.as_char_ptr())
                })?;
                dev
            }
        };

        // From here on, dropping `registration` undoes every step that
        // already succeeded.
        let mut registration = Registration {
            dev,
            count,
            class: None,
            device_files: Vec::new(),
            cdevs: Vec::new(),
        };

        if let Some(class_name) = self.class_name {
            let class =
                from_err_ptr(unsafe { bindings::class_create(class_name.as_char_ptr()) })?;
            registration.class = Some(class);
        }

        for (i, vtable) in self.fops.into_iter().enumerate() {
            let devt = dev + i as u32;
            if let Some(class) = registration.class {
                from_err_ptr(unsafe {
                    bindings::device_create(
                        class,
                        core::ptr::null_mut(),
                        devt,
                        core::ptr::null_mut(),
                        self.name.as_char_ptr(),
                    )
                })?;
                registration.device_files.push(devt);
            }

            let cdev = unsafe { bindings::cdev_alloc() };
            if cdev.is_null() {
                return Err(linux_err::ENOMEM);
            }
            unsafe { bindings::cdev_set_ops(cdev, core::ptr::null_mut(), &vtable.0) };
            // The cdev is owned by the registration from this point, so a
            // failing cdev_add is still deleted by the drop below.
            registration.cdevs.push((cdev, vtable));
            to_result(unsafe { bindings::cdev_add(cdev, devt, 1) })?;
        }

        Ok(registration)
    }
}

/// A live character device registration. Dropping it tears the device
/// down: cdevs first, then device files, class and device number region,
/// matching the reverse of the acquisition order.
pub struct Registration {
    dev: bindings::dev_t,
    count: c_uint,
    class: Option<*mut bindings::class>,
    device_files: Vec<bindings::dev_t>,
    cdevs: Vec<(*mut bindings::cdev, Box<FileOperationsVtable>)>,
}

// The raw pointers are only handed back to the kernel functions that
// produced them; the vtables they reference are immutable.
unsafe impl Send for Registration {}
unsafe impl Sync for Registration {}

impl Registration {
    /// The major number of the registered region.
    pub fn major(&self) -> u32 {
        bindings::MAJOR(self.dev)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        for (cdev, _) in self.cdevs.drain(..).rev() {
            unsafe { bindings::cdev_del(cdev) };
        }
        if let Some(class) = self.class {
            for devt in self.device_files.drain(..).rev() {
                unsafe { bindings::device_destroy(class, devt) };
            }
            unsafe { bindings::class_destroy(class) };
        }
        unsafe { bindings::unregister_chrdev_region(self.dev, self.count) };
    }
}

#[cfg(test)]
mod tests {
    use kbind::mock::{self, FailPoint};

    use super::*;
    use crate::c_str;

    struct NullFile;

    impl FileOperations for NullFile {
        fn open() -> KernelResult<NullFile> {
            Ok(NullFile)
        }
    }

    #[test]
    fn build_and_drop_release_everything() {
        let _serial = mock::exclusive();
        mock::reset();

        let registration = builder(c_str!("balanced"), 0..1)
            .unwrap()
            .with_device_files(c_str!("balanced_class"))
            .register_device::<NullFile>()
            .build()
            .unwrap();

        let counters = mock::counters();
        assert_eq!(counters.regions_allocated, 1);
        assert_eq!(counters.classes_created, 1);
        assert_eq!(counters.devices_created, 1);
        assert_eq!(counters.cdevs_added, 1);
        assert_eq!(mock::class_names(), ["balanced_class"]);
        assert_eq!(mock::device_names(), ["balanced"]);

        drop(registration);
        assert!(mock::counters().balanced());
        assert!(mock::regions().is_empty());
    }

    #[test]
    fn fixed_major_registers_requested_region() {
        let _serial = mock::exclusive();
        mock::reset();

        let registration = builder(c_str!("fixed"), 0..1)
            .unwrap()
            .major(90)
            .register_device::<NullFile>()
            .build()
            .unwrap();

        assert_eq!(registration.major(), 90);
        assert_eq!(
            mock::regions(),
            [(bindings::MKDEV(90, 0), 1, "fixed".to_string())]
        );
        drop(registration);
        assert!(mock::counters().balanced());
    }

    #[test]
    fn busy_fixed_major_is_reported() {
        let _serial = mock::exclusive();
        mock::reset();

        let first = builder(c_str!("first"), 0..1)
            .unwrap()
            .major(91)
            .register_device::<NullFile>()
            .build()
            .unwrap();
        let second = builder(c_str!("second"), 0..1)
            .unwrap()
            .major(91)
            .register_device::<NullFile>()
            .build();
        assert_eq!(second.err(), Some(linux_err::EBUSY));
        drop(first);
        assert!(mock::counters().balanced());
    }

    #[test]
    fn failure_at_each_step_unwinds_cleanly() {
        let _serial = mock::exclusive();

        for point in [
            FailPoint::AllocChrdevRegion,
            FailPoint::ClassCreate,
            FailPoint::DeviceCreate,
            FailPoint::CdevAdd,
        ] {
            mock::reset();
            mock::fail_once(point);
            let res = builder(c_str!("unwind"), 0..2)
                .unwrap()
                .with_device_files(c_str!("unwind_class"))
                .register_device::<NullFile>()
                .register_device::<NullFile>()
                .build();
            assert!(res.is_err(), "{point:?} did not fail the build");
            assert!(
                mock::counters().balanced(),
                "{point:?} leaked: {:?}",
                mock::counters()
            );
        }
    }

    #[test]
    fn rejects_more_devices_than_minors() {
        let _serial = mock::exclusive();
        mock::reset();

        let res = builder(c_str!("crowded"), 0..1)
            .unwrap()
            .register_device::<NullFile>()
            .register_device::<NullFile>()
            .build();
        assert_eq!(res.err(), Some(linux_err::EINVAL));
        assert_eq!(mock::counters(), Default::default());
    }

    #[test]
    fn empty_minor_range_is_invalid() {
        let _serial = mock::exclusive();
        mock::reset();

        assert_eq!(builder(c_str!("empty"), 3..3).err(), Some(linux_err::EINVAL));
    }
}
