//! Registers a device number with a fixed major and logs every open and
//! close of it.

#![cfg_attr(not(test), no_std)]

use kernel::{error::KernelResult as Result, fs::FileOperations, *};

module! {
    type: DevNr,
    name: "dev_nr",
    author: "Lalitha 4 GNU/Linux",
    description: "Registers a device nr and implements some callback functions",
    license: "GPL",
}

const MYMAJOR: u32 = 90;

struct DevNrFile;

impl FileOperations for DevNrFile {
    fn open() -> Result<DevNrFile> {
        pr_info!("dev nr open was called!\n");
        Ok(DevNrFile)
    }
}

impl Drop for DevNrFile {
    fn drop(&mut self) {
        pr_info!("dev nr close was called!\n");
    }
}

struct DevNr {
    _dev: chrdev::Registration,
}

impl kernel::Module for DevNr {
    fn init(_module: &'static ThisModule) -> Result<Self> {
        logger::init_logger();
        pr_info!("Hello, Kernel!\n");

        let dev = chrdev::builder(c_str!("my dev nr"), 0..1)?
            .major(MYMAJOR)
            .register_device::<DevNrFile>()
            .build()?;
        pr_info!(
            "dev nr - registered Device Number Major: {}, Minor: {}\n",
            dev.major(),
            0
        );
        Ok(DevNr { _dev: dev })
    }
}

impl Drop for DevNr {
    fn drop(&mut self) {
        pr_info!("Goodbye, Kernel!\n");
    }
}

#[cfg(test)]
mod tests {
    use kbind::mock;
    use kernel::bindings;

    fn new_file() -> bindings::file {
        bindings::file {
            f_flags: 0,
            f_pos: 0,
            private_data: core::ptr::null_mut(),
        }
    }

    #[test]
    fn registers_major_90_and_logs_open_close() {
        let _serial = mock::exclusive();
        mock::reset();

        assert_eq!(crate::__dev_nr_init(), 0);
        assert_eq!(
            mock::regions(),
            [(bindings::MKDEV(90, 0), 1, "my dev nr".to_string())]
        );

        let ops = mock::installed_ops();
        assert_eq!(ops.len(), 1);
        let fops = unsafe { &*ops[0].1 };
        assert!(fops.read.is_none());
        assert!(fops.write.is_none());

        let mut file = new_file();
        let open = fops.open.unwrap();
        assert_eq!(unsafe { open(core::ptr::null_mut(), &mut file) }, 0);
        let release = fops.release.unwrap();
        assert_eq!(unsafe { release(core::ptr::null_mut(), &mut file) }, 0);

        let lines = mock::printk_lines();
        assert!(lines.contains(&"<6>dev nr open was called!\n".to_string()));
        assert!(lines.contains(&"<6>dev nr close was called!\n".to_string()));

        crate::__dev_nr_exit();
        assert!(mock::counters().balanced());
        assert!(mock::printk_lines().contains(&"<6>Goodbye, Kernel!\n".to_string()));
    }

    #[test]
    fn busy_major_fails_the_load() {
        let _serial = mock::exclusive();
        mock::reset();
        mock::fail_once(mock::FailPoint::RegisterChrdevRegion);

        assert!(crate::__dev_nr_init() < 0);
        assert!(mock::counters().balanced());
    }
}
