#![cfg_attr(not(test), no_std)]

use kernel::{error::KernelResult as Result, *};

module! {
    type: HelloKernel,
    name: "hello_world",
    author: "Lalitha 4 GNU/Linux",
    description: "A hello world LKM",
    license: "GPL",
}

struct HelloKernel;

impl kernel::Module for HelloKernel {
    fn init(_module: &'static ThisModule) -> Result<Self> {
        logger::init_logger();
        pr_info!("Hello, Kernel!\n");
        log::info!("hello_world loaded");
        Ok(HelloKernel)
    }
}

impl Drop for HelloKernel {
    fn drop(&mut self) {
        pr_info!("Goodbye, Kernel!\n");
    }
}

#[cfg(test)]
mod tests {
    use kbind::mock;

    #[test]
    fn greets_on_load_and_unload() {
        let _serial = mock::exclusive();
        mock::reset();

        assert_eq!(crate::__hello_world_init(), 0);
        assert!(mock::printk_lines().contains(&"<6>Hello, Kernel!\n".to_string()));

        crate::__hello_world_exit();
        assert!(mock::printk_lines().contains(&"<6>Goodbye, Kernel!\n".to_string()));
    }
}
