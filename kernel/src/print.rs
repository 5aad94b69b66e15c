//! Printing facilities, wrapping the kernel's `printk`.

use core::fmt;

#[doc(hidden)]
pub fn call_printk(level: &'static [u8; 3], args: fmt::Arguments<'_>) {
    let mut writer = kbind::printk::LogLineWriter::new();
    let _ = fmt::write(&mut writer, args);
    kbind::printk::printk_level(level, writer.as_bytes());
}

/// Prints an emergency-level message (level 0).
#[macro_export]
macro_rules! pr_emerg {
    ($($arg:tt)*) => (
        $crate::print::call_printk($crate::bindings::KERN_EMERG, format_args!($($arg)*))
    );
}

/// Prints an alert-level message (level 1).
#[macro_export]
macro_rules! pr_alert {
    ($($arg:tt)*) => (
        $crate::print::call_printk($crate::bindings::KERN_ALERT, format_args!($($arg)*))
    );
}

/// Prints a critical-level message (level 2).
#[macro_export]
macro_rules! pr_crit {
    ($($arg:tt)*) => (
        $crate::print::call_printk($crate::bindings::KERN_CRIT, format_args!($($arg)*))
    );
}

/// Prints an error-level message (level 3).
#[macro_export]
macro_rules! pr_err {
    ($($arg:tt)*) => (
        $crate::print::call_printk($crate::bindings::KERN_ERR, format_args!($($arg)*))
    );
}

/// Prints a warning-level message (level 4).
#[macro_export]
macro_rules! pr_warn {
    ($($arg:tt)*) => (
        $crate::print::call_printk($crate::bindings::KERN_WARNING, format_args!($($arg)*))
    );
}

/// Prints a notice-level message (level 5).
#[macro_export]
macro_rules! pr_notice {
    ($($arg:tt)*) => (
        $crate::print::call_printk($crate::bindings::KERN_NOTICE, format_args!($($arg)*))
    );
}

/// Prints an info-level message (level 6).
///
/// Mimics the interface of [`std::print!`].
///
/// [`std::print!`]: https://doc.rust-lang.org/std/macro.print.html
#[macro_export]
macro_rules! pr_info {
    ($($arg:tt)*) => (
        $crate::print::call_printk($crate::bindings::KERN_INFO, format_args!($($arg)*))
    );
}

/// Prints a debug-level message (level 7).
#[macro_export]
macro_rules! pr_debug {
    ($($arg:tt)*) => (
        if cfg!(debug_assertions) {
            $crate::print::call_printk($crate::bindings::KERN_DEBUG, format_args!($($arg)*))
        }
    );
}

/// Continues a previous log message in the same line.
#[macro_export]
macro_rules! pr_cont {
    ($($arg:tt)*) => (
        $crate::print::call_printk($crate::bindings::KERN_CONT, format_args!($($arg)*))
    );
}
