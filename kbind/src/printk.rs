use core::{cmp, ffi::c_int, fmt};

use crate::bindings;

#[doc(hidden)]
pub fn printk_level(level: &[u8; 3], s: &[u8]) {
    // Don't copy the trailing NUL from the `KERN_*` prefix.
    let mut fmt_str = [0; 2 + b"%.*s\0".len()];
    fmt_str[..2].copy_from_slice(&level[..2]);
    fmt_str[2..].copy_from_slice(b"%.*s\0");

    unsafe { bindings::_printk(fmt_str.as_ptr() as _, s.len() as c_int, s.as_ptr()) };
}

// From kernel/print/printk.c
const LOG_LINE_MAX: usize = 1024 - 32;

#[doc(hidden)]
pub struct LogLineWriter {
    data: [u8; LOG_LINE_MAX],
    pos: usize,
}

#[allow(clippy::new_without_default)]
impl LogLineWriter {
    pub fn new() -> LogLineWriter {
        LogLineWriter {
            data: [0u8; LOG_LINE_MAX],
            pos: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.pos]
    }
}

impl fmt::Write for LogLineWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let copy_len = cmp::min(LOG_LINE_MAX - self.pos, s.as_bytes().len());
        self.data[self.pos..self.pos + copy_len].copy_from_slice(&s.as_bytes()[..copy_len]);
        self.pos += copy_len;
        Ok(())
    }
}

/// Warning-level printk, used for diagnostics from within the binding
/// layer itself. The `kernel` crate layers the full `pr_*` family on top.
#[macro_export]
macro_rules! pr_warning {
    ($fmt:expr) => ({
        $crate::printk::printk_level($crate::KERN_WARNING, concat!($fmt, "\n").as_bytes());
    });
    ($fmt:expr, $($arg:tt)*) => ({
        use ::core::fmt;
        let mut writer = $crate::printk::LogLineWriter::new();
        let _ = fmt::write(&mut writer, format_args!(concat!($fmt, "\n"), $($arg)*));
        $crate::printk::printk_level($crate::KERN_WARNING, writer.as_bytes());
    });
}
