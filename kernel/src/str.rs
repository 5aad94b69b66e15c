//! String representations for kernel interfaces.

use core::fmt;

/// Possible errors when converting a byte slice to a [`CStr`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CStrConvertError {
    /// The slice does not end with a NUL byte.
    NotNulTerminated,
    /// The slice contains an interior NUL byte.
    InteriorNul,
}

/// A string that is guaranteed to have exactly one `NUL` byte, at the end.
///
/// Used for interoperability with kernel APIs that take C strings.
#[repr(transparent)]
pub struct CStr([u8]);

impl CStr {
    /// Creates a [`CStr`] from a `[u8]`, checking the invariant.
    pub const fn from_bytes_with_nul(bytes: &[u8]) -> Result<&CStr, CStrConvertError> {
        if bytes.is_empty() || bytes[bytes.len() - 1] != 0 {
            return Err(CStrConvertError::NotNulTerminated);
        }
        let mut i = 0;
        while i + 1 < bytes.len() {
            if bytes[i] == 0 {
                return Err(CStrConvertError::InteriorNul);
            }
            i += 1;
        }
        // SAFETY: The invariant was just checked.
        Ok(unsafe { CStr::from_bytes_with_nul_unchecked(bytes) })
    }

    /// Creates a [`CStr`] from a `[u8]` without checking the invariant.
    ///
    /// # Safety
    ///
    /// `bytes` must end with a `NUL` byte and contain no other `NUL` bytes.
    pub const unsafe fn from_bytes_with_nul_unchecked(bytes: &[u8]) -> &CStr {
        // SAFETY: `CStr` is `repr(transparent)` over `[u8]`.
        unsafe { core::mem::transmute(bytes) }
    }

    /// Returns a C pointer to the string.
    pub const fn as_char_ptr(&self) -> *const core::ffi::c_char {
        self.0.as_ptr() as *const core::ffi::c_char
    }

    /// The bytes of the string without the trailing `NUL`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..self.0.len() - 1]
    }

    /// The bytes of the string including the trailing `NUL`.
    pub const fn as_bytes_with_nul(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for CStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.as_bytes() {
            if (0x20..0x7f).contains(&b) {
                f.write_fmt(format_args!("{}", b as char))?;
            } else {
                f.write_fmt(format_args!("\\x{:02x}", b))?;
            }
        }
        Ok(())
    }
}

/// Creates a new [`CStr`] from a string literal, appending the `NUL` byte.
///
/// # Examples
///
/// ```ignore
/// const NAME: &kernel::str::CStr = kernel::c_str!("mydevice");
/// ```
#[macro_export]
macro_rules! c_str {
    ($str:expr) => {{
        const S: &str = concat!($str, "\0");
        const C: &$crate::str::CStr = match $crate::str::CStr::from_bytes_with_nul(S.as_bytes()) {
            Ok(v) => v,
            Err(_) => panic!("string contains interior NUL"),
        };
        C
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_str_appends_nul() {
        let s = crate::c_str!("abc");
        assert_eq!(s.as_bytes(), b"abc");
        assert_eq!(s.as_bytes_with_nul(), b"abc\0");
    }

    #[test]
    fn rejects_interior_nul() {
        assert!(matches!(
            CStr::from_bytes_with_nul(b"a\0b\0"),
            Err(CStrConvertError::InteriorNul)
        ));
        assert!(matches!(
            CStr::from_bytes_with_nul(b"ab"),
            Err(CStrConvertError::NotNulTerminated)
        ));
    }
}
