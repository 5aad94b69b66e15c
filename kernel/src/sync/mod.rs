//! Synchronisation primitives backed by the kernel's locking API.

use core::{cell::UnsafeCell, ops};

use crate::{bindings, str::CStr, types::Opaque};

/// A lockdep class key. One static key per lock, handed to
/// [`Mutex::init`].
pub struct LockClassKey(Opaque<bindings::lock_class_key>);

// The kernel mutates the key through the raw pointer; Rust code never
// touches it.
unsafe impl Sync for LockClassKey {}

impl LockClassKey {
    pub const fn new() -> LockClassKey {
        LockClassKey(Opaque::uninit())
    }

    pub(crate) fn as_ptr(&self) -> *mut bindings::lock_class_key {
        self.0.get()
    }
}

/// A mutual-exclusion lock around a value, backed by `struct mutex`.
///
/// Statics of this type are created with [`Mutex::new`] and must be
/// initialised with [`Mutex::init`] before the first [`lock`](Mutex::lock),
/// typically from the module's `init`.
pub struct Mutex<T: ?Sized> {
    mutex: Opaque<bindings::mutex>,
    data: UnsafeCell<T>,
}

// Matching std: the lock hands out &T/&mut T, so sharing the mutex across
// threads shares the data.
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    /// Creates a new mutex around `data`.
    ///
    /// # Safety
    ///
    /// The caller must call [`Mutex::init`] before the mutex is first
    /// locked.
    pub const unsafe fn new(data: T) -> Mutex<T> {
        Mutex {
            mutex: Opaque::zeroed(),
            data: UnsafeCell::new(data),
        }
    }

    /// Initialises the underlying kernel mutex.
    pub fn init(&self, name: &'static CStr, key: &'static LockClassKey) {
        unsafe { bindings::__mutex_init(self.mutex.get(), name.as_char_ptr(), key.as_ptr()) };
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Locks the mutex, blocking until it is acquired.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        unsafe { bindings::mutex_lock(self.mutex.get()) };
        MutexGuard { mutex: self }
    }
}

/// Grants access to the data protected by a [`Mutex`]; unlocks on drop.
pub struct MutexGuard<'a, T: ?Sized> {
    mutex: &'a Mutex<T>,
}

impl<T: ?Sized> ops::Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T: ?Sized> ops::DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        unsafe { bindings::mutex_unlock(self.mutex.mutex.get()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c_str;

    static KEY: LockClassKey = LockClassKey::new();

    #[test]
    fn guard_gives_mutable_access() {
        let mutex = unsafe { Mutex::new(7) };
        mutex.init(c_str!("test_mutex"), &KEY);
        *mutex.lock() += 1;
        assert_eq!(*mutex.lock(), 8);
    }

    #[test]
    fn serialises_concurrent_increments() {
        let mutex: &'static Mutex<u64> = Box::leak(Box::new(unsafe { Mutex::new(0) }));
        mutex.init(c_str!("contended_mutex"), &KEY);

        let threads: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let mut guard = mutex.lock();
                        let v = *guard;
                        std::thread::yield_now();
                        *guard = v + 1;
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(*mutex.lock(), 4000);
    }
}
