//! An in-memory stand-in for the kernel symbols declared in
//! `bindings_c.rs`, selected by the `mock` cargo feature.
//!
//! The fake kernel tracks every resource the tutorial acquires (device
//! number regions, classes, device files, cdevs), captures printk output,
//! and can inject a failure at each acquisition step or cap the user-copy
//! primitives to simulate partial copies. Double releases and releases of
//! never-acquired resources panic, so unbalanced teardown fails tests
//! loudly.

use std::{
    ffi::CStr as StdCStr,
    sync::{Mutex, MutexGuard, PoisonError},
    vec::Vec,
};

use crate::types_c::*;

/// A load-time acquisition step that can be made to fail once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    AllocChrdevRegion,
    RegisterChrdevRegion,
    ClassCreate,
    DeviceCreate,
    CdevAdd,
}

/// Snapshot of the acquire/release counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub regions_allocated: usize,
    pub regions_released: usize,
    pub classes_created: usize,
    pub classes_destroyed: usize,
    pub devices_created: usize,
    pub devices_destroyed: usize,
    pub cdevs_added: usize,
    pub cdevs_deleted: usize,
}

impl Counters {
    /// True when everything acquired has been released again.
    pub fn balanced(&self) -> bool {
        self.regions_allocated == self.regions_released
            && self.classes_created == self.classes_destroyed
            && self.devices_created == self.devices_destroyed
            && self.cdevs_added == self.cdevs_deleted
    }
}

struct CdevRec {
    addr: usize,
    // Stored as an address so `State` stays `Send`.
    ops: usize,
    added: Option<(dev_t, u32)>,
}

struct State {
    printk: Vec<String>,
    next_major: u32,
    regions: Vec<(dev_t, u32, String)>,
    classes: Vec<(usize, String)>,
    devices: Vec<(usize, usize, dev_t, String)>,
    cdevs: Vec<CdevRec>,
    counters: Counters,
    fail: Vec<FailPoint>,
    copy_to_user_cap: Option<usize>,
    copy_from_user_cap: Option<usize>,
}

impl State {
    const fn new() -> State {
        State {
            printk: Vec::new(),
            next_major: 240,
            regions: Vec::new(),
            classes: Vec::new(),
            devices: Vec::new(),
            cdevs: Vec::new(),
            counters: Counters {
                regions_allocated: 0,
                regions_released: 0,
                classes_created: 0,
                classes_destroyed: 0,
                devices_created: 0,
                devices_destroyed: 0,
                cdevs_added: 0,
                cdevs_deleted: 0,
            },
            fail: Vec::new(),
            copy_to_user_cap: None,
            copy_from_user_cap: None,
        }
    }

    fn take_fail(&mut self, point: FailPoint) -> bool {
        match self.fail.iter().position(|p| *p == point) {
            Some(idx) => {
                self.fail.remove(idx);
                true
            }
            None => false,
        }
    }
}

static STATE: Mutex<State> = Mutex::new(State::new());
static SERIAL: Mutex<()> = Mutex::new(());

fn state() -> MutexGuard<'static, State> {
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serialises tests that share the fake kernel. Take this first, then call
/// [`reset`].
pub fn exclusive() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drops all recorded state and frees outstanding fake objects.
pub fn reset() {
    let mut s = state();
    for rec in s.cdevs.drain(..) {
        drop(unsafe { Box::from_raw(rec.addr as *mut u64) });
    }
    for (addr, _) in s.classes.drain(..) {
        drop(unsafe { Box::from_raw(addr as *mut u64) });
    }
    for (addr, ..) in s.devices.drain(..) {
        drop(unsafe { Box::from_raw(addr as *mut u64) });
    }
    *s = State::new();
}

/// Makes the next call hitting `point` fail.
pub fn fail_once(point: FailPoint) {
    state().fail.push(point);
}

/// Caps the next `_copy_to_user` at `n` bytes; the remainder is reported
/// as not copied, like a fault halfway through the transfer.
pub fn cap_next_copy_to_user(n: usize) {
    state().copy_to_user_cap = Some(n);
}

/// Caps the next `_copy_from_user` at `n` bytes.
pub fn cap_next_copy_from_user(n: usize) {
    state().copy_from_user_cap = Some(n);
}

pub fn counters() -> Counters {
    state().counters
}

/// Captured printk lines, formatted as `<level>message`.
pub fn printk_lines() -> Vec<String> {
    state().printk.clone()
}

/// Active device number regions as `(dev, count, name)`.
pub fn regions() -> Vec<(dev_t, u32, String)> {
    state().regions.clone()
}

/// Names of the currently registered classes.
pub fn class_names() -> Vec<String> {
    state().classes.iter().map(|(_, n)| n.clone()).collect()
}

/// Names of the currently created device files.
pub fn device_names() -> Vec<String> {
    state().devices.iter().map(|(.., n)| n.clone()).collect()
}

/// The callback tables of all cdevs currently added, with their device
/// numbers. Lets tests drive the callbacks the way the kernel would.
pub fn installed_ops() -> Vec<(dev_t, *const file_operations)> {
    state()
        .cdevs
        .iter()
        .filter_map(|rec| {
            let (dev, _) = rec.added?;
            Some((dev, rec.ops as *const file_operations))
        })
        .collect()
}

fn err(code: u32) -> core::ffi::c_int {
    -(code as core::ffi::c_int)
}

fn name_of(ptr: *const core::ffi::c_char) -> String {
    unsafe { StdCStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}

/// The fake implementations themselves, re-exported as `bindings` by
/// `lib.rs`. Signatures mirror `bindings_c.rs`; variadic declarations are
/// narrowed to the argument lists the call sites actually use.
pub mod calls {
    use core::ffi::{c_char, c_int, c_uint, c_ulong, c_void};

    use super::*;

    pub unsafe extern "C" fn _printk(fmt: *const c_char, len: c_int, msg: *const u8) -> c_int {
        // `fmt` is one of the `KERN_*` prefixes followed by "%.*s".
        let level = unsafe { *fmt.add(1) as u8 as char };
        let body = unsafe { core::slice::from_raw_parts(msg, len as usize) };
        let line = format!("<{}>{}", level, String::from_utf8_lossy(body));
        state().printk.push(line);
        len
    }

    pub unsafe extern "C" fn _copy_to_user(
        to: *mut c_void,
        from: *const c_void,
        n: c_ulong,
    ) -> c_ulong {
        let requested = n as usize;
        let allowed = match state().copy_to_user_cap.take() {
            Some(cap) => requested.min(cap),
            None => requested,
        };
        unsafe { core::ptr::copy_nonoverlapping(from as *const u8, to as *mut u8, allowed) };
        (requested - allowed) as c_ulong
    }

    pub unsafe extern "C" fn _copy_from_user(
        to: *mut c_void,
        from: *const c_void,
        n: c_ulong,
    ) -> c_ulong {
        let requested = n as usize;
        let allowed = match state().copy_from_user_cap.take() {
            Some(cap) => requested.min(cap),
            None => requested,
        };
        unsafe { core::ptr::copy_nonoverlapping(from as *const u8, to as *mut u8, allowed) };
        (requested - allowed) as c_ulong
    }

    pub unsafe extern "C" fn alloc_chrdev_region(
        dev: *mut dev_t,
        baseminor: c_uint,
        count: c_uint,
        name: *const c_char,
    ) -> c_int {
        let mut s = state();
        if s.take_fail(FailPoint::AllocChrdevRegion) {
            return err(ENOMEM);
        }
        let major = s.next_major;
        s.next_major -= 1;
        let devt = MKDEV(major, baseminor);
        unsafe { *dev = devt };
        let name = name_of(name);
        s.regions.push((devt, count, name));
        s.counters.regions_allocated += 1;
        0
    }

    pub unsafe extern "C" fn register_chrdev_region(
        from: dev_t,
        count: c_uint,
        name: *const c_char,
    ) -> c_int {
        let mut s = state();
        if s.take_fail(FailPoint::RegisterChrdevRegion) {
            return err(EBUSY);
        }
        if s.regions.iter().any(|(dev, ..)| MAJOR(*dev) == MAJOR(from)) {
            return err(EBUSY);
        }
        let name = name_of(name);
        s.regions.push((from, count, name));
        s.counters.regions_allocated += 1;
        0
    }

    pub unsafe extern "C" fn unregister_chrdev_region(from: dev_t, count: c_uint) {
        let mut s = state();
        let idx = s
            .regions
            .iter()
            .position(|(dev, cnt, _)| *dev == from && *cnt == count)
            .expect("unregister_chrdev_region: region was not registered");
        s.regions.remove(idx);
        s.counters.regions_released += 1;
    }

    pub unsafe extern "C" fn cdev_alloc() -> *mut cdev {
        let token = Box::into_raw(Box::new(0u64));
        state().cdevs.push(CdevRec {
            addr: token as usize,
            ops: 0,
            added: None,
        });
        token as *mut cdev
    }

    pub unsafe extern "C" fn cdev_set_ops(
        p: *mut cdev,
        _owner: *mut module,
        ops: *const file_operations,
    ) {
        let mut s = state();
        let rec = s
            .cdevs
            .iter_mut()
            .find(|rec| rec.addr == p as usize)
            .expect("cdev_set_ops: cdev was not allocated with cdev_alloc");
        rec.ops = ops as usize;
    }

    pub unsafe extern "C" fn cdev_add(p: *mut cdev, dev: dev_t, count: c_uint) -> c_int {
        let mut s = state();
        if s.take_fail(FailPoint::CdevAdd) {
            return err(ENOMEM);
        }
        let rec = s
            .cdevs
            .iter_mut()
            .find(|rec| rec.addr == p as usize)
            .expect("cdev_add: cdev was not allocated with cdev_alloc");
        assert!(rec.added.is_none(), "cdev_add: cdev added twice");
        rec.added = Some((dev, count));
        s.counters.cdevs_added += 1;
        0
    }

    pub unsafe extern "C" fn cdev_del(p: *mut cdev) {
        let mut s = state();
        let idx = s
            .cdevs
            .iter()
            .position(|rec| rec.addr == p as usize)
            .expect("cdev_del: cdev unknown or already deleted");
        let rec = s.cdevs.remove(idx);
        if rec.added.is_some() {
            s.counters.cdevs_deleted += 1;
        }
        drop(unsafe { Box::from_raw(p as *mut u64) });
    }

    pub unsafe extern "C" fn class_create(name: *const c_char) -> *mut class {
        let mut s = state();
        if s.take_fail(FailPoint::ClassCreate) {
            return err(ENOMEM) as isize as *mut class;
        }
        let token = Box::into_raw(Box::new(0u64)) as usize;
        s.classes.push((token, name_of(name)));
        s.counters.classes_created += 1;
        token as *mut class
    }

    pub unsafe extern "C" fn class_destroy(cls: *mut class) {
        let mut s = state();
        let idx = s
            .classes
            .iter()
            .position(|(addr, _)| *addr == cls as usize)
            .expect("class_destroy: class unknown or already destroyed");
        s.classes.remove(idx);
        s.counters.classes_destroyed += 1;
        drop(unsafe { Box::from_raw(cls as *mut u64) });
    }

    pub unsafe extern "C" fn device_create(
        cls: *mut class,
        _parent: *mut device,
        devt: dev_t,
        _drvdata: *mut c_void,
        fmt: *const c_char,
    ) -> *mut device {
        let mut s = state();
        assert!(
            s.classes.iter().any(|(addr, _)| *addr == cls as usize),
            "device_create: unknown class"
        );
        if s.take_fail(FailPoint::DeviceCreate) {
            return err(ENOMEM) as isize as *mut device;
        }
        let token = Box::into_raw(Box::new(0u64)) as usize;
        s.devices.push((token, cls as usize, devt, name_of(fmt)));
        s.counters.devices_created += 1;
        token as *mut device
    }

    pub unsafe extern "C" fn device_destroy(cls: *mut class, devt: dev_t) {
        let mut s = state();
        let idx = s
            .devices
            .iter()
            .position(|(_, c, d, _)| *c == cls as usize && *d == devt)
            .expect("device_destroy: device unknown or already destroyed");
        let (token, ..) = s.devices.remove(idx);
        s.counters.devices_destroyed += 1;
        drop(unsafe { Box::from_raw(token as *mut u64) });
    }

    pub unsafe extern "C" fn __mutex_init(
        _lock: *mut mutex,
        _name: *const c_char,
        _key: *mut lock_class_key,
    ) {
    }

    pub unsafe extern "C" fn mutex_lock(lock: *mut mutex) {
        let word = unsafe { &*(lock as *const core::sync::atomic::AtomicU64) };
        while word
            .compare_exchange(
                0,
                1,
                core::sync::atomic::Ordering::Acquire,
                core::sync::atomic::Ordering::Relaxed,
            )
            .is_err()
        {
            std::thread::yield_now();
        }
    }

    pub unsafe extern "C" fn mutex_unlock(lock: *mut mutex) {
        let word = unsafe { &*(lock as *const core::sync::atomic::AtomicU64) };
        word.store(0, core::sync::atomic::Ordering::Release);
    }

    pub unsafe extern "C" fn errname(_err: c_int) -> *const c_char {
        core::ptr::null()
    }

    pub unsafe extern "C" fn file_private_data(file: *const file) -> *mut c_void {
        unsafe { (*file).private_data }
    }

    pub unsafe extern "C" fn file_set_private_data(file: *mut file, data: *mut c_void) {
        unsafe { (*file).private_data = data };
    }

    pub unsafe extern "C" fn file_pos(file: *const file) -> loff_t {
        unsafe { (*file).f_pos }
    }

    pub unsafe extern "C" fn file_set_pos(file: *mut file, pos: loff_t) {
        unsafe { (*file).f_pos = pos };
    }

    pub unsafe extern "C" fn file_flags(file: *const file) -> c_uint {
        unsafe { (*file).f_flags }
    }
}
