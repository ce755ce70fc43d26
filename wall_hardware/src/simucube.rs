//! Binding to the vendor motor-control shared library.
//!
//! The vendor ships `libsimucube.so` with a C surface of five calls:
//! `openSimucube`, `closeSimucube`, `clearFaultsAndInitialize`, `setSpeed`,
//! `getTorque`. All but close return a status code (0 = success) that every
//! call site checks. The library is loaded at runtime so the binary starts
//! on machines without the vendor stack installed.

use std::ffi::OsStr;
use std::os::raw::c_int;

use libloading::{Library, Symbol};

use crate::error::HwError;
use wall_traits::MotorDriver;

/// Library name resolved through the normal dynamic-linker search path when
/// no explicit path is configured.
pub const DEFAULT_DRIVER_LIB: &str = "libsimucube.so";

pub struct SimucubeDriver {
    lib: Library,
    handle: c_int,
    closed: bool,
}

impl SimucubeDriver {
    /// Load the vendor library and open the motor-controller bus. The vendor
    /// open scans serial ports internally; a nonzero status means no
    /// controller answered and is fatal for startup.
    pub fn open(lib_path: impl AsRef<OsStr>) -> Result<Self, HwError> {
        let lib = unsafe { Library::new(lib_path.as_ref()) }
            .map_err(|e| HwError::Library(e.to_string()))?;
        let mut handle: c_int = 0;
        let rc = unsafe {
            let open: Symbol<unsafe extern "C" fn(*mut c_int) -> c_int> = lib
                .get(b"openSimucube\0")
                .map_err(|e| HwError::Library(e.to_string()))?;
            open(&mut handle)
        };
        if rc != 0 {
            return Err(HwError::Open(rc));
        }
        tracing::info!(handle, "motor controller bus opened");
        Ok(Self {
            lib,
            handle,
            closed: false,
        })
    }

    fn sym<T>(&self, name: &[u8]) -> Result<Symbol<'_, T>, HwError> {
        unsafe { self.lib.get(name) }.map_err(|e| HwError::Library(e.to_string()))
    }

    fn close_inner(&mut self) -> Result<(), HwError> {
        let close: Symbol<'_, unsafe extern "C" fn(c_int)> = self.sym(b"closeSimucube\0")?;
        unsafe { close(self.handle) };
        self.closed = true;
        tracing::info!("motor controller bus closed");
        Ok(())
    }
}

impl MotorDriver for SimucubeDriver {
    fn set_speed(
        &mut self,
        rpm: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let set: Symbol<'_, unsafe extern "C" fn(c_int, c_int) -> c_int> =
            self.sym(b"setSpeed\0")?;
        let rc = unsafe { set(self.handle, rpm as c_int) };
        if rc != 0 {
            return Err(Box::new(HwError::Command(rc)));
        }
        Ok(())
    }

    fn torque(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        let get: Symbol<'_, unsafe extern "C" fn(c_int, *mut c_int) -> c_int> =
            self.sym(b"getTorque\0")?;
        let mut value: c_int = 0;
        let rc = unsafe { get(self.handle, &mut value) };
        if rc != 0 {
            return Err(Box::new(HwError::TorqueRead(rc)));
        }
        Ok(value)
    }

    fn clear_faults(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let clear: Symbol<'_, unsafe extern "C" fn(c_int) -> c_int> =
            self.sym(b"clearFaultsAndInitialize\0")?;
        let rc = unsafe { clear(self.handle) };
        if rc != 0 {
            return Err(Box::new(HwError::Fault(rc)));
        }
        tracing::info!("faults cleared, drive enabled");
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.close_inner()?;
        Ok(())
    }
}

impl Drop for SimucubeDriver {
    fn drop(&mut self) {
        // Backstop for error paths that never reached the shutdown sequence.
        if !self.closed
            && let Err(e) = self.close_inner()
        {
            tracing::warn!(error = %e, "close on drop failed");
        }
    }
}
