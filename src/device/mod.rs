//! Device-style access to the record ring
//!
//! `LogDevice` is the context object created at service start; callers
//! `open()` it to get a `LogFile` carrying their own cursor. Every
//! operation runs under the device's single `AccessGuard`.

mod file;
mod guard;
mod log_device;

pub use file::LogFile;
pub use guard::{AccessGuard, Interrupt};
pub use log_device::{DeviceOptions, LogDevice, Teardown};
