//! Device and registration traits
//!
//! These traits are the boundary between the platform-agnostic core and
//! the device implementation in `msgslot-module`.

use std::sync::Arc;

use crate::error::SlotResult;
use crate::uaccess::{UserSink, UserSource};

/// File operations of a character device
///
/// Mirrors the open/read/write/ioctl/release table a driver registers.
/// Every call is synchronous and never waits for data.
pub trait CharDevice: Send + Sync {
    /// Per-open-handle state
    type File;

    /// Open the endpoint with the given minor number
    fn open(&self, minor: usize) -> SlotResult<Self::File>;

    /// Copy the message on the handle's channel into `dst`
    fn read<D: UserSink + ?Sized>(&self, file: &Self::File, dst: &mut D) -> SlotResult<usize>;

    /// Store the bytes of `src` on the handle's channel
    fn write<S: UserSource + ?Sized>(&self, file: &Self::File, src: &S) -> SlotResult<usize>;

    /// Device-specific control command
    fn ioctl(&self, file: &mut Self::File, cmd: u32, param: u64) -> SlotResult<()>;

    /// Close the handle
    fn release(&self, file: Self::File);
}

/// Character device number registration
///
/// Registration failure is fatal to loading the device.
pub trait Registrar: Send + Sync {
    /// Claim `major` under `name`
    fn register(&self, major: u32, name: &str) -> SlotResult<()>;

    /// Give `major` back (always succeeds)
    fn unregister(&self, major: u32, name: &str);
}

impl<R: Registrar + ?Sized> Registrar for Arc<R> {
    fn register(&self, major: u32, name: &str) -> SlotResult<()> {
        (**self).register(major, name)
    }

    fn unregister(&self, major: u32, name: &str) {
        (**self).unregister(major, name)
    }
}
