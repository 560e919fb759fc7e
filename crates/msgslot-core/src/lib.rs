//! # msgslot-core
//!
//! Core types for the message slot device.
//!
//! This crate is platform-agnostic and contains no device plumbing.
//! The device itself (endpoint registry, dispatch, ioctl ABI) lives in
//! `msgslot-module`.
//!
//! ## Modules
//!
//! - `id` - Channel and arena node identifiers
//! - `arena` - Index-addressed node storage with a LIFO free stack
//! - `tree` - Height-balanced channel tree (one per endpoint)
//! - `session` - Per-open-handle channel binding
//! - `uaccess` - User-memory copy seam and message staging
//! - `error` - Error types and errno mapping
//! - `spinlock` - Per-endpoint spinlock primitive
//! - `traits` - Character device and registration traits
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

pub mod id;
pub mod arena;
pub mod tree;
pub mod session;
pub mod uaccess;
pub mod error;
pub mod spinlock;
pub mod traits;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use id::{ChannelId, NodeId};
pub use tree::{ChannelEntry, ChannelTree, InsertOutcome, InvariantViolation};
pub use session::{Session, SessionState};
pub use uaccess::{StagedMessage, UserSink, UserSource};
pub use error::{SlotError, SlotResult};
pub use spinlock::SpinLock;
pub use traits::{CharDevice, Registrar};
pub use env::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};

/// Device-wide constants
pub mod constants {
    /// Maximum message length in bytes
    pub const BUF_LEN: usize = 128;

    /// Number of endpoint slots (256 minors plus headroom)
    pub const NUM_ENDPOINTS: usize = 260;

    /// Static major number the device registers under
    pub const MAJOR_NUM: u32 = 235;

    /// Name used for character device registration
    pub const DEVICE_RANGE_NAME: &str = "message_slot";

    /// Largest major number the registration layer accepts
    pub const MAX_MAJOR: u32 = 511;

    /// Unbounded per-endpoint entry count
    pub const UNLIMITED_ENTRIES: usize = usize::MAX;

    /// ioctl command that binds a channel: `_IOW(MAJOR_NUM, 0, unsigned int)`
    pub const MSG_SLOT_CHANNEL: u32 = ioc_write(MAJOR_NUM, 0, core::mem::size_of::<u32>() as u32);

    const IOC_NRSHIFT: u32 = 0;
    const IOC_TYPESHIFT: u32 = 8;
    const IOC_SIZESHIFT: u32 = 16;
    const IOC_DIRSHIFT: u32 = 30;
    const IOC_WRITE: u32 = 1;

    /// Generic Linux `_IOW` encoding.
    pub const fn ioc_write(ty: u32, nr: u32, size: u32) -> u32 {
        (IOC_WRITE << IOC_DIRSHIFT)
            | ((ty & 0xff) << IOC_TYPESHIFT)
            | ((nr & 0xff) << IOC_NRSHIFT)
            | ((size & 0x3fff) << IOC_SIZESHIFT)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_msg_slot_channel_encoding() {
            // dir=write, size=4, type=235, nr=0
            assert_eq!(MSG_SLOT_CHANNEL, 0x4004_EB00);
        }
    }
}
